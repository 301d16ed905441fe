use thiserror::Error;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collaborator {
    #[error("cache")]
    Cache,
    #[error("shutoff registry")]
    ShutoffRegistry,
    #[error("rule store")]
    RuleStore,
    #[error("release resolver")]
    ReleaseResolver,
}

/// Infrastructure failure reported by one of the engine's collaborators.
///
/// These are never policy outcomes: the engine hands them back to its caller
/// untouched.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("{collaborator} unavailable: {details}")]
    Unavailable {
        collaborator: Collaborator,
        details: String,
    },

    #[error("{collaborator} query failed during {operation}: {details}")]
    QueryFailed {
        collaborator: Collaborator,
        operation: &'static str,
        details: String,
    },
}

impl StoreError {
    pub fn unavailable(collaborator: Collaborator, details: impl Into<String>) -> Self {
        Self::Unavailable {
            collaborator,
            details: details.into(),
        }
    }

    pub fn query_failed(
        collaborator: Collaborator,
        operation: &'static str,
        details: impl Into<String>,
    ) -> Self {
        Self::QueryFailed {
            collaborator,
            operation,
            details: details.into(),
        }
    }

    #[must_use]
    pub fn collaborator(&self) -> Collaborator {
        match self {
            Self::Unavailable { collaborator, .. }
            | Self::QueryFailed { collaborator, .. } => *collaborator,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Collaborator, StoreError};

    #[test]
    fn unavailable_display_names_collaborator() {
        let error = StoreError::unavailable(Collaborator::RuleStore, "connection refused");

        assert_eq!(
            error.to_string(),
            "rule store unavailable: connection refused"
        );
        assert_eq!(error.collaborator(), Collaborator::RuleStore);
    }

    #[test]
    fn query_failed_keeps_operation() {
        let error =
            StoreError::query_failed(Collaborator::ShutoffRegistry, "select", "deadlock detected");

        assert!(matches!(
            error,
            StoreError::QueryFailed {
                collaborator: Collaborator::ShutoffRegistry,
                operation: "select",
                ..
            }
        ));
        assert_eq!(
            error.to_string(),
            "shutoff registry query failed during select: deadlock detected"
        );
    }
}
