#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppErrorDetail {
    Message(String),
    Io {
        kind: std::io::ErrorKind,
        message: String,
    },
}

impl std::fmt::Display for AppErrorDetail {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Message(message) => write!(f, "{message}"),
            Self::Io { kind, message } => write!(f, "{kind}: {message}"),
        }
    }
}

impl From<String> for AppErrorDetail {
    fn from(value: String) -> Self {
        Self::Message(value)
    }
}

impl From<&str> for AppErrorDetail {
    fn from(value: &str) -> Self {
        Self::Message(value.to_string())
    }
}

impl From<std::io::Error> for AppErrorDetail {
    fn from(error: std::io::Error) -> Self {
        Self::Io {
            kind: error.kind(),
            message: error.to_string(),
        }
    }
}

impl From<aus_memory::DataSetError> for AppErrorDetail {
    fn from(value: aus_memory::DataSetError) -> Self {
        Self::Message(value.to_string())
    }
}

impl From<aus_core::EngineError> for AppErrorDetail {
    fn from(value: aus_core::EngineError) -> Self {
        Self::Message(value.to_string())
    }
}

impl From<serde_json::Error> for AppErrorDetail {
    fn from(value: serde_json::Error) -> Self {
        Self::Message(value.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppError {
    DataSetNotConfigured,
    DataSetLoadFailed {
        path: String,
        details: AppErrorDetail,
    },
    EvaluationFailed {
        details: AppErrorDetail,
    },
    OutputFailed {
        format: &'static str,
        details: AppErrorDetail,
    },
    SettingsPathUnavailable,
    SettingsWriteFailed {
        path: String,
        details: AppErrorDetail,
    },
}

impl AppError {
    pub fn data_set_not_configured() -> Self {
        Self::DataSetNotConfigured
    }

    pub fn data_set_load_failed(
        path: &std::path::Path,
        details: impl Into<AppErrorDetail>,
    ) -> Self {
        Self::DataSetLoadFailed {
            path: path.display().to_string(),
            details: details.into(),
        }
    }

    pub fn evaluation_failed(details: impl Into<AppErrorDetail>) -> Self {
        Self::EvaluationFailed {
            details: details.into(),
        }
    }

    pub fn settings_path_unavailable() -> Self {
        Self::SettingsPathUnavailable
    }

    pub fn settings_write_failed(
        path: &std::path::Path,
        details: impl Into<AppErrorDetail>,
    ) -> Self {
        Self::SettingsWriteFailed {
            path: path.display().to_string(),
            details: details.into(),
        }
    }

    pub fn output_failed(format: &'static str, details: impl Into<AppErrorDetail>) -> Self {
        Self::OutputFailed {
            format,
            details: details.into(),
        }
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DataSetNotConfigured => write!(
                f,
                "No data set given: pass --data or set data_set in the settings file"
            ),
            Self::DataSetLoadFailed { path, details } => {
                write!(f, "Failed to load data set {path}: {details}")
            }
            Self::EvaluationFailed { details } => write!(f, "Evaluation failed: {details}"),
            Self::OutputFailed { format, details } => {
                write!(f, "Failed to render {format} output: {details}")
            }
            Self::SettingsPathUnavailable => write!(
                f,
                "No settings location known: pass --settings with a file path"
            ),
            Self::SettingsWriteFailed { path, details } => {
                write!(f, "Failed to write settings {path}: {details}")
            }
        }
    }
}

impl std::error::Error for AppError {}
