use aus_backend::StoreError;
use thiserror::Error;

use crate::blob::BlobError;

/// Failure of one evaluation. Policy outcomes (shutoffs, drops, stale
/// releases) are never errors; these are infrastructure or data faults.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Release {release} has an unusable blob: {source}")]
    Blob {
        release: String,
        #[source]
        source: BlobError,
    },
}

impl EngineError {
    pub fn blob(release: impl Into<String>, source: BlobError) -> Self {
        Self::Blob {
            release: release.into(),
            source,
        }
    }
}
