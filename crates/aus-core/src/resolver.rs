use std::sync::Arc;

use async_trait::async_trait;
use aus_backend::{Release, ReleaseResolver, StoreError, Transaction};

/// Looks a release up in the current release table first and in the legacy
/// table second, while both tables are still in service.
pub struct LegacyFallbackResolver {
    primary: Arc<dyn ReleaseResolver>,
    legacy: Arc<dyn ReleaseResolver>,
}

impl LegacyFallbackResolver {
    #[must_use]
    pub fn new(primary: Arc<dyn ReleaseResolver>, legacy: Arc<dyn ReleaseResolver>) -> Self {
        Self { primary, legacy }
    }
}

#[async_trait]
impl ReleaseResolver for LegacyFallbackResolver {
    async fn resolve(
        &self,
        name: &str,
        transaction: Option<Transaction>,
    ) -> Result<Option<Release>, StoreError> {
        if let Some(release) = self.primary.resolve(name, transaction).await? {
            return Ok(Some(release));
        }

        let legacy = self.legacy.resolve(name, transaction).await?;
        if legacy.is_some() {
            log::debug!("Release {name} resolved from the legacy release table");
        }
        Ok(legacy)
    }
}
