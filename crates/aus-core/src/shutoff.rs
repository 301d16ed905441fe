use std::sync::Arc;

use aus_backend::{Cache, ShutoffRegistry, StoreError, Transaction};
use serde_json::Value;

/// Cache namespace holding memoized shutoff status per product/channel.
pub const UPDATES_DISABLED_NAMESPACE: &str = "updates_disabled";

/// Cache key for one product/channel pair. Encoded as a JSON array so a
/// separator inside either part cannot collide.
#[must_use]
pub fn shutoff_cache_key(product: &str, channel: &str) -> String {
    serde_json::json!([product, channel]).to_string()
}

pub(crate) struct ShutoffGate {
    cache: Arc<dyn Cache>,
    registry: Arc<dyn ShutoffRegistry>,
}

impl ShutoffGate {
    pub(crate) fn new(cache: Arc<dyn Cache>, registry: Arc<dyn ShutoffRegistry>) -> Self {
        Self { cache, registry }
    }

    pub(crate) async fn updates_are_disabled(
        &self,
        product: &str,
        channel: &str,
        transaction: Option<Transaction>,
    ) -> Result<bool, StoreError> {
        let key = shutoff_cache_key(product, channel);
        match self.cache.get(UPDATES_DISABLED_NAMESPACE, &key).await? {
            Some(Value::Bool(disabled)) => return Ok(disabled),
            Some(other) => {
                log::warn!("Ignoring non-boolean shutoff cache entry for {key}: {other}");
            }
            None => {}
        }

        let disabled = !self
            .registry
            .shutoffs(product, channel, transaction)
            .await?
            .is_empty();
        self.cache
            .put(UPDATES_DISABLED_NAMESPACE, &key, Value::Bool(disabled))
            .await?;
        Ok(disabled)
    }
}
