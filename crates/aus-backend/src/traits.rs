use async_trait::async_trait;
use serde_json::Value;

use crate::error::StoreError;
use crate::types::{Release, Rule, Shutoff, Transaction, UpdateQuery};

/// Process-wide memoization layer. Expiry and invalidation belong to the
/// implementation; callers only read and write.
#[async_trait]
pub trait Cache: Send + Sync {
    async fn get(&self, namespace: &str, key: &str) -> Result<Option<Value>, StoreError>;

    async fn put(&self, namespace: &str, key: &str, value: Value) -> Result<(), StoreError>;
}

#[async_trait]
pub trait ShutoffRegistry: Send + Sync {
    /// Active shutoffs for exactly this product/channel pair. An empty list
    /// means updates are enabled.
    async fn shutoffs(
        &self,
        product: &str,
        channel: &str,
        transaction: Option<Transaction>,
    ) -> Result<Vec<Shutoff>, StoreError>;
}

#[async_trait]
pub trait RuleStore: Send + Sync {
    /// Rules whose predicates match `query`, where a rule scoped to
    /// `fallback_channel` also matches.
    async fn matching_rules(
        &self,
        query: &UpdateQuery,
        fallback_channel: &str,
        transaction: Option<Transaction>,
    ) -> Result<Vec<Rule>, StoreError>;
}

#[async_trait]
pub trait ReleaseResolver: Send + Sync {
    async fn resolve(
        &self,
        name: &str,
        transaction: Option<Transaction>,
    ) -> Result<Option<Release>, StoreError>;
}

/// A release artifact able to judge whether it is an update for a client.
pub trait Payload: Send + Sync {
    fn name(&self) -> &str;

    fn should_serve_update(&self, query: &UpdateQuery) -> bool;
}
