use std::collections::HashMap;

use async_trait::async_trait;
use aus_backend::{
    Release, ReleaseResolver, Rule, RuleStore, Shutoff, ShutoffRegistry, StoreError, Transaction,
    UpdateQuery,
};

use crate::conditions::rule_matches;

/// Rules held in insertion order. Matching preserves that order, so it is
/// also the order equal-priority rules reach the engine in.
#[derive(Debug, Clone, Default)]
pub struct MemoryRuleStore {
    rules: Vec<Rule>,
}

impl MemoryRuleStore {
    #[must_use]
    pub fn from_rules(rules: impl IntoIterator<Item = Rule>) -> Self {
        Self {
            rules: rules.into_iter().collect(),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

#[async_trait]
impl RuleStore for MemoryRuleStore {
    async fn matching_rules(
        &self,
        query: &UpdateQuery,
        fallback_channel: &str,
        _transaction: Option<Transaction>,
    ) -> Result<Vec<Rule>, StoreError> {
        Ok(self
            .rules
            .iter()
            .filter(|rule| rule_matches(&rule.conditions, query, fallback_channel))
            .cloned()
            .collect())
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryShutoffRegistry {
    shutoffs: Vec<Shutoff>,
}

impl MemoryShutoffRegistry {
    #[must_use]
    pub fn from_shutoffs(shutoffs: impl IntoIterator<Item = Shutoff>) -> Self {
        Self {
            shutoffs: shutoffs.into_iter().collect(),
        }
    }
}

#[async_trait]
impl ShutoffRegistry for MemoryShutoffRegistry {
    async fn shutoffs(
        &self,
        product: &str,
        channel: &str,
        _transaction: Option<Transaction>,
    ) -> Result<Vec<Shutoff>, StoreError> {
        Ok(self
            .shutoffs
            .iter()
            .filter(|shutoff| shutoff.product == product && shutoff.channel == channel)
            .cloned()
            .collect())
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryReleaseStore {
    releases: HashMap<String, Release>,
}

impl MemoryReleaseStore {
    /// Later releases replace earlier ones with the same name.
    #[must_use]
    pub fn from_releases(releases: impl IntoIterator<Item = Release>) -> Self {
        Self {
            releases: releases
                .into_iter()
                .map(|release| (release.name.clone(), release))
                .collect(),
        }
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.releases.contains_key(name)
    }
}

#[async_trait]
impl ReleaseResolver for MemoryReleaseStore {
    async fn resolve(
        &self,
        name: &str,
        _transaction: Option<Transaction>,
    ) -> Result<Option<Release>, StoreError> {
        Ok(self.releases.get(name).cloned())
    }
}
