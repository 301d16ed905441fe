use std::fmt;
use std::sync::Arc;

use aus_backend::{
    Cache, ForceResult, Payload, ReleaseResolver, Rule, RuleStore, ShutoffRegistry, Transaction,
    UpdateQuery, UpdateType,
};
use serde::{Serialize, Serializer};

use crate::blob::{Blob, create_blob};
use crate::channel::fallback_channel;
use crate::dice::{RolloutDice, ThreadRngDice};
use crate::error::EngineError;
use crate::shutoff::ShutoffGate;

/// Placeholder reported for rule id and data version when no rule drove the
/// decision.
pub const UNKNOWN_RULE: &str = "unknown";

/// Which rule, if any, a decision came from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EvaluationMetadata {
    #[serde(serialize_with = "serialize_or_unknown")]
    pub rule_id: Option<i64>,
    #[serde(serialize_with = "serialize_or_unknown")]
    pub rule_data_version: Option<i64>,
}

impl EvaluationMetadata {
    #[must_use]
    pub fn unknown() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn for_rule(rule: &Rule) -> Self {
        Self {
            rule_id: Some(rule.rule_id),
            rule_data_version: Some(rule.data_version),
        }
    }

    #[must_use]
    pub fn is_unknown(&self) -> bool {
        self.rule_id.is_none()
    }
}

fn serialize_or_unknown<S>(value: &Option<i64>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match value {
        Some(value) => serializer.serialize_i64(*value),
        None => serializer.serialize_str(UNKNOWN_RULE),
    }
}

impl fmt::Display for EvaluationMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.rule_id, self.rule_data_version) {
            (Some(id), Some(data_version)) => {
                write!(f, "rule_id={id} rule_data_version={data_version}")
            }
            _ => write!(f, "rule_id={UNKNOWN_RULE} rule_data_version={UNKNOWN_RULE}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RolloutPath {
    Primary,
    Fallback,
}

impl fmt::Display for RolloutPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Primary => write!(f, "primary"),
            Self::Fallback => write!(f, "fallback"),
        }
    }
}

/// Why a decision came out the way it did. Every variant except `Served`
/// carries no payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Outcome {
    UpdatesDisabled,
    NoMatchingRule,
    NullMapping,
    Dropped,
    NotServable {
        release: String,
        path: RolloutPath,
        missing: bool,
    },
    Served {
        release: String,
        path: RolloutPath,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServedUpdate {
    pub payload: Blob,
    pub update_type: UpdateType,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Decision {
    pub update: Option<ServedUpdate>,
    pub metadata: EvaluationMetadata,
    pub outcome: Outcome,
}

impl Decision {
    fn none(metadata: EvaluationMetadata, outcome: Outcome) -> Self {
        Self {
            update: None,
            metadata,
            outcome,
        }
    }

    #[must_use]
    pub fn payload(&self) -> Option<&Blob> {
        self.update.as_ref().map(|update| &update.payload)
    }

    #[must_use]
    pub fn update_type(&self) -> Option<UpdateType> {
        self.update.as_ref().map(|update| update.update_type)
    }

    /// `(payload, update_type, metadata)`, the shape callers render from.
    #[must_use]
    pub fn into_parts(self) -> (Option<Blob>, Option<UpdateType>, EvaluationMetadata) {
        match self.update {
            Some(ServedUpdate {
                payload,
                update_type,
            }) => (Some(payload), Some(update_type), self.metadata),
            None => (None, None, self.metadata),
        }
    }
}

/// Picks the update, if any, for one update query.
///
/// The engine holds no per-request state; one instance can serve concurrent
/// evaluations from behind an `Arc`.
pub struct RuleEngine {
    shutoffs: ShutoffGate,
    rules: Arc<dyn RuleStore>,
    releases: Arc<dyn ReleaseResolver>,
    dice: Arc<dyn RolloutDice>,
}

impl RuleEngine {
    #[must_use]
    pub fn new(
        cache: Arc<dyn Cache>,
        shutoffs: Arc<dyn ShutoffRegistry>,
        rules: Arc<dyn RuleStore>,
        releases: Arc<dyn ReleaseResolver>,
    ) -> Self {
        Self {
            shutoffs: ShutoffGate::new(cache, shutoffs),
            rules,
            releases,
            dice: Arc::new(ThreadRngDice),
        }
    }

    #[must_use]
    pub fn with_dice(mut self, dice: Arc<dyn RolloutDice>) -> Self {
        self.dice = dice;
        self
    }

    /// Whether an emergency shutoff covers exactly this product/channel.
    /// The answer is memoized in the `updates_disabled` cache namespace.
    ///
    /// # Errors
    /// Returns an error when the cache or the shutoff registry fails.
    pub async fn updates_are_disabled(
        &self,
        product: &str,
        channel: &str,
        transaction: Option<Transaction>,
    ) -> Result<bool, EngineError> {
        Ok(self
            .shutoffs
            .updates_are_disabled(product, channel, transaction)
            .await?)
    }

    /// Decide which payload, if any, to serve for `query`.
    ///
    /// Every store call made for this evaluation receives `transaction`
    /// unchanged.
    ///
    /// # Errors
    /// Returns an error when a collaborator fails or a resolved release holds
    /// a blob that cannot be interpreted. Shutoffs, missing rules, dropped
    /// requests and stale releases are not errors.
    pub async fn evaluate_rules(
        &self,
        query: &UpdateQuery,
        transaction: Option<Transaction>,
    ) -> Result<Decision, EngineError> {
        log::debug!(
            "Looking for rules that apply to {query:?} (transaction {:?})",
            transaction.map(Transaction::id)
        );

        let fallback = fallback_channel(&query.channel);
        let mut metadata = EvaluationMetadata::unknown();

        if self
            .updates_are_disabled(&query.product, &query.channel, transaction)
            .await?
            || self
                .updates_are_disabled(&query.product, fallback, transaction)
                .await?
        {
            log::debug!(
                "Updates are disabled for {}/{}",
                query.product,
                query.channel
            );
            return Ok(Decision::none(metadata, Outcome::UpdatesDisabled));
        }

        let mut rules = self
            .rules
            .matching_rules(query, fallback, transaction)
            .await?;
        // Stable: rules sharing the top priority keep the store's order.
        rules.sort_by(|a, b| b.priority.cmp(&a.priority));
        let Some(rule) = rules.into_iter().next() else {
            log::debug!("No rules match {}/{}", query.product, query.channel);
            return Ok(Decision::none(metadata, Outcome::NoMatchingRule));
        };

        metadata = EvaluationMetadata::for_rule(&rule);
        log::debug!("Matching rule: {rule:?}");

        let Some(mapping) = rule.primary_release() else {
            log::debug!("Rule {} points at a null mapping", rule.rule_id);
            return Ok(Decision::none(metadata, Outcome::NullMapping));
        };

        if query.force != ForceResult::Succeed
            && !rule.background_rate.is_full()
            && self.routes_to_fallback(query.force, &rule)
        {
            let Some(fallback_release) = rule.fallback_release() else {
                log::debug!(
                    "Rule {} has no fallback release, request was dropped",
                    rule.rule_id
                );
                return Ok(Decision::none(metadata, Outcome::Dropped));
            };
            return self
                .serve(
                    query,
                    &rule,
                    fallback_release,
                    RolloutPath::Fallback,
                    metadata,
                    transaction,
                )
                .await;
        }

        self.serve(
            query,
            &rule,
            mapping,
            RolloutPath::Primary,
            metadata,
            transaction,
        )
        .await
    }

    /// Resolve a release by name into a payload. A missing release is
    /// `None`, which callers treat like a payload that declines to serve.
    ///
    /// # Errors
    /// Returns an error when the resolver fails or the stored blob cannot be
    /// interpreted.
    pub async fn resolve_payload(
        &self,
        name: &str,
        transaction: Option<Transaction>,
    ) -> Result<Option<Blob>, EngineError> {
        let Some(release) = self.releases.resolve(name, transaction).await? else {
            return Ok(None);
        };
        create_blob(&release.blob)
            .map(Some)
            .map_err(|error| EngineError::blob(name, error))
    }

    /// At most one draw per evaluation, and none when the caller forced the
    /// fallback.
    fn routes_to_fallback(&self, force: ForceResult, rule: &Rule) -> bool {
        if force == ForceResult::Fail {
            log::debug!("Fallback mapping forced for rule {}", rule.rule_id);
            return true;
        }
        let roll = self.dice.roll();
        log::debug!(
            "Background rate {} below 100 for rule {}, rolled {roll}",
            rule.background_rate,
            rule.rule_id
        );
        roll >= rule.background_rate.get()
    }

    async fn serve(
        &self,
        query: &UpdateQuery,
        rule: &Rule,
        release: &str,
        path: RolloutPath,
        metadata: EvaluationMetadata,
        transaction: Option<Transaction>,
    ) -> Result<Decision, EngineError> {
        let Some(payload) = self.resolve_payload(release, transaction).await? else {
            log::debug!("Release {release} ({path}) does not exist");
            return Ok(Decision::none(
                metadata,
                Outcome::NotServable {
                    release: release.to_string(),
                    path,
                    missing: true,
                },
            ));
        };

        if !payload.should_serve_update(query) {
            log::debug!("Release {release} ({path}) is not an update for this client");
            return Ok(Decision::none(
                metadata,
                Outcome::NotServable {
                    release: release.to_string(),
                    path,
                    missing: false,
                },
            ));
        }

        log::debug!("Returning {path} release {release}");
        Ok(Decision {
            update: Some(ServedUpdate {
                payload,
                update_type: rule.update_type,
            }),
            metadata,
            outcome: Outcome::Served {
                release: release.to_string(),
                path,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use aus_backend::Rule;
    use serde_json::json;

    use super::{EvaluationMetadata, Outcome, RolloutPath};

    #[test]
    fn unknown_metadata_serializes_sentinels() {
        let value = serde_json::to_value(EvaluationMetadata::unknown()).expect("serialize");

        assert_eq!(
            value,
            json!({ "rule_id": "unknown", "rule_data_version": "unknown" })
        );
        assert_eq!(
            EvaluationMetadata::unknown().to_string(),
            "rule_id=unknown rule_data_version=unknown"
        );
    }

    #[test]
    fn rule_metadata_records_id_and_data_version() {
        let metadata = EvaluationMetadata::for_rule(&Rule::new(42, 10).with_data_version(7));

        assert!(!metadata.is_unknown());
        assert_eq!(
            serde_json::to_value(metadata).expect("serialize"),
            json!({ "rule_id": 42, "rule_data_version": 7 })
        );
    }

    #[test]
    fn outcome_serializes_with_kind_tag() {
        let served = Outcome::Served {
            release: "R1".to_string(),
            path: RolloutPath::Fallback,
        };

        assert_eq!(
            serde_json::to_value(served).expect("serialize"),
            json!({ "kind": "served", "release": "R1", "path": "fallback" })
        );
        assert_eq!(
            serde_json::to_value(Outcome::Dropped).expect("serialize"),
            json!({ "kind": "dropped" })
        );
    }
}
