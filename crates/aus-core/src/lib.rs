//! Update decision engine.
//!
//! Given one client's update query, the engine:
//! - honours administrative shutoffs for the channel and its fallback channel,
//! - picks the highest-priority matching rule,
//! - applies staged-rollout admission and fallback mapping policy,
//! - resolves the winning release into a payload and asks it whether it is
//!   actually an update for this client.
//!
//! Storage and caching are reached only through the `aus-backend` traits.

mod blob;
mod channel;
mod dice;
mod engine;
mod error;
mod resolver;
mod shutoff;
mod urls;

/// Stored release documents and their serving rules.
pub use blob::{
    APP_SCHEMA_VERSION, AppBlob, Blob, BlobError, PLUGIN_SCHEMA_VERSION, PluginBlob, PluginVendor,
    create_blob,
};
/// Partner-channel suffix handling.
pub use channel::{CCK_MARKER, fallback_channel};
/// Random sources for staged rollouts.
pub use dice::{RolloutDice, SeededDice, ThreadRngDice};
/// Decision entry point and its output record.
pub use engine::{
    Decision, EvaluationMetadata, Outcome, RolloutPath, RuleEngine, ServedUpdate, UNKNOWN_RULE,
};
pub use error::EngineError;
/// Release resolver that consults the legacy release table second.
pub use resolver::LegacyFallbackResolver;
pub use shutoff::{UPDATES_DISABLED_NAMESPACE, shutoff_cache_key};
/// URL predicates used when rendering payload links.
pub use urls::{DomainAllowlist, is_forbidden_url, is_special_url};
