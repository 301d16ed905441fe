//! Data model and collaborator interfaces consumed by the update decision
//! engine.
//!
//! Everything the engine reads (rules, releases, shutoffs, cached values)
//! reaches it through the traits in this crate, so storage backends can be
//! swapped without touching the decision policy.

mod error;
mod traits;
mod types;
mod version;

pub use error::{Collaborator, StoreError};
pub use traits::{Cache, Payload, ReleaseResolver, RuleStore, ShutoffRegistry};
pub use types::{
    BackgroundRate, BackgroundRateError, ForceResult, Release, Rule, RuleConditions, Shutoff,
    Transaction, UpdateQuery, UpdateType,
};
pub use version::{ProductVersion, VersionParseError, compare_build_ids};
