//! In-memory backing implementations of the `aus-backend` collaborator
//! traits, plus a JSON data-set loader that fills them from disk.

mod cache;
mod conditions;
mod dataset;
mod stores;

pub use cache::MemoryCache;
pub use dataset::{DataSet, DataSetError};
pub use stores::{MemoryReleaseStore, MemoryRuleStore, MemoryShutoffRegistry};
