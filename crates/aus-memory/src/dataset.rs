use std::collections::HashSet;
use std::path::{Path, PathBuf};

use aus_backend::{Release, Rule, Shutoff};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::stores::{MemoryReleaseStore, MemoryRuleStore, MemoryShutoffRegistry};

#[derive(Debug, Error)]
pub enum DataSetError {
    #[error("Failed to read data set {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid data set: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Duplicate rule id {0}")]
    DuplicateRule(i64),

    #[error("Duplicate release name in {table}: {name}")]
    DuplicateRelease { table: &'static str, name: String },
}

/// Snapshot of everything the engine's stores serve, as one JSON document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DataSet {
    #[serde(default)]
    pub rules: Vec<Rule>,
    #[serde(default)]
    pub releases: Vec<Release>,
    #[serde(default)]
    pub legacy_releases: Vec<Release>,
    #[serde(default)]
    pub shutoffs: Vec<Shutoff>,
}

impl DataSet {
    /// Load and check a data set file.
    ///
    /// # Errors
    /// Returns an error when the file cannot be read, is not a valid data
    /// set, or repeats a rule id or release name.
    pub fn load(path: &Path) -> Result<Self, DataSetError> {
        let content = std::fs::read_to_string(path).map_err(|source| DataSetError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let data_set = Self::from_json(&content)?;
        log::debug!(
            "Loaded data set {}: {} rules, {} releases, {} legacy releases, {} shutoffs",
            path.display(),
            data_set.rules.len(),
            data_set.releases.len(),
            data_set.legacy_releases.len(),
            data_set.shutoffs.len()
        );
        Ok(data_set)
    }

    /// # Errors
    /// Returns an error when `json` is not a valid data set or repeats a rule
    /// id or release name.
    pub fn from_json(json: &str) -> Result<Self, DataSetError> {
        let data_set: Self = serde_json::from_str(json)?;
        data_set.check_unique()?;
        Ok(data_set)
    }

    fn check_unique(&self) -> Result<(), DataSetError> {
        let mut rule_ids = HashSet::new();
        if let Some(rule) = self.rules.iter().find(|rule| !rule_ids.insert(rule.rule_id)) {
            return Err(DataSetError::DuplicateRule(rule.rule_id));
        }

        for (table, releases) in [
            ("releases", &self.releases),
            ("legacy_releases", &self.legacy_releases),
        ] {
            let mut names = HashSet::new();
            if let Some(release) = releases
                .iter()
                .find(|release| !names.insert(release.name.as_str()))
            {
                return Err(DataSetError::DuplicateRelease {
                    table,
                    name: release.name.clone(),
                });
            }
        }
        Ok(())
    }

    #[must_use]
    pub fn rule_store(&self) -> MemoryRuleStore {
        MemoryRuleStore::from_rules(self.rules.iter().cloned())
    }

    #[must_use]
    pub fn release_store(&self) -> MemoryReleaseStore {
        MemoryReleaseStore::from_releases(self.releases.iter().cloned())
    }

    #[must_use]
    pub fn legacy_release_store(&self) -> MemoryReleaseStore {
        MemoryReleaseStore::from_releases(self.legacy_releases.iter().cloned())
    }

    #[must_use]
    pub fn shutoff_registry(&self) -> MemoryShutoffRegistry {
        MemoryShutoffRegistry::from_shutoffs(self.shutoffs.iter().cloned())
    }
}
