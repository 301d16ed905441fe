use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use aus_core::{DomainAllowlist, UPDATES_DISABLED_NAMESPACE};
use aus_memory::MemoryCache;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Failed to read settings {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid settings {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheSettings {
    #[serde(default = "default_cache_max_size")]
    pub max_size: usize,

    #[serde(default = "default_cache_ttl")]
    pub ttl_secs: u64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            max_size: default_cache_max_size(),
            ttl_secs: default_cache_ttl(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceSettings {
    #[serde(default)]
    pub special_force_hosts: Vec<String>,

    #[serde(default)]
    pub domain_allowlist: DomainAllowlist,

    #[serde(default = "default_caches")]
    pub caches: HashMap<String, CacheSettings>,

    #[serde(default)]
    pub data_set: Option<PathBuf>,

    #[serde(default)]
    pub debug_logging: bool,

    #[serde(default = "default_max_log_size_bytes")]
    pub max_log_size_bytes: u64,
}

fn default_cache_max_size() -> usize {
    500
}

fn default_cache_ttl() -> u64 {
    600
}

fn default_caches() -> HashMap<String, CacheSettings> {
    HashMap::from([(
        UPDATES_DISABLED_NAMESPACE.to_string(),
        CacheSettings::default(),
    )])
}

fn default_max_log_size_bytes() -> u64 {
    5 * 1024 * 1024
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            special_force_hosts: Vec::new(),
            domain_allowlist: DomainAllowlist::new(),
            caches: default_caches(),
            data_set: None,
            debug_logging: false,
            max_log_size_bytes: default_max_log_size_bytes(),
        }
    }
}

impl ServiceSettings {
    /// Read settings from `path`. A missing file yields the defaults.
    pub fn load_from(path: &Path) -> Result<Self, SettingsError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path).map_err(|source| SettingsError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| SettingsError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn save_to(&self, path: &Path) -> Result<(), std::io::Error> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)
    }

    /// A cache with every configured namespace enabled.
    pub fn build_cache(&self) -> MemoryCache {
        let cache = MemoryCache::new();
        for (namespace, settings) in &self.caches {
            cache.make_cache(
                namespace,
                settings.max_size,
                Duration::from_secs(settings.ttl_secs),
            );
        }
        cache
    }
}
