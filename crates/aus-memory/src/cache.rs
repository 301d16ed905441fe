use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use aus_backend::{Cache, StoreError};
use chrono::{DateTime, TimeDelta, Utc};
use lru::LruCache;
use serde_json::Value;

type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

struct Entry {
    value: Value,
    stored_at: DateTime<Utc>,
}

struct Namespace {
    ttl: TimeDelta,
    /// `None` for a zero-sized namespace, which stores nothing.
    entries: Option<LruCache<String, Entry>>,
}

impl Namespace {
    fn is_expired(&self, entry: &Entry, now: DateTime<Utc>) -> bool {
        now - entry.stored_at >= self.ttl
    }
}

/// Namespaced expiring LRU cache.
///
/// A namespace only caches once it has been configured with
/// [`MemoryCache::make_cache`]; reads from an unconfigured namespace miss and
/// writes are dropped.
pub struct MemoryCache {
    namespaces: Mutex<HashMap<String, Namespace>>,
    clock: Clock,
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryCache {
    #[must_use]
    pub fn new() -> Self {
        Self::with_clock(Utc::now)
    }

    #[must_use]
    pub fn with_clock(clock: impl Fn() -> DateTime<Utc> + Send + Sync + 'static) -> Self {
        Self {
            namespaces: Mutex::new(HashMap::new()),
            clock: Arc::new(clock),
        }
    }

    /// Enable caching for `namespace`, replacing any previous configuration
    /// and contents.
    pub fn make_cache(&self, namespace: &str, max_size: usize, ttl: Duration) {
        let ttl = TimeDelta::from_std(ttl).unwrap_or(TimeDelta::MAX);
        self.lock().insert(
            namespace.to_string(),
            Namespace {
                ttl,
                entries: NonZeroUsize::new(max_size).map(LruCache::new),
            },
        );
    }

    #[must_use]
    pub fn is_enabled(&self, namespace: &str) -> bool {
        self.lock().contains_key(namespace)
    }

    /// Read an entry without refreshing its recency.
    #[must_use]
    pub fn peek(&self, namespace: &str, key: &str) -> Option<Value> {
        let now = (self.clock)();
        let namespaces = self.lock();
        let ns = namespaces.get(namespace)?;
        ns.entries
            .as_ref()?
            .peek(key)
            .filter(|entry| !ns.is_expired(entry, now))
            .map(|entry| entry.value.clone())
    }

    pub fn insert(&self, namespace: &str, key: &str, value: Value) {
        let now = (self.clock)();
        if let Some(entries) = self
            .lock()
            .get_mut(namespace)
            .and_then(|ns| ns.entries.as_mut())
        {
            entries.put(
                key.to_string(),
                Entry {
                    value,
                    stored_at: now,
                },
            );
        }
    }

    fn lookup(&self, namespace: &str, key: &str) -> Option<Value> {
        let now = (self.clock)();
        let mut namespaces = self.lock();
        let ns = namespaces.get_mut(namespace)?;
        let ttl = ns.ttl;
        let entries = ns.entries.as_mut()?;

        if entries
            .peek(key)
            .is_some_and(|entry| now - entry.stored_at >= ttl)
        {
            entries.pop(key);
            return None;
        }
        entries.get(key).map(|entry| entry.value.clone())
    }

    pub fn invalidate(&self, namespace: &str, key: &str) {
        if let Some(entries) = self
            .lock()
            .get_mut(namespace)
            .and_then(|ns| ns.entries.as_mut())
        {
            entries.pop(key);
        }
    }

    /// Drop every entry while keeping namespace configuration.
    pub fn clear(&self) {
        for entries in self
            .lock()
            .values_mut()
            .filter_map(|ns| ns.entries.as_mut())
        {
            entries.clear();
        }
    }

    #[must_use]
    pub fn len(&self, namespace: &str) -> usize {
        self.lock()
            .get(namespace)
            .and_then(|ns| ns.entries.as_ref())
            .map_or(0, LruCache::len)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Namespace>> {
        self.namespaces
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl Cache for MemoryCache {
    async fn get(&self, namespace: &str, key: &str) -> Result<Option<Value>, StoreError> {
        Ok(self.lookup(namespace, key))
    }

    async fn put(&self, namespace: &str, key: &str, value: Value) -> Result<(), StoreError> {
        self.insert(namespace, key, value);
        Ok(())
    }
}
