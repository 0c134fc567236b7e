//! Bounded, eviction-aware theme cache.
//!
//! The cache is a performance shadow of storage: anything in it may be evicted
//! and rebuilt at any time. Capacity is bounded by entry count and by the
//! serialized size of the cached themes, and entries expire after a TTL.
//!
//! # Example
//!
//! ```rust
//! use tincture::cache::{CacheConfig, ThemeCache};
//! use tincture::Theme;
//!
//! let cache = ThemeCache::new(CacheConfig::default());
//! cache.set("default", &Theme::extract(), 1.0);
//! assert!(cache.get("default").is_some());
//! assert_eq!(cache.stats().hits, 1);
//! ```

use std::collections::HashMap;
use std::sync::{Arc, Weak};
use std::time::Duration;

use chrono::Utc;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

use crate::compress::{compress, decompress};
use crate::model::Theme;
use crate::storage::KeyValueStore;

/// Which entry to drop when the cache is full.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EvictionStrategy {
    /// Least recently accessed.
    #[default]
    Lru,
    /// Fewest accesses.
    Lfu,
    /// First expired entry, else least recently accessed.
    Ttl,
    /// Lowest priority.
    Priority,
}

/// Cache configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Maximum number of entries.
    pub max_size: usize,
    /// Maximum total serialized size of cached themes, in bytes.
    pub max_memory: usize,
    /// Entry lifetime in milliseconds.
    pub ttl_ms: u64,
    pub strategy: EvictionStrategy,
    /// Interval of the background expiry sweep in milliseconds.
    pub sweep_interval_ms: u64,
    /// Mirror entries into the key-value store given to [`ThemeCache::with_store`].
    pub persist: bool,
    /// Store mirrored themes in compressed form.
    pub compress: bool,
    /// Key prefix for mirrored entries.
    pub namespace: String,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_size: 100,
            max_memory: 5 * 1024 * 1024,
            ttl_ms: 24 * 60 * 60 * 1000,
            strategy: EvictionStrategy::Lru,
            sweep_interval_ms: 60 * 1000,
            persist: false,
            compress: true,
            namespace: "theme-cache".to_string(),
        }
    }
}

impl CacheConfig {
    pub const fn ttl(&self) -> Duration {
        Duration::from_millis(self.ttl_ms)
    }

    pub const fn sweep_interval(&self) -> Duration {
        Duration::from_millis(self.sweep_interval_ms)
    }
}

/// A cached theme with its bookkeeping.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub theme: Theme,
    /// Insertion time, milliseconds since the Unix epoch.
    pub timestamp: i64,
    pub access_count: u64,
    /// Last read time, milliseconds since the Unix epoch.
    pub last_accessed: i64,
    /// Serialized size in bytes.
    pub size: usize,
    pub priority: f64,
    /// Access order; breaks ties between accesses in the same millisecond.
    seq: u64,
}

impl CacheEntry {
    fn is_expired(&self, now: i64, ttl_ms: u64) -> bool {
        now.saturating_sub(self.timestamp) >= i64::try_from(ttl_ms).unwrap_or(i64::MAX)
    }

    #[allow(clippy::cast_precision_loss)]
    fn recompute_priority(&mut self, now: i64) {
        let recency = now.saturating_sub(self.last_accessed).max(0);
        let age = now.saturating_sub(self.timestamp).max(0);
        self.priority = (self.access_count as f64 * 1000.0) / ((recency + age) as f64 + 1.0);
    }
}

/// Cache statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    /// Number of entries.
    pub size: usize,
    /// Total serialized size of the entries, in bytes.
    pub memory_usage: usize,
    /// `hits / (hits + misses)`, or `0.0` before the first read.
    pub hit_rate: f64,
}

#[derive(Default)]
struct Inner {
    entries: HashMap<String, CacheEntry>,
    memory: usize,
    hits: u64,
    misses: u64,
    evictions: u64,
    seq: u64,
}

impl Inner {
    fn next_seq(&mut self) -> u64 {
        self.seq += 1;
        self.seq
    }

    fn insert(&mut self, id: String, entry: CacheEntry) {
        self.memory += entry.size;
        if let Some(old) = self.entries.insert(id, entry) {
            self.memory = self.memory.saturating_sub(old.size);
        }
    }

    fn take(&mut self, id: &str) -> Option<CacheEntry> {
        let entry = self.entries.remove(id)?;
        self.memory = self.memory.saturating_sub(entry.size);
        Some(entry)
    }

    fn least_recent(&self) -> Option<String> {
        self.entries
            .iter()
            .min_by_key(|(_, e)| e.seq)
            .map(|(id, _)| id.clone())
    }

    fn victim(&self, strategy: EvictionStrategy, now: i64, ttl_ms: u64) -> Option<String> {
        match strategy {
            EvictionStrategy::Lru => self.least_recent(),
            EvictionStrategy::Lfu => self
                .entries
                .iter()
                .min_by_key(|(_, e)| (e.access_count, e.seq))
                .map(|(id, _)| id.clone()),
            EvictionStrategy::Ttl => self
                .entries
                .iter()
                .filter(|(_, e)| e.is_expired(now, ttl_ms))
                .min_by_key(|(_, e)| e.seq)
                .map(|(id, _)| id.clone())
                .or_else(|| self.least_recent()),
            EvictionStrategy::Priority => self
                .entries
                .iter()
                .min_by(|(_, a), (_, b)| {
                    a.priority
                        .total_cmp(&b.priority)
                        .then(a.seq.cmp(&b.seq))
                })
                .map(|(id, _)| id.clone()),
        }
    }
}

/// Shape of an entry mirrored into the key-value store.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PersistedEntry {
    theme: Value,
    compressed: bool,
    timestamp: i64,
    access_count: u64,
    last_accessed: i64,
    size: usize,
    priority: f64,
}

fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

/// Bounded theme cache keyed by theme id.
pub struct ThemeCache {
    config: CacheConfig,
    inner: Mutex<Inner>,
    store: Option<Arc<dyn KeyValueStore>>,
    sweeper: Mutex<Option<JoinHandle<()>>>,
}

impl ThemeCache {
    /// Creates an in-memory cache.
    pub fn new(config: CacheConfig) -> Self {
        debug!(
            cache.max_size = config.max_size,
            cache.max_memory = config.max_memory,
            cache.ttl_ms = config.ttl_ms,
            cache.strategy = ?config.strategy,
            "Theme cache initialized"
        );
        Self {
            config,
            inner: Mutex::new(Inner::default()),
            store: None,
            sweeper: Mutex::new(None),
        }
    }

    /// Creates a cache mirrored into `store` and rehydrates from it.
    ///
    /// Mirroring only happens when [`CacheConfig::persist`] is set. Expired or
    /// unreadable persisted entries are removed from the store.
    pub fn with_store(config: CacheConfig, store: Arc<dyn KeyValueStore>) -> Self {
        let mut cache = Self::new(config);
        cache.store = Some(store);
        if cache.config.persist {
            cache.rehydrate();
        }
        cache
    }

    pub const fn config(&self) -> &CacheConfig {
        &self.config
    }

    fn store_key(&self, id: &str) -> String {
        format!("{}:{id}", self.config.namespace)
    }

    fn persistent_store(&self) -> Option<&Arc<dyn KeyValueStore>> {
        self.store.as_ref().filter(|_| self.config.persist)
    }

    fn rehydrate(&self) {
        let Some(store) = self.persistent_store() else {
            return;
        };
        let prefix = format!("{}:", self.config.namespace);
        let now = now_ms();
        let mut restored: Vec<(String, CacheEntry)> = Vec::new();

        for key in store.keys_with_prefix(&prefix) {
            let id = key[prefix.len()..].to_string();
            let Some(raw) = store.get(&key) else {
                continue;
            };
            match Self::decode_persisted(&raw) {
                Some(entry) if !entry.is_expired(now, self.config.ttl_ms) => {
                    restored.push((id, entry));
                }
                Some(_) => {
                    trace!(cache.id = %id, "Dropping expired persisted entry");
                    store.remove(&key);
                }
                None => {
                    warn!(cache.id = %id, "Dropping unreadable persisted entry");
                    store.remove(&key);
                }
            }
        }

        restored.sort_by_key(|(_, entry)| entry.last_accessed);
        let count = restored.len();
        let mut inner = self.inner.lock();
        for (id, mut entry) in restored {
            if inner.entries.len() >= self.config.max_size
                || inner.memory + entry.size > self.config.max_memory
            {
                continue;
            }
            entry.seq = inner.next_seq();
            inner.insert(id, entry);
        }
        debug!(
            cache.restored = inner.entries.len(),
            cache.found = count,
            "Theme cache rehydrated"
        );
    }

    fn decode_persisted(raw: &str) -> Option<CacheEntry> {
        let persisted: PersistedEntry = serde_json::from_str(raw).ok()?;
        let theme = if persisted.compressed {
            decompress(&persisted.theme).ok()?
        } else {
            serde_json::from_value(persisted.theme).ok()?
        };
        Some(CacheEntry {
            theme,
            timestamp: persisted.timestamp,
            access_count: persisted.access_count,
            last_accessed: persisted.last_accessed,
            size: persisted.size,
            priority: persisted.priority,
            seq: 0,
        })
    }

    fn persist(&self, id: &str, entry: &CacheEntry) {
        let Some(store) = self.persistent_store() else {
            return;
        };
        let theme = if self.config.compress {
            compress(&entry.theme).map_err(|err| err.to_string())
        } else {
            serde_json::to_value(&entry.theme).map_err(|err| err.to_string())
        };
        let theme = match theme {
            Ok(theme) => theme,
            Err(err) => {
                warn!(cache.id = %id, error = %err, "Could not encode cache entry");
                return;
            }
        };
        let persisted = PersistedEntry {
            theme,
            compressed: self.config.compress,
            timestamp: entry.timestamp,
            access_count: entry.access_count,
            last_accessed: entry.last_accessed,
            size: entry.size,
            priority: entry.priority,
        };
        let result = serde_json::to_string(&persisted)
            .map_err(crate::error::StorageError::from)
            .and_then(|json| store.set(&self.store_key(id), json));
        if let Err(err) = result {
            warn!(cache.id = %id, error = %err, "Could not persist cache entry");
        }
    }

    fn unpersist(&self, ids: &[String]) {
        if let Some(store) = self.persistent_store() {
            for id in ids {
                store.remove(&self.store_key(id));
            }
        }
    }

    /// Returns the cached theme, counting a hit or a miss.
    ///
    /// Expired entries are evicted on read and count as both a miss and an
    /// eviction.
    pub fn get(&self, id: &str) -> Option<Theme> {
        let now = now_ms();
        let ttl_ms = self.config.ttl_ms;
        let mut inner = self.inner.lock();

        let expired = match inner.entries.get(id) {
            None => {
                inner.misses += 1;
                trace!(cache.id = %id, "Cache miss");
                return None;
            }
            Some(entry) => entry.is_expired(now, ttl_ms),
        };

        if expired {
            inner.take(id);
            inner.misses += 1;
            inner.evictions += 1;
            drop(inner);
            trace!(cache.id = %id, "Cache entry expired");
            self.unpersist(&[id.to_string()]);
            return None;
        }

        let seq = inner.next_seq();
        inner.hits += 1;
        let entry = inner.entries.get_mut(id)?;
        entry.access_count += 1;
        entry.recompute_priority(now);
        entry.last_accessed = now;
        entry.seq = seq;
        trace!(cache.id = %id, cache.access_count = entry.access_count, "Cache hit");
        Some(entry.theme.clone())
    }

    /// Returns the cached theme without touching statistics or access order.
    /// Expired entries are not returned.
    pub fn peek(&self, id: &str) -> Option<Theme> {
        let now = now_ms();
        self.inner
            .lock()
            .entries
            .get(id)
            .filter(|entry| !entry.is_expired(now, self.config.ttl_ms))
            .map(|entry| entry.theme.clone())
    }

    /// Inserts or replaces a theme.
    ///
    /// Other entries are evicted one at a time by the configured strategy until
    /// both budgets admit the new entry. A theme that alone exceeds a budget is
    /// not stored, and any previous entry under `id` is dropped.
    pub fn set(&self, id: &str, theme: &Theme, priority: f64) {
        let size = match serde_json::to_vec(theme) {
            Ok(bytes) => bytes.len(),
            Err(err) => {
                warn!(cache.id = %id, error = %err, "Could not size theme for caching");
                return;
            }
        };
        let now = now_ms();
        let mut evicted = Vec::new();

        let stored = {
            let mut inner = self.inner.lock();
            inner.take(id);

            if self.config.max_size == 0 || size > self.config.max_memory {
                inner.evictions += 1;
                evicted.push(id.to_string());
                debug!(
                    cache.id = %id,
                    cache.entry_size = size,
                    cache.max_memory = self.config.max_memory,
                    "Entry exceeds cache budget, not stored"
                );
                None
            } else {
                while inner.entries.len() >= self.config.max_size
                    || inner.memory + size > self.config.max_memory
                {
                    let Some(victim) = inner.victim(self.config.strategy, now, self.config.ttl_ms)
                    else {
                        break;
                    };
                    inner.take(&victim);
                    inner.evictions += 1;
                    debug!(
                        cache.id = %victim,
                        cache.strategy = ?self.config.strategy,
                        "Evicted cache entry"
                    );
                    evicted.push(victim);
                }

                let entry = CacheEntry {
                    theme: theme.clone(),
                    timestamp: now,
                    access_count: 0,
                    last_accessed: now,
                    size,
                    priority,
                    seq: inner.next_seq(),
                };
                inner.insert(id.to_string(), entry.clone());
                Some(entry)
            }
        };

        self.unpersist(&evicted);
        if let Some(entry) = stored {
            self.persist(id, &entry);
        }
    }

    /// Removes an entry. Returns whether it existed.
    pub fn remove(&self, id: &str) -> bool {
        let removed = self.inner.lock().take(id).is_some();
        self.unpersist(&[id.to_string()]);
        removed
    }

    /// Removes every entry. Statistics are kept.
    pub fn clear(&self) {
        let ids: Vec<String> = {
            let mut inner = self.inner.lock();
            inner.memory = 0;
            inner.entries.drain().map(|(id, _)| id).collect()
        };
        self.unpersist(&ids);
    }

    /// Drops the mirrored copy of `id` from the key-value store, along with
    /// any in-memory entry.
    pub fn purge_persisted(&self, id: &str) -> bool {
        let in_memory = self.inner.lock().take(id).is_some();
        let persisted = self
            .store
            .as_ref()
            .is_some_and(|store| store.remove(&self.store_key(id)));
        debug!(cache.id = %id, in_memory, persisted, "Purged cached theme");
        in_memory || persisted
    }

    /// Removes expired entries and returns how many were dropped.
    pub fn sweep_expired(&self) -> usize {
        let now = now_ms();
        let expired: Vec<String> = {
            let mut inner = self.inner.lock();
            let ids: Vec<String> = inner
                .entries
                .iter()
                .filter(|(_, entry)| entry.is_expired(now, self.config.ttl_ms))
                .map(|(id, _)| id.clone())
                .collect();
            for id in &ids {
                inner.take(id);
            }
            inner.evictions += ids.len() as u64;
            ids
        };
        self.unpersist(&expired);
        if !expired.is_empty() {
            debug!(cache.swept = expired.len(), "Swept expired cache entries");
        }
        expired.len()
    }

    #[allow(clippy::cast_precision_loss)]
    pub fn stats(&self) -> CacheStats {
        let inner = self.inner.lock();
        let reads = inner.hits + inner.misses;
        CacheStats {
            hits: inner.hits,
            misses: inner.misses,
            evictions: inner.evictions,
            size: inner.entries.len(),
            memory_usage: inner.memory,
            hit_rate: if reads == 0 {
                0.0
            } else {
                inner.hits as f64 / reads as f64
            },
        }
    }

    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().entries.is_empty()
    }

    pub fn memory_usage(&self) -> usize {
        self.inner.lock().memory
    }

    /// Cached ids, least recently used first.
    pub fn ids(&self) -> Vec<String> {
        let inner = self.inner.lock();
        let mut entries: Vec<(&String, u64)> =
            inner.entries.iter().map(|(id, e)| (id, e.seq)).collect();
        entries.sort_by_key(|(_, seq)| *seq);
        entries.into_iter().map(|(id, _)| id.clone()).collect()
    }

    /// Snapshot of one entry's bookkeeping.
    pub fn entry(&self, id: &str) -> Option<CacheEntry> {
        self.inner.lock().entries.get(id).cloned()
    }

    /// Starts the background expiry sweep.
    ///
    /// The task holds only a weak reference and ends once the cache is dropped.
    /// Does nothing outside a tokio runtime.
    pub fn start_sweeper(self: &Arc<Self>) {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            warn!("No tokio runtime available, cache sweeper not started");
            return;
        };
        let cache: Weak<Self> = Arc::downgrade(self);
        let period = self.config.sweep_interval().max(Duration::from_millis(1));

        let handle = runtime.spawn(async move {
            let mut timer = tokio::time::interval(period);
            timer.tick().await;
            loop {
                timer.tick().await;
                let Some(cache) = cache.upgrade() else {
                    break;
                };
                cache.sweep_expired();
            }
        });

        if let Some(previous) = self.sweeper.lock().replace(handle) {
            previous.abort();
        }
        debug!(cache.sweep_interval_ms = self.config.sweep_interval_ms, "Cache sweeper started");
    }

    /// Stops the background sweep if running.
    pub fn stop_sweeper(&self) {
        if let Some(handle) = self.sweeper.lock().take() {
            handle.abort();
            debug!("Cache sweeper stopped");
        }
    }
}

impl std::fmt::Debug for ThemeCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThemeCache")
            .field("config", &self.config)
            .field("stats", &self.stats())
            .finish_non_exhaustive()
    }
}

impl Drop for ThemeCache {
    fn drop(&mut self) {
        self.stop_sweeper();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryKeyValueStore;

    fn theme(id: &str) -> Theme {
        Theme::extract().renamed(id, id)
    }

    fn theme_size() -> usize {
        serde_json::to_vec(&theme("aaa")).expect("serialize").len()
    }

    #[test]
    fn test_hit_and_miss_statistics() {
        let cache = ThemeCache::new(CacheConfig::default());
        cache.set("aaa", &theme("aaa"), 1.0);
        assert!(cache.get("aaa").is_some());
        assert!(cache.get("bbb").is_none());
        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.size, 1);
        assert!((stats.hit_rate - 0.5).abs() < f64::EPSILON);
        assert_eq!(stats.memory_usage, theme_size());
    }

    #[test]
    fn test_lru_evicts_least_recently_accessed() {
        let config = CacheConfig {
            max_size: 3,
            ..Default::default()
        };
        let cache = ThemeCache::new(config);
        cache.set("aaa", &theme("aaa"), 1.0);
        cache.set("bbb", &theme("bbb"), 1.0);
        cache.set("ccc", &theme("ccc"), 1.0);
        assert!(cache.get("aaa").is_some());

        cache.set("ddd", &theme("ddd"), 1.0);
        assert_eq!(cache.len(), 3);
        assert!(cache.peek("bbb").is_none());
        assert_eq!(cache.ids(), vec!["ccc", "aaa", "ddd"]);
        assert_eq!(cache.stats().evictions, 1);
    }

    #[test]
    fn test_lfu_evicts_least_frequently_accessed() {
        let config = CacheConfig {
            max_size: 2,
            strategy: EvictionStrategy::Lfu,
            ..Default::default()
        };
        let cache = ThemeCache::new(config);
        cache.set("aaa", &theme("aaa"), 1.0);
        cache.set("bbb", &theme("bbb"), 1.0);
        cache.get("aaa");
        cache.get("aaa");
        cache.get("bbb");
        cache.set("ccc", &theme("ccc"), 1.0);
        assert!(cache.peek("aaa").is_some());
        assert!(cache.peek("bbb").is_none());
    }

    #[test]
    fn test_priority_evicts_lowest_priority() {
        let config = CacheConfig {
            max_size: 2,
            strategy: EvictionStrategy::Priority,
            ..Default::default()
        };
        let cache = ThemeCache::new(config);
        cache.set("low", &theme("low"), 1.0);
        cache.set("high", &theme("high"), 10.0);
        cache.set("new", &theme("new"), 5.0);
        assert!(cache.peek("low").is_none());
        assert!(cache.peek("high").is_some());
    }

    #[test]
    fn test_replacing_an_id_does_not_evict_others() {
        let config = CacheConfig {
            max_size: 2,
            ..Default::default()
        };
        let cache = ThemeCache::new(config);
        cache.set("aaa", &theme("aaa"), 1.0);
        cache.set("bbb", &theme("bbb"), 1.0);
        cache.set("aaa", &theme("aaa"), 2.0);
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.stats().evictions, 0);
        assert_eq!(cache.memory_usage(), 2 * theme_size());
    }

    #[test]
    fn test_zero_ttl_is_immediate_miss() {
        let config = CacheConfig {
            ttl_ms: 0,
            ..Default::default()
        };
        let cache = ThemeCache::new(config);
        cache.set("aaa", &theme("aaa"), 1.0);
        assert!(cache.get("aaa").is_none());
        let stats = cache.stats();
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.evictions, 1);
        assert_eq!(stats.size, 0);
    }

    #[test]
    fn test_zero_memory_budget_stores_nothing() {
        let config = CacheConfig {
            max_memory: 0,
            ..Default::default()
        };
        let cache = ThemeCache::new(config);
        cache.set("aaa", &theme("aaa"), 1.0);
        let stats = cache.stats();
        assert_eq!(stats.size, 0);
        assert_eq!(stats.memory_usage, 0);
        assert_eq!(stats.evictions, 1);
    }

    #[test]
    fn test_memory_budget_evicts_until_fit() {
        let config = CacheConfig {
            max_memory: theme_size() * 2 + 10,
            ..Default::default()
        };
        let cache = ThemeCache::new(config);
        cache.set("aaa", &theme("aaa"), 1.0);
        cache.set("bbb", &theme("bbb"), 1.0);
        cache.set("ccc", &theme("ccc"), 1.0);
        assert_eq!(cache.len(), 2);
        assert!(cache.peek("aaa").is_none());
        assert!(cache.memory_usage() <= cache.config().max_memory);
    }

    #[test]
    fn test_hit_recomputes_priority() {
        let cache = ThemeCache::new(CacheConfig::default());
        cache.set("aaa", &theme("aaa"), 1.0);
        cache.get("aaa");
        let entry = cache.entry("aaa").expect("entry");
        assert_eq!(entry.access_count, 1);
        assert!(entry.priority > 0.0);
    }

    #[test]
    fn test_sweep_removes_expired() {
        let config = CacheConfig {
            ttl_ms: 0,
            ..Default::default()
        };
        let cache = ThemeCache::new(config);
        cache.set("aaa", &theme("aaa"), 1.0);
        cache.set("bbb", &theme("bbb"), 1.0);
        assert_eq!(cache.sweep_expired(), 2);
        assert!(cache.is_empty());
        assert_eq!(cache.memory_usage(), 0);
    }

    #[test]
    fn test_persisted_entries_rehydrate() {
        let store = Arc::new(MemoryKeyValueStore::new());
        let config = CacheConfig {
            persist: true,
            ..Default::default()
        };
        {
            let cache = ThemeCache::with_store(config.clone(), store.clone());
            cache.set("aaa", &theme("aaa"), 1.0);
            cache.set("bbb", &theme("bbb"), 1.0);
        }
        assert!(store.get("theme-cache:aaa").is_some());

        let cache = ThemeCache::with_store(config, store);
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get("aaa"), Some(theme("aaa")));
    }

    #[test]
    fn test_expired_persisted_entries_are_dropped() {
        let store = Arc::new(MemoryKeyValueStore::new());
        let config = CacheConfig {
            persist: true,
            compress: false,
            ..Default::default()
        };
        ThemeCache::with_store(config.clone(), store.clone()).set("aaa", &theme("aaa"), 1.0);

        let expired = CacheConfig { ttl_ms: 0, ..config };
        let cache = ThemeCache::with_store(expired, store.clone());
        assert!(cache.is_empty());
        assert!(store.is_empty());
    }

    #[test]
    fn test_purge_persisted() {
        let store = Arc::new(MemoryKeyValueStore::new());
        let config = CacheConfig {
            persist: true,
            ..Default::default()
        };
        let cache = ThemeCache::with_store(config, store.clone());
        cache.set("aaa", &theme("aaa"), 1.0);
        assert!(cache.purge_persisted("aaa"));
        assert!(cache.is_empty());
        assert!(store.is_empty());
        assert!(!cache.purge_persisted("aaa"));
    }

    #[tokio::test]
    async fn test_sweeper_runs_in_background() {
        let config = CacheConfig {
            ttl_ms: 20,
            sweep_interval_ms: 10,
            ..Default::default()
        };
        let cache = Arc::new(ThemeCache::new(config));
        cache.set("aaa", &theme("aaa"), 1.0);
        cache.start_sweeper();
        tokio::time::sleep(Duration::from_millis(150)).await;
        assert!(cache.is_empty());
        cache.stop_sweeper();
    }
}
