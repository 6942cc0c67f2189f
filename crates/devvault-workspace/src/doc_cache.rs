// ABOUTME: Bounded TTL cache of documentation pages keyed by documentation set and path
// ABOUTME: Expired pages are pruned on insert and lazily on lookup; overflow evicts the least recently used

use std::collections::HashMap;
use std::time::{Duration, Instant};

use devvault_types::{DocEntry, DocId, WorkspaceConfig};

/// Cache key: a page within an installed documentation set
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DocCacheKey {
    pub doc_id: DocId,
    pub path: String,
}

impl DocCacheKey {
    pub fn new(doc_id: DocId, path: impl Into<String>) -> Self {
        Self {
            doc_id,
            path: path.into(),
        }
    }
}

#[derive(Debug, Clone)]
struct CacheEntry {
    entry: DocEntry,
    created_at: Instant,
    last_accessed: Instant,
}

impl CacheEntry {
    fn is_expired(&self, now: Instant, ttl: Duration) -> bool {
        now.saturating_duration_since(self.created_at) > ttl
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocCacheConfig {
    pub max_entries: usize,
    pub ttl: Duration,
}

impl Default for DocCacheConfig {
    fn default() -> Self {
        Self::from(&WorkspaceConfig::default())
    }
}

impl From<&WorkspaceConfig> for DocCacheConfig {
    fn from(config: &WorkspaceConfig) -> Self {
        Self {
            max_entries: config.doc_cache_max_entries.max(1),
            ttl: config.doc_cache_ttl(),
        }
    }
}

/// Counters for monitoring the cache
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheMetrics {
    pub hits: u64,
    pub misses: u64,
    /// Entries dropped for space
    pub evictions: u64,
    /// Entries dropped for age
    pub expirations: u64,
}

#[derive(Debug, Default)]
pub struct DocEntryCache {
    entries: HashMap<DocCacheKey, CacheEntry>,
    config: DocCacheConfig,
    metrics: CacheMetrics,
}

impl DocEntryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: DocCacheConfig) -> Self {
        Self {
            entries: HashMap::new(),
            config,
            metrics: CacheMetrics::default(),
        }
    }

    pub fn config(&self) -> &DocCacheConfig {
        &self.config
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn metrics(&self) -> CacheMetrics {
        self.metrics
    }

    pub fn get(&mut self, doc_id: DocId, path: &str) -> Option<DocEntry> {
        self.get_at(doc_id, path, Instant::now())
    }

    /// Look up a page as of `now`, dropping it if it has expired
    pub fn get_at(&mut self, doc_id: DocId, path: &str, now: Instant) -> Option<DocEntry> {
        let key = DocCacheKey::new(doc_id, path);
        let ttl = self.config.ttl;

        let expired = self
            .entries
            .get(&key)
            .map(|cached| cached.is_expired(now, ttl));

        match expired {
            Some(false) => {
                let cached = self.entries.get_mut(&key)?;
                cached.last_accessed = now;
                self.metrics.hits += 1;
                Some(cached.entry.clone())
            }
            Some(true) => {
                self.entries.remove(&key);
                self.metrics.expirations += 1;
                self.metrics.misses += 1;
                None
            }
            None => {
                self.metrics.misses += 1;
                None
            }
        }
    }

    pub fn insert(&mut self, entry: DocEntry) {
        self.insert_at(entry, Instant::now());
    }

    pub fn insert_at(&mut self, entry: DocEntry, now: Instant) {
        self.prune_expired_at(now);

        let key = DocCacheKey::new(entry.doc_id, entry.path.clone());
        if !self.entries.contains_key(&key) {
            while self.entries.len() >= self.config.max_entries {
                if !self.evict_least_recent() {
                    break;
                }
            }
        }

        self.entries.insert(
            key,
            CacheEntry {
                entry,
                created_at: now,
                last_accessed: now,
            },
        );
    }

    pub fn remove(&mut self, doc_id: DocId, path: &str) -> Option<DocEntry> {
        self.entries
            .remove(&DocCacheKey::new(doc_id, path))
            .map(|cached| cached.entry)
    }

    /// Drop every page of one documentation set
    pub fn invalidate_doc(&mut self, doc_id: DocId) {
        self.entries.retain(|key, _| key.doc_id != doc_id);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Remove every expired entry, returning how many were dropped
    pub fn prune_expired_at(&mut self, now: Instant) -> usize {
        let ttl = self.config.ttl;
        let before = self.entries.len();
        self.entries.retain(|_, cached| !cached.is_expired(now, ttl));

        let pruned = before - self.entries.len();
        self.metrics.expirations += pruned as u64;
        pruned
    }

    fn evict_least_recent(&mut self) -> bool {
        let oldest = self
            .entries
            .iter()
            .min_by_key(|(_, cached)| cached.last_accessed)
            .map(|(key, _)| key.clone());

        match oldest {
            Some(key) => {
                self.entries.remove(&key);
                self.metrics.evictions += 1;
                true
            }
            None => false,
        }
    }
}
