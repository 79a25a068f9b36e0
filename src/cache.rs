//! Time-to-live memoization for graph results and generated answers.
//!
//! Entries are keyed by the exact query or prompt text and expire after the
//! configured TTL. There is no invalidation when the underlying data changes.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use moka::sync::Cache;

use crate::metrics;

pub const QUERY_CACHE_TTL_SECS: u64 = 3600;
pub const ANSWER_CACHE_TTL_SECS: u64 = 600;
const MAX_ENTRIES: u64 = 1_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// String-keyed TTL cache with hit/miss accounting.
pub struct TtlCache<V: Clone + Send + Sync + 'static> {
    name: &'static str,
    cache: Cache<String, V>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl<V: Clone + Send + Sync + 'static> TtlCache<V> {
    pub fn new(name: &'static str, ttl_secs: u64) -> Self {
        let cache = Cache::builder()
            .max_capacity(MAX_ENTRIES)
            .time_to_live(Duration::from_secs(ttl_secs))
            .build();

        Self {
            name,
            cache,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub fn get(&self, key: &str) -> Option<V> {
        let value = self.cache.get(key);
        if value.is_some() {
            self.hits.fetch_add(1, Ordering::Relaxed);
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
        }
        metrics::record_cache_lookup(self.name, value.is_some());
        value
    }

    pub fn insert(&self, key: impl Into<String>, value: V) {
        self.cache.insert(key.into(), value);
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hit_after_insert() {
        let cache: TtlCache<String> = TtlCache::new("test", 60);
        assert!(cache.get("q").is_none());

        cache.insert("q", "respuesta".to_string());
        assert_eq!(cache.get("q").as_deref(), Some("respuesta"));

        let stats = cache.stats();
        assert_eq!(stats, CacheStats { hits: 1, misses: 1 });
        assert!((stats.hit_rate() - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn keys_are_exact_text() {
        let cache: TtlCache<u32> = TtlCache::new("test", 60);
        cache.insert("SELECT ?a", 1);
        assert!(cache.get("SELECT ?a ").is_none());
        assert!(cache.get("select ?a").is_none());
    }

    #[test]
    fn expired_entries_are_not_returned() {
        let cache: TtlCache<u32> = TtlCache::new("test", 1);
        cache.insert("k", 7);
        std::thread::sleep(Duration::from_millis(1_200));
        assert!(cache.get("k").is_none());
    }

    #[test]
    fn empty_stats() {
        let cache: TtlCache<u32> = TtlCache::new("test", 60);
        assert_eq!(cache.stats().hit_rate(), 0.0);
    }
}
