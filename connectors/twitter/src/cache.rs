//! Time-bounded cache for read results.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::RwLock;

/// In-memory TTL cache keyed by operation and parameters.
#[derive(Debug, Clone)]
pub struct ResponseCache<V> {
    entries: Arc<RwLock<HashMap<String, CachedEntry<V>>>>,
    ttl: Duration,
    /// Time of last cleanup.
    last_cleanup: Arc<RwLock<Instant>>,
    cleanup_interval: Duration,
}

#[derive(Debug)]
struct CachedEntry<V> {
    value: V,
    stored_at: Instant,
}

impl<V: Clone> ResponseCache<V> {
    /// Create a cache whose entries live for `ttl`.
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            ttl,
            last_cleanup: Arc::new(RwLock::new(Instant::now())),
            cleanup_interval: Duration::from_secs(60),
        }
    }

    /// Build a cache key from an operation name and its parameters.
    #[must_use]
    pub fn key(operation: &str, params: &[&str]) -> String {
        let mut key = operation.to_string();
        for param in params {
            key.push('\u{1f}');
            key.push_str(param);
        }
        key
    }

    /// Get a live entry.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<V> {
        let entries = self.entries.read();
        entries
            .get(key)
            .filter(|entry| entry.stored_at.elapsed() < self.ttl)
            .map(|entry| entry.value.clone())
    }

    /// Store a value.
    pub fn insert(&self, key: String, value: V) {
        self.maybe_cleanup();
        self.entries.write().insert(
            key,
            CachedEntry {
                value,
                stored_at: Instant::now(),
            },
        );
    }

    /// Drop expired entries.
    fn maybe_cleanup(&self) {
        let should_cleanup = {
            let last = self.last_cleanup.read();
            last.elapsed() >= self.cleanup_interval
        };

        if should_cleanup {
            let ttl = self.ttl;
            self.entries
                .write()
                .retain(|_, entry| entry.stored_at.elapsed() < ttl);
            *self.last_cleanup.write() = Instant::now();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hit_within_ttl() {
        let cache = ResponseCache::new(Duration::from_secs(60));
        let key = ResponseCache::<String>::key("get_tweet", &["1"]);
        cache.insert(key.clone(), "hello".to_string());

        assert_eq!(cache.get(&key).as_deref(), Some("hello"));
        assert!(cache.get("get_tweet").is_none());
    }

    #[test]
    fn test_expired_entries_miss() {
        let cache = ResponseCache::new(Duration::from_millis(10));
        cache.insert("k".to_string(), 1_u32);
        std::thread::sleep(Duration::from_millis(30));

        assert!(cache.get("k").is_none());
    }

    #[test]
    fn test_keys_separate_parameters() {
        let a = ResponseCache::<u8>::key("get_tweets", &["ab", "c"]);
        let b = ResponseCache::<u8>::key("get_tweets", &["a", "bc"]);
        assert_ne!(a, b);
    }

    #[test]
    fn test_cleanup_drops_expired() {
        let mut cache = ResponseCache::new(Duration::from_millis(10));
        cache.cleanup_interval = Duration::ZERO;
        cache.insert("old".to_string(), 1_u32);
        std::thread::sleep(Duration::from_millis(30));
        cache.insert("new".to_string(), 2_u32);

        assert_eq!(cache.entries.read().len(), 1);
        assert_eq!(cache.get("new"), Some(2));
    }
}
