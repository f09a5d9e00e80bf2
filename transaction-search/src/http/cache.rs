//! In-process cache of serialized search responses.

use std::num::NonZeroUsize;
use std::time::{Duration, Instant};

use bytes::Bytes;
use lru::LruCache;
use parking_lot::Mutex;

struct CachedResponse {
    body: Bytes,
    stored_at: Instant,
}

/// LRU cache of search response bodies keyed by the exact query string.
///
/// Entries older than `ttl` are treated as missing and evicted on lookup.
pub struct QueryCache {
    entries: Mutex<LruCache<String, CachedResponse>>,
    ttl: Duration,
}

impl QueryCache {
    pub fn new(capacity: NonZeroUsize, ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
            ttl,
        }
    }

    /// How long a response stays cached.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Get the cached body for `query`, if present and still fresh.
    pub fn get(&self, query: &str) -> Option<Bytes> {
        self.get_at(query, Instant::now())
    }

    /// Cache `body` as the response for `query`.
    pub fn insert(&self, query: &str, body: Bytes) {
        self.insert_at(query, body, Instant::now());
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    fn get_at(&self, query: &str, now: Instant) -> Option<Bytes> {
        let mut entries = self.entries.lock();

        let fresh = match entries.get(query) {
            Some(entry) => now.saturating_duration_since(entry.stored_at) < self.ttl,
            None => return None,
        };

        if !fresh {
            entries.pop(query);
            return None;
        }

        entries.get(query).map(|entry| entry.body.clone())
    }

    fn insert_at(&self, query: &str, body: Bytes, now: Instant) {
        self.entries.lock().put(
            query.to_string(),
            CachedResponse {
                body,
                stored_at: now,
            },
        );
    }
}
