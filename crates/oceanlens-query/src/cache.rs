//! Bounded result cache keyed by normalized query text.
//!
//! The cache is best effort: a miss, an evicted entry or an expired entry only
//! means the query runs again.

use std::num::NonZeroUsize;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use chrono::{DateTime, Utc};
use lru::LruCache;

/// Source of the current time
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock that only moves when told to
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self { now: Mutex::new(start) }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(|e| e.into_inner());
        *now += chrono::Duration::from_std(by).unwrap_or_else(|_| chrono::Duration::zero());
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    stored_at: DateTime<Utc>,
    access_count: u64,
}

/// Cache signature of a query: lowercased with whitespace collapsed
pub fn normalize_key(query: &str) -> String {
    query.split_whitespace().map(str::to_lowercase).collect::<Vec<_>>().join(" ")
}

pub struct QueryCache<V> {
    entries: Mutex<LruCache<String, CacheEntry<V>>>,
    ttl: Option<Duration>,
}

impl<V: Clone> QueryCache<V> {
    pub fn new(capacity: usize, ttl: Option<Duration>) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self { entries: Mutex::new(LruCache::new(capacity)), ttl }
    }

    fn entries(&self) -> MutexGuard<'_, LruCache<String, CacheEntry<V>>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Look up a query, dropping the entry if it has outlived the TTL
    pub fn get(&self, query: &str, now: DateTime<Utc>) -> Option<V> {
        let key = normalize_key(query);
        let mut entries = self.entries();

        let expired = match entries.get(&key) {
            Some(entry) => self.is_expired(entry, now),
            None => return None,
        };
        if expired {
            entries.pop(&key);
            tracing::debug!(key = %key, "Cached report expired");
            return None;
        }

        let entry = entries.get_mut(&key)?;
        entry.access_count += 1;
        Some(entry.value.clone())
    }

    pub fn insert(&self, query: &str, value: V, now: DateTime<Utc>) {
        let key = normalize_key(query);
        let entry = CacheEntry { value, stored_at: now, access_count: 0 };
        if let Some((evicted, _)) = self.entries().push(key.clone(), entry) {
            if evicted != key {
                tracing::debug!(key = %evicted, "Evicted cached report");
            }
        }
    }

    /// Number of hits recorded for a query
    pub fn access_count(&self, query: &str) -> Option<u64> {
        self.entries().peek(&normalize_key(query)).map(|entry| entry.access_count)
    }

    pub fn clear(&self) {
        self.entries().clear();
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn is_expired(&self, entry: &CacheEntry<V>, now: DateTime<Utc>) -> bool {
        match self.ttl {
            Some(ttl) => (now - entry.stored_at).to_std().map(|age| age > ttl).unwrap_or(false),
            None => false,
        }
    }
}
