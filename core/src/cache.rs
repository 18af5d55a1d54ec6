//! Freshness cache for remote lookups.
//!
//! Entries live in memory only and are never persisted. An entry is served
//! while it is younger than the freshness window; after that it is ignored
//! and logically evicted when the next successful fetch overwrites it.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::clock::Clock;

/// One cached remote lookup.
#[derive(Debug, Clone)]
pub struct CachedLookup<T> {
    pub entity_key: String,
    pub fetched_at: DateTime<Utc>,
    pub payload: T,
}

/// Time-windowed cache keyed by lookup key.
///
/// The lock is never held across an `.await`.
pub struct LookupCache<T> {
    entries: Mutex<HashMap<String, CachedLookup<T>>>,
    freshness: Duration,
    clock: Arc<dyn Clock>,
}

impl<T: Clone> LookupCache<T> {
    pub fn new(freshness: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            freshness,
            clock,
        }
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<String, CachedLookup<T>>> {
        self.entries
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn is_fresh(&self, fetched_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        // Negative age (clock moved backwards) counts as fresh.
        match (now - fetched_at).to_std() {
            Ok(age) => age < self.freshness,
            Err(_) => true,
        }
    }

    /// Cached entry for `key` if it is still fresh.
    pub fn lookup(&self, key: &str) -> Option<CachedLookup<T>> {
        let now = self.clock.now();
        let entries = self.entries();
        let entry = entries.get(key)?;
        self.is_fresh(entry.fetched_at, now).then(|| entry.clone())
    }

    /// Cached payload for `key` if it is still fresh.
    pub fn get(&self, key: &str) -> Option<T> {
        self.lookup(key).map(|entry| entry.payload)
    }

    /// Store `payload` under `key`, stamped with the current time, and drop
    /// every entry that has expired.
    pub fn insert(&self, key: &str, payload: T) -> CachedLookup<T> {
        let now = self.clock.now();
        let entry = CachedLookup {
            entity_key: key.to_string(),
            fetched_at: now,
            payload,
        };
        let mut entries = self.entries();
        entries.retain(|_, e| self.is_fresh(e.fetched_at, now));
        entries.insert(key.to_string(), entry.clone());
        entry
    }

    /// Number of entries, fresh or not.
    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
