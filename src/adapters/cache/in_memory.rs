//! In-memory TTL cache.
//!
//! Entries are checked for freshness when read; there is no background
//! sweep and no timer. Stale entries stay in memory until overwritten,
//! invalidated or purged, but are never returned.
//!
//! Every invalidation bumps a generation counter held under the same lock
//! as the entries, so a conditional write can tell whether anything was
//! invalidated since its caller started fetching.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::time::Duration;
use tokio::time::Instant;

use crate::domain::cache::CacheEntry;
use crate::ports::CacheStore;

/// In-memory cache store shared by many callers.
///
/// Reads take a shared lock and clone the value out; no reference into the
/// map outlives a call.
#[derive(Debug)]
pub struct TtlCache<V> {
    store: RwLock<Store<V>>,
}

#[derive(Debug)]
struct Store<V> {
    entries: HashMap<String, CacheEntry<V>>,
    generation: u64,
}

impl<V> Store<V> {
    fn put(&mut self, key: &str, value: V, ttl: Duration) {
        if ttl.is_zero() {
            self.entries.remove(key);
            return;
        }
        self.entries.insert(key.to_string(), CacheEntry::new(value, ttl));
    }
}

impl<V> TtlCache<V> {
    pub fn new() -> Self {
        Self {
            store: RwLock::new(Store {
                entries: HashMap::new(),
                generation: 0,
            }),
        }
    }

    /// Drops every stale entry, returning how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut store = self.store.write();
        let before = store.entries.len();
        store.entries.retain(|_, entry| entry.is_fresh_at(now));
        before - store.entries.len()
    }
}

impl<V> Default for TtlCache<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> CacheStore<V> for TtlCache<V>
where
    V: Clone + Send + Sync,
{
    fn get(&self, key: &str) -> Option<V> {
        let now = Instant::now();
        self.store
            .read()
            .entries
            .get(key)
            .filter(|entry| entry.is_fresh_at(now))
            .map(|entry| entry.value().clone())
    }

    fn set(&self, key: &str, value: V, ttl: Duration) {
        self.store.write().put(key, value, ttl);
    }

    fn generation(&self) -> u64 {
        self.store.read().generation
    }

    fn set_if_unchanged(&self, key: &str, value: V, ttl: Duration, generation: u64) -> bool {
        let mut store = self.store.write();
        if store.generation != generation {
            return false;
        }
        store.put(key, value, ttl);
        true
    }

    fn invalidate(&self, key: &str) {
        let mut store = self.store.write();
        store.generation += 1;
        store.entries.remove(key);
    }

    fn invalidate_matching(&self, matches: &dyn Fn(&str) -> bool) -> usize {
        let mut store = self.store.write();
        store.generation += 1;
        let before = store.entries.len();
        store.entries.retain(|key, _| !matches(key));
        before - store.entries.len()
    }

    fn invalidate_all(&self) {
        let mut store = self.store.write();
        store.generation += 1;
        store.entries.clear();
    }

    fn len(&self) -> usize {
        self.store.read().entries.len()
    }
}
