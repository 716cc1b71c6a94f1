//! CacheStore port - synchronous keyed store with expiry.

use std::time::Duration;

/// Keyed store whose entries expire after a per-entry time-to-live.
///
/// Every operation is synchronous and never blocks on I/O. `get` never
/// fetches; filling the cache on a miss is the caller's job. Writes to the
/// same key are last-write-wins.
pub trait CacheStore<V>: Send + Sync {
    /// Returns a copy of the value if present and fresh.
    fn get(&self, key: &str) -> Option<V>;

    /// Stores a value. A zero `ttl` stores nothing and drops any existing entry.
    fn set(&self, key: &str, value: V, ttl: Duration);

    /// Counter bumped by every invalidation, whether or not it dropped
    /// anything.
    fn generation(&self) -> u64;

    /// Stores a value only if nothing was invalidated since `generation`
    /// was read. Returns whether the value was stored.
    fn set_if_unchanged(&self, key: &str, value: V, ttl: Duration, generation: u64) -> bool;

    /// Drops one entry. Missing keys are ignored.
    fn invalidate(&self, key: &str);

    /// Drops every entry whose key matches; returns how many were dropped.
    fn invalidate_matching(&self, matches: &dyn Fn(&str) -> bool) -> usize;

    /// Drops everything.
    fn invalidate_all(&self);

    /// Number of physically held entries, fresh or stale.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops every entry whose key starts with `prefix`.
    fn invalidate_prefix(&self, prefix: &str) -> usize {
        self.invalidate_matching(&|key| key.starts_with(prefix))
    }
}
