//! A single cached value with its time-to-live.

use std::time::Duration;
use tokio::time::Instant;

/// A value stored at a point in monotonic time with a time-to-live.
///
/// Fresh iff `now - stored_at < ttl`. A zero ttl is never fresh.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    value: V,
    stored_at: Instant,
    ttl: Duration,
}

impl<V> CacheEntry<V> {
    /// Creates an entry stored now.
    pub fn new(value: V, ttl: Duration) -> Self {
        Self::stored_at(value, ttl, Instant::now())
    }

    /// Creates an entry stored at an explicit instant.
    pub fn stored_at(value: V, ttl: Duration, stored_at: Instant) -> Self {
        Self {
            value,
            stored_at,
            ttl,
        }
    }

    pub fn value(&self) -> &V {
        &self.value
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn is_fresh_at(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.stored_at) < self.ttl
    }

    pub fn is_fresh(&self) -> bool {
        self.is_fresh_at(Instant::now())
    }

    /// Time left before the entry goes stale, or `None` if it already has.
    pub fn remaining_at(&self, now: Instant) -> Option<Duration> {
        self.ttl
            .checked_sub(now.saturating_duration_since(self.stored_at))
            .filter(|left| !left.is_zero())
    }
}
