//! Bounded batching window.

use std::collections::VecDeque;
use std::time::Duration;
use tokio::time::Instant;

/// Holds at most `capacity` items between flushes, evicting the oldest.
///
/// Also remembers when it was last flushed, so callers can decide whether
/// the next flush is due.
#[derive(Debug)]
pub struct BufferWindow<T> {
    items: VecDeque<T>,
    capacity: usize,
    last_flush: Option<Instant>,
    dropped_total: u64,
}

impl<T> BufferWindow<T> {
    /// Creates a window; a zero capacity is treated as one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            items: VecDeque::with_capacity(capacity),
            capacity,
            last_flush: None,
            dropped_total: 0,
        }
    }

    /// Adds an item, returning how many old items were evicted.
    pub fn push(&mut self, item: T) -> usize {
        let mut dropped = 0;
        while self.items.len() >= self.capacity {
            self.items.pop_front();
            dropped += 1;
        }
        self.items.push_back(item);
        self.dropped_total += dropped as u64;
        dropped
    }

    /// Drains the window in arrival order.
    pub fn take(&mut self) -> Vec<T> {
        self.items.drain(..).collect()
    }

    /// Records a flush at `now`.
    pub fn mark_flushed(&mut self, now: Instant) {
        self.last_flush = Some(now);
    }

    /// Earliest instant the next flush may happen; `None` if never flushed.
    pub fn next_flush_at(&self, period: Duration) -> Option<Instant> {
        self.last_flush.map(|at| at + period)
    }

    /// Returns true if a flush at `now` respects the period.
    pub fn is_due(&self, now: Instant, period: Duration) -> bool {
        self.next_flush_at(period).map_or(true, |at| now >= at)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Items evicted over the window's lifetime.
    pub fn dropped_total(&self) -> u64 {
        self.dropped_total
    }
}
