//! Cache entries and keys.
//!
//! The cache is disposable, rebuildable state: freshness is decided at read
//! time from when a value was stored and how long it may live.

mod entry;
mod key;

pub use entry::CacheEntry;
pub use key::{CacheKey, Filters};
