//! Cache store adapters.
//!
//! ## Available Adapters
//!
//! - `TtlCache` - In-memory store, freshness checked at read time
//!
//! ## Usage
//!
//! ```ignore
//! use console_sync::adapters::cache::TtlCache;
//! use console_sync::ports::CacheStore;
//!
//! let cache = TtlCache::new();
//! cache.set("clients", list, Duration::from_secs(30));
//! ```

mod in_memory;

pub use in_memory::TtlCache;
