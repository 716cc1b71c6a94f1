//! Per-resource cache lifetimes.

use std::collections::HashMap;
use std::time::Duration;

use crate::config::CacheConfig;
use crate::domain::cache::CacheKey;

/// How long fetched values stay fresh, per resource collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TtlPolicy {
    default: Duration,
    overrides: HashMap<String, Duration>,
}

impl TtlPolicy {
    pub fn new(default: Duration) -> Self {
        Self {
            default,
            overrides: HashMap::new(),
        }
    }

    /// Sets the lifetime for one collection; zero disables caching for it.
    pub fn with_override(mut self, collection: impl Into<String>, ttl: Duration) -> Self {
        self.overrides.insert(collection.into(), ttl);
        self
    }

    pub fn default_ttl(&self) -> Duration {
        self.default
    }

    /// Lifetime for `resource`, looked up by its collection.
    pub fn ttl_for(&self, resource: &str) -> Duration {
        self.overrides
            .get(resource)
            .or_else(|| self.overrides.get(CacheKey::collection_of(resource)))
            .copied()
            .unwrap_or(self.default)
    }
}

impl Default for TtlPolicy {
    fn default() -> Self {
        Self::new(Duration::from_secs(30))
    }
}

impl From<&CacheConfig> for TtlPolicy {
    fn from(config: &CacheConfig) -> Self {
        config
            .resource_ttls()
            .fold(Self::new(config.default_ttl()), |policy, (collection, ttl)| {
                policy.with_override(collection, ttl)
            })
    }
}
