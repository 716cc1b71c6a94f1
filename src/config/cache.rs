//! Cache configuration

use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

/// Cache configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    /// Lifetime of cached reads, in milliseconds
    #[serde(default = "default_ttl")]
    pub default_ttl_ms: u64,

    /// Per-collection lifetimes in milliseconds; zero disables caching
    #[serde(default)]
    pub resource_ttls: HashMap<String, u64>,

    /// Coalesce concurrent fetches of the same query
    #[serde(default = "default_single_flight")]
    pub single_flight: bool,
}

impl CacheConfig {
    pub fn default_ttl(&self) -> Duration {
        Duration::from_millis(self.default_ttl_ms)
    }

    /// Per-collection lifetimes as durations
    pub fn resource_ttls(&self) -> impl Iterator<Item = (&str, Duration)> {
        self.resource_ttls
            .iter()
            .map(|(resource, ms)| (resource.as_str(), Duration::from_millis(*ms)))
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            default_ttl_ms: default_ttl(),
            resource_ttls: HashMap::new(),
            single_flight: default_single_flight(),
        }
    }
}

fn default_ttl() -> u64 {
    30_000
}

fn default_single_flight() -> bool {
    true
}
