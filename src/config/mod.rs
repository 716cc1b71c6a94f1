//! Application configuration module
//!
//! This module provides type-safe configuration loading from environment variables
//! using the `config` and `dotenvy` crates. Configuration is loaded with the
//! `CONSOLE_SYNC` prefix and nested values use double underscores as separators.
//!
//! # Example
//!
//! ```no_run
//! use console_sync::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//!
//! println!("Streaming from {}", config.connection.endpoint().unwrap());
//! ```

mod cache;
mod connection;
mod error;
mod policy;
mod remote;
mod shaping;
mod telemetry;

pub use cache::CacheConfig;
pub use connection::ConnectionConfig;
pub use error::{ConfigError, ValidationError};
pub use policy::PolicyConfig;
pub use remote::RemoteConfig;
pub use shaping::ShapingConfig;
pub use telemetry::TelemetryConfig;

use serde::Deserialize;

/// Root application configuration
///
/// Every section has defaults, so an empty environment yields a usable
/// configuration. Load using [`AppConfig::load()`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Live connection (endpoint, retry, keepalive)
    #[serde(default)]
    pub connection: ConnectionConfig,

    /// Local cache lifetimes
    #[serde(default)]
    pub cache: CacheConfig,

    /// Remote store (REST API)
    #[serde(default)]
    pub remote: RemoteConfig,

    /// Debounce and throttle settings
    #[serde(default)]
    pub shaping: ShapingConfig,

    /// Access policy source
    #[serde(default)]
    pub policy: PolicyConfig,

    /// Logging
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// This function:
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with `CONSOLE_SYNC` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    /// 4. Deserializes into typed configuration structs
    ///
    /// # Environment Variable Format
    ///
    /// - `CONSOLE_SYNC__CONNECTION__MAX_ATTEMPTS=5` -> `connection.max_attempts = 5`
    /// - `CONSOLE_SYNC__CACHE__RESOURCE_TTLS__DASHBOARD=5000` -> `cache.resource_ttls.dashboard = 5000`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if values cannot be parsed into expected types.
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (development)
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("CONSOLE_SYNC")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` for zero counts or periods, unparseable
    /// URLs, and unsupported schemes.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.connection.validate()?;
        self.remote.validate()?;
        self.shaping.validate()?;
        self.policy.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::Mutex;
    use std::time::Duration;

    // Mutex to ensure tests don't run in parallel (env vars are global)
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    const VARS: [&str; 6] = [
        "CONSOLE_SYNC__CONNECTION__MAX_ATTEMPTS",
        "CONSOLE_SYNC__CONNECTION__CHANNELS",
        "CONSOLE_SYNC__CONNECTION__URL",
        "CONSOLE_SYNC__CACHE__SINGLE_FLIGHT",
        "CONSOLE_SYNC__SHAPING__STREAM_BUFFER_SIZE",
        "CONSOLE_SYNC__TELEMETRY__JSON",
    ];

    /// Helper to clear environment variables after testing
    fn clear_env() {
        for var in VARS {
            env::remove_var(var);
        }
    }

    #[test]
    fn test_empty_environment_uses_defaults() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();
        let result = AppConfig::load();

        assert!(result.is_ok(), "Failed to load config: {:?}", result.err());
        let config = result.unwrap();
        assert_eq!(config.connection.max_attempts, 5);
        assert_eq!(config.cache.default_ttl(), Duration::from_secs(30));
        assert_eq!(config.telemetry.log_level, "info,console_sync=debug");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_from_environment() {
        let _guard = ENV_MUTEX.lock().unwrap();
        env::set_var("CONSOLE_SYNC__CONNECTION__MAX_ATTEMPTS", "8");
        env::set_var("CONSOLE_SYNC__CONNECTION__CHANNELS", "dashboard,calls");
        env::set_var("CONSOLE_SYNC__CONNECTION__URL", "wss://events.example.com/ws");
        env::set_var("CONSOLE_SYNC__CACHE__SINGLE_FLIGHT", "false");
        env::set_var("CONSOLE_SYNC__TELEMETRY__JSON", "true");
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert_eq!(config.connection.max_attempts, 8);
        assert_eq!(config.connection.channels_list(), vec!["dashboard", "calls"]);
        assert_eq!(
            config.connection.endpoint().unwrap().as_str(),
            "wss://events.example.com/ws"
        );
        assert!(!config.cache.single_flight);
        assert!(config.telemetry.json);
    }

    #[test]
    fn test_validate_rejects_zero_buffer() {
        let _guard = ENV_MUTEX.lock().unwrap();
        env::set_var("CONSOLE_SYNC__SHAPING__STREAM_BUFFER_SIZE", "0");
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert_eq!(
            config.validate(),
            Err(ValidationError::MustBePositive("shaping.stream_buffer_size"))
        );
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(AppConfig::default().validate().is_ok());
    }
}
