//! Logging setup for the binary and for embedders that want the same output.

use thiserror::Error;
use tracing_subscriber::EnvFilter;

use crate::config::TelemetryConfig;

#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("invalid log filter '{filter}': {reason}")]
    InvalidFilter { filter: String, reason: String },

    #[error("a global subscriber is already installed")]
    AlreadyInitialized,
}

/// Builds the log filter: `RUST_LOG` when set, otherwise the configured level.
pub fn filter(config: &TelemetryConfig) -> Result<EnvFilter, TelemetryError> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(&config.log_level).map_err(|e| TelemetryError::InvalidFilter {
            filter: config.log_level.clone(),
            reason: e.to_string(),
        }),
    }
}

/// Installs the global tracing subscriber.
///
/// # Errors
///
/// Fails on an unparseable filter or when a subscriber is already set.
pub fn init(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    let filter = filter(config)?;
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    let result = if config.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };

    result.map_err(|_| TelemetryError::AlreadyInitialized)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configured_level_is_parsed() {
        if std::env::var("RUST_LOG").is_ok() {
            return;
        }
        let config = TelemetryConfig::default();
        assert!(filter(&config).is_ok());
    }

    #[test]
    fn second_init_is_reported() {
        let config = TelemetryConfig::default();
        let _ = init(&config);
        assert!(matches!(
            init(&config),
            Err(TelemetryError::AlreadyInitialized)
        ));
    }
}
