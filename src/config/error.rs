//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// Errors that can occur during configuration validation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Required configuration missing: {0}")]
    MissingRequired(&'static str),

    #[error("Invalid URL in {field}: {reason}")]
    InvalidUrl { field: &'static str, reason: String },

    #[error("Unsupported scheme '{scheme}' in {field}")]
    UnsupportedScheme { field: &'static str, scheme: String },

    #[error("{0} must be greater than zero")]
    MustBePositive(&'static str),

    #[error("Invalid request timeout")]
    InvalidTimeout,
}
