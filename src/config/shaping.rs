//! Rate shaping configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// Debounce and throttle settings
#[derive(Debug, Clone, Deserialize)]
pub struct ShapingConfig {
    /// Quiet period before a search query is issued, in milliseconds
    #[serde(default = "default_search_debounce")]
    pub search_debounce_ms: u64,

    /// Minimum spacing of batched stream deliveries, in milliseconds
    #[serde(default = "default_stream_throttle")]
    pub stream_throttle_ms: u64,

    /// Largest batch delivered per window
    #[serde(default = "default_stream_buffer_size")]
    pub stream_buffer_size: usize,
}

impl ShapingConfig {
    pub fn search_debounce(&self) -> Duration {
        Duration::from_millis(self.search_debounce_ms)
    }

    pub fn stream_throttle(&self) -> Duration {
        Duration::from_millis(self.stream_throttle_ms)
    }

    /// Validate shaping configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.stream_buffer_size == 0 {
            return Err(ValidationError::MustBePositive("shaping.stream_buffer_size"));
        }
        if self.stream_throttle_ms == 0 {
            return Err(ValidationError::MustBePositive("shaping.stream_throttle_ms"));
        }
        Ok(())
    }
}

impl Default for ShapingConfig {
    fn default() -> Self {
        Self {
            search_debounce_ms: default_search_debounce(),
            stream_throttle_ms: default_stream_throttle(),
            stream_buffer_size: default_stream_buffer_size(),
        }
    }
}

fn default_search_debounce() -> u64 {
    300
}

fn default_stream_throttle() -> u64 {
    250
}

fn default_stream_buffer_size() -> usize {
    50
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shaping_defaults() {
        let config = ShapingConfig::default();
        assert_eq!(config.search_debounce(), Duration::from_millis(300));
        assert_eq!(config.stream_throttle(), Duration::from_millis(250));
        assert_eq!(config.stream_buffer_size, 50);
    }

    #[test]
    fn test_zero_buffer_rejected() {
        let config = ShapingConfig {
            stream_buffer_size: 0,
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(ValidationError::MustBePositive("shaping.stream_buffer_size"))
        );
    }
}
