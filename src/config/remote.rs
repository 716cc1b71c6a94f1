//! Remote store configuration

use serde::Deserialize;
use std::time::Duration;
use url::Url;

use super::error::ValidationError;

/// Remote store (REST API) configuration
#[derive(Debug, Clone, Deserialize)]
pub struct RemoteConfig {
    /// API root URL
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

impl RemoteConfig {
    pub fn base_url(&self) -> Result<Url, ValidationError> {
        let url = Url::parse(&self.base_url).map_err(|e| ValidationError::InvalidUrl {
            field: "remote.base_url",
            reason: e.to_string(),
        })?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            other => Err(ValidationError::UnsupportedScheme {
                field: "remote.base_url",
                scheme: other.to_string(),
            }),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Validate remote configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.request_timeout_secs == 0 || self.request_timeout_secs > 300 {
            return Err(ValidationError::InvalidTimeout);
        }
        self.base_url()?;
        Ok(())
    }
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:8080/api".to_string()
}

fn default_request_timeout() -> u64 {
    15
}
