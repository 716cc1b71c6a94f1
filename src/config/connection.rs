//! Live connection configuration

use secrecy::SecretString;
use serde::Deserialize;
use std::time::Duration;
use url::Url;

use super::error::ValidationError;

/// Live connection configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ConnectionConfig {
    /// Explicit WebSocket endpoint; overrides origin + path
    pub url: Option<String>,

    /// Origin of the hosting page, used to derive a same-origin endpoint
    #[serde(default = "default_origin")]
    pub origin: String,

    /// Endpoint path appended to the origin
    #[serde(default = "default_path")]
    pub path: String,

    /// Channels to subscribe to after every open (comma-separated)
    #[serde(default = "default_channels")]
    pub channels: String,

    /// Consecutive failed attempts before giving up
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Fixed delay between reconnect attempts, in milliseconds
    #[serde(default = "default_retry_delay")]
    pub retry_delay_ms: u64,

    /// Handshake timeout, in milliseconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_ms: u64,

    /// Keepalive ping period, in seconds
    #[serde(default = "default_keepalive")]
    pub keepalive_secs: u64,

    /// Extra silence tolerated after a missed ping, in seconds
    #[serde(default = "default_liveness_grace")]
    pub liveness_grace_secs: u64,

    /// Bearer token sent with the upgrade request
    pub auth_token: Option<SecretString>,
}

impl ConnectionConfig {
    /// Resolves the endpoint: the configured URL, else the origin with its
    /// scheme mapped `http` → `ws`, `https` → `wss` and `path` appended.
    pub fn endpoint(&self) -> Result<Url, ValidationError> {
        if let Some(url) = self.url.as_deref().filter(|url| !url.trim().is_empty()) {
            let endpoint = Url::parse(url.trim()).map_err(|e| ValidationError::InvalidUrl {
                field: "connection.url",
                reason: e.to_string(),
            })?;
            return match endpoint.scheme() {
                "ws" | "wss" => Ok(endpoint),
                other => Err(ValidationError::UnsupportedScheme {
                    field: "connection.url",
                    scheme: other.to_string(),
                }),
            };
        }

        let mut endpoint = Url::parse(&self.origin).map_err(|e| ValidationError::InvalidUrl {
            field: "connection.origin",
            reason: e.to_string(),
        })?;
        let scheme = match endpoint.scheme() {
            "http" | "ws" => "ws",
            "https" | "wss" => "wss",
            other => {
                return Err(ValidationError::UnsupportedScheme {
                    field: "connection.origin",
                    scheme: other.to_string(),
                })
            }
        };
        endpoint
            .set_scheme(scheme)
            .map_err(|_| ValidationError::UnsupportedScheme {
                field: "connection.origin",
                scheme: endpoint.scheme().to_string(),
            })?;
        endpoint.set_path(&self.path);
        endpoint.set_query(None);
        endpoint.set_fragment(None);
        Ok(endpoint)
    }

    /// Get subscription channels as a vector
    pub fn channels_list(&self) -> Vec<String> {
        self.channels
            .split(',')
            .map(str::trim)
            .filter(|channel| !channel.is_empty())
            .map(str::to_string)
            .collect()
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn keepalive(&self) -> Duration {
        Duration::from_secs(self.keepalive_secs)
    }

    pub fn liveness_grace(&self) -> Duration {
        Duration::from_secs(self.liveness_grace_secs)
    }

    /// Validate connection configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.max_attempts == 0 {
            return Err(ValidationError::MustBePositive("connection.max_attempts"));
        }
        if self.keepalive_secs == 0 {
            return Err(ValidationError::MustBePositive("connection.keepalive_secs"));
        }
        if self.connect_timeout_ms == 0 {
            return Err(ValidationError::MustBePositive("connection.connect_timeout_ms"));
        }
        self.endpoint()?;
        Ok(())
    }
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            url: None,
            origin: default_origin(),
            path: default_path(),
            channels: default_channels(),
            max_attempts: default_max_attempts(),
            retry_delay_ms: default_retry_delay(),
            connect_timeout_ms: default_connect_timeout(),
            keepalive_secs: default_keepalive(),
            liveness_grace_secs: default_liveness_grace(),
            auth_token: None,
        }
    }
}

fn default_origin() -> String {
    "http://localhost:8080".to_string()
}

fn default_path() -> String {
    "/ws".to_string()
}

fn default_channels() -> String {
    "dashboard".to_string()
}

fn default_max_attempts() -> u32 {
    5
}

fn default_retry_delay() -> u64 {
    3000
}

fn default_connect_timeout() -> u64 {
    10_000
}

fn default_keepalive() -> u64 {
    30
}

fn default_liveness_grace() -> u64 {
    10
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_config_defaults() {
        let config = ConnectionConfig::default();
        assert_eq!(config.max_attempts, 5);
        assert_eq!(config.retry_delay(), Duration::from_secs(3));
        assert_eq!(config.keepalive(), Duration::from_secs(30));
        assert_eq!(config.channels_list(), vec!["dashboard"]);
    }

    #[test]
    fn test_same_origin_endpoint() {
        let config = ConnectionConfig::default();
        assert_eq!(config.endpoint().unwrap().as_str(), "ws://localhost:8080/ws");
    }

    #[test]
    fn test_https_origin_becomes_wss() {
        let config = ConnectionConfig {
            origin: "https://console.example.com/app?tab=calls".to_string(),
            path: "/live".to_string(),
            ..Default::default()
        };
        assert_eq!(
            config.endpoint().unwrap().as_str(),
            "wss://console.example.com/live"
        );
    }

    #[test]
    fn test_explicit_url_wins() {
        let config = ConnectionConfig {
            url: Some("wss://events.example.com/stream".to_string()),
            ..Default::default()
        };
        assert_eq!(
            config.endpoint().unwrap().as_str(),
            "wss://events.example.com/stream"
        );
    }

    #[test]
    fn test_explicit_url_must_be_websocket() {
        let config = ConnectionConfig {
            url: Some("http://events.example.com/stream".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            config.endpoint(),
            Err(ValidationError::UnsupportedScheme { .. })
        ));
    }

    #[test]
    fn test_unsupported_origin_scheme() {
        let config = ConnectionConfig {
            origin: "file:///tmp/index.html".to_string(),
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(ValidationError::UnsupportedScheme {
                field: "connection.origin",
                scheme: "file".to_string()
            })
        );
    }

    #[test]
    fn test_channels_are_trimmed() {
        let config = ConnectionConfig {
            channels: " dashboard, calls ,,alerts".to_string(),
            ..Default::default()
        };
        assert_eq!(config.channels_list(), vec!["dashboard", "calls", "alerts"]);
    }

    #[test]
    fn test_zero_attempts_rejected() {
        let config = ConnectionConfig {
            max_attempts: 0,
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(ValidationError::MustBePositive("connection.max_attempts"))
        );
    }

    #[test]
    fn test_auth_token_is_redacted_in_debug() {
        let config = ConnectionConfig {
            auth_token: Some(SecretString::new("tok-123".to_string())),
            ..Default::default()
        };
        assert!(!format!("{config:?}").contains("tok-123"));
    }
}
