//! Reconnect and keepalive timing.

use std::time::Duration;

use crate::config::ConnectionConfig;

/// Fixed-delay reconnect policy.
///
/// After `max_attempts` consecutive failed connection attempts the manager
/// stops retrying and reports the connection as lost.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
        }
    }

    /// Returns true once `failures` consecutive failures exhaust the policy.
    pub fn is_exhausted(&self, failures: u32) -> bool {
        failures >= self.max_attempts
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(5, Duration::from_secs(3))
    }
}

/// Liveness probing for an open session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeepalivePolicy {
    /// Period between `ping` frames.
    pub interval: Duration,
    /// Extra silence tolerated after a missed probe before the session is
    /// considered dead.
    pub grace: Duration,
}

impl KeepalivePolicy {
    pub fn new(interval: Duration, grace: Duration) -> Self {
        Self { interval, grace }
    }

    /// Longest silence an open session may have.
    pub fn liveness_timeout(&self) -> Duration {
        self.interval + self.grace
    }
}

impl Default for KeepalivePolicy {
    fn default() -> Self {
        Self::new(Duration::from_secs(30), Duration::from_secs(10))
    }
}

impl From<&ConnectionConfig> for RetryPolicy {
    fn from(config: &ConnectionConfig) -> Self {
        Self::new(config.max_attempts, config.retry_delay())
    }
}

impl From<&ConnectionConfig> for KeepalivePolicy {
    fn from(config: &ConnectionConfig) -> Self {
        Self::new(config.keepalive(), config.liveness_grace())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exhausted_after_max_attempts() {
        let policy = RetryPolicy::new(3, Duration::from_millis(10));
        assert!(!policy.is_exhausted(2));
        assert!(policy.is_exhausted(3));
        assert!(policy.is_exhausted(4));
    }

    #[test]
    fn zero_attempts_means_one() {
        assert_eq!(RetryPolicy::new(0, Duration::ZERO).max_attempts, 1);
    }

    #[test]
    fn liveness_timeout_adds_grace() {
        let policy = KeepalivePolicy::default();
        assert_eq!(policy.liveness_timeout(), Duration::from_secs(40));
    }

    #[test]
    fn built_from_connection_config() {
        let config = ConnectionConfig {
            max_attempts: 7,
            retry_delay_ms: 500,
            ..ConnectionConfig::default()
        };

        assert_eq!(
            RetryPolicy::from(&config),
            RetryPolicy::new(7, Duration::from_millis(500))
        );
        assert_eq!(KeepalivePolicy::from(&config), KeepalivePolicy::default());
    }
}
