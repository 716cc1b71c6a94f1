//! Alert severities and their presentation.
//!
//! The notification surface itself is an external collaborator; this
//! module only decides how urgently something should be shown.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::time::Duration;

use crate::domain::foundation::Timestamp;

/// How long a medium-severity warning stays on screen.
pub const WARNING_DISPLAY: Duration = Duration::from_secs(10);

/// How long an informational notice stays on screen.
pub const INFO_DISPLAY: Duration = Duration::from_secs(5);

/// Severity carried by `alert` messages.
///
/// Variants are declared in rising order of urgency. Unrecognised
/// severities deserialize as `Low`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertSeverity {
    #[default]
    Low,
    Medium,
    High,
    Critical,
}

impl AlertSeverity {
    /// Maps severity to the surface it should be shown on.
    pub fn presentation(&self) -> Presentation {
        match self {
            AlertSeverity::Critical | AlertSeverity::High => Presentation::Persistent,
            AlertSeverity::Medium => Presentation::TimedWarning(WARNING_DISPLAY),
            AlertSeverity::Low => Presentation::Transient(INFO_DISPLAY),
        }
    }

    /// Maps a wire severity to a variant, falling back to `Low`.
    pub fn from_wire(value: &str) -> Self {
        match value {
            "critical" => AlertSeverity::Critical,
            "high" => AlertSeverity::High,
            "medium" => AlertSeverity::Medium,
            _ => AlertSeverity::Low,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AlertSeverity::Low => "low",
            AlertSeverity::Medium => "medium",
            AlertSeverity::High => "high",
            AlertSeverity::Critical => "critical",
        }
    }
}

impl<'de> Deserialize<'de> for AlertSeverity {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        Ok(AlertSeverity::from_wire(&value))
    }
}

impl fmt::Display for AlertSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where and for how long a notification is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presentation {
    /// Urgent; stays until the user dismisses it.
    Persistent,
    /// Warning that dismisses itself after the duration.
    TimedWarning(Duration),
    /// Informational; dismisses itself after the duration.
    Transient(Duration),
}

impl Presentation {
    /// Returns true if the user must dismiss the notification.
    pub fn requires_dismissal(&self) -> bool {
        matches!(self, Presentation::Persistent)
    }
}

/// A user-visible notification handed to the notifier port.
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub severity: AlertSeverity,
    pub presentation: Presentation,
    pub title: String,
    pub message: String,
    pub raised_at: Timestamp,
}

impl Notification {
    /// Creates a notification presented according to its severity.
    pub fn new(
        severity: AlertSeverity,
        title: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            severity,
            presentation: severity.presentation(),
            title: title.into(),
            message: message.into(),
            raised_at: Timestamp::now(),
        }
    }
}
