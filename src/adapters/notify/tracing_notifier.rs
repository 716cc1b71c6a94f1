//! Notifier that writes notifications to the log.

use crate::domain::notification::{AlertSeverity, Notification, Presentation};
use crate::ports::Notifier;

/// Logs each notification at a level matching its severity.
///
/// Used by the binary, which has no notification surface of its own.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl TracingNotifier {
    pub fn new() -> Self {
        Self
    }
}

impl Notifier for TracingNotifier {
    fn notify(&self, notification: Notification) {
        let display_secs = match notification.presentation {
            Presentation::Persistent => None,
            Presentation::TimedWarning(d) | Presentation::Transient(d) => Some(d.as_secs()),
        };

        match notification.severity {
            AlertSeverity::Critical | AlertSeverity::High => tracing::error!(
                severity = %notification.severity,
                title = %notification.title,
                raised_at = %notification.raised_at,
                "{}",
                notification.message
            ),
            AlertSeverity::Medium => tracing::warn!(
                severity = %notification.severity,
                title = %notification.title,
                display_secs,
                "{}",
                notification.message
            ),
            AlertSeverity::Low => tracing::info!(
                severity = %notification.severity,
                title = %notification.title,
                display_secs,
                "{}",
                notification.message
            ),
        }
    }
}
