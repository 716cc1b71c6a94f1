//! Routing of alerts and connection loss to the notifier.

use async_trait::async_trait;
use std::sync::Arc;

use crate::domain::connection::{tags, InboundEnvelope, InboundMessage};
use crate::domain::notification::{AlertSeverity, Notification};
use crate::ports::{ConnectionObserver, HandlerError, MessageHandler, Notifier};

/// Turns `alert` and `handoff-triggered` messages into notifications.
///
/// Alerts are presented by severity; handoffs always need a human and are
/// raised as critical.
pub struct AlertRouter {
    notifier: Arc<dyn Notifier>,
}

impl AlertRouter {
    pub const TAGS: [&'static str; 2] = [tags::ALERT, tags::HANDOFF_TRIGGERED];

    pub fn new(notifier: Arc<dyn Notifier>) -> Self {
        Self { notifier }
    }
}

#[async_trait]
impl MessageHandler for AlertRouter {
    async fn handle(&self, envelope: InboundEnvelope) -> Result<(), HandlerError> {
        let notification = match envelope.message {
            InboundMessage::Alert(alert) => Notification::new(
                alert.severity,
                alert.title.unwrap_or_else(|| "Alert".to_string()),
                alert.message,
            ),
            InboundMessage::HandoffTriggered(handoff) => {
                let reason = handoff
                    .reason
                    .map(|reason| format!(": {reason}"))
                    .unwrap_or_default();
                Notification::new(
                    AlertSeverity::Critical,
                    "Handoff requested",
                    format!("Call {} needs an agent{reason}", handoff.call_id),
                )
            }
            other => {
                return Err(HandlerError::new(
                    "AlertRouter",
                    format!("unexpected message '{}'", other.tag()),
                ))
            }
        };

        self.notifier.notify(notification);
        Ok(())
    }

    fn name(&self) -> &'static str {
        "AlertRouter"
    }
}

/// Surfaces the terminal connection-lost event as a persistent
/// notification.
pub struct NotifyingObserver {
    notifier: Arc<dyn Notifier>,
}

impl NotifyingObserver {
    pub fn new(notifier: Arc<dyn Notifier>) -> Self {
        Self { notifier }
    }
}

impl ConnectionObserver for NotifyingObserver {
    fn on_connection_lost(&self, attempts: u32, last_error: Option<&str>) {
        let detail = last_error
            .map(|e| format!(" Last error: {e}."))
            .unwrap_or_default();
        self.notifier.notify(Notification::new(
            AlertSeverity::Critical,
            "Connection lost",
            format!("Live updates stopped after {attempts} failed attempts.{detail}"),
        ));
    }
}
