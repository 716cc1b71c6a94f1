//! Handlers for decoded inbound messages.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::connection::InboundEnvelope;

/// A handler failed to process a message.
///
/// Logged by the dispatcher; never closes the session.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{handler}: {message}")]
pub struct HandlerError {
    pub handler: &'static str,
    pub message: String,
}

impl HandlerError {
    pub fn new(handler: &'static str, message: impl Into<String>) -> Self {
        Self {
            handler,
            message: message.into(),
        }
    }
}

/// Consumer of one inbound message at a time.
///
/// Handlers run on the connection task in arrival order, so they should be
/// quick; long work belongs on a spawned task.
///
/// # Example
///
/// ```ignore
/// struct CallTracker { /* ... */ }
///
/// #[async_trait]
/// impl MessageHandler for CallTracker {
///     async fn handle(&self, envelope: InboundEnvelope) -> Result<(), HandlerError> {
///         if let InboundMessage::CallStarted(call) = envelope.message {
///             // track call...
///         }
///         Ok(())
///     }
///
///     fn name(&self) -> &'static str {
///         "CallTracker"
///     }
/// }
/// ```
#[async_trait]
pub trait MessageHandler: Send + Sync {
    async fn handle(&self, envelope: InboundEnvelope) -> Result<(), HandlerError>;

    /// Handler name for logging.
    fn name(&self) -> &'static str;
}

/// Consumer of throttled batches of messages.
#[async_trait]
pub trait BatchHandler: Send + Sync {
    async fn handle_batch(&self, batch: Vec<InboundEnvelope>) -> Result<(), HandlerError>;

    fn name(&self) -> &'static str;
}
