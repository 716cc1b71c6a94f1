//! Tag-based routing of inbound messages to handlers.

use futures::channel::mpsc as batch_channel;
use futures::StreamExt;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

use crate::application::shaping::ThrottledBuffer;
use crate::domain::connection::{InboundEnvelope, InboundMessage};
use crate::ports::{BatchHandler, MessageHandler};

/// How a dispatched message was consumed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// A handler registered for the tag ran successfully.
    Handled,
    /// Queued for a batched handler.
    Batched,
    /// No handler for the tag; the fallback ran.
    Fallback,
    /// A handler returned an error; it was logged.
    Failed,
    /// Nobody wanted the message.
    Dropped,
}

enum Route {
    Direct(Arc<dyn MessageHandler>),
    Batched(batch_channel::UnboundedSender<InboundEnvelope>),
}

/// A batched route waiting to be started.
pub(crate) struct BatchRoute {
    pub tag: String,
    pub period: Duration,
    pub buffer_size: usize,
    pub handler: Arc<dyn BatchHandler>,
}

/// Routes each inbound message to the handler registered for its tag.
///
/// Messages are dispatched one at a time, so handlers see them in
/// arrival order.
pub struct Dispatcher {
    routes: HashMap<String, Route>,
    fallback: Option<Arc<dyn MessageHandler>>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self {
            routes: HashMap::new(),
            fallback: None,
        }
    }

    /// Registers `handler` for `tag`, replacing any previous route.
    pub fn route(&mut self, tag: impl Into<String>, handler: Arc<dyn MessageHandler>) {
        self.routes.insert(tag.into(), Route::Direct(handler));
    }

    /// Handles messages with no registered route.
    pub fn set_fallback(&mut self, handler: Arc<dyn MessageHandler>) {
        self.fallback = Some(handler);
    }

    /// Routes `tag` through a throttled buffer into `handler`.
    ///
    /// Spawns the forwarding task and returns its handle; aborting it
    /// stops batched delivery. Requires a Tokio runtime.
    pub(crate) fn route_batched(&mut self, route: BatchRoute) -> JoinHandle<()> {
        let BatchRoute {
            tag,
            period,
            buffer_size,
            handler,
        } = route;
        let (tx, rx) = batch_channel::unbounded();
        let mut batches = ThrottledBuffer::new(rx, period, buffer_size);
        self.routes.insert(tag.clone(), Route::Batched(tx));

        tokio::spawn(async move {
            while let Some(batch) = batches.next().await {
                let size = batch.len();
                if let Err(e) = handler.handle_batch(batch).await {
                    tracing::warn!(
                        handler = handler.name(),
                        tag = %tag,
                        size,
                        error = %e,
                        "Batch handler failed"
                    );
                }
            }
        })
    }

    pub fn has_route(&self, tag: &str) -> bool {
        self.routes.contains_key(tag)
    }

    /// Delivers one message.
    pub async fn dispatch(&self, envelope: InboundEnvelope) -> Delivery {
        let tag = envelope.tag().into_owned();

        match self.routes.get(&tag) {
            Some(Route::Direct(handler)) => {
                let name = handler.name();
                match handler.handle(envelope).await {
                    Ok(()) => Delivery::Handled,
                    Err(e) => {
                        tracing::warn!(handler = name, tag = %tag, error = %e, "Handler failed");
                        Delivery::Failed
                    }
                }
            }
            Some(Route::Batched(tx)) => {
                if tx.unbounded_send(envelope).is_err() {
                    tracing::debug!(tag = %tag, "Batched route closed, message dropped");
                    return Delivery::Dropped;
                }
                Delivery::Batched
            }
            None => self.unrouted(tag, envelope).await,
        }
    }

    async fn unrouted(&self, tag: String, envelope: InboundEnvelope) -> Delivery {
        match &envelope.message {
            InboundMessage::Pong => return Delivery::Dropped,
            InboundMessage::Connected(payload) => {
                tracing::info!(client_id = ?payload.client_id, "Server acknowledged connection");
                return Delivery::Dropped;
            }
            _ => {}
        }

        let Some(fallback) = &self.fallback else {
            tracing::debug!(tag = %tag, "No handler for message");
            return Delivery::Dropped;
        };

        match fallback.handle(envelope).await {
            Ok(()) => Delivery::Fallback,
            Err(e) => {
                tracing::warn!(
                    handler = fallback.name(),
                    tag = %tag,
                    error = %e,
                    "Fallback handler failed"
                );
                Delivery::Failed
            }
        }
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}
