//! In-memory transport for tests and offline development.
//!
//! `InMemoryTransport` hands out channel-backed sessions. Every accepted
//! session surfaces on the paired [`InMemoryServer`] as an [`InMemoryPeer`],
//! which plays the server side: push frames, read what the client sent,
//! inject errors, or hang up.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::mpsc;
use url::Url;

use crate::ports::{Transport, TransportError, TransportSession};

/// What the next connection attempt does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectOutcome {
    /// Handshake succeeds; a peer is handed to the server.
    Accept,
    /// Handshake fails with the given reason.
    Refuse(String),
    /// Handshake never completes.
    Hang,
}

struct Inner {
    script: Mutex<VecDeque<ConnectOutcome>>,
    fallback: Mutex<ConnectOutcome>,
    attempts: AtomicU32,
    endpoints: Mutex<Vec<Url>>,
    accepted: mpsc::UnboundedSender<InMemoryPeer>,
}

/// Client half of the in-memory transport.
#[derive(Clone)]
pub struct InMemoryTransport {
    inner: Arc<Inner>,
}

impl InMemoryTransport {
    /// Creates a transport that accepts every connection by default.
    pub fn new() -> (Self, InMemoryServer) {
        let (accepted, incoming) = mpsc::unbounded_channel();
        let transport = Self {
            inner: Arc::new(Inner {
                script: Mutex::new(VecDeque::new()),
                fallback: Mutex::new(ConnectOutcome::Accept),
                attempts: AtomicU32::new(0),
                endpoints: Mutex::new(Vec::new()),
                accepted,
            }),
        };
        (transport, InMemoryServer { incoming })
    }

    /// Queues an outcome for the next unscripted attempt.
    pub fn push_outcome(&self, outcome: ConnectOutcome) {
        self.inner.script.lock().push_back(outcome);
    }

    /// Fails the next `count` attempts.
    pub fn fail_next(&self, count: usize, reason: &str) {
        let mut script = self.inner.script.lock();
        for _ in 0..count {
            script.push_back(ConnectOutcome::Refuse(reason.to_string()));
        }
    }

    /// Sets the outcome used once the script is exhausted.
    pub fn set_fallback(&self, outcome: ConnectOutcome) {
        *self.inner.fallback.lock() = outcome;
    }

    /// Refuses every attempt from now on.
    pub fn refuse_all(&self, reason: &str) {
        self.inner.script.lock().clear();
        self.set_fallback(ConnectOutcome::Refuse(reason.to_string()));
    }

    /// Accepts every attempt from now on.
    pub fn accept_all(&self) {
        self.inner.script.lock().clear();
        self.set_fallback(ConnectOutcome::Accept);
    }

    /// Number of connection attempts made so far.
    pub fn attempts(&self) -> u32 {
        self.inner.attempts.load(Ordering::SeqCst)
    }

    /// Endpoints passed to `connect`, in order.
    pub fn endpoints(&self) -> Vec<Url> {
        self.inner.endpoints.lock().clone()
    }

    fn next_outcome(&self) -> ConnectOutcome {
        self.inner
            .script
            .lock()
            .pop_front()
            .unwrap_or_else(|| self.inner.fallback.lock().clone())
    }
}

#[async_trait]
impl Transport for InMemoryTransport {
    async fn connect(&self, endpoint: &Url) -> Result<Box<dyn TransportSession>, TransportError> {
        self.inner.attempts.fetch_add(1, Ordering::SeqCst);
        self.inner.endpoints.lock().push(endpoint.clone());

        match self.next_outcome() {
            ConnectOutcome::Accept => {
                let (to_client, inbound) = mpsc::unbounded_channel();
                let (outbound, from_client) = mpsc::unbounded_channel();
                let peer = InMemoryPeer {
                    to_client,
                    from_client,
                };
                self.inner
                    .accepted
                    .send(peer)
                    .map_err(|_| TransportError::ConnectionFailed("server is gone".to_string()))?;
                Ok(Box::new(InMemorySession {
                    inbound,
                    outbound: Some(outbound),
                }))
            }
            ConnectOutcome::Refuse(reason) => Err(TransportError::ConnectionFailed(reason)),
            ConnectOutcome::Hang => futures::future::pending().await,
        }
    }
}

/// Server half: yields one peer per accepted connection.
pub struct InMemoryServer {
    incoming: mpsc::UnboundedReceiver<InMemoryPeer>,
}

impl InMemoryServer {
    /// Waits for the next accepted connection.
    pub async fn accept(&mut self) -> Option<InMemoryPeer> {
        self.incoming.recv().await
    }

    /// Returns an already-accepted connection, if any.
    pub fn try_accept(&mut self) -> Option<InMemoryPeer> {
        self.incoming.try_recv().ok()
    }
}

/// Server side of one accepted session.
///
/// Dropping the peer closes the session from the server side.
pub struct InMemoryPeer {
    to_client: mpsc::UnboundedSender<Result<String, TransportError>>,
    from_client: mpsc::UnboundedReceiver<String>,
}

impl InMemoryPeer {
    /// Pushes a raw text frame. Returns false if the client is gone.
    pub fn send(&self, frame: impl Into<String>) -> bool {
        self.to_client.send(Ok(frame.into())).is_ok()
    }

    /// Pushes a JSON value as a text frame.
    pub fn send_json(&self, value: &Value) -> bool {
        self.send(value.to_string())
    }

    /// Surfaces a transport error on the client's next receive.
    pub fn error(&self, error: TransportError) -> bool {
        self.to_client.send(Err(error)).is_ok()
    }

    /// Waits for the next frame the client sent; `None` once it closed.
    pub async fn recv(&mut self) -> Option<String> {
        self.from_client.recv().await
    }

    /// Waits for the next frame and decodes it as JSON.
    pub async fn recv_json(&mut self) -> Option<Value> {
        let frame = self.recv().await?;
        serde_json::from_str(&frame).ok()
    }

    /// Returns a frame the client already sent, if any.
    pub fn try_recv(&mut self) -> Option<String> {
        self.from_client.try_recv().ok()
    }

    /// Hangs up.
    pub fn close(self) {}
}

struct InMemorySession {
    inbound: mpsc::UnboundedReceiver<Result<String, TransportError>>,
    outbound: Option<mpsc::UnboundedSender<String>>,
}

#[async_trait]
impl TransportSession for InMemorySession {
    async fn send(&mut self, frame: String) -> Result<(), TransportError> {
        let outbound = self.outbound.as_ref().ok_or(TransportError::Closed)?;
        outbound.send(frame).map_err(|_| TransportError::Closed)
    }

    async fn recv(&mut self) -> Option<Result<String, TransportError>> {
        self.inbound.recv().await
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        self.outbound = None;
        self.inbound.close();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn endpoint() -> Url {
        Url::parse("ws://localhost:8080/ws").unwrap()
    }

    #[tokio::test]
    async fn accepted_session_exchanges_frames() {
        let (transport, mut server) = InMemoryTransport::new();
        let mut session = transport.connect(&endpoint()).await.unwrap();
        let mut peer = server.accept().await.unwrap();

        session.send("hello".to_string()).await.unwrap();
        assert_eq!(peer.recv().await.as_deref(), Some("hello"));

        assert!(peer.send("world"));
        assert_eq!(session.recv().await, Some(Ok("world".to_string())));
    }

    #[tokio::test]
    async fn scripted_failures_then_fallback() {
        let (transport, mut server) = InMemoryTransport::new();
        transport.fail_next(2, "refused");

        assert!(transport.connect(&endpoint()).await.is_err());
        assert!(transport.connect(&endpoint()).await.is_err());
        assert!(transport.connect(&endpoint()).await.is_ok());
        assert_eq!(transport.attempts(), 3);
        assert!(server.try_accept().is_some());
    }

    #[tokio::test]
    async fn refuse_all_reports_reason() {
        let (transport, _server) = InMemoryTransport::new();
        transport.refuse_all("server down");

        let result = transport.connect(&endpoint()).await;
        assert_eq!(
            result.err(),
            Some(TransportError::ConnectionFailed("server down".to_string()))
        );
    }

    #[tokio::test]
    async fn dropping_peer_ends_client_stream() {
        let (transport, mut server) = InMemoryTransport::new();
        let mut session = transport.connect(&endpoint()).await.unwrap();
        let peer = server.accept().await.unwrap();

        peer.close();
        assert!(session.recv().await.is_none());
    }

    #[tokio::test]
    async fn closing_session_is_seen_by_peer() {
        let (transport, mut server) = InMemoryTransport::new();
        let mut session = transport.connect(&endpoint()).await.unwrap();
        let mut peer = server.accept().await.unwrap();

        session.close().await.unwrap();
        assert!(peer.recv().await.is_none());
        assert_eq!(session.send("late".into()).await, Err(TransportError::Closed));
    }

    #[tokio::test(start_paused = true)]
    async fn hang_never_completes() {
        let (transport, _server) = InMemoryTransport::new();
        transport.push_outcome(ConnectOutcome::Hang);

        let result = tokio::time::timeout(
            std::time::Duration::from_secs(60),
            transport.connect(&endpoint()),
        )
        .await;
        assert!(result.is_err());
    }
}
