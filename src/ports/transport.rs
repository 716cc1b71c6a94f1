//! Transport port - one bidirectional session of text frames.
//!
//! The connection manager is the only caller. It owns the session returned
//! by [`Transport::connect`] exclusively; nothing else writes to or closes
//! it.

use async_trait::async_trait;
use thiserror::Error;
use url::Url;

/// Errors raised by a transport.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Connection attempt timed out")]
    Timeout,

    #[error("Session is closed")]
    Closed,
}

/// Opens sessions to an endpoint.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Opens a new session. Completing the handshake is the open signal.
    async fn connect(&self, endpoint: &Url) -> Result<Box<dyn TransportSession>, TransportError>;
}

/// A live session.
#[async_trait]
pub trait TransportSession: Send {
    /// Sends one text frame.
    async fn send(&mut self, frame: String) -> Result<(), TransportError>;

    /// Receives the next text frame.
    ///
    /// Returns `None` once the remote side has closed the session. Must be
    /// cancel-safe: dropping the future before it completes loses no frame.
    async fn recv(&mut self) -> Option<Result<String, TransportError>>;

    /// Closes the session gracefully.
    async fn close(&mut self) -> Result<(), TransportError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[allow(dead_code)]
    fn assert_transport_object_safe(_: &dyn Transport) {}

    #[allow(dead_code)]
    fn assert_session_object_safe(_: &dyn TransportSession) {}

    #[test]
    fn error_messages() {
        assert_eq!(TransportError::Timeout.to_string(), "Connection attempt timed out");
        assert_eq!(
            TransportError::ConnectionFailed("refused".into()).to_string(),
            "Connection failed: refused"
        );
    }
}
