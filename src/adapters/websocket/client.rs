//! WebSocket client transport built on tokio-tungstenite.

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use secrecy::{ExposeSecret, SecretString};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::{header, HeaderValue};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use url::Url;

use crate::ports::{Transport, TransportError, TransportSession};

/// Opens WebSocket sessions, optionally authenticating with a bearer token.
#[derive(Clone, Default)]
pub struct WebSocketTransport {
    auth_token: Option<SecretString>,
}

impl WebSocketTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sends `Authorization: Bearer <token>` with the upgrade request.
    pub fn with_auth_token(mut self, token: SecretString) -> Self {
        self.auth_token = Some(token);
        self
    }
}

impl std::fmt::Debug for WebSocketTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebSocketTransport")
            .field("authenticated", &self.auth_token.is_some())
            .finish()
    }
}

#[async_trait]
impl Transport for WebSocketTransport {
    async fn connect(&self, endpoint: &Url) -> Result<Box<dyn TransportSession>, TransportError> {
        let mut request = endpoint
            .as_str()
            .into_client_request()
            .map_err(|e| TransportError::ConnectionFailed(e.to_string()))?;

        if let Some(token) = &self.auth_token {
            let value = HeaderValue::from_str(&format!("Bearer {}", token.expose_secret()))
                .map_err(|e| TransportError::ConnectionFailed(e.to_string()))?;
            request.headers_mut().insert(header::AUTHORIZATION, value);
        }

        let (stream, response) = tokio_tungstenite::connect_async(request)
            .await
            .map_err(|e| TransportError::ConnectionFailed(e.to_string()))?;

        tracing::debug!(
            endpoint = %endpoint,
            status = %response.status(),
            "WebSocket handshake complete"
        );

        Ok(Box::new(WebSocketSession { stream }))
    }
}

/// One open WebSocket connection.
struct WebSocketSession {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

#[async_trait]
impl TransportSession for WebSocketSession {
    async fn send(&mut self, frame: String) -> Result<(), TransportError> {
        self.stream
            .send(Message::Text(frame))
            .await
            .map_err(|e| TransportError::ConnectionFailed(e.to_string()))
    }

    async fn recv(&mut self) -> Option<Result<String, TransportError>> {
        loop {
            let message = match self.stream.next().await? {
                Ok(message) => message,
                Err(e) => return Some(Err(TransportError::ConnectionFailed(e.to_string()))),
            };

            match message {
                Message::Text(text) => return Some(Ok(text)),
                Message::Binary(bytes) => match String::from_utf8(bytes) {
                    Ok(text) => return Some(Ok(text)),
                    Err(e) => {
                        tracing::warn!(
                            len = e.as_bytes().len(),
                            "Dropping binary frame that is not UTF-8"
                        );
                        continue;
                    }
                },
                Message::Close(frame) => {
                    tracing::debug!(?frame, "Server sent close frame");
                    return None;
                }
                // Protocol-level ping/pong are answered by tungstenite itself.
                Message::Ping(_) | Message::Pong(_) | Message::Frame(_) => continue,
            }
        }
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        self.stream
            .close(None)
            .await
            .map_err(|e| TransportError::ConnectionFailed(e.to_string()))
    }
}
