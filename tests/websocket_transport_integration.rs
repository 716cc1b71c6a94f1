//! Integration tests for the WebSocket transport against a live axum server.
//!
//! Each test binds an ephemeral port on localhost, so no external service
//! is needed.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::http::HeaderMap;
use axum::response::Response;
use axum::routing::get;
use axum::Router;
use secrecy::SecretString;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use url::Url;

use console_sync::adapters::WebSocketTransport;
use console_sync::application::ConnectionManager;
use console_sync::ports::Transport;

// =============================================================================
// Test Server
// =============================================================================

/// Starts a server whose `/ws` route runs `session` for each connection and
/// reports the upgrade request's `Authorization` header.
async fn serve<F, Fut>(session: F) -> (Url, mpsc::UnboundedReceiver<Option<String>>)
where
    F: Fn(WebSocket) -> Fut + Clone + Send + Sync + 'static,
    Fut: std::future::Future<Output = ()> + Send + 'static,
{
    let (auth_tx, auth_rx) = mpsc::unbounded_channel();
    let app = Router::new().route(
        "/ws",
        get(move |ws: WebSocketUpgrade, headers: HeaderMap| {
            let session = session.clone();
            let auth_tx = auth_tx.clone();
            async move {
                let auth = headers
                    .get("authorization")
                    .and_then(|value| value.to_str().ok())
                    .map(str::to_string);
                let _ = auth_tx.send(auth);
                let response: Response = ws.on_upgrade(session);
                response
            }
        }),
    );

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (Url::parse(&format!("ws://{addr}/ws")).unwrap(), auth_rx)
}

async fn echo(mut socket: WebSocket) {
    while let Some(Ok(message)) = socket.recv().await {
        match message {
            Message::Text(text) => {
                if socket.send(Message::Text(format!("echo:{text}"))).await.is_err() {
                    break;
                }
            }
            Message::Close(_) => break,
            _ => {}
        }
    }
}

// =============================================================================
// Transport
// =============================================================================

#[tokio::test]
async fn text_frames_round_trip() {
    let (url, _auth) = serve(echo).await;
    let transport = WebSocketTransport::new();

    let mut session = transport.connect(&url).await.unwrap();
    session.send("hello".to_string()).await.unwrap();

    let reply = session.recv().await.unwrap().unwrap();
    assert_eq!(reply, "echo:hello");
    let _ = session.close().await;
}

#[tokio::test]
async fn auth_token_is_sent_as_bearer() {
    let (url, mut auth) = serve(echo).await;
    let transport = WebSocketTransport::new().with_auth_token(SecretString::new("s3cret".into()));

    let _session = transport.connect(&url).await.unwrap();

    assert_eq!(auth.recv().await.unwrap().as_deref(), Some("Bearer s3cret"));
}

#[tokio::test]
async fn no_token_means_no_header() {
    let (url, mut auth) = serve(echo).await;

    let _session = WebSocketTransport::new().connect(&url).await.unwrap();

    assert_eq!(auth.recv().await.unwrap(), None);
}

#[tokio::test]
async fn server_close_ends_the_stream() {
    let (url, _auth) = serve(|mut socket: WebSocket| async move {
        let _ = socket.send(Message::Text("bye".to_string())).await;
        let _ = socket.send(Message::Close(None)).await;
    })
    .await;

    let mut session = WebSocketTransport::new().connect(&url).await.unwrap();

    assert_eq!(session.recv().await.unwrap().unwrap(), "bye");
    let next = tokio::time::timeout(Duration::from_secs(5), session.recv())
        .await
        .unwrap();
    assert!(next.is_none() || matches!(next, Some(Err(_))));
}

#[tokio::test]
async fn undecodable_binary_frame_is_skipped() {
    let (url, _auth) = serve(|mut socket: WebSocket| async move {
        let _ = socket.send(Message::Binary(vec![0xff, 0xfe, 0x00])).await;
        let _ = socket.send(Message::Binary(br#"{"type":"pong"}"#.to_vec())).await;
        while let Some(Ok(_)) = socket.recv().await {}
    })
    .await;

    let mut session = WebSocketTransport::new().connect(&url).await.unwrap();

    let next = tokio::time::timeout(Duration::from_secs(5), session.recv())
        .await
        .unwrap();
    assert_eq!(next.unwrap().unwrap(), r#"{"type":"pong"}"#);
    let _ = session.close().await;
}

// =============================================================================
// Connection manager over a real socket
// =============================================================================

#[tokio::test]
async fn manager_subscribes_over_websocket() {
    let (frames_tx, mut frames_rx) = mpsc::unbounded_channel::<String>();
    let (url, _auth) = serve(move |mut socket: WebSocket| {
        let frames_tx = frames_tx.clone();
        async move {
            while let Some(Ok(Message::Text(text))) = socket.recv().await {
                let _ = frames_tx.send(text);
            }
        }
    })
    .await;

    let manager = ConnectionManager::builder(Arc::new(WebSocketTransport::new()), url)
        .subscribe("dashboard")
        .build();
    manager.connect().unwrap();

    let frame = tokio::time::timeout(Duration::from_secs(5), frames_rx.recv())
        .await
        .unwrap()
        .unwrap();
    let value: Value = serde_json::from_str(&frame).unwrap();
    assert_eq!(value["type"], "subscribe");
    assert_eq!(value["data"]["channel"], "dashboard");
    assert!(manager.snapshot().is_open());

    manager.shutdown().await;
}
