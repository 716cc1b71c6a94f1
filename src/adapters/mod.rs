//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the client core to concrete infrastructure:
//! - `cache` - In-memory TTL cache store
//! - `websocket` - WebSocket transport (tokio-tungstenite) and an in-memory transport
//! - `http` - HTTP remote store (reqwest)
//! - `notify` - Notification sinks

pub mod cache;
pub mod http;
pub mod notify;
pub mod websocket;

pub use cache::TtlCache;
pub use http::{HttpRemoteConfig, HttpRemoteStore};
pub use notify::{InMemoryNotifier, TracingNotifier};
pub use websocket::{
    ConnectOutcome, InMemoryPeer, InMemoryServer, InMemoryTransport, WebSocketTransport,
};
