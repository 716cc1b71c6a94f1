//! WebSocket transport adapters.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                     ConnectionManager                        │
//! │   owns exactly one Box<dyn TransportSession> at a time       │
//! └──────────────────────────────────────────────────────────────┘
//!                │ Transport::connect(endpoint)
//!                ▼
//! ┌─────────────────────────────┐   ┌────────────────────────────┐
//! │     WebSocketTransport      │   │    InMemoryTransport       │
//! │  tokio-tungstenite client   │   │  scripted, for tests/dev   │
//! └─────────────────────────────┘   └────────────────────────────┘
//! ```
//!
//! # Components
//!
//! - [`client`] - Real WebSocket client sessions
//! - [`in_memory`] - Channel-backed sessions with a scriptable server end

pub mod client;
pub mod in_memory;

pub use client::WebSocketTransport;
pub use in_memory::{ConnectOutcome, InMemoryPeer, InMemoryServer, InMemoryTransport};
