//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the client core and the outside world. Adapters implement these ports.
//!
//! ## Transport Ports
//!
//! - `Transport` / `TransportSession` - Bidirectional text-frame session
//! - `MessageHandler` / `BatchHandler` - Consumers of decoded inbound messages
//! - `ConnectionObserver` - Lifecycle callbacks from the connection manager
//!
//! ## Data Ports
//!
//! - `RemoteStore` - The authoritative remote data source
//! - `CacheStore` - Synchronous keyed store with per-entry time-to-live
//!
//! ## Presentation Ports
//!
//! - `Notifier` - User-visible notification surface

mod cache_store;
mod connection_observer;
mod message_handler;
mod notifier;
mod remote_store;
mod transport;

pub use cache_store::CacheStore;
pub use connection_observer::{ConnectionObserver, NoopObserver};
pub use message_handler::{BatchHandler, HandlerError, MessageHandler};
pub use notifier::Notifier;
pub use remote_store::{RemoteError, RemoteStore};
pub use transport::{Transport, TransportError, TransportSession};
