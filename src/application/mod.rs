//! Application layer - orchestration over the ports.
//!
//! - [`connection`] - reconnecting live connection and message dispatch
//! - [`shaping`] - debounce and throttled batching
//! - [`data_access`] - policy-gated, cache-fronted remote reads and writes
//! - [`invalidation`] / [`alerts`] - handlers wiring pushed events to the
//!   cache and the notifier

pub mod alerts;
pub mod connection;
pub mod data_access;
pub mod invalidation;
pub mod shaping;

pub use alerts::{AlertRouter, NotifyingObserver};
pub use connection::{ConnectionManager, KeepalivePolicy, RetryPolicy, SendError};
pub use data_access::{DataAccessError, DataAccessFacade, DebouncedSearch, FacadeOptions, TtlPolicy};
pub use invalidation::InvalidationRouter;
