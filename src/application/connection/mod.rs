//! Live connection management.
//!
//! - [`ConnectionManager`] - reconnecting, keepalive-probed session with
//!   typed dispatch to handlers
//! - [`Dispatcher`] - tag-based routing used by the manager
//! - [`RetryPolicy`] / [`KeepalivePolicy`] - timing knobs

mod dispatcher;
mod error;
mod manager;
mod policy;

pub use dispatcher::{Delivery, Dispatcher};
pub use error::{ManagerStopped, SendError};
pub use manager::{ConnectionManager, ConnectionManagerBuilder};
pub use policy::{KeepalivePolicy, RetryPolicy};
