//! HTTP adapters.
//!
//! - [`remote_store`] - `RemoteStore` over a JSON REST API (reqwest)

pub mod remote_store;

pub use remote_store::{HttpRemoteConfig, HttpRemoteStore};
