//! Console Sync - live data client for the agent console
//!
//! Keeps locally held views of server state fresh over an unreliable
//! network: a reconnecting event stream, a TTL cache in front of the
//! remote store, rate shapers for event storms, and a deny-by-default
//! access policy.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
pub mod telemetry;
