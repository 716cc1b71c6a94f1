//! Domain layer containing the pure types of the live data client.
//!
//! # Module Organization
//!
//! - `foundation` - Shared primitives (ids, timestamps, state machine, errors)
//! - `connection` - Connection lifecycle state and the wire message protocol
//! - `cache` - Cache entries, freshness and canonical cache keys
//! - `policy` - Role/resource/action access policy and its evaluator
//! - `notification` - Alert severities and how they are presented

pub mod cache;
pub mod connection;
pub mod foundation;
pub mod notification;
pub mod policy;
