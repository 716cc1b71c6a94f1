//! Foundation module - Shared domain primitives.
//!
//! Contains value objects, identifiers, the state machine trait and the
//! validation error type used across the console-sync domain.

mod errors;
mod ids;
mod state_machine;
mod timestamp;

pub use errors::ValidationError;
pub use ids::SessionId;
pub use state_machine::StateMachine;
pub use timestamp::Timestamp;
