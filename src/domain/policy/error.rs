//! Policy construction errors.

use thiserror::Error;

/// Reasons a policy table is rejected at construction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PolicyError {
    #[error("Role name cannot be empty")]
    EmptyRole,

    #[error("Resource name cannot be empty (role '{role}')")]
    EmptyResource { role: String },

    #[error("Role '{role}' has wildcard value '{value}', expected '*'")]
    InvalidWildcard { role: String, value: String },

    #[error("Role '{role}' grants a wildcard resource with restricted actions; use '*' for both")]
    AmbiguousWildcard { role: String },

    #[error("Unknown action '{verb}' for role '{role}' on '{resource}'")]
    UnknownAction {
        role: String,
        resource: String,
        verb: String,
    },

    #[error("Role '{role}' lists no actions for '{resource}'")]
    EmptyActions { role: String, resource: String },

    #[error("Policy document could not be parsed: {0}")]
    Parse(String),

    #[error("Policy file '{path}' could not be read: {message}")]
    Io { path: String, message: String },
}
