//! Data access errors.

use thiserror::Error;

use crate::domain::policy::{AccessDeniedReason, Action};
use crate::ports::RemoteError;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DataAccessError {
    /// The policy table does not allow the request. Nothing was read or
    /// written.
    #[error("Access denied: {0}")]
    Denied(AccessDeniedReason),

    #[error(transparent)]
    Remote(#[from] RemoteError),

    #[error("'{0}' does not change remote state")]
    NotAMutation(Action),
}

impl DataAccessError {
    pub fn is_denied(&self) -> bool {
        matches!(self, DataAccessError::Denied(_))
    }
}

impl From<AccessDeniedReason> for DataAccessError {
    fn from(reason: AccessDeniedReason) -> Self {
        DataAccessError::Denied(reason)
    }
}
