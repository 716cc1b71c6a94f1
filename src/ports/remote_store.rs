//! RemoteStore port - the single authoritative data source.

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::domain::cache::Filters;
use crate::domain::policy::Action;

/// Remote call failures.
///
/// `Clone` so a single in-flight fetch can hand the same outcome to every
/// waiting caller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RemoteError {
    #[error("Remote store unreachable: {0}")]
    Network(String),

    #[error("Remote store responded {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Remote response could not be decoded: {0}")]
    Decode(String),
}

impl RemoteError {
    /// Returns true for failures worth retrying.
    pub fn is_transient(&self) -> bool {
        match self {
            RemoteError::Network(_) => true,
            RemoteError::Status { status, .. } => *status == 429 || *status >= 500,
            RemoteError::Decode(_) => false,
        }
    }
}

/// Reads and writes resources on the remote store.
///
/// Both operations are safe for callers to retry.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Fetches a resource; `Ok(None)` means the remote has nothing for it.
    async fn fetch(&self, resource: &str, filters: &Filters) -> Result<Option<Value>, RemoteError>;

    /// Applies a mutation to a resource and returns the remote's result.
    ///
    /// `action` is never `Action::Read`.
    async fn mutate(
        &self,
        resource: &str,
        action: Action,
        patch: &Value,
    ) -> Result<Value, RemoteError>;
}
