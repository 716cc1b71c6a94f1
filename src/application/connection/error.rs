//! Connection manager errors.

use thiserror::Error;

use crate::ports::TransportError;

/// Why an outbound message was not sent.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SendError {
    #[error("No open session")]
    NotOpen,

    #[error("Message could not be encoded: {0}")]
    Encode(String),

    #[error("Transport failed while sending: {0}")]
    Transport(#[from] TransportError),

    #[error("Connection manager has been shut down")]
    Stopped,
}

/// The manager's background task has ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Connection manager has been shut down")]
pub struct ManagerStopped;

impl From<ManagerStopped> for SendError {
    fn from(_: ManagerStopped) -> Self {
        SendError::Stopped
    }
}
