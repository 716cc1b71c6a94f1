//! Connection lifecycle state.

use serde::Serialize;
use std::fmt;

use crate::domain::foundation::{SessionId, StateMachine, Timestamp};

/// Lifecycle state of the managed transport session.
///
/// ```text
/// Disconnected --connect--> Connecting --handshake--> Open
///      ^                        |                      |
///      +------- failure --------+                      |
///      +-------------- error / remote close -----------+
///      +------------- Closing <---- shutdown ----------+
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Open,
    Closing,
}

impl ConnectionState {
    /// Returns true if frames can be sent right now.
    pub fn is_open(&self) -> bool {
        matches!(self, ConnectionState::Open)
    }

    /// Returns the lowercase label used in logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Open => "open",
            ConnectionState::Closing => "closing",
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl StateMachine for ConnectionState {
    fn can_transition_to(&self, target: &Self) -> bool {
        use ConnectionState::*;
        matches!(
            (self, target),
            (Disconnected, Connecting)
                | (Connecting, Open)
                | (Connecting, Disconnected)
                | (Open, Disconnected)
                | (Open, Closing)
                | (Closing, Disconnected)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use ConnectionState::*;
        match self {
            Disconnected => vec![Connecting],
            Connecting => vec![Open, Disconnected],
            Open => vec![Disconnected, Closing],
            Closing => vec![Disconnected],
        }
    }
}

/// Point-in-time view of the connection, published on every change.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionSnapshot {
    pub state: ConnectionState,
    /// Consecutive failed connect attempts since the last successful open.
    pub retry_count: u32,
    pub last_error: Option<String>,
    pub session_id: Option<SessionId>,
    pub session_started_at: Option<Timestamp>,
    /// Set once reconnect attempts are exhausted; cleared by an explicit connect.
    pub connection_lost: bool,
}

impl ConnectionSnapshot {
    /// Returns true if the session is open.
    pub fn is_open(&self) -> bool {
        self.state.is_open()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn happy_path_transitions_are_valid() {
        let s = ConnectionState::Disconnected;
        let s = s.transition_to(ConnectionState::Connecting).unwrap();
        let s = s.transition_to(ConnectionState::Open).unwrap();
        let s = s.transition_to(ConnectionState::Closing).unwrap();
        assert_eq!(
            s.transition_to(ConnectionState::Disconnected),
            Ok(ConnectionState::Disconnected)
        );
    }

    #[test]
    fn cannot_open_without_connecting() {
        assert!(ConnectionState::Disconnected
            .transition_to(ConnectionState::Open)
            .is_err());
    }

    #[test]
    fn failed_attempt_returns_to_disconnected() {
        assert!(ConnectionState::Connecting.can_transition_to(&ConnectionState::Disconnected));
    }

    #[test]
    fn no_state_is_terminal() {
        for state in [
            ConnectionState::Disconnected,
            ConnectionState::Connecting,
            ConnectionState::Open,
            ConnectionState::Closing,
        ] {
            assert!(!state.is_terminal(), "{state} should have an exit");
        }
    }

    #[test]
    fn default_snapshot_is_disconnected() {
        let snapshot = ConnectionSnapshot::default();
        assert_eq!(snapshot.state, ConnectionState::Disconnected);
        assert_eq!(snapshot.retry_count, 0);
        assert!(!snapshot.is_open());
        assert!(!snapshot.connection_lost);
    }
}
