//! State machine trait for status enums.
//!
//! Provides a consistent interface for validating and performing state
//! transitions, used by the connection lifecycle.

use super::ValidationError;

/// Trait for status enums that represent state machines.
///
/// Implementors define valid state transitions and get validated
/// transition methods for free.
///
/// # Example
///
/// ```ignore
/// let next = ConnectionState::Disconnected.transition_to(ConnectionState::Connecting)?;
/// ```
pub trait StateMachine: Sized + Copy + PartialEq + std::fmt::Debug {
    /// Returns true if transition from self to target is valid.
    fn can_transition_to(&self, target: &Self) -> bool;

    /// Returns all valid target states from current state.
    fn valid_transitions(&self) -> Vec<Self>;

    /// Performs transition with validation, returning error if invalid.
    fn transition_to(&self, target: Self) -> Result<Self, ValidationError> {
        if self.can_transition_to(&target) {
            Ok(target)
        } else {
            Err(ValidationError::invalid_format(
                "state_transition",
                format!("Cannot transition from {:?} to {:?}", self, target),
            ))
        }
    }

    /// Checks if current state is terminal (no valid outgoing transitions).
    fn is_terminal(&self) -> bool {
        self.valid_transitions().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Door {
        Shut,
        Ajar,
        Gone,
    }

    impl StateMachine for Door {
        fn can_transition_to(&self, target: &Self) -> bool {
            self.valid_transitions().contains(target)
        }

        fn valid_transitions(&self) -> Vec<Self> {
            match self {
                Door::Shut => vec![Door::Ajar],
                Door::Ajar => vec![Door::Shut, Door::Gone],
                Door::Gone => vec![],
            }
        }
    }

    #[test]
    fn transition_to_succeeds_for_valid_transition() {
        assert_eq!(Door::Shut.transition_to(Door::Ajar), Ok(Door::Ajar));
    }

    #[test]
    fn transition_to_fails_for_invalid_transition() {
        let err = Door::Shut.transition_to(Door::Gone).unwrap_err();
        assert!(err.to_string().contains("Cannot transition from Shut to Gone"));
    }

    #[test]
    fn is_terminal_only_without_outgoing_edges() {
        assert!(Door::Gone.is_terminal());
        assert!(!Door::Ajar.is_terminal());
    }
}
