//! State machine trait for lifecycle status enums.
//!
//! Gives every status enum the same validated-transition interface so
//! aggregates never assign a state without checking the edge first.

use super::{DomainError, ErrorCode};

/// Trait for status enums that represent state machines.
///
/// Implementors define the legal edges; validated transitions and the
/// terminal check come for free.
///
/// # Example
///
/// ```ignore
/// impl StateMachine for ClauseNegotiationState {
///     fn valid_transitions(&self) -> Vec<Self> {
///         match self {
///             Unopened => vec![InNegotiation, Withdrawn],
///             // ...
///         }
///     }
/// }
///
/// let next = current.transition_to(ClauseNegotiationState::Accepted)?;
/// ```
pub trait StateMachine: Sized + Copy + PartialEq + std::fmt::Debug {
    /// Returns all valid target states from current state.
    fn valid_transitions(&self) -> Vec<Self>;

    /// Returns true if transition from self to target is valid.
    fn can_transition_to(&self, target: &Self) -> bool {
        self.valid_transitions().contains(target)
    }

    /// Performs transition with validation, returning error if invalid.
    fn transition_to(&self, target: Self) -> Result<Self, DomainError> {
        if self.can_transition_to(&target) {
            Ok(target)
        } else {
            Err(DomainError::new(
                ErrorCode::InvalidStateTransition,
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
    enum Light {
        Red,
        Green,
        Off,
    }

    impl StateMachine for Light {
        fn valid_transitions(&self) -> Vec<Self> {
            match self {
                Light::Red => vec![Light::Green, Light::Off],
                Light::Green => vec![Light::Red, Light::Off],
                Light::Off => vec![],
            }
        }
    }

    #[test]
    fn transition_to_succeeds_for_valid_edge() {
        assert_eq!(Light::Red.transition_to(Light::Green), Ok(Light::Green));
    }

    #[test]
    fn transition_to_fails_with_invalid_transition_code() {
        let err = Light::Off.transition_to(Light::Red).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidStateTransition);
    }

    #[test]
    fn terminal_means_no_outgoing_edges() {
        assert!(Light::Off.is_terminal());
        assert!(!Light::Red.is_terminal());
    }
}
