//! Clause negotiation state machine.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::{OutcomeKind, ProposalOutcome};
use crate::domain::foundation::StateMachine;

/// Negotiation state of the clause a session covers.
///
/// ```text
/// Unopened ──first turn──> InNegotiation ──accepted──> Accepted
///     │                        │  ▲  │
///     │                        │  └──┘ countered / rejected with counter-terms
///     │                        └──────rejected──────> Rejected
///     └──────────withdraw (from any non-terminal)───> Withdrawn
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ClauseNegotiationState {
    #[default]
    Unopened,
    InNegotiation,
    Accepted,
    Rejected,
    Withdrawn,
}

impl ClauseNegotiationState {
    /// Returns true while the session still accepts turns or withdrawal.
    pub fn is_active(&self) -> bool {
        !self.is_terminal()
    }

    /// State reached after committing a turn with the given outcome.
    ///
    /// Assumes the session is already `InNegotiation`; callers open it first.
    pub fn after_outcome(&self, outcome: &ProposalOutcome) -> ClauseNegotiationState {
        use ClauseNegotiationState::*;
        match outcome.kind() {
            OutcomeKind::Accepted => Accepted,
            OutcomeKind::Rejected if outcome.counter_terms().is_none() => Rejected,
            OutcomeKind::Rejected | OutcomeKind::Countered => InNegotiation,
        }
    }
}

impl StateMachine for ClauseNegotiationState {
    fn valid_transitions(&self) -> Vec<Self> {
        use ClauseNegotiationState::*;
        match self {
            Unopened => vec![InNegotiation, Withdrawn],
            InNegotiation => vec![Accepted, Rejected, Withdrawn],
            Accepted | Rejected | Withdrawn => vec![],
        }
    }
}

impl fmt::Display for ClauseNegotiationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ClauseNegotiationState::Unopened => "Unopened",
            ClauseNegotiationState::InNegotiation => "InNegotiation",
            ClauseNegotiationState::Accepted => "Accepted",
            ClauseNegotiationState::Rejected => "Rejected",
            ClauseNegotiationState::Withdrawn => "Withdrawn",
        };
        write!(f, "{}", s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ClauseNegotiationState::*;

    fn outcome(kind: OutcomeKind, counter: Option<&str>) -> ProposalOutcome {
        ProposalOutcome::new(kind, "because", counter.map(String::from)).unwrap()
    }

    #[test]
    fn default_is_unopened() {
        assert_eq!(ClauseNegotiationState::default(), Unopened);
    }

    #[test]
    fn terminal_states_have_no_transitions() {
        for state in [Accepted, Rejected, Withdrawn] {
            assert!(state.is_terminal());
            assert!(!state.is_active());
            assert!(state.transition_to(InNegotiation).is_err());
        }
    }

    #[test]
    fn withdraw_allowed_from_every_non_terminal_state() {
        assert!(Unopened.can_transition_to(&Withdrawn));
        assert!(InNegotiation.can_transition_to(&Withdrawn));
    }

    #[test]
    fn cannot_return_to_unopened() {
        assert!(!InNegotiation.can_transition_to(&Unopened));
    }

    #[test]
    fn unopened_must_open_before_concluding() {
        assert!(Unopened.can_transition_to(&InNegotiation));
        assert!(!Unopened.can_transition_to(&Accepted));
        assert!(!Unopened.can_transition_to(&Rejected));
    }

    #[test]
    fn accepted_outcome_ends_negotiation() {
        assert_eq!(
            InNegotiation.after_outcome(&outcome(OutcomeKind::Accepted, None)),
            Accepted
        );
    }

    #[test]
    fn countered_outcome_keeps_negotiating() {
        assert_eq!(
            InNegotiation.after_outcome(&outcome(OutcomeKind::Countered, Some("1.5 months"))),
            InNegotiation
        );
    }

    #[test]
    fn rejected_without_counter_is_terminal() {
        assert_eq!(
            InNegotiation.after_outcome(&outcome(OutcomeKind::Rejected, None)),
            Rejected
        );
    }

    #[test]
    fn rejected_with_counter_keeps_negotiating() {
        assert_eq!(
            InNegotiation.after_outcome(&outcome(OutcomeKind::Rejected, Some("3 weeks"))),
            InNegotiation
        );
    }

    #[test]
    fn display_works_correctly() {
        assert_eq!(InNegotiation.to_string(), "InNegotiation");
    }
}
