//! NegotiationSession aggregate.
//!
//! One session negotiates exactly one clause. Turns form an append-only log
//! whose sequence numbers are assigned at commit, so the log never has gaps.
//!
//! # Ownership
//!
//! The session references its clause by ID; the clause itself stays in the
//! clause store.

use serde::{Deserialize, Serialize};

use super::{
    AgreedChange, ClauseNegotiationState, ConflictReason, GroundingSnippet, NegotiationError,
    ProposalOutcome, StrategyTip, Turn,
};
use crate::domain::clause::Clause;
use crate::domain::foundation::{
    ClauseId, DocumentId, SessionId, StateMachine, Timestamp, TurnNumber,
};

/// Negotiation session aggregate.
///
/// # Invariants
///
/// - turn numbers are `1..=turns.len()` in order
/// - `state` never changes once terminal
/// - `finalized_at` is only set on a terminal session, and only once
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NegotiationSession {
    id: SessionId,
    clause_id: ClauseId,
    document_id: DocumentId,
    state: ClauseNegotiationState,
    turns: Vec<Turn>,
    reopened_from: Option<SessionId>,
    created_at: Timestamp,
    updated_at: Timestamp,
    finalized_at: Option<Timestamp>,
}

impl NegotiationSession {
    /// Opens a new session for a clause.
    ///
    /// # Errors
    ///
    /// - `Validation` if the clause is not negotiable
    pub fn open(clause: &Clause) -> Result<Self, NegotiationError> {
        if !clause.is_negotiable() {
            return Err(NegotiationError::validation(
                "clause_id",
                format!("clause {} is not negotiable", clause.id()),
            ));
        }

        let now = Timestamp::now();
        Ok(Self {
            id: SessionId::new(),
            clause_id: clause.id().clone(),
            document_id: clause.document_id().clone(),
            state: ClauseNegotiationState::Unopened,
            turns: Vec::new(),
            reopened_from: None,
            created_at: now,
            updated_at: now,
            finalized_at: None,
        })
    }

    /// Starts a new lineage for the same clause. The previous session is untouched.
    ///
    /// # Errors
    ///
    /// - `Conflict` if `previous` is not terminal
    pub fn reopen(previous: &NegotiationSession) -> Result<Self, NegotiationError> {
        if !previous.is_terminal() {
            return Err(NegotiationError::conflict(
                ConflictReason::SessionNotTerminal {
                    session_id: previous.id,
                    state: previous.state,
                },
            ));
        }

        let now = Timestamp::now();
        Ok(Self {
            id: SessionId::new(),
            clause_id: previous.clause_id.clone(),
            document_id: previous.document_id.clone(),
            state: ClauseNegotiationState::Unopened,
            turns: Vec::new(),
            reopened_from: Some(previous.id),
            created_at: now,
            updated_at: now,
            finalized_at: None,
        })
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Accessors
    // ─────────────────────────────────────────────────────────────────────────

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn clause_id(&self) -> &ClauseId {
        &self.clause_id
    }

    pub fn document_id(&self) -> &DocumentId {
        &self.document_id
    }

    pub fn state(&self) -> ClauseNegotiationState {
        self.state
    }

    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }

    /// Committed turns in sequence order.
    pub fn history(&self) -> &[Turn] {
        &self.turns
    }

    pub fn turn(&self, number: TurnNumber) -> Option<&Turn> {
        self.turns.get(number.value() as usize - 1)
    }

    pub fn last_turn(&self) -> Option<&Turn> {
        self.turns.last()
    }

    /// Number the next committed turn will receive.
    pub fn next_turn_number(&self) -> TurnNumber {
        self.turns
            .last()
            .map(|t| t.number().next())
            .unwrap_or(TurnNumber::FIRST)
    }

    pub fn reopened_from(&self) -> Option<&SessionId> {
        self.reopened_from.as_ref()
    }

    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }

    pub fn updated_at(&self) -> Timestamp {
        self.updated_at
    }

    pub fn finalized_at(&self) -> Option<Timestamp> {
        self.finalized_at
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Mutations
    // ─────────────────────────────────────────────────────────────────────────

    /// Fails with `Conflict` if the session is terminal.
    pub fn ensure_accepts_turns(&self) -> Result<(), NegotiationError> {
        if self.is_terminal() {
            return Err(NegotiationError::conflict(ConflictReason::SessionTerminal {
                session_id: self.id,
                state: self.state,
            }));
        }
        Ok(())
    }

    /// Appends a committed turn and applies its outcome to the state machine.
    ///
    /// # Errors
    ///
    /// - `Conflict` if the session is terminal
    pub fn record_turn(
        &mut self,
        proposal: String,
        outcome: ProposalOutcome,
        grounding: Vec<GroundingSnippet>,
    ) -> Result<&Turn, NegotiationError> {
        self.ensure_accepts_turns()?;

        if self.state == ClauseNegotiationState::Unopened {
            self.state = self
                .state
                .transition_to(ClauseNegotiationState::InNegotiation)?;
        }
        let next = self.state.after_outcome(&outcome);
        if next != self.state {
            self.state = self.state.transition_to(next)?;
        }

        let turn = Turn::commit(self.next_turn_number(), proposal, outcome, grounding);
        self.updated_at = turn.committed_at();
        self.turns.push(turn);

        // just pushed
        Ok(&self.turns[self.turns.len() - 1])
    }

    /// Fills the tip of an already-committed turn.
    ///
    /// Allowed on terminal sessions: the tip is advisory and leaves the
    /// outcome, rationale and state untouched.
    ///
    /// # Errors
    ///
    /// - `TurnNotFound` if the turn was never committed
    /// - `Conflict` if the turn already has a tip
    pub fn attach_tip(
        &mut self,
        number: TurnNumber,
        tip: StrategyTip,
    ) -> Result<(), NegotiationError> {
        let session_id = self.id;
        let turn = self
            .turns
            .get_mut(number.value() as usize - 1)
            .ok_or(NegotiationError::TurnNotFound {
                session_id,
                turn: number.value(),
            })?;

        if !turn.fill_tip(tip) {
            return Err(NegotiationError::conflict(
                ConflictReason::TipAlreadyAttached {
                    session_id,
                    turn: number.value(),
                },
            ));
        }
        self.updated_at = Timestamp::now();
        Ok(())
    }

    /// Abandons the negotiation.
    ///
    /// # Errors
    ///
    /// - `Conflict` if already terminal
    pub fn withdraw(&mut self) -> Result<(), NegotiationError> {
        self.ensure_accepts_turns()?;
        self.state = self
            .state
            .transition_to(ClauseNegotiationState::Withdrawn)?;
        self.updated_at = Timestamp::now();
        Ok(())
    }

    /// Records the finalization time on first call and returns the stored value after.
    ///
    /// # Errors
    ///
    /// - `Conflict` if the session is not terminal
    pub fn mark_finalized(&mut self) -> Result<Timestamp, NegotiationError> {
        if !self.is_terminal() {
            return Err(NegotiationError::conflict(
                ConflictReason::SessionNotTerminal {
                    session_id: self.id,
                    state: self.state,
                },
            ));
        }
        Ok(*self.finalized_at.get_or_insert_with(Timestamp::now))
    }

    /// Terms implied by the committed history. See [`AgreedChange::derive`].
    pub fn agreed_change(&self, clause: &Clause) -> AgreedChange {
        AgreedChange::derive(self, clause)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::clause::{RiskLabel, TextSpan};
    use crate::domain::foundation::ErrorCode;
    use crate::domain::negotiation::OutcomeKind;

    fn clause(negotiable: bool) -> Clause {
        let text = "Security deposit of 2 months.";
        Clause::new(
            ClauseId::new("deposit").unwrap(),
            DocumentId::new("lease").unwrap(),
            text,
            TextSpan::covering(text),
            RiskLabel::High,
            negotiable,
        )
        .unwrap()
    }

    fn countered(terms: &str) -> ProposalOutcome {
        ProposalOutcome::countered("market rate", terms).unwrap()
    }

    fn tip(text: &str) -> StrategyTip {
        StrategyTip::new(text).unwrap()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Opening
    // ─────────────────────────────────────────────────────────────────────────

    #[test]
    fn open_starts_unopened_with_empty_history() {
        let session = NegotiationSession::open(&clause(true)).unwrap();
        assert_eq!(session.state(), ClauseNegotiationState::Unopened);
        assert!(session.history().is_empty());
        assert_eq!(session.next_turn_number(), TurnNumber::FIRST);
        assert_eq!(session.document_id().as_str(), "lease");
    }

    #[test]
    fn open_rejects_non_negotiable_clause() {
        let err = NegotiationSession::open(&clause(false)).unwrap_err();
        assert_eq!(err.code(), ErrorCode::ValidationFailed);
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Turns
    // ─────────────────────────────────────────────────────────────────────────

    #[test]
    fn first_turn_opens_negotiation() {
        let mut session = NegotiationSession::open(&clause(true)).unwrap();
        let turn = session
            .record_turn("one month".into(), countered("1.5 months"), vec![])
            .unwrap();
        assert_eq!(turn.number(), TurnNumber::FIRST);
        assert_eq!(session.state(), ClauseNegotiationState::InNegotiation);
    }

    #[test]
    fn accepted_on_first_turn_passes_through_in_negotiation() {
        let mut session = NegotiationSession::open(&clause(true)).unwrap();
        session
            .record_turn("one month".into(), ProposalOutcome::accepted("ok"), vec![])
            .unwrap();
        assert_eq!(session.state(), ClauseNegotiationState::Accepted);
    }

    #[test]
    fn turn_numbers_are_contiguous() {
        let mut session = NegotiationSession::open(&clause(true)).unwrap();
        for i in 0..4 {
            session
                .record_turn(format!("offer {}", i), countered("1.5 months"), vec![])
                .unwrap();
        }
        let numbers: Vec<u32> = session.history().iter().map(|t| t.number().value()).collect();
        assert_eq!(numbers, vec![1, 2, 3, 4]);
        assert_eq!(session.next_turn_number().value(), 5);
    }

    #[test]
    fn terminal_session_rejects_turns_and_keeps_history() {
        let mut session = NegotiationSession::open(&clause(true)).unwrap();
        session
            .record_turn("one month".into(), ProposalOutcome::rejected("no"), vec![])
            .unwrap();
        assert_eq!(session.state(), ClauseNegotiationState::Rejected);

        let before = session.clone();
        let err = session
            .record_turn("please".into(), ProposalOutcome::accepted("ok"), vec![])
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::SessionTerminal);
        assert_eq!(session, before);
    }

    #[test]
    fn grounding_is_kept_on_turn() {
        let mut session = NegotiationSession::open(&clause(true)).unwrap();
        let snippet = GroundingSnippet::new("statute", "Deposits are capped at 1 month.", 0.9);
        let turn = session
            .record_turn("one month".into(), countered("1.5 months"), vec![snippet.clone()])
            .unwrap();
        assert_eq!(turn.grounding(), &[snippet]);
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Tips
    // ─────────────────────────────────────────────────────────────────────────

    #[test]
    fn attach_tip_fills_once_without_touching_outcome() {
        let mut session = NegotiationSession::open(&clause(true)).unwrap();
        session
            .record_turn("one month".into(), countered("1.5 months"), vec![])
            .unwrap();
        let outcome_before = session.history()[0].outcome().clone();

        session.attach_tip(TurnNumber::FIRST, tip("Ask for a shorter lease")).unwrap();
        assert_eq!(session.history()[0].tip().map(|t| t.text()), Some("Ask for a shorter lease"));
        assert_eq!(session.history()[0].outcome(), &outcome_before);

        let err = session.attach_tip(TurnNumber::FIRST, tip("again")).unwrap_err();
        assert_eq!(err.code(), ErrorCode::TipAlreadyAttached);
    }

    #[test]
    fn attach_tip_to_unknown_turn_fails() {
        let mut session = NegotiationSession::open(&clause(true)).unwrap();
        let err = session.attach_tip(TurnNumber::FIRST, tip("x")).unwrap_err();
        assert_eq!(err.code(), ErrorCode::TurnNotFound);
    }

    #[test]
    fn attach_tip_allowed_after_terminal() {
        let mut session = NegotiationSession::open(&clause(true)).unwrap();
        session
            .record_turn("one month".into(), ProposalOutcome::accepted("ok"), vec![])
            .unwrap();
        session.attach_tip(TurnNumber::FIRST, tip("Lock it in writing")).unwrap();
        assert_eq!(session.state(), ClauseNegotiationState::Accepted);
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Withdraw / finalize / reopen
    // ─────────────────────────────────────────────────────────────────────────

    #[test]
    fn withdraw_from_unopened_and_twice_conflicts() {
        let mut session = NegotiationSession::open(&clause(true)).unwrap();
        session.withdraw().unwrap();
        assert_eq!(session.state(), ClauseNegotiationState::Withdrawn);
        assert_eq!(session.withdraw().unwrap_err().code(), ErrorCode::SessionTerminal);
    }

    #[test]
    fn mark_finalized_requires_terminal_and_is_stable() {
        let mut session = NegotiationSession::open(&clause(true)).unwrap();
        assert_eq!(
            session.mark_finalized().unwrap_err().code(),
            ErrorCode::SessionNotTerminal
        );

        session.withdraw().unwrap();
        let first = session.mark_finalized().unwrap();
        let second = session.mark_finalized().unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn reopen_links_lineage_and_requires_terminal() {
        let mut session = NegotiationSession::open(&clause(true)).unwrap();
        assert!(NegotiationSession::reopen(&session).is_err());

        session
            .record_turn("one month".into(), ProposalOutcome::accepted("ok"), vec![])
            .unwrap();
        let reopened = NegotiationSession::reopen(&session).unwrap();

        assert_ne!(reopened.id(), session.id());
        assert_eq!(reopened.reopened_from(), Some(session.id()));
        assert_eq!(reopened.clause_id(), session.clause_id());
        assert_eq!(reopened.state(), ClauseNegotiationState::Unopened);
        assert_eq!(session.history().len(), 1);
    }

    #[test]
    fn rejection_with_counter_terms_keeps_negotiating() {
        let mut session = NegotiationSession::open(&clause(true)).unwrap();
        let outcome =
            ProposalOutcome::new(OutcomeKind::Rejected, "too low", Some("6 weeks".into())).unwrap();
        session.record_turn("two weeks".into(), outcome, vec![]).unwrap();
        assert_eq!(session.state(), ClauseNegotiationState::InNegotiation);
    }
}
