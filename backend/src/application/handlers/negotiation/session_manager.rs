//! SessionManager - entry point for every negotiation operation.
//!
//! Mutations of a session (submit, withdraw, finalize, reopen, late tip
//! attachment) run under that session's gate, so they apply in a total
//! order. Reads go straight to the repository and see the last saved
//! snapshot. Events are published after the save; publish failures are
//! logged and never undo the change.

use serde::Serialize;
use std::sync::Arc;
use tokio::sync::oneshot;

use super::{ConversationOrchestrator, SessionGate, TipTracker};
use crate::domain::clause::Clause;
use crate::domain::foundation::{
    ClauseId, DocumentId, DomainEvent, EventEnvelope, EventId, SessionId, Timestamp, TurnNumber,
};
use crate::domain::negotiation::{
    ClauseNegotiationState, ConflictReason, NegotiationContext, NegotiationError,
    NegotiationSession, ProposalOutcome, SessionFinalized, SessionOpened, SessionReopened,
    SessionWithdrawn, StrategyTip, StrategyTipAttached, Turn, TurnCommitted,
};
use crate::domain::reconciliation::{reconcile_document, reconcile_session, OutputArtifact};
use crate::ports::{ClauseStore, EventPublisher, InsertResult, SessionRepository};

/// Default upper bound on proposal length, in characters.
pub const DEFAULT_MAX_PROPOSAL_CHARS: usize = 2_000;

/// What the caller sees once a turn has committed.
#[derive(Debug, Clone)]
pub struct TurnResult {
    pub session_id: SessionId,
    pub turn: TurnNumber,
    pub outcome: ProposalOutcome,
    /// Session state after the turn.
    pub state: ClauseNegotiationState,
    /// Present only if the tip was ready when the turn committed. Otherwise
    /// it arrives later as `StrategyTipAttached`.
    pub tip: Option<StrategyTip>,
    pub grounding_used: usize,
}

pub struct SessionManager {
    clauses: Arc<dyn ClauseStore>,
    sessions: Arc<dyn SessionRepository>,
    publisher: Arc<dyn EventPublisher>,
    orchestrator: ConversationOrchestrator,
    gate: SessionGate,
    max_proposal_chars: usize,
}

impl SessionManager {
    pub fn new(
        clauses: Arc<dyn ClauseStore>,
        sessions: Arc<dyn SessionRepository>,
        publisher: Arc<dyn EventPublisher>,
        orchestrator: ConversationOrchestrator,
    ) -> Self {
        Self {
            clauses,
            sessions,
            publisher,
            orchestrator,
            gate: SessionGate::new(),
            max_proposal_chars: DEFAULT_MAX_PROPOSAL_CHARS,
        }
    }

    pub fn with_max_proposal_chars(mut self, max: usize) -> Self {
        self.max_proposal_chars = max;
        self
    }

    fn tracker(&self) -> &TipTracker {
        self.orchestrator.tracker()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Commands
    // ─────────────────────────────────────────────────────────────────────────

    /// Opens a session for a clause.
    ///
    /// # Errors
    ///
    /// - `ClauseNotFound` if the clause is unknown
    /// - `Validation` if the clause is not negotiable
    /// - `Conflict` if the clause already has an active session
    pub async fn create_session(
        &self,
        clause_id: &ClauseId,
    ) -> Result<NegotiationSession, NegotiationError> {
        let clause = self.load_clause(clause_id).await?;
        let session = NegotiationSession::open(&clause)?;

        self.insert_new(&session).await?;

        tracing::info!(
            session_id = %session.id(),
            clause_id = %clause_id,
            "Negotiation session opened"
        );
        self.publish(&SessionOpened {
            event_id: EventId::new(),
            session_id: *session.id(),
            clause_id: clause_id.clone(),
            document_id: session.document_id().clone(),
            opened_at: session.created_at(),
        })
        .await;

        Ok(session)
    }

    /// Submits a proposal and commits the counterparty's answer as the next turn.
    ///
    /// # Errors
    ///
    /// - `Validation` if the proposal is blank or too long
    /// - `SessionNotFound` / `ClauseNotFound`
    /// - `Conflict` if the session is terminal
    /// - `ModelUnavailable` if the counterparty could not answer; nothing is committed
    pub async fn submit_turn(
        &self,
        session_id: SessionId,
        proposal: &str,
    ) -> Result<TurnResult, NegotiationError> {
        let proposal = self.validate_proposal(proposal)?;

        let guard = self.gate.lock(session_id).await;

        let mut session = self.load_session(session_id).await?;
        session.ensure_accepts_turns()?;
        let clause = self.load_clause(session.clause_id()).await?;

        let context = NegotiationContext::new(
            session_id,
            &clause,
            session.history().to_vec(),
            session.next_turn_number(),
            proposal.clone(),
        );
        let mut draft = self.orchestrator.run_turn(context).await?;
        let grounding_used = draft.grounding.len();

        let turn = session
            .record_turn(proposal, draft.outcome.clone(), draft.grounding)?
            .number();

        let ready_tip = draft.tip.try_take();
        if let Some(tip) = &ready_tip {
            session.attach_tip(turn, tip.clone())?;
        }

        if let Err(err) = self.sessions.update(&session).await {
            draft.tip.discard();
            return Err(err.into());
        }
        drop(guard);

        tracing::info!(
            session_id = %session_id,
            turn = turn.value(),
            outcome = %draft.outcome.kind(),
            state = %session.state(),
            "Turn committed"
        );

        let committed_at = session
            .turn(turn)
            .map(Turn::committed_at)
            .unwrap_or_else(Timestamp::now);
        self.publish(&TurnCommitted {
            event_id: EventId::new(),
            session_id,
            turn,
            outcome: draft.outcome.kind(),
            counter_terms: draft.outcome.counter_terms().map(String::from),
            state: session.state(),
            committed_at,
        })
        .await;

        match &ready_tip {
            Some(tip) => {
                self.publish(&StrategyTipAttached {
                    event_id: EventId::new(),
                    session_id,
                    turn,
                    tip: tip.text().to_string(),
                    attached_at: tip.produced_at(),
                })
                .await
            }
            None => self.attach_later(session_id, turn, draft.tip.into_receiver()),
        }

        Ok(TurnResult {
            session_id,
            turn,
            outcome: draft.outcome,
            state: session.state(),
            tip: ready_tip,
            grounding_used,
        })
    }

    /// Abandons a session. Queues behind an in-flight submission.
    ///
    /// # Errors
    ///
    /// - `SessionNotFound`
    /// - `Conflict` if already terminal
    pub async fn withdraw(&self, session_id: SessionId) -> Result<NegotiationSession, NegotiationError> {
        let guard = self.gate.lock(session_id).await;
        let mut session = self.load_session(session_id).await?;
        session.withdraw()?;
        self.sessions.update(&session).await?;
        drop(guard);

        tracing::info!(
            session_id = %session_id,
            turns = session.history().len(),
            "Negotiation session withdrawn"
        );
        self.publish(&SessionWithdrawn {
            event_id: EventId::new(),
            session_id,
            turns_committed: session.history().len() as u32,
            withdrawn_at: session.updated_at(),
        })
        .await;

        Ok(session)
    }

    /// Produces the output artifact of a terminal session.
    ///
    /// The finalization time is stored on first call, so repeated calls
    /// return identical artifacts.
    ///
    /// # Errors
    ///
    /// - `SessionNotFound` / `ClauseNotFound`
    /// - `Conflict` if the session is not terminal
    pub async fn finalize(&self, session_id: SessionId) -> Result<OutputArtifact, NegotiationError> {
        let guard = self.gate.lock(session_id).await;
        let mut session = self.load_session(session_id).await?;
        let clause = self.load_clause(session.clause_id()).await?;

        let first_time = session.finalized_at().is_none();
        let finalized_at = session.mark_finalized()?;
        let artifact = reconcile_session(&session, &clause)?;

        if first_time {
            self.sessions.update(&session).await?;
        }
        drop(guard);

        if first_time {
            tracing::info!(
                session_id = %session_id,
                state = %session.state(),
                digest = %artifact.digest,
                "Negotiation session finalized"
            );
            self.publish(&SessionFinalized {
                event_id: EventId::new(),
                session_id,
                state: session.state(),
                digest: artifact.digest.clone(),
                finalized_at,
            })
            .await;
        }

        Ok(artifact)
    }

    /// Starts a new session for the clause of a terminal session.
    ///
    /// # Errors
    ///
    /// - `SessionNotFound`
    /// - `Conflict` if the session is not terminal or the clause already has an active session
    pub async fn reopen(&self, session_id: SessionId) -> Result<NegotiationSession, NegotiationError> {
        let guard = self.gate.lock(session_id).await;
        let previous = self.load_session(session_id).await?;
        let session = NegotiationSession::reopen(&previous)?;
        self.insert_new(&session).await?;
        drop(guard);

        tracing::info!(
            session_id = %session.id(),
            previous_session_id = %session_id,
            clause_id = %session.clause_id(),
            "Negotiation session reopened"
        );
        self.publish(&SessionReopened {
            event_id: EventId::new(),
            session_id: *session.id(),
            previous_session_id: session_id,
            clause_id: session.clause_id().clone(),
            reopened_at: session.created_at(),
        })
        .await;

        Ok(session)
    }

    /// Reconciles every clause of a document against its latest session.
    ///
    /// Checks all sessions before finalizing any of them, so a conflict
    /// leaves every session untouched. The latest sessions stay gated from
    /// the final check until they are marked finalized.
    ///
    /// # Errors
    ///
    /// - `DocumentNotFound`
    /// - `Conflict` if any clause's latest session is not terminal, or a
    ///   clause gained a newer session while the gates were being taken
    pub async fn finalize_document(
        &self,
        document_id: &DocumentId,
    ) -> Result<OutputArtifact, NegotiationError> {
        let document = self
            .clauses
            .find_document(document_id)
            .await?
            .ok_or_else(|| NegotiationError::DocumentNotFound(document_id.clone()))?;
        let clauses = self.clauses.list_clauses(document_id).await?;

        let mut latest = Vec::with_capacity(clauses.len());
        for clause in &clauses {
            let session = self.sessions.find_latest_by_clause(clause.id()).await?;
            if let Some(session) = &session {
                if !session.is_terminal() {
                    return Err(NegotiationError::conflict(
                        ConflictReason::SessionNotTerminal {
                            session_id: *session.id(),
                            state: session.state(),
                        },
                    ));
                }
            }
            latest.push(session.map(|s| *s.id()));
        }

        // sorted, so concurrent document finalizations cannot deadlock
        let mut gated: Vec<SessionId> = latest.iter().flatten().copied().collect();
        gated.sort();
        let mut guards = Vec::with_capacity(gated.len());
        for session_id in gated {
            guards.push(self.gate.lock(session_id).await);
        }

        for (clause, planned) in clauses.iter().zip(&latest) {
            let current = self
                .sessions
                .find_latest_by_clause(clause.id())
                .await?
                .map(|s| *s.id());
            if let Some(session_id) = current.filter(|id| Some(*id) != *planned) {
                return Err(NegotiationError::conflict(ConflictReason::LineageChanged {
                    clause_id: clause.id().clone(),
                    session_id,
                }));
            }
        }

        let mut pairs: Vec<(Clause, Option<NegotiationSession>)> = Vec::with_capacity(clauses.len());
        for (clause, session_id) in clauses.into_iter().zip(latest) {
            let session = match session_id {
                Some(id) => Some(self.mark_finalized_gated(id).await?),
                None => None,
            };
            pairs.push((clause, session));
        }
        drop(guards);

        let artifact = reconcile_document(&document, &pairs)?;
        tracing::info!(
            document_id = %document_id,
            clauses = pairs.len(),
            changes = artifact.redline.changes.len(),
            digest = %artifact.digest,
            "Document finalized"
        );
        Ok(artifact)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Queries
    // ─────────────────────────────────────────────────────────────────────────

    /// Committed turns in order. Never waits on an in-flight submission.
    pub async fn get_history(&self, session_id: SessionId) -> Result<Vec<Turn>, NegotiationError> {
        Ok(self.load_session(session_id).await?.history().to_vec())
    }

    /// Current snapshot of a session.
    pub async fn get_session(
        &self,
        session_id: SessionId,
    ) -> Result<NegotiationSession, NegotiationError> {
        self.load_session(session_id).await
    }

    /// Waits until every pending tip has been attached or discarded.
    pub async fn drain_background(&self) {
        self.tracker().drain().await;
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Helpers
    // ─────────────────────────────────────────────────────────────────────────

    fn validate_proposal(&self, proposal: &str) -> Result<String, NegotiationError> {
        let trimmed = proposal.trim();
        if trimmed.is_empty() {
            return Err(NegotiationError::validation("proposal", "proposal cannot be empty"));
        }
        let chars = trimmed.chars().count();
        if chars > self.max_proposal_chars {
            return Err(NegotiationError::validation(
                "proposal",
                format!(
                    "proposal has {} characters, limit is {}",
                    chars, self.max_proposal_chars
                ),
            ));
        }
        Ok(trimmed.to_string())
    }

    async fn load_session(&self, session_id: SessionId) -> Result<NegotiationSession, NegotiationError> {
        self.sessions
            .find_by_id(&session_id)
            .await?
            .ok_or(NegotiationError::SessionNotFound(session_id))
    }

    async fn load_clause(&self, clause_id: &ClauseId) -> Result<Clause, NegotiationError> {
        self.clauses
            .find_clause(clause_id)
            .await?
            .ok_or_else(|| NegotiationError::ClauseNotFound(clause_id.clone()))
    }

    async fn insert_new(&self, session: &NegotiationSession) -> Result<(), NegotiationError> {
        match self.sessions.insert(session).await? {
            InsertResult::Inserted => Ok(()),
            InsertResult::ActiveSessionExists(existing) => Err(NegotiationError::conflict(
                ConflictReason::ActiveSessionExists {
                    clause_id: session.clause_id().clone(),
                    session_id: existing,
                },
            )),
        }
    }

    /// Marks a terminal session finalized and returns the stored copy.
    /// The caller holds the session's gate.
    async fn mark_finalized_gated(
        &self,
        session_id: SessionId,
    ) -> Result<NegotiationSession, NegotiationError> {
        let mut session = self.load_session(session_id).await?;
        if session.finalized_at().is_none() {
            session.mark_finalized()?;
            self.sessions.update(&session).await?;
        }
        Ok(session)
    }

    fn attach_later(
        &self,
        session_id: SessionId,
        turn: TurnNumber,
        tip: oneshot::Receiver<StrategyTip>,
    ) {
        let gate = self.gate.clone();
        let sessions = Arc::clone(&self.sessions);
        let publisher = Arc::clone(&self.publisher);

        self.tracker().spawn(async move {
            // sender dropped: the tip call gave up and already logged why
            let Ok(tip) = tip.await else {
                return;
            };

            let guard = gate.lock(session_id).await;
            let mut session = match sessions.find_by_id(&session_id).await {
                Ok(Some(session)) => session,
                Ok(None) => {
                    tracing::warn!(session_id = %session_id, "Session vanished before tip attached");
                    return;
                }
                Err(err) => {
                    tracing::warn!(session_id = %session_id, error = %err, "Failed to load session for tip");
                    return;
                }
            };
            if let Err(err) = session.attach_tip(turn, tip.clone()) {
                tracing::warn!(session_id = %session_id, turn = turn.value(), error = %err, "Tip not attached");
                return;
            }
            if let Err(err) = sessions.update(&session).await {
                tracing::warn!(session_id = %session_id, turn = turn.value(), error = %err, "Failed to save tip");
                return;
            }
            drop(guard);

            tracing::debug!(session_id = %session_id, turn = turn.value(), "Strategy tip attached");
            publish_event(
                publisher.as_ref(),
                &StrategyTipAttached {
                    event_id: EventId::new(),
                    session_id,
                    turn,
                    tip: tip.text().to_string(),
                    attached_at: Timestamp::now(),
                },
            )
            .await;
        });
    }

    async fn publish<E>(&self, event: &E)
    where
        E: DomainEvent + Serialize,
    {
        publish_event(self.publisher.as_ref(), event).await;
    }
}

async fn publish_event<E>(publisher: &dyn EventPublisher, event: &E)
where
    E: DomainEvent + Serialize,
{
    let envelope = match EventEnvelope::from_event(event) {
        Ok(envelope) => envelope,
        Err(err) => {
            tracing::warn!(event_type = event.event_type(), error = %err, "Failed to build event");
            return;
        }
    };
    if let Err(err) = publisher.publish(envelope).await {
        tracing::warn!(event_type = event.event_type(), error = %err, "Failed to publish event");
    }
}
