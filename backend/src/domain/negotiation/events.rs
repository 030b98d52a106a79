//! Negotiation domain events.
//!
//! Published after each commit:
//! - `SessionOpened` - New session created for a clause
//! - `TurnCommitted` - A turn was appended to the log
//! - `StrategyTipAttached` - A tip was filled into a committed turn
//! - `SessionWithdrawn` - User abandoned the negotiation
//! - `SessionReopened` - A terminal session spawned a new lineage
//! - `SessionFinalized` - Output artifact was produced

use serde::{Deserialize, Serialize};

use super::{ClauseNegotiationState, OutcomeKind};
use crate::domain::foundation::{
    domain_event, ClauseId, DocumentId, EventId, SessionId, Timestamp, TurnNumber,
};

pub const AGGREGATE_TYPE: &str = "NegotiationSession";

// ════════════════════════════════════════════════════════════════════════════
// SessionOpened
// ════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionOpened {
    pub event_id: EventId,
    pub session_id: SessionId,
    pub clause_id: ClauseId,
    pub document_id: DocumentId,
    pub opened_at: Timestamp,
}

domain_event!(
    SessionOpened,
    event_type = "negotiation.session_opened.v1",
    schema_version = 1,
    aggregate_id = session_id,
    aggregate_type = AGGREGATE_TYPE,
    occurred_at = opened_at,
    event_id = event_id
);

// ════════════════════════════════════════════════════════════════════════════
// TurnCommitted
// ════════════════════════════════════════════════════════════════════════════

/// Published when the counterparty outcome for a turn is committed.
///
/// The tip, if any, follows later as `StrategyTipAttached`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnCommitted {
    pub event_id: EventId,
    pub session_id: SessionId,
    pub turn: TurnNumber,
    pub outcome: OutcomeKind,
    pub counter_terms: Option<String>,
    /// Session state after the turn.
    pub state: ClauseNegotiationState,
    pub committed_at: Timestamp,
}

domain_event!(
    TurnCommitted,
    event_type = "negotiation.turn_committed.v1",
    schema_version = 1,
    aggregate_id = session_id,
    aggregate_type = AGGREGATE_TYPE,
    occurred_at = committed_at,
    event_id = event_id
);

// ════════════════════════════════════════════════════════════════════════════
// StrategyTipAttached
// ════════════════════════════════════════════════════════════════════════════

/// Published when a strategy tip lands on an already-committed turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyTipAttached {
    pub event_id: EventId,
    pub session_id: SessionId,
    pub turn: TurnNumber,
    pub tip: String,
    pub attached_at: Timestamp,
}

domain_event!(
    StrategyTipAttached,
    event_type = "negotiation.strategy_tip_attached.v1",
    schema_version = 1,
    aggregate_id = session_id,
    aggregate_type = AGGREGATE_TYPE,
    occurred_at = attached_at,
    event_id = event_id
);

// ════════════════════════════════════════════════════════════════════════════
// SessionWithdrawn
// ════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionWithdrawn {
    pub event_id: EventId,
    pub session_id: SessionId,
    pub turns_committed: u32,
    pub withdrawn_at: Timestamp,
}

domain_event!(
    SessionWithdrawn,
    event_type = "negotiation.session_withdrawn.v1",
    schema_version = 1,
    aggregate_id = session_id,
    aggregate_type = AGGREGATE_TYPE,
    occurred_at = withdrawn_at,
    event_id = event_id
);

// ════════════════════════════════════════════════════════════════════════════
// SessionReopened
// ════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionReopened {
    pub event_id: EventId,
    /// The new session.
    pub session_id: SessionId,
    pub previous_session_id: SessionId,
    pub clause_id: ClauseId,
    pub reopened_at: Timestamp,
}

domain_event!(
    SessionReopened,
    event_type = "negotiation.session_reopened.v1",
    schema_version = 1,
    aggregate_id = session_id,
    aggregate_type = AGGREGATE_TYPE,
    occurred_at = reopened_at,
    event_id = event_id
);

// ════════════════════════════════════════════════════════════════════════════
// SessionFinalized
// ════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionFinalized {
    pub event_id: EventId,
    pub session_id: SessionId,
    pub state: ClauseNegotiationState,
    /// SHA-256 of the produced artifact.
    pub digest: String,
    pub finalized_at: Timestamp,
}

domain_event!(
    SessionFinalized,
    event_type = "negotiation.session_finalized.v1",
    schema_version = 1,
    aggregate_id = session_id,
    aggregate_type = AGGREGATE_TYPE,
    occurred_at = finalized_at,
    event_id = event_id
);
