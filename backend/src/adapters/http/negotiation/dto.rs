//! HTTP DTOs for negotiation endpoints.
//!
//! These types decouple the HTTP API from domain types, allowing independent evolution.

use serde::{Deserialize, Serialize};

use crate::application::handlers::negotiation::TurnResult;
use crate::domain::negotiation::{
    ClauseNegotiationState, GroundingSnippet, NegotiationError, NegotiationSession,
    ProposalOutcome, Turn,
};
use crate::domain::reconciliation::{NegotiationSummary, OutputArtifact, RedlinedDocument};

// ════════════════════════════════════════════════════════════════════════════
// Request DTOs
// ════════════════════════════════════════════════════════════════════════════

/// Request to open a negotiation session for a clause.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateSessionRequest {
    pub clause_id: String,
}

/// Request to submit a proposal as the next turn.
#[derive(Debug, Clone, Deserialize)]
pub struct SubmitTurnRequest {
    pub proposal: String,
}

// ════════════════════════════════════════════════════════════════════════════
// Response DTOs
// ════════════════════════════════════════════════════════════════════════════

/// Session snapshot for API responses.
#[derive(Debug, Clone, Serialize)]
pub struct SessionResponse {
    pub id: String,
    pub clause_id: String,
    pub document_id: String,
    pub state: ClauseNegotiationState,
    pub turn_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reopened_from: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finalized_at: Option<String>,
}

impl From<&NegotiationSession> for SessionResponse {
    fn from(session: &NegotiationSession) -> Self {
        Self {
            id: session.id().to_string(),
            clause_id: session.clause_id().to_string(),
            document_id: session.document_id().to_string(),
            state: session.state(),
            turn_count: session.history().len(),
            reopened_from: session.reopened_from().map(|id| id.to_string()),
            created_at: session.created_at().to_rfc3339(),
            updated_at: session.updated_at().to_rfc3339(),
            finalized_at: session.finalized_at().map(|t| t.to_rfc3339()),
        }
    }
}

/// One committed turn.
#[derive(Debug, Clone, Serialize)]
pub struct TurnResponse {
    pub number: u32,
    pub proposal: String,
    pub outcome: ProposalOutcome,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub grounding: Vec<GroundingSnippet>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tip: Option<String>,
    pub committed_at: String,
}

impl From<&Turn> for TurnResponse {
    fn from(turn: &Turn) -> Self {
        Self {
            number: turn.number().value(),
            proposal: turn.proposal().to_string(),
            outcome: turn.outcome().clone(),
            grounding: turn.grounding().to_vec(),
            tip: turn.tip().map(|t| t.text().to_string()),
            committed_at: turn.committed_at().to_rfc3339(),
        }
    }
}

/// Result of a turn submission.
///
/// `tip` is present only when the strategy tip was ready before the
/// response was sent; otherwise it shows up later in the history.
#[derive(Debug, Clone, Serialize)]
pub struct TurnResultResponse {
    pub session_id: String,
    pub turn: u32,
    pub outcome: ProposalOutcome,
    pub state: ClauseNegotiationState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tip: Option<String>,
    pub grounding_used: usize,
}

impl From<TurnResult> for TurnResultResponse {
    fn from(result: TurnResult) -> Self {
        Self {
            session_id: result.session_id.to_string(),
            turn: result.turn.value(),
            outcome: result.outcome,
            state: result.state,
            tip: result.tip.map(|t| t.text().to_string()),
            grounding_used: result.grounding_used,
        }
    }
}

/// Committed history of a session.
#[derive(Debug, Clone, Serialize)]
pub struct HistoryResponse {
    pub session_id: String,
    pub turns: Vec<TurnResponse>,
}

impl HistoryResponse {
    pub fn new(session_id: impl Into<String>, turns: &[Turn]) -> Self {
        Self {
            session_id: session_id.into(),
            turns: turns.iter().map(TurnResponse::from).collect(),
        }
    }
}

/// Output artifact plus rendered views of the redline.
#[derive(Debug, Clone, Serialize)]
pub struct ArtifactResponse {
    pub redline: RedlinedDocument,
    pub summary: NegotiationSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finalized_at: Option<String>,
    pub digest: String,
    pub amended_text: String,
    pub markup: String,
}

impl From<OutputArtifact> for ArtifactResponse {
    fn from(artifact: OutputArtifact) -> Self {
        let amended_text = artifact.redline.amended_text();
        let markup = artifact.redline.markup();
        Self {
            redline: artifact.redline,
            summary: artifact.summary,
            finalized_at: artifact.finalized_at.map(|t| t.to_rfc3339()),
            digest: artifact.digest,
            amended_text,
            markup,
        }
    }
}

/// Standard error response.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ErrorResponse {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            code: "BAD_REQUEST".to_string(),
            message: message.into(),
            details: None,
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            code: "INTERNAL_ERROR".to_string(),
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }
}

impl From<&NegotiationError> for ErrorResponse {
    fn from(error: &NegotiationError) -> Self {
        let details = match error {
            NegotiationError::Validation { field, .. } => {
                Some(serde_json::json!({ "field": field }))
            }
            NegotiationError::ModelUnavailable { attempts, .. } => {
                Some(serde_json::json!({ "attempts": attempts }))
            }
            _ => None,
        };
        Self {
            code: error.code().to_string(),
            message: error.message(),
            details,
        }
    }
}
