//! Negotiation error taxonomy surfaced to callers.

use thiserror::Error;

use super::ClauseNegotiationState;
use crate::domain::foundation::{
    ClauseId, DocumentId, DomainError, ErrorCode, SessionId, ValidationError,
};

/// Why a request conflicted with current session state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConflictReason {
    #[error("clause {clause_id} already has active session {session_id}")]
    ActiveSessionExists {
        clause_id: ClauseId,
        session_id: SessionId,
    },

    #[error("session {session_id} is {state} and accepts no further changes")]
    SessionTerminal {
        session_id: SessionId,
        state: ClauseNegotiationState,
    },

    #[error("session {session_id} is {state}; it must reach a terminal state first")]
    SessionNotTerminal {
        session_id: SessionId,
        state: ClauseNegotiationState,
    },

    #[error("turn {turn} of session {session_id} already has a strategy tip")]
    TipAlreadyAttached { session_id: SessionId, turn: u32 },

    #[error("clause {clause_id} moved on to session {session_id} while finalizing")]
    LineageChanged {
        clause_id: ClauseId,
        session_id: SessionId,
    },
}

impl ConflictReason {
    pub fn code(&self) -> ErrorCode {
        match self {
            ConflictReason::ActiveSessionExists { .. } => ErrorCode::ActiveSessionExists,
            ConflictReason::SessionTerminal { .. } => ErrorCode::SessionTerminal,
            ConflictReason::SessionNotTerminal { .. } => ErrorCode::SessionNotTerminal,
            ConflictReason::TipAlreadyAttached { .. } => ErrorCode::TipAlreadyAttached,
            ConflictReason::LineageChanged { .. } => ErrorCode::LineageChanged,
        }
    }
}

/// Errors returned by negotiation operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NegotiationError {
    /// Malformed input, rejected before any lookup or collaborator call.
    #[error("Validation failed for '{field}': {message}")]
    Validation { field: String, message: String },

    #[error("Session not found: {0}")]
    SessionNotFound(SessionId),

    #[error("Clause not found: {0}")]
    ClauseNotFound(ClauseId),

    #[error("Document not found: {0}")]
    DocumentNotFound(DocumentId),

    #[error("Turn {turn} not found in session {session_id}")]
    TurnNotFound { session_id: SessionId, turn: u32 },

    #[error("Conflict: {0}")]
    Conflict(ConflictReason),

    /// The counterparty call failed; nothing was committed.
    #[error("Counterparty model unavailable after {attempts} attempt(s): {reason}")]
    ModelUnavailable { attempts: u32, reason: String },

    #[error("Infrastructure error: {0}")]
    Infrastructure(String),
}

impl NegotiationError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        NegotiationError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn conflict(reason: ConflictReason) -> Self {
        NegotiationError::Conflict(reason)
    }

    pub fn infrastructure(message: impl Into<String>) -> Self {
        NegotiationError::Infrastructure(message.into())
    }

    /// True for the not-found family.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            NegotiationError::SessionNotFound(_)
                | NegotiationError::ClauseNotFound(_)
                | NegotiationError::DocumentNotFound(_)
                | NegotiationError::TurnNotFound { .. }
        )
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            NegotiationError::Validation { .. } => ErrorCode::ValidationFailed,
            NegotiationError::SessionNotFound(_) => ErrorCode::SessionNotFound,
            NegotiationError::ClauseNotFound(_) => ErrorCode::ClauseNotFound,
            NegotiationError::DocumentNotFound(_) => ErrorCode::DocumentNotFound,
            NegotiationError::TurnNotFound { .. } => ErrorCode::TurnNotFound,
            NegotiationError::Conflict(reason) => reason.code(),
            NegotiationError::ModelUnavailable { .. } => ErrorCode::ModelUnavailable,
            NegotiationError::Infrastructure(_) => ErrorCode::InternalError,
        }
    }

    pub fn message(&self) -> String {
        self.to_string()
    }
}

impl From<DomainError> for NegotiationError {
    fn from(err: DomainError) -> Self {
        match err.code {
            ErrorCode::ValidationFailed => NegotiationError::Validation {
                field: err
                    .details
                    .get("field")
                    .cloned()
                    .unwrap_or_else(|| "unknown".to_string()),
                message: err.message,
            },
            _ => NegotiationError::Infrastructure(err.to_string()),
        }
    }
}

impl From<ValidationError> for NegotiationError {
    fn from(err: ValidationError) -> Self {
        NegotiationError::validation(err.field().to_string(), err.to_string())
    }
}
