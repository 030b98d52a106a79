//! HTTP handlers for negotiation endpoints.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Response,
    },
    Json,
};
use futures::stream;
use tokio::sync::broadcast::error::RecvError;

use crate::adapters::events::InMemoryEventBus;
use crate::application::handlers::negotiation::SessionManager;
use crate::domain::foundation::{ClauseId, DocumentId, SessionId};
use crate::domain::negotiation::NegotiationError;

use super::dto::{
    ArtifactResponse, CreateSessionRequest, ErrorResponse, HistoryResponse, SessionResponse,
    SubmitTurnRequest, TurnResultResponse,
};

// ════════════════════════════════════════════════════════════════════════════
// Handler state
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone)]
pub struct NegotiationAppState {
    manager: Arc<SessionManager>,
    events: Arc<InMemoryEventBus>,
}

impl NegotiationAppState {
    /// `events` must be the bus the manager publishes to.
    pub fn new(manager: Arc<SessionManager>, events: Arc<InMemoryEventBus>) -> Self {
        Self { manager, events }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// HTTP handlers
// ════════════════════════════════════════════════════════════════════════════

/// POST /api/negotiations/sessions - Open a session for a clause
pub async fn create_session(
    State(state): State<NegotiationAppState>,
    Json(req): Json<CreateSessionRequest>,
) -> Response {
    let clause_id = match ClauseId::new(req.clause_id) {
        Ok(id) => id,
        Err(e) => return bad_request(e.to_string()),
    };

    match state.manager.create_session(&clause_id).await {
        Ok(session) => (StatusCode::CREATED, Json(SessionResponse::from(&session))).into_response(),
        Err(e) => handle_negotiation_error(e),
    }
}

/// GET /api/negotiations/sessions/:id - Current session snapshot
pub async fn get_session(
    State(state): State<NegotiationAppState>,
    Path(session_id): Path<String>,
) -> Response {
    let session_id = match parse_session_id(&session_id) {
        Ok(id) => id,
        Err(response) => return response,
    };

    match state.manager.get_session(session_id).await {
        Ok(session) => (StatusCode::OK, Json(SessionResponse::from(&session))).into_response(),
        Err(e) => handle_negotiation_error(e),
    }
}

/// POST /api/negotiations/sessions/:id/turns - Submit a proposal
pub async fn submit_turn(
    State(state): State<NegotiationAppState>,
    Path(session_id): Path<String>,
    Json(req): Json<SubmitTurnRequest>,
) -> Response {
    let session_id = match parse_session_id(&session_id) {
        Ok(id) => id,
        Err(response) => return response,
    };

    match state.manager.submit_turn(session_id, &req.proposal).await {
        Ok(result) => (StatusCode::OK, Json(TurnResultResponse::from(result))).into_response(),
        Err(e) => handle_negotiation_error(e),
    }
}

/// GET /api/negotiations/sessions/:id/turns - Committed history
pub async fn get_history(
    State(state): State<NegotiationAppState>,
    Path(session_id): Path<String>,
) -> Response {
    let session_id = match parse_session_id(&session_id) {
        Ok(id) => id,
        Err(response) => return response,
    };

    match state.manager.get_history(session_id).await {
        Ok(turns) => (
            StatusCode::OK,
            Json(HistoryResponse::new(session_id.to_string(), &turns)),
        )
            .into_response(),
        Err(e) => handle_negotiation_error(e),
    }
}

/// POST /api/negotiations/sessions/:id/withdraw - Abandon the session
pub async fn withdraw_session(
    State(state): State<NegotiationAppState>,
    Path(session_id): Path<String>,
) -> Response {
    let session_id = match parse_session_id(&session_id) {
        Ok(id) => id,
        Err(response) => return response,
    };

    match state.manager.withdraw(session_id).await {
        Ok(session) => (StatusCode::OK, Json(SessionResponse::from(&session))).into_response(),
        Err(e) => handle_negotiation_error(e),
    }
}

/// POST /api/negotiations/sessions/:id/finalize - Artifact for one clause
pub async fn finalize_session(
    State(state): State<NegotiationAppState>,
    Path(session_id): Path<String>,
) -> Response {
    let session_id = match parse_session_id(&session_id) {
        Ok(id) => id,
        Err(response) => return response,
    };

    match state.manager.finalize(session_id).await {
        Ok(artifact) => (StatusCode::OK, Json(ArtifactResponse::from(artifact))).into_response(),
        Err(e) => handle_negotiation_error(e),
    }
}

/// POST /api/negotiations/sessions/:id/reopen - Start a new lineage session
pub async fn reopen_session(
    State(state): State<NegotiationAppState>,
    Path(session_id): Path<String>,
) -> Response {
    let session_id = match parse_session_id(&session_id) {
        Ok(id) => id,
        Err(response) => return response,
    };

    match state.manager.reopen(session_id).await {
        Ok(session) => (StatusCode::CREATED, Json(SessionResponse::from(&session))).into_response(),
        Err(e) => handle_negotiation_error(e),
    }
}

/// POST /api/negotiations/documents/:id/finalize - Artifact for a whole document
pub async fn finalize_document(
    State(state): State<NegotiationAppState>,
    Path(document_id): Path<String>,
) -> Response {
    let document_id = match DocumentId::new(document_id) {
        Ok(id) => id,
        Err(e) => return bad_request(e.to_string()),
    };

    match state.manager.finalize_document(&document_id).await {
        Ok(artifact) => (StatusCode::OK, Json(ArtifactResponse::from(artifact))).into_response(),
        Err(e) => handle_negotiation_error(e),
    }
}

/// GET /api/negotiations/sessions/:id/events - Live session events (SSE)
///
/// Streams every event published for the session from now on, including
/// strategy tips that land after their turn was returned.
pub async fn stream_session_events(
    State(state): State<NegotiationAppState>,
    Path(session_id): Path<String>,
) -> Response {
    let session_id = match parse_session_id(&session_id) {
        Ok(id) => id,
        Err(response) => return response,
    };

    // subscribe first so nothing published during the lookup is missed
    let receiver = state.events.listen();
    if let Err(e) = state.manager.get_session(session_id).await {
        return handle_negotiation_error(e);
    }

    let aggregate_id = session_id.to_string();
    let events = stream::unfold((receiver, aggregate_id), |(mut receiver, aggregate_id)| async move {
        loop {
            match receiver.recv().await {
                Ok(envelope) if envelope.aggregate_id == aggregate_id => {
                    let event = Event::default()
                        .event(envelope.event_type.clone())
                        .id(envelope.event_id.to_string())
                        .json_data(&envelope);
                    return Some((event, (receiver, aggregate_id)));
                }
                Ok(_) => continue,
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(session_id = %aggregate_id, skipped, "Event stream lagged");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    });

    Sse::new(events)
        .keep_alive(KeepAlive::default())
        .into_response()
}

// ════════════════════════════════════════════════════════════════════════════
// Error handling
// ════════════════════════════════════════════════════════════════════════════

fn parse_session_id(raw: &str) -> Result<SessionId, Response> {
    raw.parse::<SessionId>()
        .map_err(|_| bad_request("Invalid session ID"))
}

fn bad_request(message: impl Into<String>) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse::bad_request(message)),
    )
        .into_response()
}

fn handle_negotiation_error(error: NegotiationError) -> Response {
    let status = match &error {
        NegotiationError::Validation { .. } => StatusCode::BAD_REQUEST,
        NegotiationError::SessionNotFound(_)
        | NegotiationError::ClauseNotFound(_)
        | NegotiationError::DocumentNotFound(_)
        | NegotiationError::TurnNotFound { .. } => StatusCode::NOT_FOUND,
        NegotiationError::Conflict(_) => StatusCode::CONFLICT,
        NegotiationError::ModelUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
        NegotiationError::Infrastructure(msg) => {
            tracing::error!(error = %msg, "Negotiation request failed");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::internal("Internal error")),
            )
                .into_response();
        }
    };
    (status, Json(ErrorResponse::from(&error))).into_response()
}
