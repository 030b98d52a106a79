//! HTTP routes for negotiation endpoints.

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::{
    create_session, finalize_document, finalize_session, get_history, get_session,
    reopen_session, stream_session_events, submit_turn, withdraw_session, NegotiationAppState,
};

/// Creates the negotiation router with all endpoints.
pub fn negotiation_routes(state: NegotiationAppState) -> Router {
    Router::new()
        .route("/sessions", post(create_session))
        .route("/sessions/:id", get(get_session))
        .route("/sessions/:id/turns", post(submit_turn).get(get_history))
        .route("/sessions/:id/withdraw", post(withdraw_session))
        .route("/sessions/:id/finalize", post(finalize_session))
        .route("/sessions/:id/reopen", post(reopen_session))
        .route("/sessions/:id/events", get(stream_session_events))
        .route("/documents/:id/finalize", post(finalize_document))
        .with_state(state)
}
