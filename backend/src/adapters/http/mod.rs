//! HTTP adapters - REST API implementations.
//!
//! `api_router` assembles the negotiation endpoints with the shared
//! middleware stack (request tracing, CORS, request timeout).

pub mod negotiation;

use std::time::Duration;

use axum::{http::HeaderValue, routing::get, Json, Router};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::ServerConfig;

pub use negotiation::{negotiation_routes, NegotiationAppState};

/// Builds the full API router.
pub fn api_router(state: NegotiationAppState, server: &ServerConfig) -> Router {
    Router::new()
        .route("/health", get(health))
        .nest("/api/negotiations", negotiation_routes(state))
        .layer(TimeoutLayer::new(Duration::from_secs(
            server.request_timeout_secs,
        )))
        .layer(cors_layer(&server.cors_origins_list()))
        .layer(TraceLayer::new_for_http())
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if allowed.is_empty() {
        layer.allow_origin(Any)
    } else {
        layer.allow_origin(AllowOrigin::list(allowed))
    }
}
