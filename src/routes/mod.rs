//! Router assembly: HTTP endpoints, WebSocket upgrade, CORS, and HTTP tracing.

use std::sync::Arc;

use axum::{
    http::HeaderValue,
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{warn, Level};

use crate::state::AppState;

pub mod http;
pub mod ws;

/// Build the application router with:
/// - WebSocket at `/ws`
/// - session API under `/api/session/...` plus `/api/analyze`
/// - CORS from `server.allowed_origins` (any origin when the list is empty)
/// - HTTP trace layer (per-request spans w/ method, path, status, latency)
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = cors_layer(&state.allowed_origins);

    Router::new()
        .route("/ws", get(ws::ws_upgrade))
        .route("/health", get(http::http_health))
        .route("/api/analyze", post(http::http_post_analyze))
        .route("/api/session/start", post(http::http_post_start))
        .route("/api/session/answer", post(http::http_post_answer))
        .route("/api/session/report", get(http::http_get_report))
        .with_state(state)
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let base = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if allowed_origins.is_empty() {
        return base.allow_origin(Any);
    }
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|o| match o.parse::<HeaderValue>() {
            Ok(v) => Some(v),
            Err(_) => {
                warn!(target: "mock_interview", origin = %o, "Ignoring unparsable CORS origin");
                None
            }
        })
        .collect();
    base.allow_origin(origins)
}
