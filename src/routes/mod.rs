//! Router assembly: HTTP endpoints, WebSocket upgrade, static files, CORS, and HTTP tracing.

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    services::{ServeDir, ServeFile},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::state::AppState;

pub mod http;
pub mod ws;

/// Multipart framing on top of the raw file size.
const UPLOAD_OVERHEAD_BYTES: usize = 64 * 1024;

/// Build the application router with:
/// - WebSocket at `/ws` (one interaction session per connection)
/// - the generation and upload contracts at `/api/chat` and `/api/upload-docx`
/// - REST-ish API under `/api/v1/...`
/// - Static SPA from the configured directory with index fallback
/// - CORS (allow any origin/method/headers); adjust for production if needed
/// - HTTP trace layer (per-request spans w/ method, path, status, latency)
pub fn build_router(state: Arc<AppState>) -> Router {
    let static_dir = state.config.static_dir.clone();
    let static_service = ServeDir::new(&static_dir)
        .append_index_html_on_directories(true)
        .not_found_service(ServeFile::new(format!("{static_dir}/index.html")));
    let body_limit = state.config.max_upload_bytes + UPLOAD_OVERHEAD_BYTES;

    Router::new()
        // WebSocket
        .route("/ws", get(ws::ws_upgrade))
        // Collaborator contracts
        .route("/api/chat", post(http::http_post_chat))
        .route("/api/upload-docx", post(http::http_post_upload))
        // HTTP API
        .route("/api/v1/health", get(http::http_health))
        .route("/api/v1/intents", get(http::http_get_intents))
        .route("/api/v1/prompts/differentiate", post(http::http_post_differentiate_prompt))
        .route("/api/v1/prompts/create", post(http::http_post_create_prompt))
        .route("/api/v1/sections", post(http::http_post_sections))
        .route("/api/v1/sessions", post(http::http_create_session))
        .route(
            "/api/v1/sessions/:id",
            get(http::http_get_session).delete(http::http_delete_session),
        )
        .route("/api/v1/sessions/:id/commands", post(http::http_post_command))
        .route("/api/v1/sessions/:id/upload", post(http::http_post_session_upload))
        // State + limits + CORS + HTTP tracing
        .with_state(state)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        // Frontend fallback
        .fallback_service(static_service)
}
