//! Differentie backend
//!
//! - Axum HTTP + WebSocket API
//! - Generation via an external chat endpoint or OpenAI (environment variables)
//! - Static SPA fallback (<static_dir>/index.html)
//!
//! Important env variables:
//!   PORT                     : u16 (default 3000)
//!   DIFFERENTIE_CONFIG_PATH  : path to TOML config
//!   GENERATION_ENDPOINT      : `{message, aiModel}` -> `{response}` service
//!   GENERATION_TIMEOUT_SECS  : upper bound per generation (default 120)
//!   EXTRACTION_ENDPOINT      : .docx/.pdf -> `{content}` service
//!   SESSION_TTL_SECS         : idle sessions are dropped after this (default 3600)
//!   OPENAI_API_KEY           : enables OpenAI when no GENERATION_ENDPOINT is set
//!   OPENAI_BASE_URL          : default "https://api.openai.com/v1"
//!   OPENAI_STRONG_MODEL      : default "gpt-4o"
//!   LOG_LEVEL                : tracing filter, e.g. "debug" or full directives
//!   LOG_FORMAT               : "pretty" (default) or "json"

use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tracing::info;

use differentie_backend::config::ServiceConfig;
use differentie_backend::routes::build_router;
use differentie_backend::state::{spawn_session_sweeper, AppState};
use differentie_backend::telemetry;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
  telemetry::init_tracing();

  let config = ServiceConfig::load();
  let addr = SocketAddr::from(([0, 0, 0, 0], config.port));

  // Shared application state (generation backend, extractor, sessions).
  let state = Arc::new(AppState::new(config));
  spawn_session_sweeper(state.clone());
  let app = build_router(state);

  let listener = TcpListener::bind(addr).await?;
  info!(target: "differentie_backend", %addr, "HTTP server listening");
  axum::serve(listener, app)
    .with_graceful_shutdown(shutdown_signal())
    .await?;
  Ok(())
}

async fn shutdown_signal() {
  if let Err(e) = tokio::signal::ctrl_c().await {
    tracing::error!(target: "differentie_backend", error = %e, "Failed to listen for shutdown signal");
    std::future::pending::<()>().await;
  }
  info!(target: "differentie_backend", "Shutdown signal received");
}
