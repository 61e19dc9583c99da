//! Adaptive mock interview backend
//!
//! - Axum HTTP + WebSocket API over one session engine
//! - Adaptive difficulty, strike/readiness early termination, final report
//! - Optional OpenAI grading (via environment variables), local heuristic otherwise
//!
//! Important env variables:
//!   PORT                  : u16 (default 8000)
//!   INTERVIEW_CONFIG_PATH : path to TOML config (engine knobs, prompts, extra questions)
//!   OPENAI_API_KEY        : enables OpenAI grading if present
//!   OPENAI_BASE_URL       : default "https://api.openai.com/v1"
//!   OPENAI_MODEL          : default "gpt-4o-mini"
//!   LOG_LEVEL             : tracing filter, e.g. "debug" or full directives
//!   LOG_FORMAT            : "pretty" (default) or "json"

mod telemetry;
mod util;
mod domain;
mod error;
mod config;
mod bank;
mod profile;
mod scoring;
mod openai;
mod policy;
mod store;
mod engine;
mod report;
mod state;
mod protocol;
mod routes;

use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tracing::info;

use crate::routes::build_router;
use crate::state::{spawn_session_sweeper, AppState};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
  telemetry::init_tracing();

  let state = Arc::new(AppState::new());
  let _sweeper = spawn_session_sweeper(state.clone());

  let app = build_router(state.clone());

  let addr: SocketAddr = std::env::var("PORT")
    .ok()
    .and_then(|p| p.parse::<u16>().ok())
    .map(|port| SocketAddr::from(([0, 0, 0, 0], port)))
    .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], 8000)));

  let listener = TcpListener::bind(addr).await?;
  info!(target: "mock_interview", %addr, scorer = state.engine.scorer_name(), "HTTP server listening");
  axum::serve(listener, app)
    .with_graceful_shutdown(shutdown_signal())
    .await?;
  info!(target: "mock_interview", "Server stopped");
  Ok(())
}

async fn shutdown_signal() {
  if let Err(e) = tokio::signal::ctrl_c().await {
    tracing::error!(target: "mock_interview", error = %e, "Failed to listen for shutdown signal");
    std::future::pending::<()>().await;
  }
}
