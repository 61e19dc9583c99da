//! Application state: the session engine and the settings the HTTP layer needs.
//!
//! This module owns:
//!   - the question bank (built-in + TOML)
//!   - the grader selection (OpenAI when configured, local heuristic otherwise)
//!   - the session engine and its store
//!
//! If OpenAI is unavailable, every answer is graded by the local heuristic.

use std::{sync::Arc, time::Duration};

use tracing::{info, instrument};

use crate::bank::QuestionBank;
use crate::config::{load_config_from_env, AppConfig, SessionsConfig};
use crate::engine::SessionEngine;
use crate::openai::{OpenAI, OpenAiScorer};
use crate::scoring::{AnswerScorer, FallbackScorer, HeuristicScorer};

pub struct AppState {
    pub engine: SessionEngine,
    pub sessions: SessionsConfig,
    pub allowed_origins: Vec<String>,
}

impl AppState {
    /// Build state from env: load config, build the bank, pick a grader.
    #[instrument(level = "info", skip_all)]
    pub fn new() -> Self {
        let cfg = load_config_from_env();

        let scorer: Arc<dyn AnswerScorer> = match OpenAI::from_env() {
            Some(oa) => {
                info!(target: "mock_interview", base_url = %oa.base_url, model = %oa.model, fallback_to_local = cfg.scoring.fallback_to_local, "OpenAI grading enabled.");
                let remote: Arc<dyn AnswerScorer> = Arc::new(OpenAiScorer::new(oa, cfg.prompts.clone()));
                if cfg.scoring.fallback_to_local {
                    Arc::new(FallbackScorer::new(remote))
                } else {
                    remote
                }
            }
            None => {
                info!(target: "mock_interview", "OpenAI disabled (no OPENAI_API_KEY). Using local heuristic grading.");
                Arc::new(HeuristicScorer)
            }
        };

        Self::from_config(cfg, scorer)
    }

    /// Build state around an explicit grader.
    pub fn from_config(cfg: AppConfig, scorer: Arc<dyn AnswerScorer>) -> Self {
        let bank = QuestionBank::with_config(&cfg.questions, cfg.bank.selection);
        let engine = SessionEngine::new(bank, scorer, cfg.engine, cfg.report);
        Self {
            engine,
            sessions: cfg.sessions,
            allowed_origins: cfg.server.allowed_origins,
        }
    }
}

/// Periodically remove idle sessions for as long as the process runs.
pub fn spawn_session_sweeper(state: Arc<AppState>) -> tokio::task::JoinHandle<()> {
    let ttl = Duration::from_secs(state.sessions.ttl_secs);
    let every = Duration::from_secs(state.sessions.sweep_interval_secs.max(1));
    tokio::spawn(async move {
        let mut tick = tokio::time::interval(every);
        // The first tick completes immediately.
        tick.tick().await;
        loop {
            tick.tick().await;
            state.engine.sweep_expired(ttl).await;
        }
    })
}
