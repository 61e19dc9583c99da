//! Loading service configuration (engine policy, report caps, session expiry,
//! grader prompts and an optional extra question bank) from TOML.
//!
//! Every section is optional; missing values fall back to the defaults below.

use std::time::Duration;

use serde::Deserialize;
use tracing::{error, info};

use crate::domain::Difficulty;

#[derive(Clone, Debug, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
  pub engine: EngineConfig,
  pub report: ReportConfig,
  pub sessions: SessionsConfig,
  pub scoring: ScoringConfig,
  pub bank: BankConfig,
  pub server: ServerConfig,
  pub prompts: Prompts,
  pub questions: Vec<QuestionCfg>,
}

/// Policy constants used while a session runs.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
  /// An answer scoring below this counts as a strike.
  pub badness_threshold: u32,
  pub strike_limit: u32,
  /// Answers required before the readiness-collapse rule may fire.
  pub min_answers_for_threshold: usize,
  pub scoring_timeout_ms: u64,
}

impl Default for EngineConfig {
  fn default() -> Self {
    Self {
      badness_threshold: 40,
      strike_limit: 3,
      min_answers_for_threshold: 3,
      scoring_timeout_ms: 30_000,
    }
  }
}

impl EngineConfig {
  pub fn scoring_timeout(&self) -> Duration {
    Duration::from_millis(self.scoring_timeout_ms)
  }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
  pub strength_threshold: u32,
  pub weakness_threshold: u32,
  /// How many of the lowest-scoring answers contribute feedback.
  pub feedback_source_answers: usize,
  pub max_feedback_items: usize,
}

impl Default for ReportConfig {
  fn default() -> Self {
    Self {
      strength_threshold: 75,
      weakness_threshold: 50,
      feedback_source_answers: 3,
      max_feedback_items: 5,
    }
  }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct SessionsConfig {
  pub ttl_secs: u64,
  pub sweep_interval_secs: u64,
}

impl Default for SessionsConfig {
  fn default() -> Self {
    Self { ttl_secs: 7200, sweep_interval_secs: 300 }
  }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
  /// When the remote grader fails, score with the local heuristic instead of failing.
  pub fallback_to_local: bool,
}

impl Default for ScoringConfig {
  fn default() -> Self {
    Self { fallback_to_local: true }
  }
}

#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum SelectionMode {
  /// Among equally ranked candidates, pick the lowest id.
  #[default]
  LowestId,
  /// Among equally ranked candidates, pick uniformly at random.
  Random,
}

#[derive(Clone, Debug, Deserialize, Default)]
#[serde(default)]
pub struct BankConfig {
  pub selection: SelectionMode,
}

#[derive(Clone, Debug, Deserialize, Default)]
#[serde(default)]
pub struct ServerConfig {
  /// Empty means any origin.
  pub allowed_origins: Vec<String>,
}

/// Question entry accepted in TOML configuration.
#[derive(Clone, Debug, Deserialize)]
pub struct QuestionCfg {
  pub id: String,
  pub text: String,
  pub skill: String,
  pub difficulty: Difficulty,
}

/// Prompts used by the OpenAI grader.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Prompts {
  pub grade_system: String,
  pub grade_user_template: String,
}

impl Default for Prompts {
  fn default() -> Self {
    Self {
      grade_system: "You are a strict but fair technical interviewer grading a candidate's spoken-style answer. Respond ONLY with strict JSON.".into(),
      grade_user_template: "Skill: {skill}\nDifficulty: {difficulty}\nQuestion: {question}\nCandidate answer: {answer}\nTime taken: {time_taken_sec}s of {time_limit_sec}s\n\nReturn JSON {\"accuracy\": int, \"clarity\": int, \"depth\": int, \"relevance\": int, \"feedback\": [string]}. Each score is 0-100. Give 1-3 short, actionable feedback items. An empty or off-topic answer scores low on every dimension.".into(),
    }
  }
}

pub fn parse_config(raw: &str) -> Result<AppConfig, toml::de::Error> {
  toml::from_str::<AppConfig>(raw)
}

impl AppConfig {
  /// Reject policy knobs that would break the termination rules or the report labels.
  pub fn validate(&self) -> Result<(), String> {
    let e = &self.engine;
    if e.strike_limit == 0 {
      return Err("engine.strike_limit must be at least 1".into());
    }
    if e.min_answers_for_threshold == 0 {
      return Err("engine.min_answers_for_threshold must be at least 1".into());
    }
    if e.scoring_timeout_ms == 0 {
      return Err("engine.scoring_timeout_ms must be positive".into());
    }
    for (name, v) in [
      ("engine.badness_threshold", e.badness_threshold),
      ("report.strength_threshold", self.report.strength_threshold),
      ("report.weakness_threshold", self.report.weakness_threshold),
    ] {
      if v > 100 {
        return Err(format!("{} must be within 0..=100 (got {})", name, v));
      }
    }
    Ok(())
  }
}

/// Parsed and validated config, or defaults when either step fails.
fn config_or_defaults(path: &str, raw: &str) -> AppConfig {
  let cfg = match parse_config(raw) {
    Ok(cfg) => cfg,
    Err(e) => {
      error!(target: "mock_interview", %path, error = %e, "Failed to parse TOML config; using defaults");
      return AppConfig::default();
    }
  };
  if let Err(reason) = cfg.validate() {
    error!(target: "mock_interview", %path, %reason, "Invalid config values; using defaults");
    return AppConfig::default();
  }
  info!(target: "mock_interview", %path, questions = cfg.questions.len(), "Loaded config (TOML)");
  cfg
}

/// Attempt to load `AppConfig` from INTERVIEW_CONFIG_PATH. On any parsing/IO error, returns defaults.
pub fn load_config_from_env() -> AppConfig {
  let Ok(path) = std::env::var("INTERVIEW_CONFIG_PATH") else {
    return AppConfig::default();
  };
  match std::fs::read_to_string(&path) {
    Ok(s) => config_or_defaults(&path, &s),
    Err(e) => {
      error!(target: "mock_interview", %path, error = %e, "Failed to read TOML config file; using defaults");
      AppConfig::default()
    }
  }
}
