//! Error taxonomy for the interview engine and its HTTP mapping.

use axum::{http::StatusCode, response::{IntoResponse, Response}, Json};
use serde::Serialize;
use thiserror::Error;

/// Errors surfaced by engine operations. Every variant carries a human-readable message.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EngineError {
  #[error("invalid settings: {0}")]
  InvalidSettings(String),

  /// Malformed request body or query (unparsable JSON, wrong types).
  #[error("invalid request: {0}")]
  InvalidRequest(String),

  #[error("session not found: {0}")]
  SessionNotFound(String),

  #[error("session {0} is no longer active")]
  SessionTerminated(String),

  #[error("question {got} is not the pending question (expected {expected})")]
  QuestionMismatch { expected: String, got: String },

  #[error("session {0} is still active; the report is available once it ends")]
  ReportNotReady(String),

  #[error("scoring did not finish within {0} ms")]
  ScoringTimeout(u64),

  #[error("scoring backend failed: {0}")]
  ScoringBackend(String),

  /// The question bank has nothing at the requested level.
  #[error("no question available at difficulty {0}")]
  NoQuestionAvailable(String),
}

impl EngineError {
  pub fn code(&self) -> &'static str {
    match self {
      EngineError::InvalidSettings(_) => "INVALID_SETTINGS",
      EngineError::InvalidRequest(_) => "INVALID_REQUEST",
      EngineError::SessionNotFound(_) => "SESSION_NOT_FOUND",
      EngineError::SessionTerminated(_) => "SESSION_TERMINATED",
      EngineError::QuestionMismatch { .. } => "QUESTION_MISMATCH",
      EngineError::ReportNotReady(_) => "REPORT_NOT_READY",
      EngineError::ScoringTimeout(_) => "SCORING_TIMEOUT",
      EngineError::ScoringBackend(_) => "SCORING_BACKEND",
      EngineError::NoQuestionAvailable(_) => "NO_QUESTION_AVAILABLE",
    }
  }

  pub fn status(&self) -> StatusCode {
    match self {
      EngineError::InvalidSettings(_) | EngineError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
      EngineError::SessionNotFound(_) => StatusCode::NOT_FOUND,
      EngineError::SessionTerminated(_)
      | EngineError::QuestionMismatch { .. }
      | EngineError::ReportNotReady(_) => StatusCode::CONFLICT,
      EngineError::ScoringTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
      EngineError::ScoringBackend(_) => StatusCode::BAD_GATEWAY,
      EngineError::NoQuestionAvailable(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
  }

  /// Only grader failures are transient; everything else is a caller bug or stale state.
  pub fn retryable(&self) -> bool {
    matches!(self, EngineError::ScoringTimeout(_) | EngineError::ScoringBackend(_))
  }
}

/// Failures reported by an `AnswerScorer` implementation.
#[derive(Debug, Error)]
pub enum ScoringError {
  #[error("grader unavailable: {0}")]
  Backend(String),

  #[error("grader returned a malformed evaluation: {0}")]
  Malformed(String),
}

impl From<ScoringError> for EngineError {
  fn from(err: ScoringError) -> Self {
    EngineError::ScoringBackend(err.to_string())
  }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
  pub error: String,
  pub code: String,
  pub retryable: bool,
}

impl IntoResponse for EngineError {
  fn into_response(self) -> Response {
    let body = ErrorResponse {
      error: self.to_string(),
      code: self.code().into(),
      retryable: self.retryable(),
    };
    (self.status(), Json(body)).into_response()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn only_scoring_errors_are_retryable() {
    assert!(EngineError::ScoringTimeout(10).retryable());
    assert!(EngineError::ScoringBackend("down".into()).retryable());
    assert!(!EngineError::InvalidSettings("x".into()).retryable());
    assert!(!EngineError::QuestionMismatch { expected: "a".into(), got: "b".into() }.retryable());
  }

  #[test]
  fn status_codes_are_distinct_per_kind() {
    assert_eq!(EngineError::SessionNotFound("s".into()).status(), StatusCode::NOT_FOUND);
    assert_eq!(EngineError::ReportNotReady("s".into()).status(), StatusCode::CONFLICT);
    assert_eq!(EngineError::ScoringTimeout(1).status(), StatusCode::GATEWAY_TIMEOUT);
    assert_eq!(EngineError::from(ScoringError::Malformed("x".into())).code(), "SCORING_BACKEND");
  }
}
