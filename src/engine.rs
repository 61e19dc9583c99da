//! Session engine: the lifecycle operations shared by the HTTP and WebSocket handlers.
//!
//!   - `start`         validate settings, open a session, issue the first (easy) question
//!   - `submit_answer` score the pending question, append to the log, apply policies
//!   - `get_report`    build the final report once the session has ended
//!
//! A submission holds the session's lock for its whole duration and mutates nothing
//! until scoring has succeeded, so a failed or timed-out submission leaves the
//! session exactly as it was and can be retried with the same question id.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::bank::QuestionBank;
use crate::config::{EngineConfig, ReportConfig};
use crate::domain::{AnsweredQuestion, Difficulty, Evaluation, Question, SessionStatus, Settings, SettingsIn};
use crate::error::EngineError;
use crate::policy::{adjust_difficulty, evaluate_termination, next_strikes};
use crate::profile::{analyze, infer_skills, Analysis};
use crate::report::{build, Report};
use crate::scoring::{validate_evaluation, AnswerScorer, ScoreRequest};
use crate::store::{Session, SessionStore};

#[derive(Debug, Clone, Serialize)]
pub struct Started {
  pub session_id: String,
  pub question: Question,
}

/// Client-facing snapshot of a session after a submission.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct StateView {
  pub difficulty: Difficulty,
  /// Answered questions so far.
  pub question_count: usize,
  pub strikes: u32,
  pub readiness_score: u32,
  pub terminated: bool,
  pub status: SessionStatus,
}

impl StateView {
  fn of(s: &Session) -> Self {
    Self {
      difficulty: s.current_difficulty,
      question_count: s.history.len(),
      strikes: s.strikes,
      readiness_score: s.readiness_score().map_or(0, |r| r.round() as u32),
      terminated: s.status == SessionStatus::Terminated,
      status: s.status,
    }
  }
}

#[derive(Debug, Clone, Serialize)]
pub struct Submission {
  pub evaluation: Evaluation,
  pub next_question: Option<Question>,
  pub state: StateView,
}

pub struct SessionEngine {
  store: SessionStore,
  bank: QuestionBank,
  scorer: Arc<dyn AnswerScorer>,
  engine_cfg: EngineConfig,
  report_cfg: ReportConfig,
}

impl SessionEngine {
  pub fn new(
    bank: QuestionBank,
    scorer: Arc<dyn AnswerScorer>,
    engine_cfg: EngineConfig,
    report_cfg: ReportConfig,
  ) -> Self {
    Self { store: SessionStore::new(), bank, scorer, engine_cfg, report_cfg }
  }

  pub fn scorer_name(&self) -> &'static str {
    self.scorer.name()
  }

  #[instrument(level = "info", skip(self, resume_text, jd_text), fields(resume_len = resume_text.len(), jd_len = jd_text.len()))]
  pub async fn start(&self, resume_text: &str, jd_text: &str, settings: SettingsIn) -> Result<Started, EngineError> {
    let settings = Settings::try_from(settings)?;
    let preferred = infer_skills(resume_text, jd_text, &self.bank.skills());

    let mut session = Session::new(Uuid::new_v4().to_string(), settings, preferred);
    let question = self
      .bank
      .select(Difficulty::Easy, &session.preferred_skills, &session.asked)
      .ok_or_else(|| EngineError::NoQuestionAvailable(Difficulty::Easy.to_string()))?;
    session.asked.insert(question.id.clone());
    session.pending = Some(question.clone());

    let session_id = session.id.clone();
    info!(
      target: "interview",
      %session_id,
      question_id = %question.id,
      skill = %question.skill,
      preferred_skills = ?session.preferred_skills,
      max_questions = settings.max_questions,
      "Session started"
    );
    self.store.insert(session).await;
    Ok(Started { session_id, question })
  }

  #[instrument(level = "info", skip(self, answer_text), fields(%session_id, %question_id, answer_len = answer_text.len()))]
  pub async fn submit_answer(
    &self,
    session_id: &str,
    question_id: &str,
    answer_text: &str,
    time_taken_sec: u32,
  ) -> Result<Submission, EngineError> {
    let mut session = self
      .store
      .lock(session_id)
      .await
      .ok_or_else(|| EngineError::SessionNotFound(session_id.to_string()))?;

    if session.status != SessionStatus::Active {
      return Err(EngineError::SessionTerminated(session_id.to_string()));
    }
    let pending = session
      .pending
      .clone()
      .ok_or_else(|| EngineError::SessionTerminated(session_id.to_string()))?;
    if pending.id != question_id {
      return Err(EngineError::QuestionMismatch { expected: pending.id, got: question_id.to_string() });
    }
    session.touch();

    let req = ScoreRequest {
      question: &pending,
      answer_text,
      time_taken_sec,
      time_limit_sec: session.settings.time_limit_sec,
    };
    let evaluation = match tokio::time::timeout(self.engine_cfg.scoring_timeout(), self.scorer.score(&req)).await {
      Ok(Ok(e)) => e,
      Ok(Err(e)) => {
        warn!(target: "interview", %session_id, scorer = self.scorer.name(), error = %e, "Scoring failed; session unchanged");
        return Err(e.into());
      }
      Err(_) => {
        warn!(target: "interview", %session_id, scorer = self.scorer.name(), "Scoring timed out; session unchanged");
        return Err(EngineError::ScoringTimeout(self.engine_cfg.scoring_timeout_ms));
      }
    };
    validate_evaluation(&evaluation)?;

    // Commit. Nothing below awaits, so the whole step lands or none of it does.
    let score = evaluation.score_0_100;
    session.history.push(AnsweredQuestion {
      question: pending,
      answer_text: answer_text.to_string(),
      time_taken_sec,
      evaluation: evaluation.clone(),
    });
    session.strikes = next_strikes(session.strikes, score, self.engine_cfg.badness_threshold);

    let mut status = evaluate_termination(
      session.history.len(),
      session.settings.max_questions,
      session.strikes,
      session.readiness_score(),
      session.settings.early_terminate_threshold,
      &self.engine_cfg,
    );

    let mut next_question = None;
    if status == SessionStatus::Active {
      session.current_difficulty = adjust_difficulty(session.current_difficulty, score);
      match self.bank.select(session.current_difficulty, &session.preferred_skills, &session.asked) {
        Some(q) => {
          session.asked.insert(q.id.clone());
          next_question = Some(q);
        }
        None => {
          warn!(target: "interview", %session_id, difficulty = %session.current_difficulty, "Bank has no question at this level; completing session");
          status = SessionStatus::Completed;
        }
      }
    }
    session.status = status;
    session.pending = next_question.clone();

    let state = StateView::of(&session);
    info!(
      target: "interview",
      %session_id,
      score,
      strikes = state.strikes,
      readiness = state.readiness_score,
      answered = state.question_count,
      status = ?state.status,
      "Answer scored"
    );
    if status != SessionStatus::Active {
      info!(target: "interview", %session_id, status = ?status, answered = state.question_count, "Session ended");
    }

    Ok(Submission { evaluation, next_question, state })
  }

  #[instrument(level = "info", skip(self), fields(%session_id))]
  pub async fn get_report(&self, session_id: &str) -> Result<Report, EngineError> {
    let mut session = self
      .store
      .lock(session_id)
      .await
      .ok_or_else(|| EngineError::SessionNotFound(session_id.to_string()))?;
    if session.status == SessionStatus::Active {
      return Err(EngineError::ReportNotReady(session_id.to_string()));
    }
    session.touch();
    let report = build(&session.history, &self.report_cfg);
    info!(
      target: "interview",
      %session_id,
      readiness = report.readiness_score_0_100,
      hiring_readiness = ?report.hiring_readiness,
      "Report built"
    );
    Ok(report)
  }

  pub fn analyze(&self, resume_text: &str, jd_text: &str) -> Analysis {
    analyze(resume_text, jd_text, &self.bank.skills())
  }

  pub async fn session_count(&self) -> usize {
    self.store.len().await
  }

  pub async fn sweep_expired(&self, ttl: Duration) -> usize {
    let removed = self.store.sweep_expired(ttl).await;
    if removed > 0 {
      info!(target: "interview", removed, "Expired idle sessions");
    }
    removed
  }
}
