//! HTTP endpoint handlers. These are thin wrappers that forward to the session engine.
//! Engine errors render as `{error, code, retryable}` with the matching status code;
//! unparsable bodies and queries are reported the same way as `INVALID_REQUEST`.

use std::sync::Arc;
use axum::{
  extract::{rejection::{JsonRejection, QueryRejection}, Query, State},
  Json,
};
use tracing::{info, instrument};

use crate::engine::{Started, Submission};
use crate::error::EngineError;
use crate::profile::Analysis;
use crate::protocol::*;
use crate::report::Report;
use crate::state::AppState;

fn bad_body(rejection: JsonRejection) -> EngineError {
  EngineError::InvalidRequest(rejection.body_text())
}

#[instrument(level = "info", skip(state))]
pub async fn http_health(State(state): State<Arc<AppState>>) -> Json<HealthOut> {
  Json(HealthOut {
    ok: true,
    sessions: state.engine.session_count().await,
    scorer: state.engine.scorer_name().into(),
  })
}

#[instrument(level = "info", skip_all)]
pub async fn http_post_analyze(
  State(state): State<Arc<AppState>>,
  body: Result<Json<AnalyzeIn>, JsonRejection>,
) -> Result<Json<Analysis>, EngineError> {
  let Json(body) = body.map_err(bad_body)?;
  let analysis = state.engine.analyze(&body.resume_text, &body.jd_text);
  info!(target: "interview", skills = ?analysis.skills, "HTTP analyze served");
  Ok(Json(analysis))
}

#[instrument(level = "info", skip_all)]
pub async fn http_post_start(
  State(state): State<Arc<AppState>>,
  body: Result<Json<StartIn>, JsonRejection>,
) -> Result<Json<Started>, EngineError> {
  let Json(body) = body.map_err(bad_body)?;
  let started = state.engine.start(&body.resume_text, &body.jd_text, body.settings).await?;
  Ok(Json(started))
}

#[instrument(level = "info", skip_all)]
pub async fn http_post_answer(
  State(state): State<Arc<AppState>>,
  body: Result<Json<AnswerIn>, JsonRejection>,
) -> Result<Json<Submission>, EngineError> {
  let Json(body) = body.map_err(bad_body)?;
  let submission = state
    .engine
    .submit_answer(&body.session_id, &body.question_id, &body.answer_text, body.time_taken_sec)
    .await?;
  Ok(Json(submission))
}

#[instrument(level = "info", skip_all)]
pub async fn http_get_report(
  State(state): State<Arc<AppState>>,
  query: Result<Query<ReportQuery>, QueryRejection>,
) -> Result<Json<Report>, EngineError> {
  let Query(q) = query.map_err(|r| EngineError::InvalidRequest(r.body_text()))?;
  let report = state.engine.get_report(&q.session_id).await?;
  Ok(Json(report))
}
