//! OpenAI-backed grader.
//!
//! We only call chat.completions in JSON-object mode. The model grades four rubric
//! dimensions and writes feedback; time efficiency and the aggregate are computed
//! locally so they stay deterministic.
//!
//! NOTE: We never log the API key or answer text, only lengths and token usage.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument};

use crate::config::Prompts;
use crate::domain::{Evaluation, RubricScores};
use crate::error::ScoringError;
use crate::scoring::{aggregate, time_efficiency, AnswerScorer, ScoreRequest};
use crate::util::fill_template;

#[derive(Clone)]
pub struct OpenAI {
  pub client: reqwest::Client,
  pub api_key: String,
  pub base_url: String,
  pub model: String,
}

impl OpenAI {
  /// Construct the client if we find OPENAI_API_KEY; otherwise return None.
  pub fn from_env() -> Option<Self> {
    let api_key = std::env::var("OPENAI_API_KEY").ok()?;
    let base_url =
      std::env::var("OPENAI_BASE_URL").unwrap_or_else(|_| "https://api.openai.com/v1".into());
    let model =
      std::env::var("OPENAI_MODEL").unwrap_or_else(|_| "gpt-4o-mini".into());

    let client = reqwest::Client::builder()
      .timeout(Duration::from_secs(20))
      .build()
      .ok()?;

    Some(Self { client, api_key, base_url, model })
  }

  /// JSON-object chat completion. Generic over the target type T.
  #[instrument(level = "info", skip(self, system, user), fields(model = %self.model))]
  async fn chat_json<T: for<'a> Deserialize<'a>>(
    &self,
    system: &str,
    user: &str,
    temperature: f32,
  ) -> Result<T, ScoringError> {
    let url = format!("{}/chat/completions", self.base_url);
    let req = ChatCompletionRequest {
      model: self.model.clone(),
      messages: vec![
        ChatMessageReq { role: "system".into(), content: system.into() },
        ChatMessageReq { role: "user".into(), content: user.into() },
      ],
      temperature,
      response_format: Some(ResponseFormat { r#type: "json_object".into() }),
      max_tokens: Some(400),
    };

    let res = self.client.post(&url)
      .header(USER_AGENT, "mock-interview-backend/0.1")
      .header(CONTENT_TYPE, "application/json")
      .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
      .json(&req).send().await.map_err(|e| ScoringError::Backend(e.to_string()))?;

    if !res.status().is_success() {
      let status = res.status();
      let body = res.text().await.unwrap_or_default();
      let msg = extract_openai_error(&body).unwrap_or(body);
      return Err(ScoringError::Backend(format!("OpenAI HTTP {}: {}", status, msg)));
    }

    let body: ChatCompletionResponse = res.json().await.map_err(|e| ScoringError::Malformed(e.to_string()))?;
    if let Some(usage) = &body.usage {
      info!(target: "scoring", prompt_tokens = ?usage.prompt_tokens, completion_tokens = ?usage.completion_tokens, total_tokens = ?usage.total_tokens, "OpenAI usage");
    }
    let text = body.choices.first()
      .and_then(|c| c.message.content.clone())
      .unwrap_or_default();

    serde_json::from_str::<T>(&text).map_err(|e| ScoringError::Malformed(format!("JSON parse error: {}", e)))
  }
}

#[derive(Deserialize)]
struct Graded {
  accuracy: i64,
  clarity: i64,
  depth: i64,
  relevance: i64,
  #[serde(default)]
  feedback: Vec<String>,
}

/// Turn the model's grades into an `Evaluation`, rejecting anything out of range.
fn to_evaluation(g: Graded, req: &ScoreRequest<'_>) -> Result<Evaluation, ScoringError> {
  let dim = |name: &str, v: i64| -> Result<u32, ScoringError> {
    if (0..=100).contains(&v) {
      Ok(v as u32)
    } else {
      Err(ScoringError::Malformed(format!("{} = {} is outside 0..=100", name, v)))
    }
  };
  let breakdown = RubricScores {
    accuracy: dim("accuracy", g.accuracy)?,
    clarity: dim("clarity", g.clarity)?,
    depth: dim("depth", g.depth)?,
    relevance: dim("relevance", g.relevance)?,
    time_efficiency: time_efficiency(req.time_taken_sec, req.time_limit_sec),
  };
  let mut feedback: Vec<String> = g
    .feedback
    .into_iter()
    .map(|f| f.trim().to_string())
    .filter(|f| !f.is_empty())
    .collect();
  if feedback.is_empty() {
    return Err(ScoringError::Malformed("no feedback".into()));
  }
  if breakdown.time_efficiency < 100 {
    feedback.push("Try to answer within the time limit.".into());
  }
  Ok(Evaluation { score_0_100: aggregate(&breakdown), breakdown, feedback })
}

/// `AnswerScorer` that asks the chat model to grade.
pub struct OpenAiScorer {
  client: OpenAI,
  prompts: Prompts,
}

impl OpenAiScorer {
  pub fn new(client: OpenAI, prompts: Prompts) -> Self {
    Self { client, prompts }
  }
}

#[async_trait]
impl AnswerScorer for OpenAiScorer {
  #[instrument(level = "info", skip_all, fields(question_id = %req.question.id, answer_len = req.answer_text.len()))]
  async fn score(&self, req: &ScoreRequest<'_>) -> Result<Evaluation, ScoringError> {
    let taken = req.time_taken_sec.to_string();
    let limit = req.time_limit_sec.to_string();
    let user = fill_template(
      &self.prompts.grade_user_template,
      &[
        ("question", req.question.text.as_str()),
        ("skill", req.question.skill.as_str()),
        ("difficulty", req.question.difficulty.as_str()),
        ("time_taken_sec", taken.as_str()),
        ("time_limit_sec", limit.as_str()),
        ("answer", req.answer_text),
      ],
    );

    let start = std::time::Instant::now();
    let graded = self.client.chat_json::<Graded>(&self.prompts.grade_system, &user, 0.0).await;
    let elapsed = start.elapsed();
    match graded {
      Ok(g) => {
        info!(target: "scoring", ?elapsed, "Model grade received");
        to_evaluation(g, req)
      }
      Err(e) => {
        error!(target: "scoring", ?elapsed, error = %e, "Model call failed during grading");
        Err(e)
      }
    }
  }

  fn name(&self) -> &'static str { "openai" }
}

// --- Chat DTOs ---

#[derive(Serialize)]
struct ChatCompletionRequest {
  model: String,
  messages: Vec<ChatMessageReq>,
  temperature: f32,
  #[serde(skip_serializing_if = "Option::is_none")]
  response_format: Option<ResponseFormat>,
  #[serde(skip_serializing_if = "Option::is_none")]
  max_tokens: Option<u32>,
}
#[derive(Serialize)]
struct ChatMessageReq { role: String, content: String }
#[derive(Serialize)]
struct ResponseFormat { #[serde(rename = "type")] r#type: String }

#[derive(Deserialize)]
struct ChatCompletionResponse {
  choices: Vec<ChatChoice>,
  #[serde(default)] usage: Option<Usage>,
}
#[derive(Deserialize)]
struct ChatChoice { message: ChatMessageResp }
#[derive(Deserialize)]
struct ChatMessageResp { content: Option<String> }
#[derive(Deserialize)]
struct Usage {
  #[serde(default)] prompt_tokens: Option<u32>,
  #[serde(default)] completion_tokens: Option<u32>,
  #[serde(default)] total_tokens: Option<u32>,
}

/// Try to extract a clean error message from OpenAI error body.
fn extract_openai_error(body: &str) -> Option<String> {
  #[derive(Deserialize)]
  struct EWrap { error: EObj }
  #[derive(Deserialize)]
  struct EObj { message: String }
  match serde_json::from_str::<EWrap>(body) {
    Ok(w) => Some(w.error.message),
    Err(_) => None,
  }
}
