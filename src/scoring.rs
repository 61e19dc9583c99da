//! Answer scoring: the grader seam used by the engine, rubric aggregation, and a
//! deterministic local grader.
//!
//! The engine only ever sees `dyn AnswerScorer`. Generative graders (see `openai.rs`)
//! live behind the same trait and may be wrapped in `FallbackScorer`.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, error, instrument};

use crate::domain::{Difficulty, Evaluation, Question, RubricScores};
use crate::error::ScoringError;

/// Everything a grader may look at for one answer.
#[derive(Debug, Clone, Copy)]
pub struct ScoreRequest<'a> {
  pub question: &'a Question,
  pub answer_text: &'a str,
  pub time_taken_sec: u32,
  pub time_limit_sec: u32,
}

#[async_trait]
pub trait AnswerScorer: Send + Sync {
  async fn score(&self, req: &ScoreRequest<'_>) -> Result<Evaluation, ScoringError>;

  /// Short label for logs.
  fn name(&self) -> &'static str;
}

const W_ACCURACY: f64 = 0.30;
const W_CLARITY: f64 = 0.20;
const W_DEPTH: f64 = 0.20;
const W_RELEVANCE: f64 = 0.20;
const W_TIME: f64 = 0.10;

/// Weighted aggregate of the five rubric dimensions, rounded to 0..=100.
pub fn aggregate(r: &RubricScores) -> u32 {
  let v = W_ACCURACY * r.accuracy as f64
    + W_CLARITY * r.clarity as f64
    + W_DEPTH * r.depth as f64
    + W_RELEVANCE * r.relevance as f64
    + W_TIME * r.time_efficiency as f64;
  v.round().clamp(0.0, 100.0) as u32
}

/// 100 within the limit, otherwise the limit as a percentage of the time taken.
pub fn time_efficiency(time_taken_sec: u32, time_limit_sec: u32) -> u32 {
  if time_taken_sec <= time_limit_sec {
    100
  } else {
    ((time_limit_sec as f64 * 100.0) / time_taken_sec as f64).round() as u32
  }
}

/// Reject evaluations a grader should never produce.
pub fn validate_evaluation(e: &Evaluation) -> Result<(), ScoringError> {
  if e.score_0_100 > 100 || !e.breakdown.all_in_range() {
    return Err(ScoringError::Malformed("score outside 0..=100".into()));
  }
  if e.feedback.iter().all(|f| f.trim().is_empty()) {
    return Err(ScoringError::Malformed("no feedback".into()));
  }
  Ok(())
}

const STOPWORDS: &[&str] = &[
  "what", "that", "this", "with", "would", "could", "should", "your", "have", "from", "between",
  "explain", "describe", "design", "difference", "consider", "does", "like", "they", "their", "there",
  "which", "when", "where", "about", "into", "approaches",
];

fn tokens(text: &str) -> Vec<String> {
  text
    .split(|c: char| !c.is_alphanumeric())
    .filter(|t| !t.is_empty())
    .map(str::to_lowercase)
    .collect()
}

fn keywords(question: &str) -> HashSet<String> {
  tokens(question)
    .into_iter()
    .filter(|t| t.chars().count() >= 4 && !STOPWORDS.contains(&t.as_str()))
    .collect()
}

/// Deterministic grader built from length, structure and keyword overlap.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicScorer;

impl HeuristicScorer {
  pub fn evaluate(&self, req: &ScoreRequest<'_>) -> Evaluation {
    let te = time_efficiency(req.time_taken_sec, req.time_limit_sec);
    let answer = req.answer_text.trim();
    let over_time = te < 100;

    if answer.is_empty() {
      let breakdown = RubricScores { time_efficiency: te, ..RubricScores::default() };
      let mut feedback = vec!["No answer was submitted; even a partial answer earns credit.".to_string()];
      if over_time {
        feedback.push("Try to answer within the time limit.".into());
      }
      return Evaluation { score_0_100: aggregate(&breakdown), breakdown, feedback };
    }

    let words = tokens(answer);
    let chars = answer.chars().count();
    let distinct: HashSet<&String> = words.iter().collect();

    let mut base: i64 = if chars < 20 {
      35
    } else if chars < 100 {
      60
    } else {
      75 + (words.len() as i64 / 25).min(15)
    };
    base += match req.question.difficulty {
      Difficulty::Hard => 5,
      Difficulty::Medium => 0,
      Difficulty::Easy => -5,
    };

    let kws = keywords(&req.question.text);
    let overlap = if kws.is_empty() {
      0.5
    } else {
      let answer_words: HashSet<&str> = words.iter().map(String::as_str).collect();
      let hits = kws
        .iter()
        .filter(|k| answer_words.iter().any(|w| w.starts_with(k.as_str()) || (w.len() >= 4 && k.starts_with(*w))))
        .count();
      hits as f64 / kws.len() as f64
    };

    let sentences = answer.matches(|c: char| matches!(c, '.' | '!' | '?')).count().max(1);
    let avg_sentence = words.len() as f64 / sentences as f64;

    let accuracy = base + (10.0 * overlap).round() as i64 - 5;
    let clarity = base + if (6.0..=30.0).contains(&avg_sentence) { 5 } else { -5 };
    let depth = base + (distinct.len() as i64 / 15).min(10) - 5;
    let relevance = if chars < 20 { base } else { 40 + (60.0 * overlap).round() as i64 };

    let scale = |v: i64| -> u32 {
      let v = if over_time { (v as f64 * 0.8).round() as i64 } else { v };
      v.clamp(0, 100) as u32
    };
    let breakdown = RubricScores {
      accuracy: scale(accuracy),
      clarity: scale(clarity),
      depth: scale(depth),
      relevance: scale(relevance),
      time_efficiency: te,
    };
    let score = aggregate(&breakdown);

    let mut feedback = vec![];
    if score >= 75 {
      feedback.push("Excellent answer with good depth.".to_string());
    } else if score >= 50 {
      feedback.push("Good answer, but could use more detail.".to_string());
    } else {
      feedback.push("Answer needs significant improvement.".to_string());
    }
    if breakdown.relevance < 50 {
      feedback.push(format!("Tie your answer more directly to the question ({}).", req.question.skill));
    }
    if breakdown.depth < 50 {
      feedback.push("Add concrete examples, trade-offs or edge cases.".into());
    }
    if breakdown.clarity < 50 {
      feedback.push("Structure the answer in short, complete sentences.".into());
    }
    if over_time {
      feedback.push("Try to answer within the time limit.".into());
    }

    Evaluation { score_0_100: score, breakdown, feedback }
  }
}

#[async_trait]
impl AnswerScorer for HeuristicScorer {
  async fn score(&self, req: &ScoreRequest<'_>) -> Result<Evaluation, ScoringError> {
    Ok(self.evaluate(req))
  }

  fn name(&self) -> &'static str { "heuristic" }
}

/// Uses `primary`; when it fails, grades locally instead of failing the submission.
pub struct FallbackScorer {
  primary: Arc<dyn AnswerScorer>,
  local: HeuristicScorer,
}

impl FallbackScorer {
  pub fn new(primary: Arc<dyn AnswerScorer>) -> Self {
    Self { primary, local: HeuristicScorer }
  }
}

#[async_trait]
impl AnswerScorer for FallbackScorer {
  #[instrument(level = "debug", skip_all, fields(primary = self.primary.name(), question_id = %req.question.id))]
  async fn score(&self, req: &ScoreRequest<'_>) -> Result<Evaluation, ScoringError> {
    let primary = self
      .primary
      .score(req)
      .await
      .and_then(|e| validate_evaluation(&e).map(|_| e));
    match primary {
      Ok(e) => Ok(e),
      Err(e) => {
        error!(target: "scoring", primary = self.primary.name(), error = %e, "Grader failed; using local rubric.");
        let local = self.local.evaluate(req);
        debug!(target: "scoring", score = local.score_0_100, "Local rubric score");
        Ok(local)
      }
    }
  }

  fn name(&self) -> &'static str { "fallback" }
}

/// Deterministic graders for tests.
#[cfg(test)]
pub mod testing {
  use std::sync::atomic::{AtomicUsize, Ordering};
  use std::time::Duration;

  use super::*;

  /// Scores an answer with the number written in it: "80" scores 80 on every dimension.
  /// Non-numeric answers score 0.
  #[derive(Debug, Default)]
  pub struct ScriptedScorer {
    pub calls: AtomicUsize,
  }

  pub fn scripted(answer_text: &str) -> Evaluation {
    let s = answer_text.trim().parse::<u32>().unwrap_or(0).min(100);
    Evaluation {
      score_0_100: s,
      breakdown: RubricScores { accuracy: s, clarity: s, depth: s, relevance: s, time_efficiency: s },
      feedback: vec![format!("feedback for {}", s)],
    }
  }

  #[async_trait]
  impl AnswerScorer for ScriptedScorer {
    async fn score(&self, req: &ScoreRequest<'_>) -> Result<Evaluation, ScoringError> {
      self.calls.fetch_add(1, Ordering::SeqCst);
      Ok(scripted(req.answer_text))
    }
    fn name(&self) -> &'static str { "scripted" }
  }

  /// Fails (by error or by stalling) for the first `failures` calls, then behaves like `ScriptedScorer`.
  #[derive(Debug)]
  pub struct FlakyScorer {
    pub failures: usize,
    pub stall: Option<Duration>,
    pub calls: AtomicUsize,
  }

  impl FlakyScorer {
    pub fn erroring(failures: usize) -> Self {
      Self { failures, stall: None, calls: AtomicUsize::new(0) }
    }
    pub fn stalling(failures: usize, stall: Duration) -> Self {
      Self { failures, stall: Some(stall), calls: AtomicUsize::new(0) }
    }
  }

  #[async_trait]
  impl AnswerScorer for FlakyScorer {
    async fn score(&self, req: &ScoreRequest<'_>) -> Result<Evaluation, ScoringError> {
      let n = self.calls.fetch_add(1, Ordering::SeqCst);
      if n < self.failures {
        match self.stall {
          Some(d) => tokio::time::sleep(d).await,
          None => return Err(ScoringError::Backend("grader offline".into())),
        }
      }
      Ok(scripted(req.answer_text))
    }
    fn name(&self) -> &'static str { "flaky" }
  }

  /// Always returns an out-of-range evaluation.
  pub struct BrokenScorer;

  #[async_trait]
  impl AnswerScorer for BrokenScorer {
    async fn score(&self, _req: &ScoreRequest<'_>) -> Result<Evaluation, ScoringError> {
      Ok(Evaluation {
        score_0_100: 140,
        breakdown: RubricScores::default(),
        feedback: vec!["?".into()],
      })
    }
    fn name(&self) -> &'static str { "broken" }
  }
}
