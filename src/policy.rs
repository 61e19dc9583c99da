//! Session policies: difficulty adjustment, strike counting, the readiness fold and
//! the termination rule. All pure functions of session data.

use crate::config::EngineConfig;
use crate::domain::{AnsweredQuestion, Difficulty, SessionStatus};

/// Scores at or above this step the difficulty up.
pub const STEP_UP_AT: u32 = 75;
/// Scores below this step the difficulty down.
pub const STEP_DOWN_BELOW: u32 = 40;

/// Next difficulty given the last answer's score. 40..75 keeps the level.
pub fn adjust_difficulty(current: Difficulty, last_score: u32) -> Difficulty {
  if last_score >= STEP_UP_AT {
    current.harder()
  } else if last_score < STEP_DOWN_BELOW {
    current.easier()
  } else {
    current
  }
}

/// Consecutive-bad-answer counter after one more answer.
pub fn next_strikes(strikes: u32, score: u32, badness_threshold: u32) -> u32 {
  if score < badness_threshold { strikes + 1 } else { 0 }
}

/// Arithmetic mean of every recorded score, folded left to right over the log.
/// `None` until the first answer.
pub fn readiness(history: &[AnsweredQuestion]) -> Option<f64> {
  let (sum, n) = history
    .iter()
    .fold((0u64, 0u64), |(sum, n), a| (sum + a.evaluation.score_0_100 as u64, n + 1));
  if n == 0 { None } else { Some(sum as f64 / n as f64) }
}

/// Decide the status after an answer has been appended. First matching rule wins:
/// question cap, strike limit, then sustained low readiness once enough answers exist.
pub fn evaluate_termination(
  answered: usize,
  max_questions: u32,
  strikes: u32,
  readiness_score: Option<f64>,
  early_terminate_threshold: u32,
  cfg: &EngineConfig,
) -> SessionStatus {
  if answered >= max_questions as usize {
    return SessionStatus::Completed;
  }
  if strikes >= cfg.strike_limit {
    return SessionStatus::Terminated;
  }
  if answered >= cfg.min_answers_for_threshold {
    if let Some(r) = readiness_score {
      if r < early_terminate_threshold as f64 {
        return SessionStatus::Terminated;
      }
    }
  }
  SessionStatus::Active
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::domain::{Evaluation, Question, RubricScores};

  fn answered(score: u32) -> AnsweredQuestion {
    AnsweredQuestion {
      question: Question { id: "q".into(), text: "t".into(), skill: "s".into(), difficulty: Difficulty::Easy },
      answer_text: String::new(),
      time_taken_sec: 10,
      evaluation: Evaluation { score_0_100: score, breakdown: RubricScores::default(), feedback: vec!["f".into()] },
    }
  }

  #[test]
  fn hysteresis_band_keeps_level() {
    assert_eq!(adjust_difficulty(Difficulty::Medium, 75), Difficulty::Hard);
    assert_eq!(adjust_difficulty(Difficulty::Medium, 74), Difficulty::Medium);
    assert_eq!(adjust_difficulty(Difficulty::Medium, 40), Difficulty::Medium);
    assert_eq!(adjust_difficulty(Difficulty::Medium, 39), Difficulty::Easy);
    assert_eq!(adjust_difficulty(Difficulty::Hard, 100), Difficulty::Hard);
    assert_eq!(adjust_difficulty(Difficulty::Easy, 0), Difficulty::Easy);
  }

  #[test]
  fn difficulty_sequence_from_medium() {
    let mut d = Difficulty::Medium;
    let mut issued = vec![d];
    for score in [80, 55, 30] {
      d = adjust_difficulty(d, score);
      issued.push(d);
    }
    assert_eq!(issued, vec![Difficulty::Medium, Difficulty::Hard, Difficulty::Hard, Difficulty::Medium]);
  }

  #[test]
  fn strikes_increment_by_one_and_reset() {
    assert_eq!(next_strikes(0, 39, 40), 1);
    assert_eq!(next_strikes(2, 10, 40), 3);
    assert_eq!(next_strikes(2, 40, 40), 0);
    assert_eq!(next_strikes(5, 99, 40), 0);
  }

  #[test]
  fn readiness_is_plain_mean() {
    assert_eq!(readiness(&[]), None);
    let h: Vec<_> = [80, 80, 40, 40, 80].into_iter().map(answered).collect();
    assert_eq!(readiness(&h), Some(64.0));
    let h: Vec<_> = [10, 90].into_iter().map(answered).collect();
    assert_eq!(readiness(&h), Some(50.0));
  }

  #[test]
  fn termination_rules_in_order() {
    let cfg = EngineConfig::default();
    // Cap wins even when the strike limit is also reached.
    assert_eq!(evaluate_termination(3, 3, 3, Some(20.0), 50, &cfg), SessionStatus::Completed);
    assert_eq!(evaluate_termination(1, 1, 0, Some(90.0), 50, &cfg), SessionStatus::Completed);
    assert_eq!(evaluate_termination(3, 10, 3, Some(20.0), 0, &cfg), SessionStatus::Terminated);
    // Readiness rule needs three answers.
    assert_eq!(evaluate_termination(2, 10, 0, Some(10.0), 50, &cfg), SessionStatus::Active);
    assert_eq!(evaluate_termination(3, 10, 0, Some(49.9), 50, &cfg), SessionStatus::Terminated);
    assert_eq!(evaluate_termination(3, 10, 0, Some(50.0), 50, &cfg), SessionStatus::Active);
  }
}
