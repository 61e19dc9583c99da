//! Domain models used by the interview engine: difficulty ladder, questions, settings,
//! rubric scores, evaluations and the append-only answer log.

use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// Question difficulty. Ordered easy < medium < hard.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
  Easy,
  Medium,
  Hard,
}

impl Difficulty {
  pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard];

  /// One level up, saturating at hard.
  pub fn harder(self) -> Self {
    match self {
      Difficulty::Easy => Difficulty::Medium,
      Difficulty::Medium | Difficulty::Hard => Difficulty::Hard,
    }
  }

  /// One level down, saturating at easy.
  pub fn easier(self) -> Self {
    match self {
      Difficulty::Hard => Difficulty::Medium,
      Difficulty::Medium | Difficulty::Easy => Difficulty::Easy,
    }
  }

  pub fn as_str(self) -> &'static str {
    match self {
      Difficulty::Easy => "easy",
      Difficulty::Medium => "medium",
      Difficulty::Hard => "hard",
    }
  }
}

impl std::fmt::Display for Difficulty {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.as_str())
  }
}

/// A bank question. Immutable once issued.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Question {
  pub id: String,
  pub text: String,
  pub skill: String,
  pub difficulty: Difficulty,
}

pub const TIME_LIMIT_RANGE: std::ops::RangeInclusive<i64> = 30..=600;
pub const MAX_QUESTIONS_RANGE: std::ops::RangeInclusive<i64> = 1..=20;
pub const THRESHOLD_RANGE: std::ops::RangeInclusive<i64> = 0..=100;

/// Raw session settings as received from a client. Signed so that negative
/// values reach validation instead of failing deserialization.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct SettingsIn {
  pub time_limit_sec: i64,
  pub max_questions: i64,
  pub early_terminate_threshold: i64,
}

/// Validated session settings, immutable for the lifetime of a session.
#[derive(Clone, Copy, Debug, Serialize, PartialEq, Eq)]
pub struct Settings {
  pub time_limit_sec: u32,
  pub max_questions: u32,
  pub early_terminate_threshold: u32,
}

impl TryFrom<SettingsIn> for Settings {
  type Error = EngineError;

  fn try_from(s: SettingsIn) -> Result<Self, Self::Error> {
    let check = |name: &str, v: i64, range: std::ops::RangeInclusive<i64>| -> Result<u32, EngineError> {
      if range.contains(&v) {
        Ok(v as u32)
      } else {
        Err(EngineError::InvalidSettings(format!(
          "{} must be between {} and {} (got {})",
          name, range.start(), range.end(), v
        )))
      }
    };
    Ok(Settings {
      time_limit_sec: check("time_limit_sec", s.time_limit_sec, TIME_LIMIT_RANGE)?,
      max_questions: check("max_questions", s.max_questions, MAX_QUESTIONS_RANGE)?,
      early_terminate_threshold: check("early_terminate_threshold", s.early_terminate_threshold, THRESHOLD_RANGE)?,
    })
  }
}

/// The five rubric dimensions, each 0..=100.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct RubricScores {
  pub accuracy: u32,
  pub clarity: u32,
  pub depth: u32,
  pub relevance: u32,
  pub time_efficiency: u32,
}

impl RubricScores {
  pub fn all_in_range(&self) -> bool {
    [self.accuracy, self.clarity, self.depth, self.relevance, self.time_efficiency]
      .iter()
      .all(|v| *v <= 100)
  }
}

/// Result of scoring one answer. Produced once, never mutated.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Evaluation {
  pub score_0_100: u32,
  pub breakdown: RubricScores,
  pub feedback: Vec<String>,
}

/// One entry of a session's append-only answer log.
#[derive(Clone, Debug, Serialize)]
pub struct AnsweredQuestion {
  pub question: Question,
  pub answer_text: String,
  pub time_taken_sec: u32,
  pub evaluation: Evaluation,
}

#[derive(Clone, Copy, Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
  Active,
  /// Ended by reaching `max_questions`.
  Completed,
  /// Ended early by the strike or readiness rule.
  Terminated,
}

/// Coarse label derived from the final readiness score.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum HiringReadiness {
  #[serde(rename = "Strong Hire")]
  StrongHire,
  #[serde(rename = "Hire")]
  Hire,
  #[serde(rename = "Borderline")]
  Borderline,
  #[serde(rename = "No Hire")]
  NoHire,
}

impl HiringReadiness {
  pub fn from_score(score: u32) -> Self {
    match score {
      80.. => HiringReadiness::StrongHire,
      60..=79 => HiringReadiness::Hire,
      40..=59 => HiringReadiness::Borderline,
      _ => HiringReadiness::NoHire,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn raw(t: i64, m: i64, e: i64) -> SettingsIn {
    SettingsIn { time_limit_sec: t, max_questions: m, early_terminate_threshold: e }
  }

  #[test]
  fn settings_bounds_are_inclusive() {
    assert!(Settings::try_from(raw(30, 1, 0)).is_ok());
    assert!(Settings::try_from(raw(600, 20, 100)).is_ok());
  }

  #[test]
  fn settings_out_of_range_are_rejected() {
    for bad in [raw(29, 5, 40), raw(601, 5, 40), raw(120, 0, 40), raw(120, 21, 40), raw(120, 5, -1), raw(120, 5, 101)] {
      let err = Settings::try_from(bad).unwrap_err();
      assert!(matches!(err, EngineError::InvalidSettings(_)));
    }
  }

  #[test]
  fn difficulty_steps_saturate() {
    assert_eq!(Difficulty::Easy.easier(), Difficulty::Easy);
    assert_eq!(Difficulty::Easy.harder(), Difficulty::Medium);
    assert_eq!(Difficulty::Hard.harder(), Difficulty::Hard);
    assert_eq!(Difficulty::Hard.easier(), Difficulty::Medium);
  }

  #[test]
  fn hiring_labels_follow_thresholds() {
    assert_eq!(HiringReadiness::from_score(100), HiringReadiness::StrongHire);
    assert_eq!(HiringReadiness::from_score(80), HiringReadiness::StrongHire);
    assert_eq!(HiringReadiness::from_score(79), HiringReadiness::Hire);
    assert_eq!(HiringReadiness::from_score(60), HiringReadiness::Hire);
    assert_eq!(HiringReadiness::from_score(59), HiringReadiness::Borderline);
    assert_eq!(HiringReadiness::from_score(40), HiringReadiness::Borderline);
    assert_eq!(HiringReadiness::from_score(39), HiringReadiness::NoHire);
    assert_eq!(serde_json::to_string(&HiringReadiness::StrongHire).unwrap(), "\"Strong Hire\"");
  }
}
