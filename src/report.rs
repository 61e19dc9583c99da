//! Final readiness report, derived entirely from a finished session's answer log.

use std::collections::{BTreeMap, HashSet};

use serde::Serialize;

use crate::config::ReportConfig;
use crate::domain::{AnsweredQuestion, HiringReadiness};
use crate::policy::readiness;

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Report {
  pub readiness_score_0_100: u32,
  pub hiring_readiness: HiringReadiness,
  pub skill_breakdown: BTreeMap<String, u32>,
  pub strengths: Vec<String>,
  pub weaknesses: Vec<String>,
  pub actionable_feedback: Vec<String>,
}

pub fn build(history: &[AnsweredQuestion], cfg: &ReportConfig) -> Report {
  let readiness_score_0_100 = readiness(history).map_or(0, |r| r.round() as u32);

  let mut per_skill: BTreeMap<String, (u64, u64)> = BTreeMap::new();
  for a in history {
    let e = per_skill.entry(a.question.skill.clone()).or_insert((0, 0));
    e.0 += a.evaluation.score_0_100 as u64;
    e.1 += 1;
  }
  let skill_breakdown: BTreeMap<String, u32> = per_skill
    .into_iter()
    .map(|(skill, (sum, n))| (skill, (sum as f64 / n as f64).round() as u32))
    .collect();

  let strengths = skill_breakdown
    .iter()
    .filter(|(_, s)| **s >= cfg.strength_threshold)
    .map(|(skill, s)| format!("Strong command of {} ({}/100)", skill, s))
    .collect();
  let weaknesses = skill_breakdown
    .iter()
    .filter(|(_, s)| **s < cfg.weakness_threshold)
    .map(|(skill, s)| format!("{} needs more practice ({}/100)", skill, s))
    .collect();

  Report {
    readiness_score_0_100,
    hiring_readiness: HiringReadiness::from_score(readiness_score_0_100),
    skill_breakdown,
    strengths,
    weaknesses,
    actionable_feedback: actionable_feedback(history, cfg),
  }
}

/// Feedback from the lowest-scoring answers (earlier answers first on ties),
/// deduplicated in order and capped.
fn actionable_feedback(history: &[AnsweredQuestion], cfg: &ReportConfig) -> Vec<String> {
  let mut worst: Vec<&AnsweredQuestion> = history.iter().collect();
  worst.sort_by_key(|a| a.evaluation.score_0_100);
  let mut seen = HashSet::new();
  worst
    .into_iter()
    .take(cfg.feedback_source_answers)
    .flat_map(|a| a.evaluation.feedback.iter().map(String::as_str))
    .filter(|f| !f.trim().is_empty() && seen.insert(*f))
    .take(cfg.max_feedback_items)
    .map(String::from)
    .collect()
}
