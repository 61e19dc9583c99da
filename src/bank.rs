//! Question bank: built-in questions plus any supplied through TOML, and the
//! per-session selection rule.

use std::collections::{BTreeMap, HashSet};

use rand::seq::SliceRandom;
use tracing::{error, info};

use crate::config::{QuestionCfg, SelectionMode};
use crate::domain::{Difficulty, Question};

/// Built-in questions that guarantee the service is useful without any config.
pub fn builtin_questions() -> Vec<Question> {
  let q = |id: &str, text: &str, skill: &str, difficulty: Difficulty| Question {
    id: id.into(),
    text: text.into(),
    skill: skill.into(),
    difficulty,
  };
  use Difficulty::*;
  vec![
    q("e1", "What is the difference between a list and a tuple in Python?", "Python", Easy),
    q("e2", "Explain what REST API means.", "API Design", Easy),
    q("e3", "What is the purpose of version control (Git)?", "DevOps", Easy),
    q("e4", "Describe the difference between HTTP GET and POST.", "Web", Easy),
    q("e5", "What is a primary key in a database?", "Database", Easy),
    q("m1", "Explain how Python's GIL affects multithreading.", "Python", Medium),
    q("m2", "Design a rate limiter for an API. What approaches would you consider?", "System Design", Medium),
    q("m3", "How would you optimize a slow SQL query?", "Database", Medium),
    q("m4", "Explain the concept of eventual consistency in distributed systems.", "System Design", Medium),
    q("m5", "What are the tradeoffs between microservices and monoliths?", "Architecture", Medium),
    q("h1", "Design a distributed cache with strong consistency guarantees.", "System Design", Hard),
    q("h2", "How would you implement a consensus algorithm like Raft?", "Distributed Systems", Hard),
    q("h3", "Design a real-time collaborative editing system (like Google Docs).", "System Design", Hard),
    q("h4", "Explain how to handle Byzantine faults in a distributed system.", "Distributed Systems", Hard),
    q("h5", "Design a load balancer that can handle millions of requests per second.", "System Design", Hard),
  ]
}

/// Immutable after startup; shared by all sessions.
#[derive(Clone, Debug)]
pub struct QuestionBank {
  /// Per difficulty, sorted by id.
  by_difficulty: BTreeMap<Difficulty, Vec<Question>>,
  mode: SelectionMode,
}

impl QuestionBank {
  pub fn new(questions: Vec<Question>, mode: SelectionMode) -> Self {
    let mut by_id = BTreeMap::<String, Question>::new();
    for q in questions {
      by_id.insert(q.id.clone(), q);
    }
    let mut by_difficulty = BTreeMap::<Difficulty, Vec<Question>>::new();
    for q in by_id.into_values() {
      by_difficulty.entry(q.difficulty).or_default().push(q);
    }
    Self { by_difficulty, mode }
  }

  /// Built-in questions overlaid with configured ones (same id replaces the built-in).
  pub fn with_config(extra: &[QuestionCfg], mode: SelectionMode) -> Self {
    let mut questions = builtin_questions();
    for qc in extra {
      if qc.id.trim().is_empty() || qc.text.trim().is_empty() || qc.skill.trim().is_empty() {
        error!(target: "interview", id = %qc.id, "Skipping bank item: id, text and skill must be non-empty.");
        continue;
      }
      questions.retain(|q| q.id != qc.id);
      questions.push(Question {
        id: qc.id.clone(),
        text: qc.text.clone(),
        skill: qc.skill.clone(),
        difficulty: qc.difficulty,
      });
    }
    let bank = Self::new(questions, mode);
    for d in Difficulty::ALL {
      info!(target: "interview", difficulty = %d, count = bank.count(d), "Startup question inventory");
    }
    bank
  }

  pub fn count(&self, difficulty: Difficulty) -> usize {
    self.by_difficulty.get(&difficulty).map_or(0, Vec::len)
  }

  /// Distinct skill names in bank order (difficulty, then id).
  pub fn skills(&self) -> Vec<String> {
    let mut seen = HashSet::new();
    self
      .by_difficulty
      .values()
      .flatten()
      .filter(|q| seen.insert(q.skill.clone()))
      .map(|q| q.skill.clone())
      .collect()
  }

  /// Pick the next question at `difficulty`.
  ///
  /// Candidates are the questions not yet asked; once a level is exhausted every
  /// question at that level is a candidate again. Questions whose skill is in
  /// `preferred_skills` rank first. Ties break per the selection mode.
  pub fn select(
    &self,
    difficulty: Difficulty,
    preferred_skills: &[String],
    asked: &HashSet<String>,
  ) -> Option<Question> {
    let level = self.by_difficulty.get(&difficulty)?;
    let fresh: Vec<&Question> = level.iter().filter(|q| !asked.contains(&q.id)).collect();
    let pool: Vec<&Question> = if fresh.is_empty() { level.iter().collect() } else { fresh };

    let affinity = |q: &Question| preferred_skills.iter().any(|s| s.eq_ignore_ascii_case(&q.skill));
    let best: Vec<&Question> = if pool.iter().any(|q| affinity(*q)) {
      pool.into_iter().filter(|q| affinity(*q)).collect()
    } else {
      pool
    };

    let chosen = match self.mode {
      // `best` keeps the id order of the level.
      SelectionMode::LowestId => best.first().copied(),
      SelectionMode::Random => best.choose(&mut rand::thread_rng()).copied(),
    };
    chosen.cloned()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn bank() -> QuestionBank {
    QuestionBank::new(builtin_questions(), SelectionMode::LowestId)
  }

  #[test]
  fn picks_lowest_id_without_preferences() {
    let q = bank().select(Difficulty::Easy, &[], &HashSet::new()).unwrap();
    assert_eq!(q.id, "e1");
    assert_eq!(q.difficulty, Difficulty::Easy);
  }

  #[test]
  fn prefers_matching_skill() {
    let prefs = vec!["database".to_string()];
    let q = bank().select(Difficulty::Easy, &prefs, &HashSet::new()).unwrap();
    assert_eq!(q.id, "e5");
  }

  #[test]
  fn skips_asked_questions_then_recycles_level() {
    let b = bank();
    let mut asked = HashSet::new();
    let mut seen = vec![];
    for _ in 0..5 {
      let q = b.select(Difficulty::Hard, &[], &asked).unwrap();
      asked.insert(q.id.clone());
      seen.push(q.id);
    }
    assert_eq!(seen, vec!["h1", "h2", "h3", "h4", "h5"]);
    let again = b.select(Difficulty::Hard, &[], &asked).unwrap();
    assert_eq!(again.id, "h1");
    assert_eq!(again.difficulty, Difficulty::Hard);
  }

  #[test]
  fn preferred_skill_exhausted_falls_back_to_others() {
    let b = bank();
    let prefs = vec!["Python".to_string()];
    let asked: HashSet<String> = ["e1".to_string()].into_iter().collect();
    let q = b.select(Difficulty::Easy, &prefs, &asked).unwrap();
    assert_eq!(q.id, "e2");
  }

  #[test]
  fn random_mode_stays_within_top_rank() {
    let b = QuestionBank::new(builtin_questions(), SelectionMode::Random);
    let prefs = vec!["Distributed Systems".to_string()];
    for _ in 0..20 {
      let q = b.select(Difficulty::Hard, &prefs, &HashSet::new()).unwrap();
      assert!(q.id == "h2" || q.id == "h4");
    }
  }

  #[test]
  fn configured_question_replaces_builtin_id() {
    let extra = vec![
      QuestionCfg { id: "e1".into(), text: "What is a closure?".into(), skill: "JavaScript".into(), difficulty: Difficulty::Easy },
      QuestionCfg { id: "bad".into(), text: "".into(), skill: "X".into(), difficulty: Difficulty::Easy },
    ];
    let b = QuestionBank::with_config(&extra, SelectionMode::LowestId);
    assert_eq!(b.count(Difficulty::Easy), 5);
    let q = b.select(Difficulty::Easy, &[], &HashSet::new()).unwrap();
    assert_eq!(q.skill, "JavaScript");
  }

  #[test]
  fn empty_level_yields_none() {
    let b = QuestionBank::new(vec![], SelectionMode::LowestId);
    assert!(b.select(Difficulty::Medium, &[], &HashSet::new()).is_none());
  }
}
