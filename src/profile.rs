//! Keyword-level reading of résumé and job description text.
//!
//! Only matches known terms; it does not parse document structure.

use serde::Serialize;

/// Common terms and the bank skill they evidence. A trailing `*` marks a stem that
/// may be followed by more letters ("scalab*" covers "scalable" and "scalability").
const SKILL_ALIASES: &[(&str, &str)] = &[
  ("python", "Python"),
  ("django", "Python"),
  ("flask", "Python"),
  ("fastapi", "Python"),
  ("rest api*", "API Design"),
  ("restful", "API Design"),
  ("graphql", "API Design"),
  ("openapi", "API Design"),
  ("github", "DevOps"),
  ("gitlab", "DevOps"),
  ("version control", "DevOps"),
  ("docker", "DevOps"),
  ("kubernetes", "DevOps"),
  ("ci/cd", "DevOps"),
  ("aws", "DevOps"),
  ("terraform", "DevOps"),
  ("http", "Web"),
  ("javascript", "Web"),
  ("react", "Web"),
  ("frontend", "Web"),
  ("sql", "Database"),
  ("postgres*", "Database"),
  ("mysql", "Database"),
  ("mongodb", "Database"),
  ("scalab*", "System Design"),
  ("caching", "System Design"),
  ("load balanc*", "System Design"),
  ("microservice*", "Architecture"),
  ("monolith*", "Architecture"),
  ("architect*", "Architecture"),
  ("distributed", "Distributed Systems"),
  ("consensus", "Distributed Systems"),
  ("raft", "Distributed Systems"),
  ("kafka", "Distributed Systems"),
];

/// True if `term` occurs in `haystack` as a whole word (or, for `stem*`, at a word start).
fn mentions(haystack: &str, term: &str) -> bool {
  let (term, stem) = match term.strip_suffix('*') {
    Some(t) => (t, true),
    None => (term, false),
  };
  let boundary = |c: Option<char>| c.map_or(true, |c| !c.is_alphanumeric());
  haystack.match_indices(term).any(|(i, m)| {
    boundary(haystack[..i].chars().next_back()) && (stem || boundary(haystack[i + m.len()..].chars().next()))
  })
}

/// Skills from `bank_skills` evidenced by either text, in `bank_skills` order.
pub fn infer_skills(resume_text: &str, jd_text: &str, bank_skills: &[String]) -> Vec<String> {
  let haystack = format!("{}\n{}", resume_text.to_lowercase(), jd_text.to_lowercase());
  bank_skills
    .iter()
    .filter(|skill| {
      mentions(&haystack, &skill.to_lowercase())
        || SKILL_ALIASES
          .iter()
          .any(|(kw, target)| target.eq_ignore_ascii_case(skill) && mentions(&haystack, kw))
    })
    .cloned()
    .collect()
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Analysis {
  pub skills: Vec<String>,
  pub role_requirements: Vec<String>,
  pub focus_areas: Vec<String>,
}

/// Summarise what the two texts evidence: candidate skills, role expectations and
/// the bank skills the JD asks for that the résumé does not show.
pub fn analyze(resume_text: &str, jd_text: &str, bank_skills: &[String]) -> Analysis {
  let mut skills = infer_skills(resume_text, jd_text, bank_skills);
  if skills.is_empty() {
    skills = vec!["Python".into(), "System Design".into()];
  }

  let jd_lower = jd_text.to_lowercase();
  let role_requirements: Vec<String> = if jd_lower.contains("senior") {
    vec!["5+ years experience", "System design expertise", "Mentorship ability"]
  } else if jd_lower.contains("junior") {
    vec!["Basic programming", "Willingness to learn", "Team collaboration"]
  } else {
    vec!["Relevant experience", "Technical proficiency", "Problem solving"]
  }
  .into_iter()
  .map(String::from)
  .collect();

  let from_resume = infer_skills(resume_text, "", bank_skills);
  let wanted = infer_skills("", jd_text, bank_skills);
  let mut focus_areas: Vec<String> = wanted.into_iter().filter(|s| !from_resume.contains(s)).collect();
  if focus_areas.is_empty() {
    focus_areas = vec!["System Design".into(), "Coding Interview".into(), "Behavioral".into()];
  }

  Analysis { skills, role_requirements, focus_areas }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn bank_skills() -> Vec<String> {
    ["Python", "API Design", "DevOps", "Web", "Database", "System Design", "Architecture", "Distributed Systems"]
      .iter()
      .map(|s| s.to_string())
      .collect()
  }

  #[test]
  fn infers_from_names_and_aliases() {
    let skills = infer_skills("Built services in Django on Postgres", "Kubernetes a plus", &bank_skills());
    assert_eq!(skills, vec!["Python", "DevOps", "Database"]);
  }

  #[test]
  fn terms_match_on_word_boundaries() {
    let skills = infer_skills("Wrote a draft on NoSQL laws, see https://me.dev", "Cobweb cleanup", &bank_skills());
    assert!(skills.is_empty(), "{:?}", skills);
    let skills = infer_skills("Scalability work on PostgreSQL; REST APIs; plain HTTP", "", &bank_skills());
    assert_eq!(skills, vec!["API Design", "Web", "Database", "System Design"]);
  }

  #[test]
  fn no_evidence_yields_nothing() {
    assert!(infer_skills("gardening", "cooking", &bank_skills()).is_empty());
  }

  #[test]
  fn analysis_defaults_and_gaps() {
    let a = analyze("", "", &bank_skills());
    assert_eq!(a.skills, vec!["Python", "System Design"]);
    assert_eq!(a.role_requirements[0], "Relevant experience");
    assert_eq!(a.focus_areas.len(), 3);

    let a = analyze("Python developer", "Senior engineer: Python and distributed consensus", &bank_skills());
    assert_eq!(a.role_requirements[0], "5+ years experience");
    assert_eq!(a.focus_areas, vec!["Distributed Systems"]);
  }
}
