//! Small utility helpers used across modules.

/// Single-pass `{key}` substitution. Substituted values are never re-scanned, so a
/// candidate answer containing `{question}` stays literal. Unknown keys are kept.
pub fn fill_template(tpl: &str, pairs: &[(&str, &str)]) -> String {
  let mut out = String::with_capacity(tpl.len());
  let mut rest = tpl;
  while let Some(open) = rest.find('{') {
    out.push_str(&rest[..open]);
    let after = &rest[open + 1..];
    let value = after
      .find('}')
      .and_then(|close| pairs.iter().find(|(k, _)| *k == &after[..close]).map(|(_, v)| (close, *v)));
    match value {
      Some((close, v)) => {
        out.push_str(v);
        rest = &after[close + 1..];
      }
      None => {
        out.push('{');
        rest = after;
      }
    }
  }
  out.push_str(rest);
  out
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn fills_known_keys_and_leaves_others() {
    let out = fill_template("Q: {question} ({skill}) {unknown}", &[("question", "Why?"), ("skill", "Web")]);
    assert_eq!(out, "Q: Why? (Web) {unknown}");
  }

  #[test]
  fn values_are_not_rescanned() {
    let out = fill_template("{answer} / {skill}", &[("answer", "see {skill}"), ("skill", "Web")]);
    assert_eq!(out, "see {skill} / Web");
  }

  #[test]
  fn json_braces_survive() {
    let out = fill_template("Return {\"a\": int} for {q}", &[("q", "x")]);
    assert_eq!(out, "Return {\"a\": int} for x");
  }
}
