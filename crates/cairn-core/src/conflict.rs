//! Conflict detection between decision records.
//!
//! Two heuristics, checked for every unordered pair:
//!
//! - **same scope**: identical scope, different standard. A hard conflict.
//! - **similar title**: titles share at least [`MIN_SHARED_TITLE_WORDS`]
//!   significant words and standards differ. A probable conflict; this check
//!   is known to both over- and under-trigger.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::record::{Decision, is_weak};

/// Shared significant title words needed for a probable conflict.
pub const MIN_SHARED_TITLE_WORDS: usize = 2;

const STOPWORDS: &[&str] = &[
  "and", "for", "the", "with", "use", "using", "from", "into", "our", "all",
  "new", "via",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum ConflictReason {
  SameScope { scope: String },
  SimilarTitle { shared_words: Vec<String> },
}

/// Two decisions that cannot both hold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictPair {
  pub first:  Decision,
  pub second: Decision,
  pub reason: ConflictReason,
}

impl ConflictPair {
  /// One-line summary for reports.
  pub fn describe(&self) -> String {
    match &self.reason {
      ConflictReason::SameScope { scope } => format!(
        "'{}' ({}) vs '{}' ({}) both apply to '{}'",
        self.first.title,
        self.first.standard,
        self.second.title,
        self.second.standard,
        scope
      ),
      ConflictReason::SimilarTitle { shared_words } => format!(
        "'{}' ({}) vs '{}' ({}) share title words [{}]",
        self.first.title,
        self.first.standard,
        self.second.title,
        self.second.standard,
        shared_words.join(", ")
      ),
    }
  }
}

fn normalize(value: &str) -> String { value.trim().to_lowercase() }

/// Lowercased alphanumeric title words of three or more characters that are
/// not stopwords.
pub fn significant_words(title: &str) -> BTreeSet<String> {
  title
    .split(|c: char| !c.is_alphanumeric())
    .map(str::to_lowercase)
    .filter(|w| w.chars().count() >= 3 && !STOPWORDS.contains(&w.as_str()))
    .collect()
}

fn standards_differ(a: &Decision, b: &Decision) -> bool {
  !is_weak(&a.standard)
    && !is_weak(&b.standard)
    && normalize(&a.standard) != normalize(&b.standard)
}

/// Classify a single pair; `None` when the two decisions are compatible.
pub fn conflict_between(a: &Decision, b: &Decision) -> Option<ConflictReason> {
  if !standards_differ(a, b) {
    return None;
  }
  if !is_weak(&a.scope) && normalize(&a.scope) == normalize(&b.scope) {
    return Some(ConflictReason::SameScope {
      scope: a.scope.trim().to_string(),
    });
  }
  if is_weak(&a.title) || is_weak(&b.title) {
    return None;
  }
  let shared: Vec<String> = significant_words(&a.title)
    .intersection(&significant_words(&b.title))
    .cloned()
    .collect();
  (shared.len() >= MIN_SHARED_TITLE_WORDS)
    .then_some(ConflictReason::SimilarTitle {
      shared_words: shared,
    })
}

/// Check every unordered pair, in document order.
pub fn detect_conflicts(decisions: &[Decision]) -> Vec<ConflictPair> {
  let mut conflicts = Vec::new();
  for (i, a) in decisions.iter().enumerate() {
    for b in &decisions[i + 1..] {
      if let Some(reason) = conflict_between(a, b) {
        conflicts.push(ConflictPair {
          first: a.clone(),
          second: b.clone(),
          reason,
        });
      }
    }
  }
  conflicts
}

#[cfg(test)]
mod tests {
  use super::*;

  fn decision(title: &str, standard: &str, scope: &str) -> Decision {
    let mut d = Decision::unspecified(1);
    d.title = title.into();
    d.standard = standard.into();
    d.scope = scope.into();
    d.with_id()
  }

  #[test]
  fn same_scope_different_standard_conflicts() {
    let found = detect_conflicts(&[
      decision("Backend runtime", "Node.js", "All backend services"),
      decision("Service language", "Python", "All backend services"),
    ]);
    assert_eq!(found.len(), 1);
    assert!(matches!(
      found[0].reason,
      ConflictReason::SameScope { ref scope } if scope == "All backend services"
    ));
  }

  #[test]
  fn different_scope_and_standard_do_not_conflict() {
    let found = detect_conflicts(&[
      decision("Backend runtime", "Node.js", "All backend services"),
      decision("Data pipeline language", "Python", "ETL jobs"),
    ]);
    assert!(found.is_empty());
  }

  #[test]
  fn same_standard_never_conflicts() {
    let found = detect_conflicts(&[
      decision("Backend runtime", "Node.js", "All backend services"),
      decision("Backend runtime choice", "node.js ", "All backend services"),
    ]);
    assert!(found.is_empty());
  }

  #[test]
  fn shared_title_words_are_a_probable_conflict() {
    let found = detect_conflicts(&[
      decision("API error format", "RFC 7807", "public API"),
      decision("Error format for API responses", "custom JSON", "internal"),
    ]);
    assert_eq!(found.len(), 1);
    let ConflictReason::SimilarTitle { shared_words } = &found[0].reason else {
      panic!("expected similar-title conflict");
    };
    assert_eq!(shared_words, &vec!["api".to_string(), "error".to_string(), "format".to_string()]);
  }

  #[test]
  fn unspecified_scope_is_not_a_shared_scope() {
    let found = detect_conflicts(&[
      decision("Caching", "Redis", "unspecified"),
      decision("Queueing", "RabbitMQ", "unspecified"),
    ]);
    assert!(found.is_empty());
  }

  #[test]
  fn placeholder_standard_never_conflicts() {
    let found = detect_conflicts(&[
      decision("Auth", "[To be decided]", "all auth"),
      decision("Auth", "JWT", "all auth"),
    ]);
    assert!(found.is_empty());
  }
}
