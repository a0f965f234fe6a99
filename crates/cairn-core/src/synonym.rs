//! Related-term lookup used to suggest alternatives for empty searches.
//!
//! The table is plain data: keys are term prefixes, values are related terms.
//! It can be replaced wholesale from configuration.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Prefix-keyed map of related search terms.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SynonymTable {
  entries: BTreeMap<String, Vec<String>>,
}

const DEFAULT_SYNONYMS: &[(&str, &[&str])] = &[
  ("auth", &["authentication", "login", "security", "token", "session"]),
  ("db", &["database", "schema", "migration", "query", "orm"]),
  ("data", &["database", "schema", "storage", "model", "migration"]),
  ("api", &["endpoint", "rest", "graphql", "route", "versioning"]),
  ("test", &["testing", "coverage", "unit", "integration", "fixture"]),
  ("deploy", &["deployment", "release", "pipeline", "container", "rollback"]),
  ("err", &["error", "exception", "retry", "fallback", "result"]),
  ("log", &["logging", "tracing", "monitoring", "observability", "metrics"]),
  ("perf", &["performance", "caching", "latency", "profiling", "scaling"]),
  ("sec", &["security", "encryption", "owasp", "secrets", "authentication"]),
  ("style", &["formatting", "linting", "naming", "conventions", "frontend"]),
  ("ui", &["frontend", "component", "styling", "accessibility", "layout"]),
];

impl Default for SynonymTable {
  fn default() -> Self {
    let entries = DEFAULT_SYNONYMS
      .iter()
      .map(|(k, terms)| {
        (k.to_string(), terms.iter().map(|t| (*t).to_string()).collect())
      })
      .collect();
    Self { entries }
  }
}

impl SynonymTable {
  pub fn new(entries: BTreeMap<String, Vec<String>>) -> Self {
    let entries = entries
      .into_iter()
      .map(|(k, v)| (k.to_lowercase(), v))
      .collect();
    Self { entries }
  }

  pub fn is_empty(&self) -> bool { self.entries.is_empty() }

  /// Related terms for `query`, in table order, without duplicates and
  /// without the query itself.
  ///
  /// An entry applies when the query and the key share a prefix (either one
  /// starts with the other), or when the query prefixes one of its terms.
  pub fn related_terms(&self, query: &str) -> Vec<String> {
    let q = query.trim().to_lowercase();
    if q.len() < 2 {
      return Vec::new();
    }
    let mut out: Vec<String> = Vec::new();
    for (key, terms) in &self.entries {
      let applies = q.starts_with(key.as_str())
        || key.starts_with(q.as_str())
        || terms.iter().any(|t| t.to_lowercase().starts_with(&q));
      if !applies {
        continue;
      }
      for term in terms {
        if term.to_lowercase() != q && !out.contains(term) {
          out.push(term.clone());
        }
      }
    }
    out
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn auth_prefix_maps_to_security_terms() {
    let terms = SynonymTable::default().related_terms("authorization");
    assert!(terms.contains(&"login".to_string()));
    assert!(terms.contains(&"token".to_string()));
  }

  #[test]
  fn query_itself_is_excluded() {
    let terms = SynonymTable::default().related_terms("logging");
    assert!(!terms.contains(&"logging".to_string()));
    assert!(terms.contains(&"tracing".to_string()));
  }

  #[test]
  fn unknown_and_tiny_queries_have_no_terms() {
    let table = SynonymTable::default();
    assert!(table.related_terms("zebra").is_empty());
    assert!(table.related_terms("a").is_empty());
  }

  #[test]
  fn custom_table_keys_are_case_folded() {
    let mut map = BTreeMap::new();
    map.insert("Cache".to_string(), vec!["redis".to_string()]);
    let table = SynonymTable::new(map);
    assert_eq!(table.related_terms("caching"), Vec::<String>::new());
    assert_eq!(table.related_terms("cache layer"), vec!["redis".to_string()]);
  }
}
