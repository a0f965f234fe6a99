//! The `DecisionStore` and `SymbolStore` traits and supporting query types.
//!
//! The traits are implemented by storage backends (e.g. `cairn-store-fs`).
//! The reasoning engine and the CLI depend on these abstractions, not on any
//! concrete backend.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
  conflict::{self, ConflictPair},
  record::{
    ConnectionRecord, Decision, FunctionRecord, NewDecision, PatternRecord,
    SymbolKind, SymbolRecord, is_weak,
  },
};

// ─── Query types ─────────────────────────────────────────────────────────────

/// Parameters for [`DecisionStore::search`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchOptions {
  /// Whole-word match instead of substring match.
  pub exact:   bool,
  /// Restrict to records under a section whose header contains this text.
  pub section: Option<String>,
}

/// Result of [`DecisionStore::search`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchOutcome {
  pub matches:     Vec<Decision>,
  /// Related terms to try instead; only filled when `matches` is empty.
  pub suggestions: Vec<String>,
}

/// Caller-supplied context for a development task.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskContext {
  pub technology: Option<String>,
  pub domain:     Option<String>,
  /// Organisational scope, e.g. "enterprise".
  pub scope:      Option<String>,
  pub team_size:  Option<u32>,
}

impl TaskContext {
  /// Enterprise scope or a team larger than five.
  pub fn is_large_organisation(&self) -> bool {
    self
      .scope
      .as_deref()
      .is_some_and(|s| s.trim().eq_ignore_ascii_case("enterprise"))
      || self.team_size.is_some_and(|n| n > 5)
  }
}

/// What the log currently says about one scope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "decisions", rename_all = "snake_case")]
pub enum ScopeResolution {
  /// No decision covers this scope.
  Unrecorded,
  /// The most recent decision; all earlier ones agree with it.
  Current(Decision),
  /// Decisions for this scope disagree; nothing is current until resolved.
  Conflicted(Vec<Decision>),
}

/// Counts and freshness of the symbol index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolHealth {
  pub function_count:   usize,
  pub connection_count: usize,
  pub pattern_count:    usize,
  /// Modification time of the backing file; `None` if it does not exist.
  pub last_updated:     Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum OrphanReason {
  Missing,
  Unreadable { error: String },
}

/// A path referenced by a symbol record that does not resolve on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Orphan {
  pub path:        String,
  pub record_kind: SymbolKind,
  pub record_name: String,
  /// Line of the referencing record in the symbol log.
  pub line:        usize,
  pub reason:      OrphanReason,
}

// ─── Shared matching ─────────────────────────────────────────────────────────

/// Records whose content mentions `decision_type` and, when given, the
/// context's technology and domain. Case-insensitive containment.
pub fn find_matching(
  decisions: &[Decision],
  decision_type: &str,
  context: &TaskContext,
) -> Vec<Decision> {
  let mut needles = vec![decision_type.trim().to_lowercase()];
  needles.extend(
    [&context.technology, &context.domain]
      .into_iter()
      .flatten()
      .map(|t| t.trim().to_lowercase())
      .filter(|t| !t.is_empty()),
  );
  decisions
    .iter()
    .filter(|d| {
      let content = d.content().to_lowercase();
      needles.iter().all(|n| content.contains(n.as_str()))
    })
    .cloned()
    .collect()
}

/// Scope resolution by linear scan; backends with an index override it.
pub fn resolve_scope(decisions: &[Decision], scope: &str) -> ScopeResolution {
  let key = scope.trim().to_lowercase();
  let for_scope: Vec<Decision> = decisions
    .iter()
    .filter(|d| !is_weak(&d.scope) && d.scope.trim().to_lowercase() == key)
    .cloned()
    .collect();
  resolve_candidates(for_scope)
}

/// Decide between the decisions recorded for one scope, oldest first.
pub fn resolve_candidates(mut for_scope: Vec<Decision>) -> ScopeResolution {
  if for_scope.is_empty() {
    return ScopeResolution::Unrecorded;
  }
  if !conflict::detect_conflicts(&for_scope).is_empty() {
    return ScopeResolution::Conflicted(for_scope);
  }
  match for_scope.pop() {
    Some(latest) => ScopeResolution::Current(latest),
    None => ScopeResolution::Unrecorded,
  }
}

// ─── Traits ──────────────────────────────────────────────────────────────────

/// Abstraction over a decision log backend.
///
/// The log is append-only. Superseding a decision means appending a newer one
/// with an overlapping scope.
pub trait DecisionStore {
  type Error: std::error::Error + Send + Sync + 'static;

  /// All decisions in log order.
  fn decisions(&self) -> &[Decision];

  /// Search titles, standards, rationales and scopes. When nothing matches
  /// the outcome carries at most five related-term suggestions.
  fn search(&self, query: &str, options: &SearchOptions) -> SearchOutcome;

  /// Decisions relevant to a task of the given type.
  fn find_matching(
    &self,
    decision_type: &str,
    context: &TaskContext,
  ) -> Vec<Decision> {
    find_matching(self.decisions(), decision_type, context)
  }

  /// Conflicting pairs across the whole log.
  fn detect_conflicts(&self) -> Vec<ConflictPair> {
    conflict::detect_conflicts(self.decisions())
  }

  /// The current answer for `scope`, if there is an unambiguous one.
  fn resolve_scope(&self, scope: &str) -> ScopeResolution {
    resolve_scope(self.decisions(), scope)
  }

  /// Append a new decision and return it as persisted.
  /// The record date is set by the store.
  fn append(&mut self, input: NewDecision) -> Result<Decision, Self::Error>;
}

/// Abstraction over a symbol index backend.
pub trait SymbolStore {
  type Error: std::error::Error + Send + Sync + 'static;

  /// All records in log order.
  fn records(&self) -> &[SymbolRecord];

  /// Functions matching `pattern` in any descriptive field; all when `None`
  /// or empty.
  fn query_functions(&self, pattern: Option<&str>) -> Vec<FunctionRecord> {
    self
      .records()
      .iter()
      .filter_map(|r| match r {
        SymbolRecord::Function(f) if f.matches(pattern.unwrap_or("")) => {
          Some(f.clone())
        }
        _ => None,
      })
      .collect()
  }

  /// Connections mentioning `component`; all when `None` or empty.
  fn query_connections(&self, component: Option<&str>) -> Vec<ConnectionRecord> {
    self
      .records()
      .iter()
      .filter_map(|r| match r {
        SymbolRecord::Connection(c) if c.matches(component.unwrap_or("")) => {
          Some(c.clone())
        }
        _ => None,
      })
      .collect()
  }

  fn query_patterns(&self) -> Vec<PatternRecord> {
    self
      .records()
      .iter()
      .filter_map(|r| match r {
        SymbolRecord::Pattern(p) => Some(p.clone()),
        _ => None,
      })
      .collect()
  }

  fn health(&self) -> SymbolHealth;

  /// Referenced paths that do not exist. The only operation that touches the
  /// filesystem beyond the index itself.
  fn find_orphans(&self) -> Vec<Orphan>;

  /// Append a record and return it as persisted (with its date and line
  /// filled in).
  fn append(&mut self, record: SymbolRecord) -> Result<SymbolRecord, Self::Error>;
}

#[cfg(test)]
mod tests {
  use super::*;

  fn decision(ty: &str, standard: &str, scope: &str) -> Decision {
    let mut d = Decision::unspecified(1);
    d.title = format!("{ty} choice");
    d.decision_type = ty.into();
    d.standard = standard.into();
    d.scope = scope.into();
    d
  }

  #[test]
  fn find_matching_requires_all_terms() {
    let log = vec![
      decision("authentication", "JWT with Rust middleware", "api"),
      decision("authentication", "Sessions in Django", "web"),
      decision("database", "Postgres", "all"),
    ];
    assert_eq!(find_matching(&log, "Authentication", &TaskContext::default()).len(), 2);
    let ctx = TaskContext {
      technology: Some("rust".into()),
      ..Default::default()
    };
    let found = find_matching(&log, "authentication", &ctx);
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].standard, "JWT with Rust middleware");
  }

  #[test]
  fn scope_resolution_prefers_latest_agreeing_record() {
    let older = decision("runtime", "Node.js", "All backend services");
    let mut newer = older.clone();
    newer.rationale = "re-confirmed".into();
    let log = vec![older, newer];
    let ScopeResolution::Current(d) = resolve_scope(&log, "all backend services")
    else {
      panic!("expected a current decision");
    };
    assert_eq!(d.rationale, "re-confirmed");
    assert_eq!(resolve_scope(&log, "frontend"), ScopeResolution::Unrecorded);
  }

  #[test]
  fn disagreeing_scope_is_conflicted() {
    let log = vec![
      decision("runtime", "Node.js", "All backend services"),
      decision("runtime", "Python", "All backend services"),
    ];
    assert!(matches!(
      resolve_scope(&log, "All backend services"),
      ScopeResolution::Conflicted(ds) if ds.len() == 2
    ));
  }

  #[test]
  fn large_organisation_context() {
    let mut ctx = TaskContext::default();
    assert!(!ctx.is_large_organisation());
    ctx.team_size = Some(6);
    assert!(ctx.is_large_organisation());
    ctx.team_size = Some(5);
    ctx.scope = Some("Enterprise".into());
    assert!(ctx.is_large_organisation());
  }
}
