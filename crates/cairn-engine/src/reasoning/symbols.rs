//! Reasoning for a symbol-index update after a development cycle.

use std::collections::BTreeSet;

use cairn_core::{
  record::{ConnectionRecord, FunctionRecord, PatternRecord, clean_path_token, is_missing, is_weak},
  store::TaskContext,
};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display};

use super::{Reasoned, Stage, ThoughtLog};

/// Connection type that marks a service-to-service call.
pub const SERVICE_CALL: &str = "service_call";

/// Service calls needed before an integration pattern is proposed.
pub const SERVICE_PATTERN_THRESHOLD: usize = 3;

pub const SERVICE_PATTERN_NAME: &str = "Service Integration Pattern";

const BASE_BATCH_SCORE: u8 = 80;

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize,
  Display, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Priority {
  Low,
  Medium,
  High,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImpactAssessment {
  /// Connections whose type mentions "architectural".
  pub architectural_changes: usize,
  /// Distinct function-name prefixes in the batch.
  pub new_patterns:          usize,
  pub complexity_increase:   usize,
  pub priority:              Priority,
}

/// A suggested reorganisation of the symbol index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StructureImprovement {
  /// New functions live under more than one second-level directory.
  MultiLayerArchitecture { directories: Vec<String> },
  /// Service connections could get a section of their own.
  ServiceSection { connection_types: Vec<String> },
  /// Enough data-moving connections to warrant a data-flow section.
  DataFlowSection { connections: usize },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolUpdatePlan {
  pub update_needed:           bool,
  pub patterns_to_document:    Vec<PatternRecord>,
  pub impact_assessment:       ImpactAssessment,
  pub structure_improvements:  Vec<StructureImprovement>,
  pub core_file_quality_score: u8,
}

// ─── Heuristics ──────────────────────────────────────────────────────────────

/// The naming family of a function: the first `_` segment of a snake_case
/// name, or the first word of a camelCase one. Lowercased.
pub fn name_prefix(name: &str) -> Option<String> {
  let name = name.trim();
  if is_missing(name) {
    return None;
  }
  let segment = if name.contains('_') {
    name.split('_').find(|s| !s.is_empty())?
  } else {
    let end = name
      .char_indices()
      .skip(1)
      .find(|(_, c)| c.is_uppercase())
      .map_or(name.len(), |(i, _)| i);
    &name[..end]
  };
  let prefix = segment
    .trim_matches(|c: char| !c.is_alphanumeric())
    .to_lowercase();
  (!prefix.is_empty()).then_some(prefix)
}

/// At most the first two directories of a file path: `src/auth` for
/// `src/auth/login.rs`, `src` for `src/main.rs`.
pub fn second_level_directory(file: &str) -> Option<String> {
  let file = clean_path_token(file);
  if is_missing(file) || !file.contains('/') {
    return None;
  }
  let parts: Vec<&str> = file
    .split('/')
    .filter(|s| !s.is_empty() && *s != ".")
    .collect();
  let dirs = &parts[..parts.len().saturating_sub(1)];
  (!dirs.is_empty()).then(|| dirs.iter().take(2).copied().collect::<Vec<_>>().join("/"))
}

fn non_trivial(text: &str) -> bool { !is_weak(text) && text.trim().chars().count() > 10 }

fn priority(architectural_changes: usize, new_patterns: usize, complexity: usize) -> Priority {
  if architectural_changes > 2 || new_patterns > 1 || complexity > 10 {
    Priority::High
  } else if architectural_changes == 0 && new_patterns == 0 {
    Priority::Low
  } else {
    Priority::Medium
  }
}

/// Completeness of an update batch, 80 to 100.
pub fn batch_quality(functions: &[FunctionRecord], connections: &[ConnectionRecord]) -> u8 {
  let mut score = BASE_BATCH_SCORE;
  if functions.iter().all(|f| non_trivial(&f.purpose)) {
    score += 10;
  }
  if functions.iter().all(|f| f.file.contains('/')) {
    score += 5;
  }
  if connections.iter().all(|c| non_trivial(&c.purpose)) {
    score += 5;
  }
  if functions.len() + connections.len() > 5 {
    score += 5;
  }
  score.min(100)
}

fn service_pattern(connections: &[ConnectionRecord]) -> Option<PatternRecord> {
  let calls: Vec<&ConnectionRecord> = connections
    .iter()
    .filter(|c| c.kind.trim().eq_ignore_ascii_case(SERVICE_CALL))
    .collect();
  if calls.len() < SERVICE_PATTERN_THRESHOLD {
    return None;
  }
  let mut endpoints: Vec<String> = Vec::new();
  for c in &calls {
    for endpoint in [&c.from, &c.to] {
      if !is_missing(endpoint) && !endpoints.contains(endpoint) {
        endpoints.push(endpoint.clone());
      }
    }
  }
  let mut pattern = PatternRecord::new(
    SERVICE_PATTERN_NAME,
    format!("{} components integrated through {} service calls", endpoints.len(), calls.len()),
  );
  pattern.usage = "Route cross-service requests through the documented call paths".to_string();
  pattern.integration_points = endpoints;
  Some(pattern)
}

// ─── Procedure ───────────────────────────────────────────────────────────────

/// Plan how a batch of new functions and connections lands in the index.
pub fn plan_symbol_update(
  functions: &[FunctionRecord],
  connections: &[ConnectionRecord],
  context: &TaskContext,
) -> Reasoned<SymbolUpdatePlan> {
  let mut trace = ThoughtLog::new();

  let architectural_changes = connections
    .iter()
    .filter(|c| c.kind.to_lowercase().contains("architectural"))
    .count();
  let prefixes: BTreeSet<String> =
    functions.iter().filter_map(|f| name_prefix(&f.name)).collect();
  let complexity_increase = functions.len() + connections.len();
  trace.record(
    Stage::Impact,
    format!(
      "{architectural_changes} architectural change(s), {} naming famil(ies), complexity +{complexity_increase}",
      prefixes.len()
    ),
  );

  let priority = priority(architectural_changes, prefixes.len(), complexity_increase);
  trace.record(Stage::Priority, format!("update priority {priority}"));

  let patterns_to_document: Vec<PatternRecord> = service_pattern(connections).into_iter().collect();
  if patterns_to_document.is_empty() {
    trace.record(Stage::PatternDetection, "no recurring pattern in this batch");
  } else {
    trace.record(Stage::PatternDetection, format!("propose '{SERVICE_PATTERN_NAME}'"));
  }

  let mut structure_improvements = Vec::new();
  let directories: BTreeSet<String> =
    functions.iter().filter_map(|f| second_level_directory(&f.file)).collect();
  if directories.len() > 1 {
    structure_improvements.push(StructureImprovement::MultiLayerArchitecture {
      directories: directories.into_iter().collect(),
    });
  }
  let service_types: BTreeSet<String> = connections
    .iter()
    .map(|c| c.kind.trim().to_lowercase())
    .filter(|k| k.contains("service"))
    .collect();
  if !service_types.is_empty() {
    structure_improvements.push(StructureImprovement::ServiceSection {
      connection_types: service_types.into_iter().collect(),
    });
  }
  let data_connections = connections
    .iter()
    .filter(|c| c.purpose.to_lowercase().contains("data"))
    .count();
  if data_connections > 2 {
    structure_improvements.push(StructureImprovement::DataFlowSection {
      connections: data_connections,
    });
  }
  trace.record(
    Stage::StructureReview,
    format!("{} structure improvement(s)", structure_improvements.len()),
  );

  let core_file_quality_score = batch_quality(functions, connections);
  trace.record(Stage::BatchQuality, format!("batch quality {core_file_quality_score}"));
  if context.is_large_organisation() {
    trace.record(Stage::BatchQuality, "large organisation: review the update before merging");
  }

  Reasoned {
    outcome: SymbolUpdatePlan {
      update_needed: true,
      patterns_to_document,
      impact_assessment: ImpactAssessment {
        architectural_changes,
        new_patterns: prefixes.len(),
        complexity_increase,
        priority,
      },
      structure_improvements,
      core_file_quality_score,
    },
    trace,
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn function(name: &str, file: &str, purpose: &str) -> FunctionRecord {
    let mut f = FunctionRecord::new(name, file);
    f.purpose = purpose.into();
    f
  }

  fn connection(from: &str, to: &str, kind: &str, purpose: &str) -> ConnectionRecord {
    let mut c = ConnectionRecord::new(from, to, kind);
    c.purpose = purpose.into();
    c
  }

  #[test]
  fn name_prefixes() {
    assert_eq!(name_prefix("auth_login").as_deref(), Some("auth"));
    assert_eq!(name_prefix("_private_helper").as_deref(), Some("private"));
    assert_eq!(name_prefix("getUserById").as_deref(), Some("get"));
    assert_eq!(name_prefix("UserService").as_deref(), Some("user"));
    assert_eq!(name_prefix("parse").as_deref(), Some("parse"));
    assert_eq!(name_prefix("unspecified"), None);
  }

  #[test]
  fn second_level_directories() {
    assert_eq!(second_level_directory("src/auth/login.rs").as_deref(), Some("src/auth"));
    assert_eq!(second_level_directory("./src/main.rs").as_deref(), Some("src"));
    assert_eq!(second_level_directory("main.rs"), None);
    assert_eq!(second_level_directory("unspecified"), None);
  }

  #[test]
  fn priority_thresholds() {
    assert_eq!(priority(0, 0, 0), Priority::Low);
    assert_eq!(priority(0, 1, 3), Priority::Medium);
    assert_eq!(priority(1, 0, 1), Priority::Medium);
    assert_eq!(priority(3, 0, 3), Priority::High);
    assert_eq!(priority(0, 2, 2), Priority::High);
    assert_eq!(priority(0, 0, 11), Priority::High);
  }

  #[test]
  fn three_service_calls_propose_a_pattern() {
    let connections = vec![
      connection("Api", "Auth", "service_call", "validate tokens"),
      connection("Api", "Billing", "service_call", "charge cards"),
      connection("Billing", "Ledger", "SERVICE_CALL", "write entries"),
    ];
    let plan = plan_symbol_update(&[], &connections, &TaskContext::default()).outcome;
    assert_eq!(plan.patterns_to_document.len(), 1);
    let p = &plan.patterns_to_document[0];
    assert_eq!(p.name, SERVICE_PATTERN_NAME);
    assert_eq!(p.integration_points, ["Api", "Auth", "Billing", "Ledger"]);
    assert!(plan.structure_improvements.contains(&StructureImprovement::ServiceSection {
      connection_types: vec!["service_call".into()],
    }));
  }

  #[test]
  fn two_service_calls_are_not_a_pattern() {
    let connections = vec![
      connection("Api", "Auth", "service_call", "validate"),
      connection("Api", "Billing", "service_call", "charge"),
    ];
    let plan = plan_symbol_update(&[], &connections, &TaskContext::default()).outcome;
    assert!(plan.patterns_to_document.is_empty());
  }

  #[test]
  fn structure_review() {
    let functions = vec![
      function("auth_login", "src/auth/login.rs", "Authenticate a user"),
      function("db_connect", "src/db/pool.rs", "Open a connection pool"),
    ];
    let connections = vec![
      connection("A", "B", "data", "moves data in"),
      connection("B", "C", "data", "moves data out"),
      connection("C", "D", "data", "data sync"),
    ];
    let plan = plan_symbol_update(&functions, &connections, &TaskContext::default()).outcome;
    assert_eq!(plan.impact_assessment.new_patterns, 2);
    assert_eq!(plan.impact_assessment.priority, Priority::High);
    assert!(plan.structure_improvements.contains(&StructureImprovement::MultiLayerArchitecture {
      directories: vec!["src/auth".into(), "src/db".into()],
    }));
    assert!(plan.structure_improvements.contains(&StructureImprovement::DataFlowSection {
      connections: 3,
    }));
  }

  #[test]
  fn batch_quality_scoring() {
    let good = vec![function("auth_login", "src/auth/login.rs", "Authenticate a user")];
    assert_eq!(batch_quality(&good, &[]), 100);
    assert_eq!(batch_quality(&good, &[connection("A", "B", "call", "x")]), 95);

    let weak = vec![function("auth_login", "login.rs", "[To be decided]")];
    assert_eq!(batch_quality(&weak, &[]), 85);

    let many: Vec<FunctionRecord> = (0..6)
      .map(|i| function(&format!("f{i}"), "src/a/b.rs", "Does something useful"))
      .collect();
    assert_eq!(batch_quality(&many, &[]), 100);
  }
}
