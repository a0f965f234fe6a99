//! The per-call reasoning trace.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display};

/// A step of one of the reasoning procedures.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Stage {
  // Decision requests.
  Analyze,
  ConflictCheck,
  QualityCheck,
  Decision,
  // Symbol-index updates.
  Impact,
  Priority,
  PatternDetection,
  StructureReview,
  BatchQuality,
  // Drift.
  Triage,
  ResolutionPlan,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Thought {
  pub timestamp: DateTime<Utc>,
  pub stage:     Stage,
  pub thought:   String,
}

/// Ordered thoughts recorded during a single reasoning call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ThoughtLog {
  entries: Vec<Thought>,
}

impl ThoughtLog {
  pub fn new() -> Self { Self::default() }

  /// Record a thought and emit it as a debug event.
  pub fn record(&mut self, stage: Stage, thought: impl Into<String>) {
    let thought = thought.into();
    tracing::debug!(stage = %stage, "{thought}");
    self.entries.push(Thought { timestamp: Utc::now(), stage, thought });
  }

  pub fn entries(&self) -> &[Thought] { &self.entries }

  pub fn len(&self) -> usize { self.entries.len() }

  pub fn is_empty(&self) -> bool { self.entries.is_empty() }

  /// Stages in the order they were visited, consecutive repeats collapsed.
  pub fn stages(&self) -> Vec<Stage> {
    let mut stages: Vec<Stage> = self.entries.iter().map(|t| t.stage).collect();
    stages.dedup();
    stages
  }
}

/// A reasoning result together with the trace that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reasoned<T> {
  pub outcome: T,
  pub trace:   ThoughtLog,
}

impl<T> Reasoned<T> {
  pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Reasoned<U> {
    Reasoned { outcome: f(self.outcome), trace: self.trace }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn stages_collapse_repeats() {
    let mut log = ThoughtLog::new();
    log.record(Stage::Analyze, "one");
    log.record(Stage::Analyze, "two");
    log.record(Stage::Decision, "three");
    assert_eq!(log.len(), 3);
    assert_eq!(log.stages(), vec![Stage::Analyze, Stage::Decision]);
    assert!(log.entries()[0].timestamp <= log.entries()[2].timestamp);
  }

  #[test]
  fn serialises_as_a_plain_list() {
    let mut log = ThoughtLog::new();
    log.record(Stage::ConflictCheck, "no conflicts");
    let json = serde_json::to_value(&log).unwrap();
    assert_eq!(json[0]["stage"], "conflict_check");
    assert_eq!(json[0]["thought"], "no conflicts");
  }
}
