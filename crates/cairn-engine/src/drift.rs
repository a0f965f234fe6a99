//! Drift detection: do the decision log and symbol index still describe
//! reality?
//!
//! Three independent checks, each selectable through [`DriftConfig::checks`]:
//!
//! | check                  | severity | impact per finding |
//! |------------------------|----------|--------------------|
//! | `dangling_references`  | critical | 2                  |
//! | `stale_decisions`      | warning  | 1                  |
//! | `decision_conflicts`   | critical | 3                  |
//!
//! Detection only; see [`crate::reasoning::drift`] for resolution plans.

use cairn_core::{
  conflict::ConflictPair,
  record::Decision,
  store::{DecisionStore, Orphan, OrphanReason, SymbolStore},
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

/// Decisions older than this many days are stale unless configured otherwise.
pub const DEFAULT_STALE_AFTER_DAYS: i64 = 180;

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display,
  EnumString, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum DriftCheck {
  DanglingReferences,
  StaleDecisions,
  DecisionConflicts,
}

impl DriftCheck {
  pub const ALL: [Self; 3] =
    [Self::DanglingReferences, Self::StaleDecisions, Self::DecisionConflicts];

  pub fn severity(self) -> Severity {
    match self {
      Self::StaleDecisions => Severity::Warning,
      Self::DanglingReferences | Self::DecisionConflicts => Severity::Critical,
    }
  }

  /// Impact weight of a single finding.
  pub fn weight(self) -> u32 {
    match self {
      Self::StaleDecisions => 1,
      Self::DanglingReferences => 2,
      Self::DecisionConflicts => 3,
    }
  }
}

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize,
  Deserialize, Display, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Severity {
  Warning,
  Critical,
}

/// The findings of one check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
  pub kind:     DriftCheck,
  pub severity: Severity,
  pub count:    usize,
  /// One line per finding.
  pub details:  Vec<String>,
  pub impact:   u32,
}

impl Issue {
  /// `None` when there are no findings.
  fn from_details(kind: DriftCheck, details: Vec<String>) -> Option<Self> {
    if details.is_empty() {
      return None;
    }
    let count = details.len();
    Some(Self {
      kind,
      severity: kind.severity(),
      count,
      details,
      impact: kind.weight() * count as u32,
    })
  }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriftReport {
  pub drift_detected: bool,
  pub issues:         Vec<Issue>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriftConfig {
  pub stale_after_days: i64,
  /// Checks to run, in order.
  pub checks:           Vec<DriftCheck>,
}

impl Default for DriftConfig {
  fn default() -> Self {
    Self {
      stale_after_days: DEFAULT_STALE_AFTER_DAYS,
      checks:           DriftCheck::ALL.to_vec(),
    }
  }
}

// ─── Checks ──────────────────────────────────────────────────────────────────

pub fn dangling_references(orphans: &[Orphan]) -> Option<Issue> {
  let details = orphans
    .iter()
    .map(|o| {
      let problem = match &o.reason {
        OrphanReason::Missing => format!("missing path {}", o.path),
        OrphanReason::Unreadable { error } => {
          format!("unreadable path {} ({error})", o.path)
        }
      };
      format!("{} '{}' (line {}) references {problem}", o.record_kind, o.record_name, o.line)
    })
    .collect();
  Issue::from_details(DriftCheck::DanglingReferences, details)
}

/// Dated decisions more than `stale_after_days` before `as_of`. Undated
/// decisions are never stale.
pub fn stale_decisions(
  decisions: &[Decision],
  as_of: NaiveDate,
  stale_after_days: i64,
) -> Option<Issue> {
  let details = decisions
    .iter()
    .filter_map(|d| {
      let date = d.timestamp?;
      let age = (as_of - date).num_days();
      (age > stale_after_days)
        .then(|| format!("'{}' (line {}) is {age} days old", d.title, d.line))
    })
    .collect();
  Issue::from_details(DriftCheck::StaleDecisions, details)
}

pub fn decision_conflicts(conflicts: &[ConflictPair]) -> Option<Issue> {
  let details = conflicts.iter().map(ConflictPair::describe).collect();
  Issue::from_details(DriftCheck::DecisionConflicts, details)
}

// ─── Detector ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct DriftDetector {
  config: DriftConfig,
}

impl DriftDetector {
  pub fn new(config: DriftConfig) -> Self { Self { config } }

  pub fn config(&self) -> &DriftConfig { &self.config }

  /// Run the configured checks, measuring age against `as_of`.
  pub fn detect<D, S>(&self, decisions: &D, symbols: &S, as_of: NaiveDate) -> DriftReport
  where
    D: DecisionStore,
    S: SymbolStore,
  {
    let mut seen = Vec::new();
    let mut issues = Vec::new();
    for &check in &self.config.checks {
      if seen.contains(&check) {
        continue;
      }
      seen.push(check);
      let issue = match check {
        DriftCheck::DanglingReferences => dangling_references(&symbols.find_orphans()),
        DriftCheck::StaleDecisions => {
          stale_decisions(decisions.decisions(), as_of, self.config.stale_after_days)
        }
        DriftCheck::DecisionConflicts => decision_conflicts(&decisions.detect_conflicts()),
      };
      if let Some(issue) = issue {
        tracing::warn!(
          check = %issue.kind,
          severity = %issue.severity,
          count = issue.count,
          "drift detected"
        );
        issues.push(issue);
      }
    }
    DriftReport { drift_detected: !issues.is_empty(), issues }
  }
}
