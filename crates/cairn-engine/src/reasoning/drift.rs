//! Reasoning over a drift report: what to fix first and how long it takes.

use std::cmp::Reverse;

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display};

use super::{Reasoned, Stage, ThoughtLog};
use crate::drift::{DriftCheck, DriftReport, Severity};

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ResolutionAction {
  UpdateSymbolIndex,
  UpdateConvention,
  ManualReview,
}

impl ResolutionAction {
  pub fn for_check(check: DriftCheck) -> Self {
    match check {
      DriftCheck::DanglingReferences => Self::UpdateSymbolIndex,
      DriftCheck::StaleDecisions => Self::UpdateConvention,
      DriftCheck::DecisionConflicts => Self::ManualReview,
    }
  }

  pub fn effort_minutes(self) -> u32 {
    match self {
      Self::UpdateSymbolIndex => 10,
      Self::UpdateConvention => 15,
      Self::ManualReview => 30,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolutionStep {
  pub kind:           DriftCheck,
  pub severity:       Severity,
  pub action:         ResolutionAction,
  pub impact:         u32,
  pub effort_minutes: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriftResolution {
  pub requires_immediate_action: bool,
  pub critical_issues:           usize,
  pub warnings:                  usize,
  /// Critical issues first, then by impact, highest first.
  pub plan:                      Vec<ResolutionStep>,
  pub total_effort_minutes:      u32,
}

pub fn plan_drift_resolution(report: &DriftReport) -> Reasoned<DriftResolution> {
  let mut trace = ThoughtLog::new();

  let critical_issues = report
    .issues
    .iter()
    .filter(|i| i.severity == Severity::Critical)
    .count();
  let warnings = report.issues.len() - critical_issues;
  let requires_immediate_action = critical_issues > 0;
  trace.record(
    Stage::Triage,
    format!("{critical_issues} critical issue(s), {warnings} warning(s)"),
  );

  let mut issues: Vec<_> = report.issues.iter().collect();
  issues.sort_by_key(|i| (Reverse(i.severity), Reverse(i.impact)));

  let plan: Vec<ResolutionStep> = issues
    .into_iter()
    .map(|i| {
      let action = ResolutionAction::for_check(i.kind);
      ResolutionStep {
        kind: i.kind,
        severity: i.severity,
        action,
        impact: i.impact,
        effort_minutes: action.effort_minutes(),
      }
    })
    .collect();
  let total_effort_minutes = plan.iter().map(|s| s.effort_minutes).sum();
  for step in &plan {
    trace.record(
      Stage::ResolutionPlan,
      format!("{}: {} (impact {}, ~{} min)", step.kind, step.action, step.impact, step.effort_minutes),
    );
  }

  Reasoned {
    outcome: DriftResolution {
      requires_immediate_action,
      critical_issues,
      warnings,
      plan,
      total_effort_minutes,
    },
    trace,
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::drift::Issue;

  fn issue(kind: DriftCheck, count: usize) -> Issue {
    Issue {
      kind,
      severity: kind.severity(),
      count,
      details: vec![String::new(); count],
      impact: kind.weight() * count as u32,
    }
  }

  #[test]
  fn critical_first_then_impact() {
    let report = DriftReport {
      drift_detected: true,
      issues:         vec![
        issue(DriftCheck::StaleDecisions, 9),
        issue(DriftCheck::DanglingReferences, 1),
        issue(DriftCheck::DecisionConflicts, 1),
      ],
    };
    let r = plan_drift_resolution(&report).outcome;
    assert!(r.requires_immediate_action);
    assert_eq!((r.critical_issues, r.warnings), (2, 1));
    let order: Vec<_> = r.plan.iter().map(|s| s.action).collect();
    assert_eq!(order, [
      ResolutionAction::ManualReview,
      ResolutionAction::UpdateSymbolIndex,
      ResolutionAction::UpdateConvention,
    ]);
    assert_eq!(r.total_effort_minutes, 55);
  }

  #[test]
  fn warnings_only_can_wait() {
    let report = DriftReport {
      drift_detected: true,
      issues:         vec![issue(DriftCheck::StaleDecisions, 2)],
    };
    let r = plan_drift_resolution(&report).outcome;
    assert!(!r.requires_immediate_action);
    assert_eq!(r.total_effort_minutes, 15);
  }

  #[test]
  fn empty_report_has_empty_plan() {
    let r = plan_drift_resolution(&DriftReport::default());
    assert!(r.outcome.plan.is_empty());
    assert_eq!(r.outcome.total_effort_minutes, 0);
    assert_eq!(r.trace.stages(), vec![Stage::Triage]);
  }
}
