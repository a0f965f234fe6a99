//! The development workflow: check what is recorded, ask when nothing is,
//! capture the answer, and record what the work produced.

use cairn_core::{
  category::DecisionCategory,
  conflict::ConflictPair,
  record::{ConnectionRecord, Decision, FunctionRecord, NewDecision, SymbolRecord},
  store::{DecisionStore, SymbolStore, TaskContext},
};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display};

use crate::{
  Error, Result,
  reasoning::{DecisionAction, Reasoned, SymbolUpdatePlan, plan_symbol_update, reason_about_decision},
};

// ─── Types ───────────────────────────────────────────────────────────────────

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, AsRefStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkflowStatus {
  ReadyForDevelopment,
  /// Hard stop: the caller must resolve the conflicts and start over.
  ConflictsRequireResolution,
  AwaitingUserDecision,
}

/// Result of [`Workflow::begin_task`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskOutcome {
  pub status:        WorkflowStatus,
  /// The most recently recorded matching decision.
  pub convention:    Option<Decision>,
  pub quality_score: Option<u8>,
  pub conflicts:     Vec<ConflictPair>,
  pub questions:     Vec<String>,
}

/// The caller's answer to the clarifying questions.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DecisionAnswer {
  /// The chosen standard.
  pub choice:    String,
  pub rationale: String,
  pub scope:     String,
  pub title:     Option<String>,
  /// Defaults to a summary of the task context.
  pub context:   Option<String>,
  pub section:   Option<String>,
}

/// What a finished development cycle added to the codebase.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DevelopmentResults {
  pub functions:   Vec<FunctionRecord>,
  pub connections: Vec<ConnectionRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleReport {
  pub functions_recorded:   usize,
  pub connections_recorded: usize,
  pub patterns_recorded:    usize,
  pub plan:                 SymbolUpdatePlan,
}

fn describe_context(context: &TaskContext) -> String {
  let mut parts = Vec::new();
  if let Some(t) = context.technology.as_deref().filter(|t| !t.trim().is_empty()) {
    parts.push(format!("technology: {}", t.trim()));
  }
  if let Some(d) = context.domain.as_deref().filter(|d| !d.trim().is_empty()) {
    parts.push(format!("domain: {}", d.trim()));
  }
  if let Some(s) = context.scope.as_deref().filter(|s| !s.trim().is_empty()) {
    parts.push(format!("organisation: {}", s.trim()));
  }
  if let Some(n) = context.team_size {
    parts.push(format!("team of {n}"));
  }
  parts.join("; ")
}

// ─── Workflow ────────────────────────────────────────────────────────────────

/// Sequences reasoning and recording for one development task over any pair
/// of stores.
#[derive(Debug)]
pub struct Workflow<D, S> {
  decisions: D,
  symbols:   S,
}

impl<D, S> Workflow<D, S>
where
  D: DecisionStore,
  S: SymbolStore,
{
  pub fn new(decisions: D, symbols: S) -> Self { Self { decisions, symbols } }

  pub fn decisions(&self) -> &D { &self.decisions }

  pub fn symbols(&self) -> &S { &self.symbols }

  pub fn into_parts(self) -> (D, S) { (self.decisions, self.symbols) }

  /// Look up what is recorded for `decision_type` and decide how the task
  /// may proceed.
  pub fn begin_task(
    &self,
    decision_type: &str,
    context: &TaskContext,
  ) -> Reasoned<TaskOutcome> {
    let matches = self.decisions.find_matching(decision_type, context);
    let reasoned = reason_about_decision(decision_type, &matches, context);
    let trace = reasoned.trace;

    let outcome = match reasoned.outcome {
      DecisionAction::UseExisting { mut decisions, quality_score } => TaskOutcome {
        status:        WorkflowStatus::ReadyForDevelopment,
        convention:    decisions.pop(),
        quality_score: Some(quality_score),
        conflicts:     Vec::new(),
        questions:     Vec::new(),
      },
      DecisionAction::ResolveConflicts { conflicts } => TaskOutcome {
        status:        WorkflowStatus::ConflictsRequireResolution,
        convention:    None,
        quality_score: None,
        conflicts,
        questions:     Vec::new(),
      },
      DecisionAction::CaptureDecision { questions } => TaskOutcome {
        status:        WorkflowStatus::AwaitingUserDecision,
        convention:    None,
        quality_score: None,
        conflicts:     Vec::new(),
        questions,
      },
    };
    tracing::debug!(decision_type, status = %outcome.status, "task assessed");
    Reasoned { outcome, trace }
  }

  /// Record the caller's answer as a new decision.
  ///
  /// A blank `choice` or `rationale` is rejected before anything is written.
  pub fn capture_decision(
    &mut self,
    decision_type: &str,
    context: &TaskContext,
    answer: DecisionAnswer,
  ) -> Result<Decision> {
    if answer.choice.trim().is_empty() {
      return Err(Error::Validation("a choice is required".to_string()));
    }
    if answer.rationale.trim().is_empty() {
      return Err(Error::Validation("a rationale is required".to_string()));
    }

    let category = DecisionCategory::classify(decision_type);
    let title = answer
      .title
      .filter(|t| !t.trim().is_empty())
      .unwrap_or_else(|| format!("{category} standard"));
    let input = NewDecision {
      title,
      context: answer.context.unwrap_or_else(|| describe_context(context)),
      standard: answer.choice,
      rationale: answer.rationale,
      scope: answer.scope,
      decision_type: category.to_string(),
      section: answer.section,
    };
    self.decisions.append(input).map_err(Error::store)
  }

  /// Plan the symbol-index update for `results` and append every function,
  /// connection and proposed pattern.
  pub fn complete_development_cycle(
    &mut self,
    results: DevelopmentResults,
    context: &TaskContext,
  ) -> Result<Reasoned<CycleReport>> {
    let Reasoned { outcome: plan, trace } =
      plan_symbol_update(&results.functions, &results.connections, context);

    let functions_recorded = results.functions.len();
    let connections_recorded = results.connections.len();
    let patterns_recorded = plan.patterns_to_document.len();

    let records: Vec<SymbolRecord> = results
      .functions
      .into_iter()
      .map(SymbolRecord::Function)
      .chain(results.connections.into_iter().map(SymbolRecord::Connection))
      .chain(plan.patterns_to_document.iter().cloned().map(SymbolRecord::Pattern))
      .collect();
    let total = records.len();
    for (recorded, record) in records.into_iter().enumerate() {
      self.symbols.append(record).map_err(|e| Error::PartialCycle {
        recorded,
        total,
        source: Box::new(e),
      })?;
    }
    tracing::info!(
      functions = functions_recorded,
      connections = connections_recorded,
      patterns = patterns_recorded,
      priority = %plan.impact_assessment.priority,
      "development cycle recorded"
    );

    Ok(Reasoned {
      outcome: CycleReport {
        functions_recorded,
        connections_recorded,
        patterns_recorded,
        plan,
      },
      trace,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn context_summary() {
    let ctx = TaskContext {
      technology: Some("Rust".into()),
      domain:     Some(" ".into()),
      scope:      None,
      team_size:  Some(3),
    };
    assert_eq!(describe_context(&ctx), "technology: Rust; team of 3");
    assert_eq!(describe_context(&TaskContext::default()), "");
  }

  #[test]
  fn status_names() {
    assert_eq!(WorkflowStatus::AwaitingUserDecision.to_string(), "AWAITING_USER_DECISION");
  }
}
