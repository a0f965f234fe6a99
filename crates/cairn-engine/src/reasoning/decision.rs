//! Reasoning for a decision request: reuse, resolve or ask.

use cairn_core::{
  category::DecisionCategory,
  conflict::{ConflictPair, detect_conflicts},
  quality,
  record::Decision,
  store::TaskContext,
};
use serde::{Deserialize, Serialize};

use super::{Reasoned, Stage, ThoughtLog};

/// Asked for every new decision, after the category questions.
pub const META_QUESTIONS: [&str; 4] = [
  "Where should this decision be documented beyond the convention log?",
  "Is there an example in the codebase that shows the standard applied?",
  "Does existing code need to migrate to the new standard, and how?",
  "Which other decisions or symbols should this one reference?",
];

/// Asked when the task runs in an enterprise or a team larger than five.
pub const ORGANISATION_QUESTIONS: [&str; 2] = [
  "Which compliance or regulatory requirements constrain this decision?",
  "How will the decision be communicated to every affected team?",
];

/// What the caller should do next.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum DecisionAction {
  /// Matching decisions disagree; nothing may be reused until resolved.
  ResolveConflicts { conflicts: Vec<ConflictPair> },
  UseExisting { decisions: Vec<Decision>, quality_score: u8 },
  /// No decision exists yet; ask these before recording one.
  CaptureDecision { questions: Vec<String> },
}

/// Clarifying questions for a new decision of `decision_type`, in a fixed
/// order: category questions, meta questions, organisation questions.
pub fn questions_for(decision_type: &str, context: &TaskContext) -> Vec<String> {
  let category = DecisionCategory::classify(decision_type);
  let mut questions: Vec<String> =
    category.questions().iter().map(|q| q.to_string()).collect();
  questions.extend(META_QUESTIONS.iter().map(|q| q.to_string()));
  if context.is_large_organisation() {
    questions.extend(ORGANISATION_QUESTIONS.iter().map(|q| q.to_string()));
  }
  questions
}

/// Decide between reusing `matches`, resolving their conflicts, or capturing
/// a new decision.
///
/// Conflicts win over everything: an engine never picks one of two
/// disagreeing standards. Low quality is logged but never blocks reuse.
pub fn reason_about_decision(
  decision_type: &str,
  matches: &[Decision],
  context: &TaskContext,
) -> Reasoned<DecisionAction> {
  let mut trace = ThoughtLog::new();
  trace.record(
    Stage::Analyze,
    format!("{} existing decision(s) match '{decision_type}'", matches.len()),
  );

  let conflicts = detect_conflicts(matches);
  if !conflicts.is_empty() {
    trace.record(
      Stage::ConflictCheck,
      format!("{} conflict(s) among matches; resolution required", conflicts.len()),
    );
    for c in &conflicts {
      trace.record(Stage::ConflictCheck, c.describe());
    }
    tracing::warn!(decision_type, conflicts = conflicts.len(), "matching decisions conflict");
    return Reasoned {
      outcome: DecisionAction::ResolveConflicts { conflicts },
      trace,
    };
  }
  trace.record(Stage::ConflictCheck, "no conflicts among matches");

  if matches.is_empty() {
    let questions = questions_for(decision_type, context);
    trace.record(
      Stage::Decision,
      format!("nothing recorded; {} question(s) to answer first", questions.len()),
    );
    return Reasoned {
      outcome: DecisionAction::CaptureDecision { questions },
      trace,
    };
  }

  let quality_score = quality::score(matches);
  if quality_score < 100 {
    trace.record(Stage::QualityCheck, format!("quality score {quality_score}"));
    for d in matches {
      let weak = quality::weak_fields(d);
      if !weak.is_empty() {
        let names: Vec<String> = weak.iter().map(ToString::to_string).collect();
        trace.record(
          Stage::QualityCheck,
          format!("'{}' has weak fields: {}", d.title, names.join(", ")),
        );
      }
    }
  } else {
    trace.record(Stage::QualityCheck, "all matches fully specified");
  }

  trace.record(Stage::Decision, format!("reuse {} existing decision(s)", matches.len()));
  Reasoned {
    outcome: DecisionAction::UseExisting {
      decisions: matches.to_vec(),
      quality_score,
    },
    trace,
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn decision(title: &str, standard: &str, scope: &str) -> Decision {
    let mut d = Decision::unspecified(1);
    d.title = title.into();
    d.standard = standard.into();
    d.rationale = "because".into();
    d.scope = scope.into();
    d.decision_type = "runtime".into();
    d
  }

  #[test]
  fn known_category_gets_eight_questions() {
    let q = questions_for("authentication", &TaskContext::default());
    assert_eq!(q.len(), 8);
    assert_eq!(q[4], META_QUESTIONS[0]);
  }

  #[test]
  fn unknown_category_falls_back_to_generic_questions() {
    assert_eq!(questions_for("quantum", &TaskContext::default()).len(), 7);
  }

  #[test]
  fn large_organisations_get_two_more() {
    let ctx = TaskContext { team_size: Some(12), ..Default::default() };
    let q = questions_for("database", &ctx);
    assert_eq!(q.len(), 10);
    assert_eq!(q[9], ORGANISATION_QUESTIONS[1]);

    let enterprise = TaskContext { scope: Some("enterprise".into()), ..Default::default() };
    assert_eq!(questions_for("database", &enterprise), q);
  }

  #[test]
  fn conflicts_take_priority_over_reuse() {
    let matches = vec![
      decision("Backend runtime", "Node.js", "All backend services"),
      decision("Backend runtime", "Python", "All backend services"),
    ];
    let r = reason_about_decision("runtime", &matches, &TaskContext::default());
    assert!(matches!(r.outcome, DecisionAction::ResolveConflicts { ref conflicts } if conflicts.len() == 1));
    assert_eq!(r.trace.stages(), vec![Stage::Analyze, Stage::ConflictCheck]);
  }

  #[test]
  fn weak_matches_are_still_reused() {
    let mut weak = decision("Backend runtime", "Node.js", "All backend services");
    weak.rationale = "[To be decided]".into();
    let r = reason_about_decision("runtime", &[weak], &TaskContext::default());
    assert!(matches!(r.outcome, DecisionAction::UseExisting { quality_score: 75, .. }));
    assert!(r.trace.entries().iter().any(|t| t.thought.contains("rationale")));
  }

  #[test]
  fn nothing_recorded_asks_questions() {
    let r = reason_about_decision("authentication", &[], &TaskContext::default());
    let DecisionAction::CaptureDecision { questions } = r.outcome else {
      panic!("expected questions");
    };
    assert!(questions.len() >= 4);
    assert_eq!(r.trace.stages().last(), Some(&Stage::Decision));
  }
}
