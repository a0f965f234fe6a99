//! Completeness scoring for decision records.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display};

use crate::record::{Decision, is_weak};

/// Points lost per weak field.
pub const FIELD_PENALTY: u8 = 25;

/// A decision field that scoring looks at.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum WeakField {
  Title,
  Standard,
  Rationale,
  Scope,
}

/// Fields of `decision` that are missing or hold a placeholder.
pub fn weak_fields(decision: &Decision) -> Vec<WeakField> {
  [
    (WeakField::Title, &decision.title),
    (WeakField::Standard, &decision.standard),
    (WeakField::Rationale, &decision.rationale),
    (WeakField::Scope, &decision.scope),
  ]
  .into_iter()
  .filter(|(_, value)| is_weak(value))
  .map(|(field, _)| field)
  .collect()
}

/// 100 minus [`FIELD_PENALTY`] per weak field.
pub fn decision_score(decision: &Decision) -> u8 {
  let penalty = weak_fields(decision).len() as u8 * FIELD_PENALTY;
  100u8.saturating_sub(penalty)
}

/// Rounded average of [`decision_score`]; an empty batch scores 100.
pub fn score(decisions: &[Decision]) -> u8 {
  if decisions.is_empty() {
    return 100;
  }
  let n = decisions.len() as u32;
  let total: u32 = decisions.iter().map(|d| u32::from(decision_score(d))).sum();
  ((total + n / 2) / n) as u8
}

#[cfg(test)]
mod tests {
  use super::*;

  fn complete() -> Decision {
    let mut d = Decision::unspecified(1);
    d.title = "Authentication".into();
    d.standard = "JWT + OAuth2".into();
    d.rationale = "security".into();
    d.scope = "all auth".into();
    d
  }

  #[test]
  fn complete_decision_scores_100() {
    assert_eq!(decision_score(&complete()), 100);
    assert!(weak_fields(&complete()).is_empty());
  }

  #[test]
  fn placeholder_field_costs_25() {
    let mut d = complete();
    d.rationale = "[To be decided]".into();
    assert!(decision_score(&d) <= 75);
    assert_eq!(weak_fields(&d), vec![WeakField::Rationale]);
  }

  #[test]
  fn sentinel_record_scores_zero() {
    assert_eq!(decision_score(&Decision::unspecified(1)), 0);
  }

  #[test]
  fn batch_score_is_rounded_average() {
    let mut half = complete();
    half.scope = "unspecified".into();
    half.title = "[title]".into();
    assert_eq!(score(&[complete(), half]), 75);
    assert_eq!(score(&[]), 100);
  }
}
