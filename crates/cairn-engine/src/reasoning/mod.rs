//! The reasoning layer.
//!
//! Each procedure is a pure function of its inputs and returns its result as
//! a [`Reasoned`] value carrying the [`ThoughtLog`] of that call. Nothing is
//! kept between calls.

pub mod decision;
pub mod drift;
pub mod symbols;
mod trace;

pub use decision::{DecisionAction, questions_for, reason_about_decision};
pub use drift::{DriftResolution, ResolutionAction, ResolutionStep, plan_drift_resolution};
pub use symbols::{
  ImpactAssessment, Priority, StructureImprovement, SymbolUpdatePlan, plan_symbol_update,
};
pub use trace::{Reasoned, Stage, Thought, ThoughtLog};
