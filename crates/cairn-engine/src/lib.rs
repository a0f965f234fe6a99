//! Drift detection, reasoning and the development workflow for Cairn.
//!
//! Everything here works against the [`cairn_core::store`] traits; the
//! file-backed stores live in `cairn-store-fs`. All operations are
//! synchronous.

pub mod drift;
pub mod error;
pub mod reasoning;
pub mod validate;
pub mod workflow;

pub use error::{Error, Result};
pub use reasoning::{Reasoned, Stage, Thought, ThoughtLog};
