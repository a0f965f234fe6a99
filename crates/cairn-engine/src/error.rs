//! Error type for `cairn-engine`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// Caller input rejected before anything was written.
  #[error("invalid input: {0}")]
  Validation(String),

  /// The mandatory pre-check found structural problems.
  #[error("pre-check failed: {}", failed.join(", "))]
  PreCheckFailed { failed: Vec<String> },

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),

  /// A batch of symbol appends stopped partway. The first `recorded`
  /// records are on disk; the rest were not written.
  #[error("recorded {recorded} of {total} symbol records, then: {source}")]
  PartialCycle {
    recorded: usize,
    total:    usize,
    #[source]
    source:   Box<dyn std::error::Error + Send + Sync>,
  },
}

impl Error {
  pub(crate) fn store(e: impl std::error::Error + Send + Sync + 'static) -> Self {
    Self::Store(Box::new(e))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
