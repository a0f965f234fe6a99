//! File-backed stores for Cairn.
//!
//! Both logs are plain markdown files. Each store parses its file once on
//! open, keeps the typed records in memory, and appends new records under an
//! advisory exclusive lock ([`fs2`]) so concurrent writers never interleave
//! record boundaries.

mod decisions;
mod lock;
mod search;
mod symbols;

pub mod error;

pub use decisions::DecisionLog;
pub use error::{Error, Result};
pub use symbols::SymbolIndex;
