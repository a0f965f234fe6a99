//! Core types and trait definitions for the Cairn decision & symbol memory.
//!
//! This crate is deliberately free of filesystem and text-format concerns.
//! The parser, the file-backed stores and the reasoning engine all depend on
//! it; it depends on nothing project-specific.

pub mod category;
pub mod conflict;
pub mod digest;
pub mod error;
pub mod quality;
pub mod record;
pub mod store;
pub mod synonym;

pub use error::{Error, Result};
