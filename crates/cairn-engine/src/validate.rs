//! Structural and semantic validation of the two logs.
//!
//! [`validate`] never fails: missing files, missing sections and read errors
//! all become failing [`CheckResult`]s. [`require_valid`] is the mandatory
//! pre-check and turns a failing report into [`Error::PreCheckFailed`].

use std::{
  io::ErrorKind,
  path::{Path, PathBuf},
};

use cairn_core::{conflict::detect_conflicts, quality, record::SymbolKind};
use cairn_markdown::{DEFAULT_DECISION_SECTIONS, FieldMarkers, parse_decisions, sections};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

#[derive(Debug, Clone)]
pub struct ValidationConfig {
  pub decision_log:      PathBuf,
  pub symbol_index:      PathBuf,
  /// `##` headers the decision log must contain.
  pub required_sections: Vec<String>,
  pub markers:           FieldMarkers,
}

impl ValidationConfig {
  pub fn new(decision_log: impl Into<PathBuf>, symbol_index: impl Into<PathBuf>) -> Self {
    Self {
      decision_log:      decision_log.into(),
      symbol_index:      symbol_index.into(),
      required_sections: DEFAULT_DECISION_SECTIONS.iter().map(|s| s.to_string()).collect(),
      markers:           FieldMarkers::default(),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckResult {
  pub name:    String,
  pub passed:  bool,
  pub details: Vec<String>,
  /// Set when the check could not run at all.
  pub error:   Option<String>,
}

impl CheckResult {
  fn pass(name: &str) -> Self {
    Self { name: name.to_string(), passed: true, details: Vec::new(), error: None }
  }

  fn fail(name: &str, details: Vec<String>) -> Self {
    Self { name: name.to_string(), passed: false, details, error: None }
  }

  fn error(name: &str, error: impl Into<String>) -> Self {
    Self { name: name.to_string(), passed: false, details: Vec::new(), error: Some(error.into()) }
  }

  fn from_details(name: &str, details: Vec<String>) -> Self {
    if details.is_empty() { Self::pass(name) } else { Self::fail(name, details) }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
  pub passed:        bool,
  pub checks:        Vec<CheckResult>,
  /// Quality of the recorded decisions; `None` when the log is unreadable.
  pub quality_score: Option<u8>,
}

impl ValidationReport {
  pub fn failed_checks(&self) -> impl Iterator<Item = &CheckResult> {
    self.checks.iter().filter(|c| !c.passed)
  }
}

/// Read `path`, reporting a missing or unreadable file as a failing check.
fn read_checked(name: &str, path: &Path) -> (CheckResult, Option<String>) {
  match std::fs::read_to_string(path) {
    Ok(text) => (CheckResult::pass(name), Some(text)),
    Err(e) if e.kind() == ErrorKind::NotFound => {
      (CheckResult::fail(name, vec![format!("{} does not exist", path.display())]), None)
    }
    Err(e) => (CheckResult::error(name, format!("{}: {e}", path.display())), None),
  }
}

fn missing_decision_sections(text: &str, required: &[String]) -> Vec<String> {
  let present: Vec<String> = sections(text).iter().map(|s| s.trim().to_lowercase()).collect();
  required
    .iter()
    .filter(|r| !present.contains(&r.trim().to_lowercase()))
    .map(|r| format!("missing section '{r}'"))
    .collect()
}

fn missing_symbol_sections(text: &str) -> Vec<String> {
  let present: Vec<SymbolKind> =
    sections(text).iter().filter_map(|s| SymbolKind::from_section(s)).collect();
  [SymbolKind::Function, SymbolKind::Connection, SymbolKind::Pattern]
    .into_iter()
    .filter(|k| !present.contains(k))
    .map(|k| format!("missing section '{}'", k.section_title()))
    .collect()
}

/// Check both logs. Reads only; running it twice on unchanged files gives
/// the same report.
pub fn validate(config: &ValidationConfig) -> ValidationReport {
  let mut checks = Vec::new();
  let mut quality_score = None;

  let (exists, decision_text) = read_checked("decision_log", &config.decision_log);
  checks.push(exists);
  match &decision_text {
    Some(text) => {
      checks.push(CheckResult::from_details(
        "decision_log_sections",
        missing_decision_sections(text, &config.required_sections),
      ));
      let decisions = parse_decisions(text, &config.markers);
      quality_score = Some(quality::score(&decisions));
      let conflicts = detect_conflicts(&decisions)
        .iter()
        .map(|c| c.describe())
        .collect();
      checks.push(CheckResult::from_details("decision_conflicts", conflicts));
    }
    None => {
      checks.push(CheckResult::error("decision_log_sections", "decision log unavailable"));
      checks.push(CheckResult::error("decision_conflicts", "decision log unavailable"));
    }
  }

  let (exists, symbol_text) = read_checked("symbol_index", &config.symbol_index);
  checks.push(exists);
  checks.push(match &symbol_text {
    Some(text) => CheckResult::from_details("symbol_index_sections", missing_symbol_sections(text)),
    None => CheckResult::error("symbol_index_sections", "symbol index unavailable"),
  });

  let passed = checks.iter().all(|c| c.passed);
  if !passed {
    let failed: Vec<&str> = checks.iter().filter(|c| !c.passed).map(|c| c.name.as_str()).collect();
    tracing::warn!(failed = ?failed, "validation failed");
  }
  ValidationReport { passed, checks, quality_score }
}

/// The mandatory pre-check: like [`validate`], but a failing report is an
/// error.
pub fn require_valid(config: &ValidationConfig) -> Result<ValidationReport> {
  let report = validate(config);
  if report.passed {
    return Ok(report);
  }
  Err(Error::PreCheckFailed {
    failed: report.failed_checks().map(|c| c.name.clone()).collect(),
  })
}

#[cfg(test)]
mod tests {
  use std::fs;

  use cairn_markdown::{decision_log_template, symbol_index_template};

  use super::*;

  fn config(dir: &Path) -> ValidationConfig {
    ValidationConfig::new(dir.join("CONVENTIONS.md"), dir.join("SYMBOLS.md"))
  }

  fn write_templates(dir: &Path) {
    fs::write(dir.join("CONVENTIONS.md"), decision_log_template(DEFAULT_DECISION_SECTIONS)).unwrap();
    fs::write(dir.join("SYMBOLS.md"), symbol_index_template()).unwrap();
  }

  #[test]
  fn fresh_templates_pass() {
    let dir = tempfile::tempdir().unwrap();
    write_templates(dir.path());
    let report = require_valid(&config(dir.path())).unwrap();
    assert!(report.passed);
    assert_eq!(report.quality_score, Some(100));
    assert_eq!(report.checks.len(), 5);
  }

  #[test]
  fn missing_files_fail_without_erroring() {
    let dir = tempfile::tempdir().unwrap();
    let report = validate(&config(dir.path()));
    assert!(!report.passed);
    assert_eq!(report.quality_score, None);
    assert_eq!(report.failed_checks().count(), 5);
    assert!(report.checks[0].details[0].contains("does not exist"));
    assert_eq!(report.checks[1].error.as_deref(), Some("decision log unavailable"));
  }

  #[test]
  fn missing_sections_are_listed() {
    let dir = tempfile::tempdir().unwrap();
    write_templates(dir.path());
    fs::write(dir.path().join("CONVENTIONS.md"), "# Conventions\n\n## Technology Stack\n").unwrap();
    let report = validate(&config(dir.path()));
    let sections = report.checks.iter().find(|c| c.name == "decision_log_sections").unwrap();
    assert_eq!(sections.details, [
      "missing section 'Security Standards'",
      "missing section 'Code Quality Standards'",
    ]);

    let err = require_valid(&config(dir.path())).unwrap_err();
    assert!(matches!(err, Error::PreCheckFailed { ref failed } if failed == &["decision_log_sections"]));
  }

  #[test]
  fn unreadable_path_is_an_error_result() {
    let dir = tempfile::tempdir().unwrap();
    write_templates(dir.path());
    // A directory cannot be read as a file.
    let mut cfg = config(dir.path());
    cfg.symbol_index = dir.path().to_path_buf();
    let report = validate(&cfg);
    let check = report.checks.iter().find(|c| c.name == "symbol_index").unwrap();
    assert!(!check.passed);
    assert!(check.error.is_some());
    // The decision log checks still ran.
    assert!(report.checks.iter().find(|c| c.name == "decision_conflicts").unwrap().passed);
  }

  #[test]
  fn validation_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    write_templates(dir.path());
    let log = dir.path().join("CONVENTIONS.md");
    let mut text = fs::read_to_string(&log).unwrap();
    text.push_str(
      "### Runtime\nDecision Made: 2026-01-01\nStandard: Node.js\nRationale: x\nApply To: backend\n\n\
       ### Runtime again\nDecision Made: 2026-02-01\nStandard: Python\nRationale: y\nApply To: backend\n",
    );
    fs::write(&log, text).unwrap();

    let first = validate(&config(dir.path()));
    let second = validate(&config(dir.path()));
    assert!(!first.passed);
    assert_eq!(first, second);
  }
}
