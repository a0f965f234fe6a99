//! Record types: the units stored in the decision log and the symbol index.
//!
//! Records are immutable once written. Both logs are append-only; a correction
//! is a new record, never an edit of an old one. Missing text fields carry the
//! [`UNSPECIFIED`] sentinel so completeness can be scored downstream.

use std::collections::HashSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

use crate::{Error, Result, digest};

/// Sentinel stored in any text field the source did not provide.
pub const UNSPECIFIED: &str = "unspecified";

/// Source-file extensions that make a bare token look like a path.
const PATH_EXTENSIONS: &[&str] = &[
  ".rs", ".py", ".ts", ".tsx", ".js", ".jsx", ".go", ".java", ".kt", ".rb",
  ".c", ".h", ".cpp", ".hpp", ".cs", ".swift", ".sh", ".md", ".toml", ".json",
  ".yaml", ".yml", ".sql",
];

// ─── Field helpers ───────────────────────────────────────────────────────────

/// `true` when the value is empty or the [`UNSPECIFIED`] sentinel.
pub fn is_missing(value: &str) -> bool {
  let v = value.trim();
  v.is_empty() || v.eq_ignore_ascii_case(UNSPECIFIED)
}

/// `true` when the value is a template placeholder: it contains a bracket or
/// the phrase "be decided" (as in `[To be decided]`).
pub fn is_placeholder(value: &str) -> bool {
  value.contains('[')
    || value.contains(']')
    || value.to_lowercase().contains("be decided")
}

/// Missing or placeholder: the value carries no real information.
pub fn is_weak(value: &str) -> bool { is_missing(value) || is_placeholder(value) }

/// Return the trimmed value, or the sentinel when it is blank.
pub fn or_unspecified(value: &str) -> String {
  let v = value.trim();
  if v.is_empty() { UNSPECIFIED.to_string() } else { v.to_string() }
}

/// Heuristic: does `token` name a file on disk?
///
/// A token qualifies when it has no inner whitespace, is not a URL, and either
/// contains a `/` or ends with a known source extension.
pub fn looks_like_path(token: &str) -> bool {
  let t = clean_path_token(token);
  if t.is_empty() || t.chars().any(char::is_whitespace) || t.contains("://") {
    return false;
  }
  let lower = t.to_lowercase();
  (t.contains('/') && t.chars().any(char::is_alphanumeric))
    || PATH_EXTENSIONS.iter().any(|ext| lower.ends_with(ext) && lower.len() > ext.len())
}

/// Strip markdown backticks and trailing sentence punctuation from a token.
pub fn clean_path_token(token: &str) -> &str {
  token
    .trim()
    .trim_matches('`')
    .trim_end_matches([',', ';', ')', '.'])
    .trim_start_matches('(')
}

fn path_tokens<'a>(
  values: impl IntoIterator<Item = &'a str>,
) -> impl Iterator<Item = String> {
  values
    .into_iter()
    .flat_map(|v| v.split([' ', ',', '\t']))
    .filter(|t| looks_like_path(t))
    .map(|t| clean_path_token(t).to_string())
}

fn contains_ci(haystack: &str, needle_lower: &str) -> bool {
  haystack.to_lowercase().contains(needle_lower)
}

// ─── Decision ────────────────────────────────────────────────────────────────

/// One architectural choice recorded in the decision log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
  /// Short content digest; stable for identical record text.
  pub id:            String,
  pub title:         String,
  pub context:       String,
  /// The chosen technical approach.
  pub standard:      String,
  pub rationale:     String,
  /// Where the decision applies.
  pub scope:         String,
  /// Category tag, e.g. "authentication".
  pub decision_type: String,
  pub timestamp:     Option<NaiveDate>,
  /// The `##` section of the log the record sits under.
  pub section:       String,
  /// 1-based line of the record boundary in the source text.
  pub line:          usize,
}

impl Decision {
  /// A record with every text field set to the sentinel.
  pub fn unspecified(line: usize) -> Self {
    Self {
      id: String::new(),
      title: UNSPECIFIED.to_string(),
      context: UNSPECIFIED.to_string(),
      standard: UNSPECIFIED.to_string(),
      rationale: UNSPECIFIED.to_string(),
      scope: UNSPECIFIED.to_string(),
      decision_type: UNSPECIFIED.to_string(),
      timestamp: None,
      section: UNSPECIFIED.to_string(),
      line,
    }
  }

  /// Recompute [`Decision::id`] from the record's content.
  pub fn with_id(mut self) -> Self {
    let date = self.timestamp.map(|d| d.to_string()).unwrap_or_default();
    self.id = digest::record_id(&[
      &self.title,
      &self.standard,
      &self.scope,
      &self.rationale,
      &date,
    ]);
    self
  }

  /// All text fields joined, for containment matching.
  pub fn content(&self) -> String {
    [
      self.title.as_str(),
      &self.context,
      &self.standard,
      &self.rationale,
      &self.scope,
      &self.decision_type,
    ]
    .join("\n")
  }
}

/// Input to [`crate::store::DecisionStore::append`].
/// The record date is always set by the store.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewDecision {
  pub title:         String,
  pub context:       String,
  pub standard:      String,
  pub rationale:     String,
  pub scope:         String,
  pub decision_type: String,
  /// Section to file the decision under; `None` files it under the section
  /// of its decision category.
  pub section:       Option<String>,
}

impl NewDecision {
  /// Reject input that lacks a standard or a rationale.
  pub fn validate(&self) -> Result<()> {
    if self.standard.trim().is_empty() {
      return Err(Error::MissingField("standard"));
    }
    if self.rationale.trim().is_empty() {
      return Err(Error::MissingField("rationale"));
    }
    Ok(())
  }
}

// ─── Symbol records ──────────────────────────────────────────────────────────

/// The three kinds of entry kept in the symbol index.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display,
  EnumString, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum SymbolKind {
  Function,
  Connection,
  Pattern,
}

impl SymbolKind {
  /// The `##` header this kind of record is filed under.
  pub fn section_title(self) -> &'static str {
    match self {
      Self::Function => "Function Index",
      Self::Connection => "Connections",
      Self::Pattern => "Patterns",
    }
  }

  /// Classify a `##` header; `None` when it names no known section.
  pub fn from_section(header: &str) -> Option<Self> {
    let h = header.to_lowercase();
    if h.contains("function") {
      Some(Self::Function)
    } else if h.contains("connection") {
      Some(Self::Connection)
    } else if h.contains("pattern") {
      Some(Self::Pattern)
    } else {
      None
    }
  }
}

/// One code unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionRecord {
  pub name:         String,
  /// Weak reference to a path; may go stale.
  pub file:         String,
  pub purpose:      String,
  pub parameters:   String,
  pub returns:      String,
  pub dependencies: Vec<String>,
  pub added_date:   Option<NaiveDate>,
  pub context:      String,
  pub line:         usize,
}

impl FunctionRecord {
  pub fn new(name: impl Into<String>, file: impl Into<String>) -> Self {
    Self {
      name: or_unspecified(&name.into()),
      file: or_unspecified(&file.into()),
      purpose: UNSPECIFIED.to_string(),
      parameters: UNSPECIFIED.to_string(),
      returns: UNSPECIFIED.to_string(),
      dependencies: Vec::new(),
      added_date: None,
      context: UNSPECIFIED.to_string(),
      line: 0,
    }
  }

  /// Case-insensitive substring match across the descriptive fields.
  pub fn matches(&self, pattern: &str) -> bool {
    let p = pattern.trim().to_lowercase();
    if p.is_empty() {
      return true;
    }
    [
      self.name.as_str(),
      &self.file,
      &self.purpose,
      &self.parameters,
      &self.returns,
      &self.context,
    ]
    .iter()
    .any(|f| contains_ci(f, &p))
      || self.dependencies.iter().any(|d| contains_ci(d, &p))
  }

  /// Path-shaped references held by this record.
  pub fn referenced_paths(&self) -> Vec<String> {
    let mut paths: Vec<String> = Vec::new();
    if !is_missing(&self.file) && looks_like_path(&self.file) {
      paths.push(clean_path_token(&self.file).to_string());
    }
    paths.extend(path_tokens(self.dependencies.iter().map(String::as_str)));
    distinct(paths)
  }
}

/// A relationship between two named components.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionRecord {
  pub from:         String,
  pub to:           String,
  /// Category tag from the `Type:` label, e.g. "service_call".
  pub kind:         String,
  pub purpose:      String,
  pub data_flow:    String,
  pub dependencies: Vec<String>,
  pub added_date:   Option<NaiveDate>,
  pub context:      String,
  pub line:         usize,
}

impl ConnectionRecord {
  pub fn new(
    from: impl Into<String>,
    to: impl Into<String>,
    kind: impl Into<String>,
  ) -> Self {
    Self {
      from: or_unspecified(&from.into()),
      to: or_unspecified(&to.into()),
      kind: or_unspecified(&kind.into()),
      purpose: UNSPECIFIED.to_string(),
      data_flow: UNSPECIFIED.to_string(),
      dependencies: Vec::new(),
      added_date: None,
      context: UNSPECIFIED.to_string(),
      line: 0,
    }
  }

  /// Display name used as the record heading.
  pub fn name(&self) -> String { format!("{} -> {}", self.from, self.to) }

  pub fn matches(&self, component: &str) -> bool {
    let c = component.trim().to_lowercase();
    if c.is_empty() {
      return true;
    }
    [
      self.from.as_str(),
      &self.to,
      &self.kind,
      &self.purpose,
      &self.data_flow,
    ]
    .iter()
    .any(|f| contains_ci(f, &c))
  }

  pub fn referenced_paths(&self) -> Vec<String> {
    distinct(
      path_tokens(
        [self.from.as_str(), &self.to, &self.data_flow]
          .into_iter()
          .chain(self.dependencies.iter().map(String::as_str)),
      )
      .collect(),
    )
  }
}

/// A reusable coordination or implementation pattern.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternRecord {
  pub name:               String,
  pub discovered_date:    Option<NaiveDate>,
  pub description:        String,
  pub usage:              String,
  pub integration_points: Vec<String>,
  /// Where the pattern was first seen.
  pub context:            String,
  pub line:               usize,
}

impl PatternRecord {
  pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
    Self {
      name: or_unspecified(&name.into()),
      discovered_date: None,
      description: or_unspecified(&description.into()),
      usage: UNSPECIFIED.to_string(),
      integration_points: Vec::new(),
      context: UNSPECIFIED.to_string(),
      line: 0,
    }
  }
}

/// Any entry of the symbol index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "record", rename_all = "snake_case")]
pub enum SymbolRecord {
  Function(FunctionRecord),
  Connection(ConnectionRecord),
  Pattern(PatternRecord),
}

impl SymbolRecord {
  pub fn kind(&self) -> SymbolKind {
    match self {
      Self::Function(_) => SymbolKind::Function,
      Self::Connection(_) => SymbolKind::Connection,
      Self::Pattern(_) => SymbolKind::Pattern,
    }
  }

  pub fn name(&self) -> String {
    match self {
      Self::Function(f) => f.name.clone(),
      Self::Connection(c) => c.name(),
      Self::Pattern(p) => p.name.clone(),
    }
  }

  pub fn line(&self) -> usize {
    match self {
      Self::Function(f) => f.line,
      Self::Connection(c) => c.line,
      Self::Pattern(p) => p.line,
    }
  }

  /// Path-shaped references; patterns never hold any.
  pub fn referenced_paths(&self) -> Vec<String> {
    match self {
      Self::Function(f) => f.referenced_paths(),
      Self::Connection(c) => c.referenced_paths(),
      Self::Pattern(_) => Vec::new(),
    }
  }

  /// Fill the record's date with `today` when it has none.
  pub fn stamp(&mut self, today: NaiveDate) {
    let slot = match self {
      Self::Function(f) => &mut f.added_date,
      Self::Connection(c) => &mut c.added_date,
      Self::Pattern(p) => &mut p.discovered_date,
    };
    if slot.is_none() {
      *slot = Some(today);
    }
  }
}

/// Drop repeated paths, keeping the first occurrence of each.
fn distinct(paths: Vec<String>) -> Vec<String> {
  let mut seen = HashSet::new();
  paths.into_iter().filter(|p| seen.insert(p.clone())).collect()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn placeholder_detection() {
    assert!(is_placeholder("[To be decided]"));
    assert!(is_placeholder("To Be Decided later"));
    assert!(is_placeholder("see ]"));
    assert!(!is_placeholder("JWT + OAuth2"));
    assert!(is_weak(UNSPECIFIED));
    assert!(is_weak("   "));
  }

  #[test]
  fn path_heuristic() {
    assert!(looks_like_path("src/auth/login.rs"));
    assert!(looks_like_path("`main.py`"));
    assert!(looks_like_path("lib/utils/"));
    assert!(!looks_like_path("AuthService"));
    assert!(!looks_like_path("https://example.com/a"));
    assert!(!looks_like_path(".rs"));
    assert!(!looks_like_path("/"));
  }

  #[test]
  fn function_paths_include_file_and_dependencies() {
    let mut f = FunctionRecord::new("login", "src/auth/login.rs");
    f.dependencies = vec!["hash_password".into(), "src/auth/hash.rs".into()];
    assert_eq!(f.referenced_paths(), vec![
      "src/auth/login.rs".to_string(),
      "src/auth/hash.rs".to_string(),
    ]);
  }

  #[test]
  fn repeated_paths_are_reported_once() {
    let mut f = FunctionRecord::new("login", "src/auth/login.rs");
    f.dependencies = vec!["src/auth/hash.rs".into(), "src/auth/login.rs".into()];
    assert_eq!(f.referenced_paths(), ["src/auth/login.rs", "src/auth/hash.rs"]);

    let mut c = ConnectionRecord::new("src/api/mod.rs", "UserRepository", "service_call");
    c.data_flow = "src/db/users.rs".into();
    c.dependencies = vec!["src/api/mod.rs".into(), "src/db/users.rs".into()];
    assert_eq!(c.referenced_paths(), ["src/api/mod.rs", "src/db/users.rs"]);
  }

  #[test]
  fn new_decision_requires_standard_and_rationale() {
    let mut input = NewDecision {
      standard: "JWT".into(),
      ..Default::default()
    };
    assert!(matches!(
      input.validate(),
      Err(Error::MissingField("rationale"))
    ));
    input.rationale = "security".into();
    assert!(input.validate().is_ok());
  }

  #[test]
  fn decision_id_is_content_addressed() {
    let mut a = Decision::unspecified(3);
    a.title = "Auth".into();
    let mut b = a.clone();
    b.line = 40;
    assert_eq!(a.clone().with_id().id, b.with_id().id);
    a.standard = "JWT".into();
    assert_ne!(a.clone().with_id().id, Decision::unspecified(3).with_id().id);
  }
}
