//! Field markers: the `Label:` prefixes the parser understands.

use std::collections::HashMap;

/// A record field addressed by a label line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
  // ── Decision ──────────────────────────────────────────────────────────
  /// `Decision Made:`, a record boundary as well as a field.
  DecisionMade,
  Title,
  Date,
  /// Decision category, or connection type inside the symbol index.
  Type,
  Context,
  Standard,
  Rationale,
  Scope,

  // ── Symbol index ──────────────────────────────────────────────────────
  File,
  Purpose,
  Parameters,
  Returns,
  Dependencies,
  Added,
  From,
  To,
  DataFlow,
  Discovered,
  Description,
  Usage,
  IntegrationPoints,
}

const DEFAULT_MARKERS: &[(&str, Field)] = &[
  ("decision made", Field::DecisionMade),
  ("title", Field::Title),
  ("date", Field::Date),
  ("type", Field::Type),
  ("category", Field::Type),
  ("context", Field::Context),
  ("standard", Field::Standard),
  ("rationale", Field::Rationale),
  ("apply to", Field::Scope),
  ("applies to", Field::Scope),
  ("scope", Field::Scope),
  ("file", Field::File),
  ("purpose", Field::Purpose),
  ("parameters", Field::Parameters),
  ("params", Field::Parameters),
  ("returns", Field::Returns),
  ("dependencies", Field::Dependencies),
  ("depends on", Field::Dependencies),
  ("added", Field::Added),
  ("from", Field::From),
  ("to", Field::To),
  ("data flow", Field::DataFlow),
  ("discovered", Field::Discovered),
  ("pattern", Field::Description),
  ("description", Field::Description),
  ("usage", Field::Usage),
  ("integration points", Field::IntegrationPoints),
  ("integrations", Field::IntegrationPoints),
];

/// Case-insensitive label → field table.
#[derive(Debug, Clone)]
pub struct FieldMarkers {
  labels: HashMap<String, Field>,
}

impl Default for FieldMarkers {
  fn default() -> Self {
    Self {
      labels: DEFAULT_MARKERS
        .iter()
        .map(|(label, field)| ((*label).to_string(), *field))
        .collect(),
    }
  }
}

impl FieldMarkers {
  /// Register an extra label for `field`, e.g. `"Chosen Approach"` for
  /// [`Field::Standard`].
  pub fn with_label(mut self, label: &str, field: Field) -> Self {
    self.labels.insert(normalize_label(label), field);
    self
  }

  pub fn field(&self, label: &str) -> Option<Field> {
    self.labels.get(&normalize_label(label)).copied()
  }

  /// Split a label line into its field and value.
  ///
  /// Accepts `Label: value`, `**Label:** value`, `**Label**: value`, each
  /// optionally behind a `-`, `*` or `+` bullet. Returns `None` for lines
  /// whose label is not registered.
  pub fn split<'a>(&self, line: &'a str) -> Option<(Field, &'a str)> {
    let (label, value) = split_label(line)?;
    Some((self.field(label)?, value.trim()))
  }
}

fn normalize_label(label: &str) -> String {
  label
    .split_whitespace()
    .collect::<Vec<_>>()
    .join(" ")
    .to_lowercase()
}

/// Labels longer than this are prose, not markers.
const MAX_LABEL_LEN: usize = 40;

fn split_label(line: &str) -> Option<(&str, &str)> {
  let mut s = line.trim();
  for bullet in ["- ", "* ", "+ "] {
    if let Some(rest) = s.strip_prefix(bullet) {
      s = rest.trim_start();
      break;
    }
  }

  let (label, value) = if let Some(rest) = s.strip_prefix("**") {
    let close = rest.find("**")?;
    let inner = &rest[..close];
    let after = &rest[close + 2..];
    if let Some(label) = inner.trim_end().strip_suffix(':') {
      (label, after)
    } else {
      (inner, after.trim_start().strip_prefix(':')?)
    }
  } else {
    let colon = s.find(':')?;
    (&s[..colon], &s[colon + 1..])
  };

  let label = label.trim();
  if label.is_empty() || label.len() > MAX_LABEL_LEN || label.contains('`') {
    return None;
  }
  Some((label, value))
}
