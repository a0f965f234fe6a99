//! Markdown record parser.
//!
//! Pipeline:
//!   raw &str
//!     └─ classify_lines()      → Vec<Line> (fences and comments dropped)
//!          └─ record boundaries (### headings, `Decision Made:` markers)
//!               └─ accumulators → Vec<Decision> / Vec<SymbolRecord>
//!
//! Parsing is best-effort and infallible: unrecognised lines are skipped and
//! text without any record boundary yields no records.

use chrono::NaiveDate;
use cairn_core::record::{
  ConnectionRecord, Decision, FunctionRecord, PatternRecord, SymbolKind,
  SymbolRecord, UNSPECIFIED, or_unspecified,
};

use crate::markers::{Field, FieldMarkers};

// ─── Line classification ─────────────────────────────────────────────────────

enum Line<'a> {
  /// `# Title`; closes any open record.
  Top,
  /// `## Section`.
  Section(&'a str),
  /// `### Record heading`.
  Heading(&'a str),
  Text(&'a str),
}

/// Fence and comment state while scanning a document line by line.
#[derive(Default)]
struct Blocks {
  /// The marker that opened the current fence.
  fence:   Option<&'static str>,
  comment: bool,
}

impl Blocks {
  /// Advance over one trimmed line; `true` if the line is hidden from
  /// record parsing.
  fn hides(&mut self, line: &str) -> bool {
    if self.comment {
      if line.contains("-->") {
        self.comment = false;
      }
      return true;
    }
    for marker in ["```", "~~~"] {
      if line.starts_with(marker) {
        match self.fence {
          None => self.fence = Some(marker),
          Some(open) if open == marker => self.fence = None,
          Some(_) => {}
        }
        return true;
      }
    }
    if self.fence.is_some() {
      return true;
    }
    if line.starts_with("<!--") {
      self.comment = !line.contains("-->");
      return true;
    }
    false
  }

  /// The line that closes whatever block is still open.
  fn closer(&self) -> Option<&'static str> {
    if self.comment { Some("-->") } else { self.fence }
  }
}

/// The closing line needed when `input` ends inside a fenced code block or an
/// HTML comment. Text appended after such a document is invisible to the
/// parser until the block is closed.
pub fn unclosed_block(input: &str) -> Option<&'static str> {
  let mut blocks = Blocks::default();
  for raw in input.lines() {
    blocks.hides(raw.trim());
  }
  blocks.closer()
}

/// Classify each line, tagging it with its 1-based line number. Lines inside
/// fenced code blocks and HTML comments are dropped.
fn classify_lines(input: &str) -> Vec<(usize, Line<'_>)> {
  let mut out = Vec::new();
  let mut blocks = Blocks::default();

  for (idx, raw) in input.lines().enumerate() {
    let line = raw.trim();
    if blocks.hides(line) {
      continue;
    }

    let classified = if let Some(rest) = line.strip_prefix("### ") {
      Line::Heading(rest.trim())
    } else if let Some(rest) = line.strip_prefix("## ") {
      Line::Section(rest.trim())
    } else if line.starts_with("# ") || line == "#" {
      Line::Top
    } else {
      Line::Text(line)
    };
    out.push((idx + 1, classified));
  }
  out
}

// ─── Value helpers ───────────────────────────────────────────────────────────

/// The first `YYYY-MM-DD` in `value`, if any.
pub(crate) fn extract_date(value: &str) -> Option<NaiveDate> {
  let bytes = value.as_bytes();
  if bytes.len() < 10 {
    return None;
  }
  (0..=bytes.len() - 10).find_map(|i| {
    let w = &bytes[i..i + 10];
    let shaped = w.iter().enumerate().all(|(j, b)| match j {
      4 | 7 => *b == b'-',
      _ => b.is_ascii_digit(),
    });
    if !shaped {
      return None;
    }
    // The window is ASCII, so slicing on byte offsets is safe.
    NaiveDate::parse_from_str(&value[i..i + 10], "%Y-%m-%d").ok()
  })
}

/// Split a comma-separated list; "none", "-" and the sentinel yield nothing.
fn split_list(value: &str) -> Vec<String> {
  value
    .split(',')
    .map(|s| s.trim().trim_matches('`').trim())
    .filter(|s| {
      !s.is_empty()
        && *s != "-"
        && !s.eq_ignore_ascii_case("none")
        && !s.eq_ignore_ascii_case(UNSPECIFIED)
    })
    .map(str::to_string)
    .collect()
}

/// Strip a date and its surrounding punctuation out of a marker value.
fn strip_date(value: &str) -> String {
  let Some(date) = extract_date(value) else {
    return value.trim().to_string();
  };
  value
    .replacen(&date.format("%Y-%m-%d").to_string(), "", 1)
    .trim_matches(|c: char| c.is_whitespace() || "()[]-–,:".contains(c))
    .to_string()
}

fn set(slot: &mut Option<String>, value: &str) {
  let v = value.trim();
  if !v.is_empty() {
    *slot = Some(v.to_string());
  }
}

fn take(slot: Option<String>) -> String {
  slot.unwrap_or_else(|| UNSPECIFIED.to_string())
}

// ─── Decision accumulator ────────────────────────────────────────────────────

struct DecisionAccum {
  line:          usize,
  section:       String,
  from_heading:  bool,
  has_marker:    bool,
  labels:        usize,
  title:         Option<String>,
  context:       Option<String>,
  standard:      Option<String>,
  rationale:     Option<String>,
  scope:         Option<String>,
  decision_type: Option<String>,
  timestamp:     Option<NaiveDate>,
}

impl DecisionAccum {
  fn new(line: usize, section: &str) -> Self {
    Self {
      line,
      section: section.to_string(),
      from_heading: false,
      has_marker: false,
      labels: 0,
      title: None,
      context: None,
      standard: None,
      rationale: None,
      scope: None,
      decision_type: None,
      timestamp: None,
    }
  }

  fn heading(line: usize, section: &str, title: &str) -> Self {
    let mut acc = Self::new(line, section);
    acc.from_heading = true;
    set(&mut acc.title, title);
    acc
  }

  /// Whether a `Decision Made:` marker belongs to this record rather than
  /// opening a new one.
  fn accepts_marker(&self) -> bool {
    self.from_heading && !self.has_marker && self.labels == 0
  }

  fn marker(&mut self, value: &str) {
    self.has_marker = true;
    if let Some(date) = extract_date(value) {
      self.timestamp = Some(date);
    }
    if self.title.is_none() {
      set(&mut self.title, &strip_date(value));
    }
  }

  fn apply(&mut self, field: Field, value: &str) {
    match field {
      Field::Title => set(&mut self.title, value),
      Field::Date => {
        if let Some(date) = extract_date(value) {
          self.timestamp = Some(date);
        }
      }
      Field::Type => set(&mut self.decision_type, value),
      Field::Context => set(&mut self.context, value),
      Field::Standard => set(&mut self.standard, value),
      Field::Rationale => set(&mut self.rationale, value),
      Field::Scope => set(&mut self.scope, value),
      // Symbol-index labels carry no meaning in the decision log.
      _ => return,
    }
    self.labels += 1;
  }

  /// `None` for a bare heading with no decision content.
  fn finish(self) -> Option<Decision> {
    if !self.has_marker && self.labels == 0 {
      return None;
    }
    Some(
      Decision {
        id:            String::new(),
        title:         take(self.title),
        context:       take(self.context),
        standard:      take(self.standard),
        rationale:     take(self.rationale),
        scope:         take(self.scope),
        decision_type: take(self.decision_type),
        timestamp:     self.timestamp,
        section:       self.section,
        line:          self.line,
      }
      .with_id(),
    )
  }
}

/// Parse every decision in a decision log, in document order.
pub fn parse_decisions(input: &str, markers: &FieldMarkers) -> Vec<Decision> {
  let mut decisions = Vec::new();
  let mut section = UNSPECIFIED.to_string();
  let mut current: Option<DecisionAccum> = None;

  let flush = |acc: Option<DecisionAccum>, out: &mut Vec<Decision>| {
    if let Some(d) = acc.and_then(DecisionAccum::finish) {
      out.push(d);
    }
  };

  for (line_no, line) in classify_lines(input) {
    match line {
      Line::Top => flush(current.take(), &mut decisions),
      Line::Section(title) => {
        flush(current.take(), &mut decisions);
        section = title.to_string();
      }
      Line::Heading(title) => {
        flush(current.take(), &mut decisions);
        current = Some(DecisionAccum::heading(line_no, &section, title));
      }
      Line::Text(text) => {
        let Some((field, value)) = markers.split(text) else {
          continue;
        };
        if field == Field::DecisionMade {
          match current.as_mut() {
            Some(acc) if acc.accepts_marker() => acc.marker(value),
            _ => {
              flush(current.take(), &mut decisions);
              let mut acc = DecisionAccum::new(line_no, &section);
              acc.marker(value);
              current = Some(acc);
            }
          }
        } else if let Some(acc) = current.as_mut() {
          acc.apply(field, value);
        }
      }
    }
  }
  flush(current.take(), &mut decisions);

  tracing::debug!(count = decisions.len(), "parsed decision log");
  decisions
}

// ─── Symbol accumulator ──────────────────────────────────────────────────────

#[derive(Default)]
struct SymbolAccum {
  line:               usize,
  section_kind:       Option<SymbolKind>,
  heading:            String,
  labels:             usize,
  file:               Option<String>,
  purpose:            Option<String>,
  parameters:         Option<String>,
  returns:            Option<String>,
  dependencies:       Vec<String>,
  date:               Option<NaiveDate>,
  context:            Option<String>,
  from:               Option<String>,
  to:                 Option<String>,
  kind:               Option<String>,
  data_flow:          Option<String>,
  description:        Option<String>,
  usage:              Option<String>,
  integration_points: Vec<String>,
  saw_connection:     bool,
  saw_pattern:        bool,
}

impl SymbolAccum {
  fn apply(&mut self, field: Field, value: &str) {
    match field {
      Field::File => set(&mut self.file, value),
      Field::Purpose => set(&mut self.purpose, value),
      Field::Parameters => set(&mut self.parameters, value),
      Field::Returns => set(&mut self.returns, value),
      Field::Dependencies => self.dependencies = split_list(value),
      Field::Added | Field::Date | Field::DecisionMade => {
        if let Some(d) = extract_date(value) {
          self.date = Some(d);
        }
      }
      Field::Context => set(&mut self.context, value),
      Field::From => {
        self.saw_connection = true;
        set(&mut self.from, value);
      }
      Field::To => {
        self.saw_connection = true;
        set(&mut self.to, value);
      }
      Field::Type => set(&mut self.kind, value),
      Field::DataFlow => {
        self.saw_connection = true;
        set(&mut self.data_flow, value);
      }
      Field::Discovered => {
        self.saw_pattern = true;
        if let Some(d) = extract_date(value) {
          self.date = Some(d);
        }
      }
      Field::Description => {
        self.saw_pattern = true;
        set(&mut self.description, value);
      }
      Field::Usage => {
        self.saw_pattern = true;
        set(&mut self.usage, value);
      }
      Field::IntegrationPoints => {
        self.saw_pattern = true;
        self.integration_points = split_list(value);
      }
      // Decision-only labels.
      Field::Title | Field::Standard | Field::Rationale | Field::Scope => return,
    }
    self.labels += 1;
  }

  fn resolved_kind(&self) -> SymbolKind {
    self.section_kind.unwrap_or(if self.saw_connection {
      SymbolKind::Connection
    } else if self.saw_pattern {
      SymbolKind::Pattern
    } else {
      SymbolKind::Function
    })
  }

  /// `None` for a bare heading outside any known section.
  fn finish(self) -> Option<SymbolRecord> {
    if self.section_kind.is_none() && self.labels == 0 {
      return None;
    }
    let record = match self.resolved_kind() {
      SymbolKind::Function => SymbolRecord::Function(FunctionRecord {
        name:         or_unspecified(&self.heading),
        file:         take(self.file),
        purpose:      take(self.purpose),
        parameters:   take(self.parameters),
        returns:      take(self.returns),
        dependencies: self.dependencies,
        added_date:   self.date,
        context:      take(self.context),
        line:         self.line,
      }),
      SymbolKind::Connection => {
        // "A -> B" headings stand in for missing From/To labels.
        let (head_from, head_to) = split_arrow(&self.heading);
        SymbolRecord::Connection(ConnectionRecord {
          from:         self.from.or(head_from).unwrap_or_else(|| UNSPECIFIED.into()),
          to:           self.to.or(head_to).unwrap_or_else(|| UNSPECIFIED.into()),
          kind:         take(self.kind),
          purpose:      take(self.purpose),
          data_flow:    take(self.data_flow),
          dependencies: self.dependencies,
          added_date:   self.date,
          context:      take(self.context),
          line:         self.line,
        })
      }
      SymbolKind::Pattern => SymbolRecord::Pattern(PatternRecord {
        name:               or_unspecified(&self.heading),
        discovered_date:    self.date,
        description:        take(self.description.or(self.purpose)),
        usage:              take(self.usage),
        integration_points: self.integration_points,
        context:            take(self.context),
        line:               self.line,
      }),
    };
    Some(record)
  }
}

fn split_arrow(heading: &str) -> (Option<String>, Option<String>) {
  for arrow in ["->", "→", "=>"] {
    if let Some((a, b)) = heading.split_once(arrow) {
      let a = a.trim();
      let b = b.trim();
      return (
        (!a.is_empty()).then(|| a.to_string()),
        (!b.is_empty()).then(|| b.to_string()),
      );
    }
  }
  (None, None)
}

/// Parse every record in a symbol index, in document order.
pub fn parse_symbols(input: &str, markers: &FieldMarkers) -> Vec<SymbolRecord> {
  let mut records = Vec::new();
  let mut section_kind: Option<SymbolKind> = None;
  let mut current: Option<SymbolAccum> = None;

  let flush = |acc: Option<SymbolAccum>, out: &mut Vec<SymbolRecord>| {
    if let Some(r) = acc.and_then(SymbolAccum::finish) {
      out.push(r);
    }
  };

  for (line_no, line) in classify_lines(input) {
    match line {
      Line::Top => {
        flush(current.take(), &mut records);
        section_kind = None;
      }
      Line::Section(title) => {
        flush(current.take(), &mut records);
        section_kind = SymbolKind::from_section(title);
      }
      Line::Heading(title) => {
        flush(current.take(), &mut records);
        current = Some(SymbolAccum {
          line: line_no,
          section_kind,
          heading: title.to_string(),
          ..Default::default()
        });
      }
      Line::Text(text) => {
        if let (Some(acc), Some((field, value))) =
          (current.as_mut(), markers.split(text))
        {
          acc.apply(field, value);
        }
      }
    }
  }
  flush(current.take(), &mut records);

  tracing::debug!(count = records.len(), "parsed symbol index");
  records
}

/// The `##` section headers of a document, in order.
pub fn sections(input: &str) -> Vec<String> {
  classify_lines(input)
    .into_iter()
    .filter_map(|(_, line)| match line {
      Line::Section(title) => Some(title.to_string()),
      _ => None,
    })
    .collect()
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use super::*;

  fn decisions(input: &str) -> Vec<Decision> {
    parse_decisions(input, &FieldMarkers::default())
  }

  fn symbols(input: &str) -> Vec<SymbolRecord> {
    parse_symbols(input, &FieldMarkers::default())
  }

  #[test]
  fn heading_with_marker_is_one_record() {
    let input = "\
# Conventions

## Technology Stack

### Backend runtime
- **Decision Made:** 2026-01-10
- **Type:** runtime
- **Standard:** Node.js
- **Rationale:** Team expertise
- **Apply To:** All backend services
";
    let ds = decisions(input);
    assert_eq!(ds.len(), 1);
    let d = &ds[0];
    assert_eq!(d.title, "Backend runtime");
    assert_eq!(d.standard, "Node.js");
    assert_eq!(d.scope, "All backend services");
    assert_eq!(d.decision_type, "runtime");
    assert_eq!(d.section, "Technology Stack");
    assert_eq!(d.timestamp, NaiveDate::from_ymd_opt(2026, 1, 10));
    assert_eq!(d.line, 5);
    assert_eq!(d.context, UNSPECIFIED);
  }

  #[test]
  fn bare_markers_split_records() {
    let input = "\
## Security Standards
Decision Made: Token auth (2025-03-01)
Standard: JWT
Rationale: stateless
Decision Made: Password hashing
Standard: argon2
";
    let ds = decisions(input);
    assert_eq!(ds.len(), 2);
    assert_eq!(ds[0].title, "Token auth");
    assert_eq!(ds[0].timestamp, NaiveDate::from_ymd_opt(2025, 3, 1));
    assert_eq!(ds[1].title, "Password hashing");
    assert_eq!(ds[1].standard, "argon2");
    assert_eq!(ds[1].rationale, UNSPECIFIED);
    assert_eq!(ds[1].line, 5);
  }

  #[test]
  fn marker_after_labels_opens_a_new_record() {
    let input = "\
### Logging
Standard: tracing
Decision Made: Metrics
Standard: prometheus
";
    let ds = decisions(input);
    assert_eq!(ds.len(), 2);
    assert_eq!(ds[0].title, "Logging");
    assert_eq!(ds[1].title, "Metrics");
  }

  #[test]
  fn headings_without_labels_are_not_decisions() {
    let input = "## Notes\n\n### Background\nSome prose: with a colon.\n";
    assert!(decisions(input).is_empty());
  }

  #[test]
  fn garbage_yields_nothing() {
    assert!(decisions("").is_empty());
    assert!(decisions("just some text\nStandard: orphan label\n").is_empty());
    assert!(symbols("\u{0}\u{1} ### not a heading :::").is_empty());
  }

  #[test]
  fn unclosed_blocks_are_reported() {
    assert_eq!(unclosed_block("## A\n```text\nstill open\n"), Some("```"));
    assert_eq!(unclosed_block("~~~\n```\n"), Some("~~~"));
    assert_eq!(unclosed_block("<!--\nnote\n"), Some("-->"));
    assert_eq!(unclosed_block("```\ncode\n```\n<!-- done -->\n"), None);
    assert_eq!(unclosed_block(""), None);
  }

  #[test]
  fn fenced_and_commented_examples_are_ignored() {
    let input = "\
## Technology Stack
<!--
### Example
Standard: [To be decided]
-->
```
### Also example
Standard: nope
```
";
    assert!(decisions(input).is_empty());
    assert_eq!(sections(input), vec!["Technology Stack".to_string()]);
  }

  #[test]
  fn symbol_sections_type_records() {
    let input = "\
# Symbol Index

## Function Index

### authenticate_user
- **File:** src/auth/login.rs
- **Purpose:** Validate credentials and issue a token
- **Dependencies:** hash_password, TokenService
- **Added:** 2026-02-01

## Connections

### AuthService -> UserRepository
- **Type:** service_call
- **Purpose:** Load user records

## Patterns

### Repository Pattern
- **Discovered:** 2026-02-03
- **Pattern:** Data access behind traits
- **Usage:** All persistence
- **Integration Points:** UserRepository, OrderRepository
";
    let rs = symbols(input);
    assert_eq!(rs.len(), 3);

    let SymbolRecord::Function(f) = &rs[0] else { panic!("no function") };
    assert_eq!(f.name, "authenticate_user");
    assert_eq!(f.file, "src/auth/login.rs");
    assert_eq!(f.dependencies, vec!["hash_password", "TokenService"]);
    assert_eq!(f.added_date, NaiveDate::from_ymd_opt(2026, 2, 1));
    assert_eq!(f.returns, UNSPECIFIED);

    let SymbolRecord::Connection(c) = &rs[1] else { panic!("no connection") };
    assert_eq!(c.from, "AuthService");
    assert_eq!(c.to, "UserRepository");
    assert_eq!(c.kind, "service_call");
    assert_eq!(c.line, 13);

    let SymbolRecord::Pattern(p) = &rs[2] else { panic!("no pattern") };
    assert_eq!(p.description, "Data access behind traits");
    assert_eq!(p.integration_points.len(), 2);
  }

  #[test]
  fn kind_inferred_outside_sections() {
    let input = "\
### Billing -> Ledger
From: Billing
To: Ledger
Type: event

### parse_config
File: src/config.rs
";
    let rs = symbols(input);
    assert_eq!(rs[0].kind(), SymbolKind::Connection);
    assert_eq!(rs[1].kind(), SymbolKind::Function);
  }

  #[test]
  fn date_extraction() {
    assert_eq!(extract_date("on 2024-02-29."), NaiveDate::from_ymd_opt(2024, 2, 29));
    assert_eq!(extract_date("2023-02-30"), None);
    assert_eq!(extract_date("émoji ✓ 2020-01-01"), NaiveDate::from_ymd_opt(2020, 1, 1));
    assert_eq!(extract_date("short"), None);
  }

  #[test]
  fn list_values() {
    assert!(split_list("none").is_empty());
    assert_eq!(split_list("`a`, b ,, c"), vec!["a", "b", "c"]);
  }
}
