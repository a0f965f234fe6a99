//! Markdown serialiser for records and log templates.
//!
//! Everything written here reads back through [`crate::parse`] unchanged.

use std::fmt::Write as _;

use chrono::NaiveDate;
use cairn_core::{
  category::DecisionCategory,
  record::{
    ConnectionRecord, Decision, FunctionRecord, PatternRecord, SymbolKind,
    SymbolRecord, UNSPECIFIED,
  },
};

/// Sections every decision log starts with.
pub const DEFAULT_DECISION_SECTIONS: &[&str] = &[
  "Technology Stack",
  "Security Standards",
  "Code Quality Standards",
];

// ─── Helpers ─────────────────────────────────────────────────────────────────

/// Collapse a value onto one line; blank values become the sentinel.
fn one_line(value: &str) -> String {
  let v = value.split_whitespace().collect::<Vec<_>>().join(" ");
  if v.is_empty() { UNSPECIFIED.to_string() } else { v }
}

fn date(value: Option<NaiveDate>) -> String {
  value.map_or_else(|| UNSPECIFIED.to_string(), |d| d.format("%Y-%m-%d").to_string())
}

fn list(values: &[String]) -> String {
  if values.is_empty() { "none".to_string() } else { one_line(&values.join(", ")) }
}

fn label(out: &mut String, name: &str, value: &str) {
  // Writing to a String cannot fail.
  let _ = writeln!(out, "- **{name}:** {}", one_line(value));
}

/// A `##` section header followed by a blank line.
pub fn render_section(title: &str) -> String { format!("## {}\n\n", one_line(title)) }

// ─── Records ─────────────────────────────────────────────────────────────────

/// Render a decision as a `###` record with a `Decision Made:` marker.
pub fn render_decision(d: &Decision) -> String {
  let mut out = format!("### {}\n", one_line(&d.title));
  label(&mut out, "Decision Made", &date(d.timestamp));
  label(&mut out, "Type", &d.decision_type);
  label(&mut out, "Context", &d.context);
  label(&mut out, "Standard", &d.standard);
  label(&mut out, "Rationale", &d.rationale);
  label(&mut out, "Apply To", &d.scope);
  out.push('\n');
  out
}

fn render_function(f: &FunctionRecord) -> String {
  let mut out = format!("### {}\n", one_line(&f.name));
  label(&mut out, "File", &f.file);
  label(&mut out, "Purpose", &f.purpose);
  label(&mut out, "Parameters", &f.parameters);
  label(&mut out, "Returns", &f.returns);
  label(&mut out, "Dependencies", &list(&f.dependencies));
  label(&mut out, "Added", &date(f.added_date));
  label(&mut out, "Context", &f.context);
  out
}

fn render_connection(c: &ConnectionRecord) -> String {
  let mut out = format!("### {}\n", one_line(&c.name()));
  label(&mut out, "From", &c.from);
  label(&mut out, "To", &c.to);
  label(&mut out, "Type", &c.kind);
  label(&mut out, "Purpose", &c.purpose);
  label(&mut out, "Data Flow", &c.data_flow);
  label(&mut out, "Dependencies", &list(&c.dependencies));
  label(&mut out, "Added", &date(c.added_date));
  label(&mut out, "Context", &c.context);
  out
}

fn render_pattern(p: &PatternRecord) -> String {
  let mut out = format!("### {}\n", one_line(&p.name));
  label(&mut out, "Discovered", &date(p.discovered_date));
  label(&mut out, "Pattern", &p.description);
  label(&mut out, "Usage", &p.usage);
  label(&mut out, "Integration Points", &list(&p.integration_points));
  label(&mut out, "Context", &p.context);
  out
}

/// Render any symbol-index record, followed by a blank line.
pub fn render_symbol(record: &SymbolRecord) -> String {
  let mut out = match record {
    SymbolRecord::Function(f) => render_function(f),
    SymbolRecord::Connection(c) => render_connection(c),
    SymbolRecord::Pattern(p) => render_pattern(p),
  };
  out.push('\n');
  out
}

// ─── Templates ───────────────────────────────────────────────────────────────

/// An empty, structurally valid decision log with the given sections.
pub fn decision_log_template<S: AsRef<str>>(sections: &[S]) -> String {
  let mut out = String::from(
    "# Project Conventions\n\n\
     Architectural decisions for this project. The log is append-only:\n\
     record a new decision instead of editing an old one.\n\n\
     <!--\n\
     ### Decision title\n\
     - **Decision Made:** YYYY-MM-DD\n\
     - **Type:** category\n\
     - **Context:** why a decision was needed\n\
     - **Standard:** the chosen approach\n\
     - **Rationale:** why this approach\n\
     - **Apply To:** where it applies\n\
     -->\n\n",
  );
  for section in sections {
    out.push_str(&render_section(section.as_ref()));
  }
  out
}

/// An empty, structurally valid symbol index.
pub fn symbol_index_template() -> String {
  let mut out = String::from(
    "# Symbol Index\n\n\
     Functions, connections and patterns of this codebase. The index is\n\
     append-only.\n\n",
  );
  for kind in [SymbolKind::Function, SymbolKind::Connection, SymbolKind::Pattern] {
    out.push_str(&render_section(kind.section_title()));
  }
  out
}

/// A placeholder decision for `category`, with its clarifying questions in a
/// trailing comment.
pub fn decision_template(category: &DecisionCategory, today: NaiveDate) -> String {
  let placeholder = Decision {
    id:            String::new(),
    title:         format!("[{category} decision]"),
    context:       "[To be decided]".to_string(),
    standard:      "[To be decided]".to_string(),
    rationale:     "[To be decided]".to_string(),
    scope:         "[To be decided]".to_string(),
    decision_type: category.to_string(),
    timestamp:     Some(today),
    section:       category.section().to_string(),
    line:          0,
  };
  let mut out = render_section(category.section());
  out.push_str(&render_decision(&placeholder));
  out.push_str("<!--\nQuestions to answer:\n");
  for q in category.questions() {
    let _ = writeln!(out, "- {q}");
  }
  out.push_str("-->\n");
  out
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{FieldMarkers, parse_decisions, parse_symbols, sections};

  #[test]
  fn multi_line_values_are_flattened() {
    let mut d = Decision::unspecified(0);
    d.title = "Auth".into();
    d.rationale = "line one\nline two".into();
    let text = render_decision(&d);
    assert!(text.contains("- **Rationale:** line one line two\n"));
    assert!(text.starts_with("### Auth\n"));
  }

  #[test]
  fn templates_are_structurally_valid_and_empty() {
    let log = decision_log_template(DEFAULT_DECISION_SECTIONS);
    assert_eq!(sections(&log), DEFAULT_DECISION_SECTIONS);
    assert!(parse_decisions(&log, &FieldMarkers::default()).is_empty());

    let index = symbol_index_template();
    assert_eq!(sections(&index), vec!["Function Index", "Connections", "Patterns"]);
    assert!(parse_symbols(&index, &FieldMarkers::default()).is_empty());
  }

  #[test]
  fn decision_template_scores_as_placeholder() {
    let today = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
    let text = decision_template(&DecisionCategory::Authentication, today);
    let parsed = parse_decisions(&text, &FieldMarkers::default());
    assert_eq!(parsed.len(), 1);
    assert_eq!(parsed[0].section, "Security Standards");
    assert_eq!(cairn_core::quality::decision_score(&parsed[0]), 0);
    assert!(text.contains("Which authentication mechanism"));
  }
}
