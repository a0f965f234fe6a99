//! Markdown codec for Cairn's decision log and symbol index.
//!
//! Converts between semi-structured markdown and [`cairn_core`] records. Pure
//! synchronous; no filesystem access.
//!
//! # Quick start
//!
//! ```no_run
//! use cairn_markdown::{FieldMarkers, parse_decisions};
//!
//! let log = "### Auth\nDecision Made: 2026-01-10\nStandard: JWT\n";
//! let decisions = parse_decisions(log, &FieldMarkers::default());
//! println!("{} decisions, first standard {}", decisions.len(), decisions[0].standard);
//! ```

mod markers;
mod parse;
mod serialize;

pub use markers::{Field, FieldMarkers};
pub use parse::{parse_decisions, parse_symbols, sections, unclosed_block};
pub use serialize::{
  DEFAULT_DECISION_SECTIONS, decision_log_template, decision_template,
  render_decision, render_section, render_symbol, symbol_index_template,
};

/// The last `##` section header of `input`, if any.
pub fn last_section(input: &str) -> Option<String> { sections(input).pop() }

// ─── Round-trip test ─────────────────────────────────────────────────────────

#[cfg(test)]
mod roundtrip_tests {
  use cairn_core::record::{
    ConnectionRecord, Decision, FunctionRecord, PatternRecord, SymbolRecord,
  };
  use chrono::NaiveDate;

  use super::*;

  #[test]
  fn decision_log_round_trip() {
    let mut d = Decision::unspecified(0);
    d.title = "Token authentication".into();
    d.context = "Public API needs auth".into();
    d.standard = "JWT + OAuth2".into();
    d.rationale = "Stateless: scales horizontally".into();
    d.scope = "all auth".into();
    d.decision_type = "authentication".into();
    d.timestamp = NaiveDate::from_ymd_opt(2026, 3, 4);

    let mut text = decision_log_template(DEFAULT_DECISION_SECTIONS);
    text.push_str(&render_decision(&d));

    let parsed = parse_decisions(&text, &FieldMarkers::default());
    assert_eq!(parsed.len(), 1);
    let p = &parsed[0];
    assert_eq!(p.title, d.title);
    assert_eq!(p.standard, d.standard);
    assert_eq!(p.rationale, d.rationale);
    assert_eq!(p.scope, d.scope);
    assert_eq!(p.context, d.context);
    assert_eq!(p.decision_type, d.decision_type);
    assert_eq!(p.timestamp, d.timestamp);
    assert_eq!(p.section, "Code Quality Standards");
    assert_eq!(p.id, d.with_id().id);
  }

  #[test]
  fn symbol_index_round_trip() {
    let mut f = FunctionRecord::new("authenticate_user", "src/auth/login.rs");
    f.purpose = "Validate credentials and issue a token".into();
    f.dependencies = vec!["hash_password".into(), "TokenService".into()];
    f.added_date = NaiveDate::from_ymd_opt(2026, 2, 1);

    let mut c = ConnectionRecord::new("AuthService", "UserRepository", "service_call");
    c.data_flow = "user id -> user row".into();

    let mut p = PatternRecord::new("Repository Pattern", "Data access behind traits");
    p.integration_points = vec!["UserRepository".into()];
    p.context = "Found while adding user lookup".into();

    let mut text = symbol_index_template();
    // Out of template order; each record gets its own section header.
    for r in [
      SymbolRecord::Pattern(p.clone()),
      SymbolRecord::Function(f.clone()),
      SymbolRecord::Connection(c.clone()),
    ] {
      text.push_str(&render_section(r.kind().section_title()));
      text.push_str(&render_symbol(&r));
    }

    let parsed = parse_symbols(&text, &FieldMarkers::default());
    assert_eq!(parsed.len(), 3);

    let SymbolRecord::Pattern(pp) = &parsed[0] else { panic!("no pattern") };
    assert_eq!(pp.description, p.description);
    assert_eq!(pp.integration_points, p.integration_points);
    assert_eq!(pp.context, p.context);

    let SymbolRecord::Function(pf) = &parsed[1] else { panic!("no function") };
    assert_eq!(pf.file, f.file);
    assert_eq!(pf.dependencies, f.dependencies);
    assert_eq!(pf.added_date, f.added_date);

    let SymbolRecord::Connection(pc) = &parsed[2] else { panic!("no connection") };
    assert_eq!(pc.from, "AuthService");
    assert_eq!(pc.to, "UserRepository");
    assert_eq!(pc.kind, "service_call");
    assert_eq!(pc.data_flow, c.data_flow);
  }

  #[test]
  fn last_section_follows_document_order() {
    assert_eq!(last_section("## A\n## B\n"), Some("B".to_string()));
    assert_eq!(last_section("no sections"), None);
  }
}
