//! Human-readable rendering of command results.

use std::fmt::Write as _;

use cairn_core::{
  conflict::ConflictPair,
  record::{ConnectionRecord, Decision, FunctionRecord, PatternRecord, SymbolRecord},
  store::{Orphan, OrphanReason, SearchOutcome, SymbolHealth},
};
use cairn_engine::{
  ThoughtLog,
  drift::DriftReport,
  reasoning::DriftResolution,
  validate::ValidationReport,
  workflow::{TaskOutcome, WorkflowStatus},
};
use chrono::NaiveDate;

// Writing to a String cannot fail; the `let _ =` below discard `fmt::Result`.

fn date(d: Option<NaiveDate>) -> String {
  d.map_or_else(|| "undated".to_string(), |d| d.to_string())
}

pub fn decision(out: &mut String, d: &Decision) {
  let _ = writeln!(out, "{} [{}] ({}, line {})", d.title, d.id, date(d.timestamp), d.line);
  let _ = writeln!(out, "  standard:  {}", d.standard);
  let _ = writeln!(out, "  rationale: {}", d.rationale);
  let _ = writeln!(out, "  scope:     {}", d.scope);
  let _ = writeln!(out, "  section:   {}", d.section);
}

pub fn decisions(ds: &[Decision]) -> String {
  let mut out = String::new();
  for d in ds {
    decision(&mut out, d);
  }
  out
}

pub fn search(outcome: &SearchOutcome) -> String {
  if !outcome.matches.is_empty() {
    let mut out = format!("{} match(es)\n", outcome.matches.len());
    out.push_str(&decisions(&outcome.matches));
    return out;
  }
  if outcome.suggestions.is_empty() {
    "no matches\n".to_string()
  } else {
    format!("no matches; try: {}\n", outcome.suggestions.join(", "))
  }
}

fn function(out: &mut String, f: &FunctionRecord) {
  let _ = writeln!(out, "{} ({}, line {})", f.name, f.file, f.line);
  let _ = writeln!(out, "  purpose: {}", f.purpose);
  if !f.dependencies.is_empty() {
    let _ = writeln!(out, "  depends on: {}", f.dependencies.join(", "));
  }
}

fn connection(out: &mut String, c: &ConnectionRecord) {
  let _ = writeln!(out, "{} [{}] (line {})", c.name(), c.kind, c.line);
  let _ = writeln!(out, "  purpose: {}", c.purpose);
  let _ = writeln!(out, "  data flow: {}", c.data_flow);
}

fn pattern(out: &mut String, p: &PatternRecord) {
  let _ = writeln!(out, "{} (discovered {}, line {})", p.name, date(p.discovered_date), p.line);
  let _ = writeln!(out, "  {}", p.description);
  let _ = writeln!(out, "  usage: {}", p.usage);
  if !p.integration_points.is_empty() {
    let _ = writeln!(out, "  integrates: {}", p.integration_points.join(", "));
  }
}

pub fn symbols(records: &[SymbolRecord]) -> String {
  if records.is_empty() {
    return "no records\n".to_string();
  }
  let mut out = String::new();
  for r in records {
    match r {
      SymbolRecord::Function(f) => function(&mut out, f),
      SymbolRecord::Connection(c) => connection(&mut out, c),
      SymbolRecord::Pattern(p) => pattern(&mut out, p),
    }
  }
  out
}

pub fn symbol_health(h: &SymbolHealth) -> String {
  let updated = h
    .last_updated
    .map_or_else(|| "never".to_string(), |t| t.format("%Y-%m-%d %H:%M UTC").to_string());
  format!(
    "functions:   {}\nconnections: {}\npatterns:    {}\nupdated:     {updated}\n",
    h.function_count, h.connection_count, h.pattern_count
  )
}

pub fn conflicts(pairs: &[ConflictPair]) -> String {
  if pairs.is_empty() {
    return "no conflicts\n".to_string();
  }
  let mut out = format!("{} conflict(s)\n", pairs.len());
  for c in pairs {
    let _ = writeln!(out, "  - {} (lines {} and {})", c.describe(), c.first.line, c.second.line);
  }
  out
}

pub fn orphans(orphans: &[Orphan]) -> String {
  if orphans.is_empty() {
    return "no orphaned references\n".to_string();
  }
  let mut out = format!("{} orphaned reference(s)\n", orphans.len());
  for o in orphans {
    let reason = match &o.reason {
      OrphanReason::Missing => "missing".to_string(),
      OrphanReason::Unreadable { error } => format!("unreadable: {error}"),
    };
    let _ = writeln!(
      out,
      "  - {} ({} '{}', line {}): {reason}",
      o.path, o.record_kind, o.record_name, o.line
    );
  }
  out
}

fn trace(out: &mut String, log: &ThoughtLog) {
  for t in log.entries() {
    let _ = writeln!(out, "  · {}: {}", t.stage, t.thought);
  }
}

pub fn task(outcome: &TaskOutcome, log: &ThoughtLog) -> String {
  let mut out = format!("{}\n", outcome.status);
  match outcome.status {
    WorkflowStatus::ReadyForDevelopment => {
      if let Some(d) = &outcome.convention {
        out.push_str("follow:\n");
        decision(&mut out, d);
      }
    }
    WorkflowStatus::ConflictsRequireResolution => out.push_str(&conflicts(&outcome.conflicts)),
    WorkflowStatus::AwaitingUserDecision => {
      for (i, q) in outcome.questions.iter().enumerate() {
        let _ = writeln!(out, "{:>2}. {q}", i + 1);
      }
    }
  }
  out.push_str("reasoning:\n");
  trace(&mut out, log);
  out
}

pub fn validation(report: &ValidationReport) -> String {
  let mut out = String::new();
  for c in &report.checks {
    let mark = if c.passed { "ok  " } else { "FAIL" };
    let _ = writeln!(out, "{mark} {}", c.name);
    for d in &c.details {
      let _ = writeln!(out, "       {d}");
    }
    if let Some(e) = &c.error {
      let _ = writeln!(out, "       error: {e}");
    }
  }
  if let Some(score) = report.quality_score {
    let _ = writeln!(out, "decision quality: {score}/100");
  }
  out.push_str(if report.passed { "valid\n" } else { "invalid\n" });
  out
}

pub fn drift(report: &DriftReport, resolution: &DriftResolution) -> String {
  if !report.drift_detected {
    return "no drift detected\n".to_string();
  }
  let mut out = String::new();
  for issue in &report.issues {
    let _ = writeln!(
      out,
      "{} {} ({} finding(s), impact {})",
      issue.severity, issue.kind, issue.count, issue.impact
    );
    for d in &issue.details {
      let _ = writeln!(out, "  - {d}");
    }
  }
  out.push_str("plan:\n");
  for (i, step) in resolution.plan.iter().enumerate() {
    let _ = writeln!(out, "{:>2}. {} for {} (~{} min)", i + 1, step.action, step.kind, step.effort_minutes);
  }
  let _ = writeln!(out, "total effort: ~{} min", resolution.total_effort_minutes);
  if resolution.requires_immediate_action {
    out.push_str("critical issues require immediate action\n");
  }
  out
}
