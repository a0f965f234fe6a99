//! One function per subcommand. Each returns whether the command succeeded
//! in the exit-status sense; hard failures are errors.

use std::path::Path;

use anyhow::{Context as _, Result, bail};
use cairn_core::{
  category::DecisionCategory,
  conflict::ConflictPair,
  quality,
  record::{NewDecision, PatternRecord, SymbolRecord},
  store::{DecisionStore, Orphan, SearchOptions, SymbolHealth, SymbolStore, TaskContext},
};
use cairn_engine::{
  drift::{DriftDetector, DriftReport},
  reasoning::{DriftResolution, plan_drift_resolution},
  validate,
  workflow::{Workflow, WorkflowStatus},
};
use cairn_markdown::{decision_template, decision_log_template, symbol_index_template};
use chrono::{NaiveDate, Utc};
use serde::Serialize;

use crate::{render, settings::Settings};

// ─── Output ──────────────────────────────────────────────────────────────────

pub struct Output {
  pub json: bool,
}

impl Output {
  /// Print `value` as JSON, or as the text produced by `human`.
  fn emit<T: Serialize>(&self, value: &T, human: impl FnOnce(&T) -> String) -> Result<()> {
    if self.json {
      println!("{}", serde_json::to_string_pretty(value).context("failed to serialise output")?);
    } else {
      print!("{}", human(value));
    }
    Ok(())
  }
}

fn today() -> NaiveDate { Utc::now().date_naive() }

// ─── Decisions ───────────────────────────────────────────────────────────────

pub fn search(
  settings: &Settings,
  out: &Output,
  query: &str,
  exact: bool,
  section: Option<String>,
) -> Result<bool> {
  let log = settings.open_decisions()?;
  let outcome = log.search(query, &SearchOptions { exact, section });
  out.emit(&outcome, render::search)?;
  Ok(true)
}

pub struct DecisionArgs {
  pub title:         String,
  pub context:       String,
  pub standard:      String,
  pub rationale:     String,
  pub scope:         Option<String>,
  pub decision_type: Option<String>,
  pub section:       Option<String>,
}

pub fn decision(settings: &Settings, out: &Output, args: DecisionArgs) -> Result<bool> {
  let mut log = settings.open_decisions()?;
  let decision_type = args
    .decision_type
    .map(|t| DecisionCategory::classify(&t).to_string())
    .unwrap_or_default();
  let recorded = log
    .append(NewDecision {
      title: args.title,
      context: args.context,
      standard: args.standard,
      rationale: args.rationale,
      scope: args.scope.unwrap_or_default(),
      decision_type,
      section: args.section,
    })
    .context("failed to record decision")?;
  out.emit(&recorded, |d| {
    format!("recorded in {}\n{}", settings.decision_log.display(), render::decisions(std::slice::from_ref(d)))
  })?;
  Ok(true)
}

#[derive(Serialize)]
struct CoreHealth {
  decisions:     usize,
  scopes:        usize,
  quality_score: u8,
  conflicts:     usize,
  symbols:       SymbolHealth,
  orphans:       usize,
}

#[derive(Serialize, Default)]
struct CoreReport {
  #[serde(skip_serializing_if = "Option::is_none")]
  health:    Option<CoreHealth>,
  #[serde(skip_serializing_if = "Option::is_none")]
  template:  Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  conflicts: Option<Vec<ConflictPair>>,
  #[serde(skip_serializing_if = "Option::is_none")]
  orphans:   Option<Vec<Orphan>>,
}

fn render_core(report: &CoreReport) -> String {
  let mut text = String::new();
  if let Some(h) = &report.health {
    text.push_str(&format!(
      "decisions:   {} ({} scopes, quality {}/100, {} conflict(s))\n",
      h.decisions, h.scopes, h.quality_score, h.conflicts
    ));
    text.push_str(&render::symbol_health(&h.symbols));
    text.push_str(&format!("orphans:     {}\n", h.orphans));
  }
  if let Some(t) = &report.template {
    text.push_str(t);
  }
  if let Some(c) = &report.conflicts {
    text.push_str(&render::conflicts(c));
  }
  if let Some(o) = &report.orphans {
    text.push_str(&render::orphans(o));
  }
  text
}

pub fn core(
  settings: &Settings,
  out: &Output,
  health: bool,
  template: Option<String>,
  conflicts: bool,
  orphans: bool,
) -> Result<bool> {
  let health = health || (template.is_none() && !conflicts && !orphans);
  let mut report = CoreReport::default();

  if let Some(t) = template {
    report.template = Some(decision_template(&DecisionCategory::classify(&t), today()));
  }
  if health || conflicts {
    let log = settings.open_decisions()?;
    let pairs = log.detect_conflicts();
    if health {
      let symbols = settings.open_symbols()?;
      report.health = Some(CoreHealth {
        decisions:     log.decisions().len(),
        scopes:        log.scopes().count(),
        quality_score: quality::score(log.decisions()),
        conflicts:     pairs.len(),
        symbols:       symbols.health(),
        orphans:       symbols.find_orphans().len(),
      });
    }
    if conflicts {
      report.conflicts = Some(pairs);
    }
  }
  if orphans {
    report.orphans = Some(settings.open_symbols()?.find_orphans());
  }

  out.emit(&report, render_core)?;
  Ok(true)
}

// ─── Symbol index ────────────────────────────────────────────────────────────

pub fn index(
  settings: &Settings,
  out: &Output,
  functions: Option<Option<String>>,
  connections: Option<Option<String>>,
  patterns: bool,
  stats: bool,
) -> Result<bool> {
  let index = settings.open_symbols()?;
  let listing = functions.is_some() || connections.is_some() || patterns;
  if stats || !listing {
    out.emit(&index.health(), render::symbol_health)?;
  }
  if !listing {
    return Ok(true);
  }

  let mut records: Vec<SymbolRecord> = Vec::new();
  if let Some(pattern) = functions {
    records.extend(index.query_functions(pattern.as_deref()).into_iter().map(SymbolRecord::Function));
  }
  if let Some(component) = connections {
    records.extend(
      index
        .query_connections(component.as_deref())
        .into_iter()
        .map(SymbolRecord::Connection),
    );
  }
  if patterns {
    records.extend(index.query_patterns().into_iter().map(SymbolRecord::Pattern));
  }
  out.emit(&records, |r| render::symbols(r))?;
  Ok(true)
}

pub fn pattern(
  settings: &Settings,
  out: &Output,
  name: String,
  context: String,
  description: String,
  usage: String,
  integrations: Vec<String>,
) -> Result<bool> {
  let mut index = settings.open_symbols()?;
  let mut record = PatternRecord::new(name, description);
  record.usage = usage;
  record.context = context;
  record.integration_points = integrations
    .into_iter()
    .map(|s| s.trim().to_string())
    .filter(|s| !s.is_empty())
    .collect();
  let recorded = index
    .append(SymbolRecord::Pattern(record))
    .context("failed to record pattern")?;
  out.emit(&recorded, |r| {
    format!("recorded in {}\n{}", settings.symbol_index.display(), render::symbols(std::slice::from_ref(r)))
  })?;
  Ok(true)
}

// ─── Workflow ────────────────────────────────────────────────────────────────

pub fn task(
  settings: &Settings,
  out: &Output,
  decision_type: &str,
  context: &TaskContext,
) -> Result<bool> {
  let workflow = Workflow::new(settings.open_decisions()?, settings.open_symbols()?);
  let reasoned = workflow.begin_task(decision_type, context);
  out.emit(&reasoned, |r| render::task(&r.outcome, &r.trace))?;
  Ok(reasoned.outcome.status != WorkflowStatus::ConflictsRequireResolution)
}

// ─── Checks ──────────────────────────────────────────────────────────────────

pub fn validate(settings: &Settings, out: &Output) -> Result<bool> {
  let report = validate::validate(&settings.validation_config());
  out.emit(&report, render::validation)?;
  Ok(report.passed)
}

pub fn check(settings: &Settings, out: &Output) -> Result<bool> {
  let report = validate::require_valid(&settings.validation_config())
    .context("run `cairn validate` for details")?;
  out.emit(&report, render::validation)?;
  Ok(true)
}

#[derive(Serialize)]
struct DriftOutput {
  report:     DriftReport,
  resolution: DriftResolution,
}

pub fn drift(
  settings: &Settings,
  out: &Output,
  as_of: Option<NaiveDate>,
  stale_after: Option<i64>,
) -> Result<bool> {
  let mut config = settings.drift_config();
  if let Some(days) = stale_after {
    config.stale_after_days = days;
  }
  let log = settings.open_decisions()?;
  let index = settings.open_symbols()?;
  let report = DriftDetector::new(config).detect(&log, &index, as_of.unwrap_or_else(today));
  let resolution = plan_drift_resolution(&report).outcome;
  let drifted = report.drift_detected;
  out.emit(&DriftOutput { report, resolution }, |o| render::drift(&o.report, &o.resolution))?;
  Ok(!drifted)
}

// ─── Init ────────────────────────────────────────────────────────────────────

fn write_new(path: &Path, text: &str, force: bool) -> Result<()> {
  if path.exists() && !force {
    bail!("{} already exists; pass --force to overwrite it", path.display());
  }
  if let Some(parent) = path.parent()
    && !parent.as_os_str().is_empty()
  {
    std::fs::create_dir_all(parent)
      .with_context(|| format!("failed to create {}", parent.display()))?;
  }
  std::fs::write(path, text).with_context(|| format!("failed to write {}", path.display()))
}

#[derive(Serialize)]
struct InitReport {
  written: Vec<String>,
}

pub fn init(settings: &Settings, out: &Output, force: bool) -> Result<bool> {
  // Check both before writing either.
  if !force {
    for path in [&settings.decision_log, &settings.symbol_index] {
      if path.exists() {
        bail!("{} already exists; pass --force to overwrite it", path.display());
      }
    }
  }
  write_new(&settings.decision_log, &decision_log_template(&settings.required_sections), force)?;
  write_new(&settings.symbol_index, &symbol_index_template(), force)?;
  tracing::info!(
    decision_log = %settings.decision_log.display(),
    symbol_index = %settings.symbol_index.display(),
    "initialised"
  );

  let report = InitReport {
    written: [&settings.decision_log, &settings.symbol_index]
      .iter()
      .map(|p| p.display().to_string())
      .collect(),
  };
  out.emit(&report, |r| r.written.iter().map(|p| format!("wrote {p}\n")).collect())?;
  Ok(true)
}
