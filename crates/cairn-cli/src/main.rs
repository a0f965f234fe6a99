//! `cairn`: the decision log and symbol index of a codebase.
//!
//! # Usage
//!
//! ```text
//! cairn init
//! cairn task authentication --technology rust
//! cairn decision --title "Token auth" --context "public API" \
//!   --standard "JWT + OAuth2" --rationale "stateless" --type authentication
//! cairn search jwt --exact
//! cairn drift --json
//! ```
//!
//! `validate`, `check`, `drift` and `task` exit with status 1 when they find
//! a problem.

mod commands;
mod render;
mod settings;

use std::{path::PathBuf, process::ExitCode};

use anyhow::Result;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use settings::Settings;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "cairn", version, about = "Decision log and symbol index for a codebase")]
struct Cli {
  /// Path to a TOML config file.
  #[arg(short, long, value_name = "FILE", default_value = "cairn.toml", global = true)]
  config: PathBuf,

  /// Print results as JSON.
  #[arg(long, global = true)]
  json: bool,

  /// Decision log to use instead of the configured one.
  #[arg(long, value_name = "FILE", global = true)]
  decision_log: Option<PathBuf>,

  /// Symbol index to use instead of the configured one.
  #[arg(long, value_name = "FILE", global = true)]
  symbol_index: Option<PathBuf>,

  /// Directory that symbol-index paths are relative to.
  #[arg(long, value_name = "DIR", global = true)]
  project_root: Option<PathBuf>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Search recorded decisions.
  Search {
    query:   String,
    /// Match whole words only.
    #[arg(long)]
    exact:   bool,
    /// Only decisions under a section whose header contains this text.
    #[arg(long)]
    section: Option<String>,
  },

  /// Query the symbol index. Without flags, prints its statistics.
  Index {
    /// Functions, optionally filtered by a pattern.
    #[arg(long, value_name = "PATTERN", num_args = 0..=1)]
    functions:   Option<Option<String>>,
    /// Connections, optionally filtered by a component name.
    #[arg(long, value_name = "COMPONENT", num_args = 0..=1)]
    connections: Option<Option<String>>,
    #[arg(long)]
    patterns:    bool,
    #[arg(long)]
    stats:       bool,
  },

  /// Inspect the decision log. Without flags, prints its health.
  Core {
    #[arg(long)]
    health:    bool,
    /// Print a decision template for a category.
    #[arg(long, value_name = "TYPE")]
    template:  Option<String>,
    #[arg(long)]
    conflicts: bool,
    #[arg(long)]
    orphans:   bool,
  },

  /// Record a decision.
  Decision {
    #[arg(long)]
    title:         String,
    #[arg(long)]
    context:       String,
    #[arg(long)]
    standard:      String,
    #[arg(long)]
    rationale:     String,
    #[arg(long)]
    scope:         Option<String>,
    /// Decision category, e.g. "authentication".
    #[arg(long = "type", value_name = "TYPE")]
    decision_type: Option<String>,
    /// Section to file the decision under; defaults to the category's.
    #[arg(long)]
    section:       Option<String>,
  },

  /// Record a pattern in the symbol index.
  Pattern {
    #[arg(long)]
    name:         String,
    #[arg(long)]
    context:      String,
    #[arg(long)]
    description:  String,
    #[arg(long)]
    usage:        String,
    /// Comma-separated components the pattern ties together.
    #[arg(long, value_delimiter = ',')]
    integrations: Vec<String>,
  },

  /// Check what is recorded before starting a task.
  Task {
    /// Decision category, e.g. "authentication".
    decision_type: String,
    #[arg(long)]
    technology:    Option<String>,
    #[arg(long)]
    domain:        Option<String>,
    /// Organisational scope, e.g. "enterprise".
    #[arg(long)]
    scope:         Option<String>,
    #[arg(long)]
    team_size:     Option<u32>,
  },

  /// Validate both logs.
  Validate,

  /// Mandatory pre-check: fails hard when the logs are not valid.
  Check,

  /// Detect drift between the logs and the project.
  Drift {
    /// Measure staleness against this date instead of today.
    #[arg(long, value_name = "YYYY-MM-DD")]
    as_of:       Option<NaiveDate>,
    /// Override the staleness threshold in days.
    #[arg(long, value_name = "DAYS")]
    stale_after: Option<i64>,
  },

  /// Write empty decision log and symbol index templates.
  Init {
    /// Overwrite existing files.
    #[arg(long)]
    force: bool,
  },
}

// ─── Entry point ──────────────────────────────────────────────────────────────

fn main() -> Result<ExitCode> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .from_env_lossy(),
    )
    .with_writer(std::io::stderr)
    .init();

  let cli = Cli::parse();

  // Flags override the config file, which overrides the defaults.
  let mut settings = Settings::load(&cli.config)?;
  if let Some(path) = cli.decision_log {
    settings.decision_log = path;
  }
  if let Some(path) = cli.symbol_index {
    settings.symbol_index = path;
  }
  if let Some(dir) = cli.project_root {
    settings.project_root = dir;
  }
  tracing::debug!(?settings, "settings loaded");

  let out = commands::Output { json: cli.json };
  let ok = match cli.command {
    Command::Search { query, exact, section } => {
      commands::search(&settings, &out, &query, exact, section)?
    }
    Command::Index { functions, connections, patterns, stats } => {
      commands::index(&settings, &out, functions, connections, patterns, stats)?
    }
    Command::Core { health, template, conflicts, orphans } => {
      commands::core(&settings, &out, health, template, conflicts, orphans)?
    }
    Command::Decision {
      title,
      context,
      standard,
      rationale,
      scope,
      decision_type,
      section,
    } => commands::decision(&settings, &out, commands::DecisionArgs {
      title,
      context,
      standard,
      rationale,
      scope,
      decision_type,
      section,
    })?,
    Command::Pattern { name, context, description, usage, integrations } => {
      commands::pattern(&settings, &out, name, context, description, usage, integrations)?
    }
    Command::Task { decision_type, technology, domain, scope, team_size } => {
      let context = cairn_core::store::TaskContext { technology, domain, scope, team_size };
      commands::task(&settings, &out, &decision_type, &context)?
    }
    Command::Validate => commands::validate(&settings, &out)?,
    Command::Check => commands::check(&settings, &out)?,
    Command::Drift { as_of, stale_after } => commands::drift(&settings, &out, as_of, stale_after)?,
    Command::Init { force } => commands::init(&settings, &out, force)?,
  };

  Ok(if ok { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}

#[cfg(test)]
mod tests {
  use clap::CommandFactory;

  use super::*;

  #[test]
  fn cli_definition_is_consistent() { Cli::command().debug_assert(); }

  #[test]
  fn optional_flag_values() {
    let cli = Cli::parse_from(["cairn", "index", "--functions", "--connections", "Auth"]);
    let Command::Index { functions, connections, .. } = cli.command else {
      panic!("expected index");
    };
    assert_eq!(functions, Some(None));
    assert_eq!(connections, Some(Some("Auth".to_string())));
  }

  #[test]
  fn global_flags_after_subcommand() {
    let cli = Cli::parse_from(["cairn", "drift", "--as-of", "2026-01-31", "--json"]);
    assert!(cli.json);
    assert!(matches!(
      cli.command,
      Command::Drift { as_of: Some(d), .. } if d == NaiveDate::from_ymd_opt(2026, 1, 31).unwrap()
    ));
  }
}
