//! Layered configuration: defaults, then `cairn.toml`, then `CAIRN_*`
//! environment variables. Command-line flags are applied last by the caller.

use std::{
  collections::BTreeMap,
  path::{Path, PathBuf},
};

use anyhow::{Context as _, Result};
use cairn_core::synonym::SynonymTable;
use cairn_engine::{
  drift::{DEFAULT_STALE_AFTER_DAYS, DriftConfig},
  validate::ValidationConfig,
};
use cairn_markdown::DEFAULT_DECISION_SECTIONS;
use cairn_store_fs::{DecisionLog, SymbolIndex};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
  pub decision_log:      PathBuf,
  pub symbol_index:      PathBuf,
  /// Symbol-index paths are resolved against this directory.
  pub project_root:      PathBuf,
  pub stale_after_days:  i64,
  pub required_sections: Vec<String>,
  /// Replaces the built-in synonym table when set.
  pub synonyms:          Option<BTreeMap<String, Vec<String>>>,
}

impl Default for Settings {
  fn default() -> Self {
    Self {
      decision_log:      PathBuf::from("CONVENTIONS.md"),
      symbol_index:      PathBuf::from("SYMBOLS.md"),
      project_root:      PathBuf::from("."),
      stale_after_days:  DEFAULT_STALE_AFTER_DAYS,
      required_sections: DEFAULT_DECISION_SECTIONS.iter().map(|s| s.to_string()).collect(),
      synonyms:          None,
    }
  }
}

impl Settings {
  /// Load settings; a missing config file is not an error.
  pub fn load(path: &Path) -> Result<Self> {
    config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(
        config::Environment::with_prefix("CAIRN")
          .try_parsing(true)
          .list_separator(",")
          .with_list_parse_key("required_sections"),
      )
      .build()
      .with_context(|| format!("failed to read configuration from {}", path.display()))?
      .try_deserialize()
      .context("failed to deserialise settings")
  }

  pub fn synonym_table(&self) -> SynonymTable {
    self
      .synonyms
      .clone()
      .map_or_else(SynonymTable::default, SynonymTable::new)
  }

  pub fn open_decisions(&self) -> Result<DecisionLog> {
    DecisionLog::open_with(&self.decision_log, Default::default(), self.synonym_table())
      .with_context(|| format!("failed to open decision log {}", self.decision_log.display()))
  }

  pub fn open_symbols(&self) -> Result<SymbolIndex> {
    SymbolIndex::open(&self.symbol_index, &self.project_root)
      .with_context(|| format!("failed to open symbol index {}", self.symbol_index.display()))
  }

  pub fn validation_config(&self) -> ValidationConfig {
    let mut config = ValidationConfig::new(&self.decision_log, &self.symbol_index);
    config.required_sections = self.required_sections.clone();
    config
  }

  pub fn drift_config(&self) -> DriftConfig {
    DriftConfig { stale_after_days: self.stale_after_days, ..Default::default() }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn missing_file_gives_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let settings = Settings::load(&dir.path().join("cairn.toml")).unwrap();
    assert_eq!(settings.decision_log, PathBuf::from("CONVENTIONS.md"));
    assert_eq!(settings.stale_after_days, 180);
    assert_eq!(settings.required_sections.len(), 3);
    assert_eq!(settings.synonym_table(), SynonymTable::default());
  }

  #[test]
  fn file_values_override_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cairn.toml");
    std::fs::write(
      &path,
      "decision_log = \"docs/DECISIONS.md\"\n\
       stale_after_days = 90\n\
       required_sections = [\"Stack\"]\n\
       [synonyms]\n\
       pay = [\"payments\", \"billing\"]\n",
    )
    .unwrap();
    let settings = Settings::load(&path).unwrap();
    assert_eq!(settings.decision_log, PathBuf::from("docs/DECISIONS.md"));
    assert_eq!(settings.symbol_index, PathBuf::from("SYMBOLS.md"));
    assert_eq!(settings.stale_after_days, 90);
    assert_eq!(settings.required_sections, ["Stack"]);
    assert_eq!(settings.synonym_table().related_terms("pay"), ["payments", "billing"]);
    assert_eq!(settings.validation_config().required_sections, ["Stack"]);
  }
}
