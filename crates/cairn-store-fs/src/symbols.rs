//! [`SymbolIndex`]: the markdown-file implementation of [`SymbolStore`].

use std::path::{Path, PathBuf};

use cairn_core::{
  record::{SymbolKind, SymbolRecord},
  store::{Orphan, OrphanReason, SymbolHealth, SymbolStore},
};
use cairn_markdown::{FieldMarkers, last_section, parse_symbols, render_section, render_symbol};
use chrono::{DateTime, Utc};

use crate::{
  Error, Result,
  lock::{append_locked, lead_in, read_log},
};

/// A symbol index backed by one markdown file.
///
/// Paths named by records are resolved against `project_root` when looking
/// for orphans.
#[derive(Debug, Clone)]
pub struct SymbolIndex {
  path:         PathBuf,
  project_root: PathBuf,
  markers:      FieldMarkers,
  records:      Vec<SymbolRecord>,
}

impl SymbolIndex {
  pub fn open(path: impl AsRef<Path>, project_root: impl AsRef<Path>) -> Result<Self> {
    Self::open_with(path, project_root, FieldMarkers::default())
  }

  pub fn open_with(
    path: impl AsRef<Path>,
    project_root: impl AsRef<Path>,
    markers: FieldMarkers,
  ) -> Result<Self> {
    let mut index = Self {
      path: path.as_ref().to_path_buf(),
      project_root: project_root.as_ref().to_path_buf(),
      markers,
      records: Vec::new(),
    };
    index.reload()?;
    Ok(index)
  }

  pub fn path(&self) -> &Path { &self.path }

  pub fn project_root(&self) -> &Path { &self.project_root }

  pub fn reload(&mut self) -> Result<()> {
    let text = read_log(&self.path)?;
    self.load_text(&text);
    Ok(())
  }

  fn load_text(&mut self, text: &str) {
    self.records = parse_symbols(text, &self.markers);
    tracing::debug!(
      path = %self.path.display(),
      records = self.records.len(),
      "loaded symbol index"
    );
  }

  fn count(&self, kind: SymbolKind) -> usize {
    self.records.iter().filter(|r| r.kind() == kind).count()
  }
}

impl SymbolStore for SymbolIndex {
  type Error = Error;

  fn records(&self) -> &[SymbolRecord] { &self.records }

  fn health(&self) -> SymbolHealth {
    let last_updated = std::fs::metadata(&self.path)
      .and_then(|m| m.modified())
      .ok()
      .map(DateTime::<Utc>::from);
    SymbolHealth {
      function_count: self.count(SymbolKind::Function),
      connection_count: self.count(SymbolKind::Connection),
      pattern_count: self.count(SymbolKind::Pattern),
      last_updated,
    }
  }

  fn find_orphans(&self) -> Vec<Orphan> {
    let mut orphans = Vec::new();
    for record in &self.records {
      for path in record.referenced_paths() {
        let reason = match self.project_root.join(&path).try_exists() {
          Ok(true) => continue,
          Ok(false) => OrphanReason::Missing,
          Err(e) => OrphanReason::Unreadable { error: e.to_string() },
        };
        orphans.push(Orphan {
          path,
          record_kind: record.kind(),
          record_name: record.name(),
          line: record.line(),
          reason,
        });
      }
    }
    tracing::debug!(orphans = orphans.len(), "checked symbol references");
    orphans
  }

  fn append(&mut self, mut record: SymbolRecord) -> Result<SymbolRecord> {
    record.stamp(Utc::now().date_naive());
    let kind = record.kind();

    let mut existing_lines = 0;
    let text = append_locked(&self.path, |existing| {
      existing_lines = existing.lines().count();
      let mut out = lead_in(existing);
      let in_section =
        last_section(existing).and_then(|s| SymbolKind::from_section(&s)) == Some(kind);
      if !in_section {
        out.push_str(&render_section(kind.section_title()));
      }
      out.push_str(&render_symbol(&record));
      out
    })?;
    self.load_text(&text);

    let appended = self
      .records
      .last()
      .filter(|r| r.line() > existing_lines)
      .cloned()
      .ok_or_else(|| Error::AppendNotReadable(self.path.clone()))?;
    tracing::info!(
      path = %self.path.display(),
      kind = %kind,
      name = %appended.name(),
      "appended symbol record"
    );
    Ok(appended)
  }
}
