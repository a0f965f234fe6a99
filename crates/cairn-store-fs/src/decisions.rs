//! [`DecisionLog`]: the markdown-file implementation of [`DecisionStore`].

use std::{
  collections::BTreeMap,
  path::{Path, PathBuf},
};

use cairn_core::{
  category::DecisionCategory,
  record::{Decision, NewDecision, is_weak, or_unspecified},
  store::{
    DecisionStore, ScopeResolution, SearchOptions, SearchOutcome, resolve_candidates,
  },
  synonym::SynonymTable,
};
use cairn_markdown::{FieldMarkers, last_section, parse_decisions, render_decision, render_section};
use chrono::Utc;

use crate::{
  Error, Result,
  lock::{append_locked, lead_in, read_log},
  search,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A decision log backed by one markdown file.
///
/// The file is parsed on [`DecisionLog::open`] and on every
/// [`DecisionLog::reload`]; queries run against the parsed copy. Appends
/// re-read the file under the lock, so after an append the handle reflects
/// every record on disk, including ones written by other handles.
#[derive(Debug, Clone)]
pub struct DecisionLog {
  path:        PathBuf,
  markers:     FieldMarkers,
  synonyms:    SynonymTable,
  decisions:   Vec<Decision>,
  /// Normalised scope → positions in `decisions`, oldest first.
  scope_index: BTreeMap<String, Vec<usize>>,
}

fn scope_key(scope: &str) -> String { scope.trim().to_lowercase() }

impl DecisionLog {
  /// Open the log at `path` with the default markers and synonym table.
  /// A missing file is an empty log; it is created on first append.
  pub fn open(path: impl AsRef<Path>) -> Result<Self> {
    Self::open_with(path, FieldMarkers::default(), SynonymTable::default())
  }

  pub fn open_with(
    path: impl AsRef<Path>,
    markers: FieldMarkers,
    synonyms: SynonymTable,
  ) -> Result<Self> {
    let mut log = Self {
      path: path.as_ref().to_path_buf(),
      markers,
      synonyms,
      decisions: Vec::new(),
      scope_index: BTreeMap::new(),
    };
    log.reload()?;
    Ok(log)
  }

  pub fn path(&self) -> &Path { &self.path }

  /// Re-read the file from disk.
  pub fn reload(&mut self) -> Result<()> {
    let text = read_log(&self.path)?;
    self.load_text(&text);
    Ok(())
  }

  fn load_text(&mut self, text: &str) {
    self.decisions = parse_decisions(text, &self.markers);
    self.scope_index.clear();
    for (i, d) in self.decisions.iter().enumerate() {
      if !is_weak(&d.scope) {
        self.scope_index.entry(scope_key(&d.scope)).or_default().push(i);
      }
    }
    tracing::debug!(
      path = %self.path.display(),
      decisions = self.decisions.len(),
      scopes = self.scope_index.len(),
      "loaded decision log"
    );
  }

  /// Distinct recorded scopes, normalised.
  pub fn scopes(&self) -> impl Iterator<Item = &str> {
    self.scope_index.keys().map(String::as_str)
  }
}

// ─── DecisionStore impl ──────────────────────────────────────────────────────

impl DecisionStore for DecisionLog {
  type Error = Error;

  fn decisions(&self) -> &[Decision] { &self.decisions }

  fn search(&self, query: &str, options: &SearchOptions) -> SearchOutcome {
    search::search(&self.decisions, &self.synonyms, query, options)
  }

  fn resolve_scope(&self, scope: &str) -> ScopeResolution {
    let candidates: Vec<Decision> = self
      .scope_index
      .get(&scope_key(scope))
      .map(|positions| positions.iter().map(|&i| self.decisions[i].clone()).collect())
      .unwrap_or_default();
    resolve_candidates(candidates)
  }

  fn append(&mut self, input: NewDecision) -> Result<Decision> {
    input.validate()?;

    let decision_type = or_unspecified(&input.decision_type);
    let section = input
      .section
      .as_deref()
      .map(str::trim)
      .filter(|s| !s.is_empty())
      .map(str::to_string)
      .unwrap_or_else(|| DecisionCategory::classify(&decision_type).section().to_string());

    let record = Decision {
      id: String::new(),
      title: or_unspecified(&input.title),
      context: or_unspecified(&input.context),
      standard: input.standard.trim().to_string(),
      rationale: input.rationale.trim().to_string(),
      scope: or_unspecified(&input.scope),
      decision_type,
      timestamp: Some(Utc::now().date_naive()),
      section: section.clone(),
      line: 0,
    };

    let mut existing_lines = 0;
    let text = append_locked(&self.path, |existing| {
      existing_lines = existing.lines().count();
      let mut out = lead_in(existing);
      let same_section = last_section(existing)
        .is_some_and(|s| s.trim().eq_ignore_ascii_case(&section));
      if !same_section {
        out.push_str(&render_section(&section));
      }
      out.push_str(&render_decision(&record));
      out
    })?;
    self.load_text(&text);

    // The new record must parse from the appended bytes, not from text
    // that was already on disk.
    let appended = self
      .decisions
      .last()
      .filter(|d| d.line > existing_lines)
      .cloned()
      .ok_or_else(|| Error::AppendNotReadable(self.path.clone()))?;
    tracing::info!(
      path = %self.path.display(),
      id = %appended.id,
      title = %appended.title,
      "appended decision"
    );
    Ok(appended)
  }
}
