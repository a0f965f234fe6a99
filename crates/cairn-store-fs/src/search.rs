//! Decision search and related-term suggestions.

use std::cmp::Reverse;

use cairn_core::{
  record::Decision,
  store::{SearchOptions, SearchOutcome},
  synonym::SynonymTable,
};
use fuzzy_matcher::{FuzzyMatcher as _, skim::SkimMatcherV2};

/// Most suggestions returned for an unmatched query.
pub(crate) const MAX_SUGGESTIONS: usize = 5;

/// `needle` occurs in `haystack` bounded by non-alphanumerics on both sides.
/// Both arguments are expected lowercased.
fn contains_word(haystack: &str, needle: &str) -> bool {
  haystack.match_indices(needle).any(|(start, _)| {
    let end = start + needle.len();
    let before = haystack[..start].chars().next_back();
    let after = haystack[end..].chars().next();
    !before.is_some_and(char::is_alphanumeric)
      && !after.is_some_and(char::is_alphanumeric)
  })
}

fn searchable_fields(d: &Decision) -> [&str; 4] {
  [&d.title, &d.standard, &d.rationale, &d.scope]
}

fn matches(d: &Decision, query: &str, exact: bool) -> bool {
  searchable_fields(d).into_iter().any(|field| {
    let field = field.to_lowercase();
    if exact { contains_word(&field, query) } else { field.contains(query) }
  })
}

fn in_section(d: &Decision, section: Option<&str>) -> bool {
  match section.map(str::trim).filter(|s| !s.is_empty()) {
    Some(s) => d.section.to_lowercase().contains(&s.to_lowercase()),
    None => true,
  }
}

/// Related terms for `query`, best fuzzy match first.
pub(crate) fn suggestions(synonyms: &SynonymTable, query: &str) -> Vec<String> {
  let matcher = SkimMatcherV2::default();
  let mut ranked: Vec<(i64, String)> = synonyms
    .related_terms(query)
    .into_iter()
    .map(|term| (matcher.fuzzy_match(&term, query).unwrap_or(0), term))
    .collect();
  // Stable: equally-scored terms keep table order.
  ranked.sort_by_key(|(score, _)| Reverse(*score));
  ranked
    .into_iter()
    .take(MAX_SUGGESTIONS)
    .map(|(_, term)| term)
    .collect()
}

pub(crate) fn search(
  decisions: &[Decision],
  synonyms: &SynonymTable,
  query: &str,
  options: &SearchOptions,
) -> SearchOutcome {
  let needle = query.trim().to_lowercase();
  if needle.is_empty() {
    return SearchOutcome::default();
  }

  let found: Vec<Decision> = decisions
    .iter()
    .filter(|d| in_section(d, options.section.as_deref()))
    .filter(|d| matches(d, &needle, options.exact))
    .cloned()
    .collect();

  let suggestions =
    if found.is_empty() { suggestions(synonyms, &needle) } else { Vec::new() };
  tracing::debug!(query, matches = found.len(), suggestions = suggestions.len(), "searched decisions");
  SearchOutcome { matches: found, suggestions }
}
