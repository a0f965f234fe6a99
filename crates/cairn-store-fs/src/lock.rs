//! Locked appends to a markdown log.

use std::{
  fs::{File, OpenOptions},
  io::{ErrorKind, Read as _, Write as _},
  path::Path,
};

use cairn_markdown::unclosed_block;
use fs2::FileExt;

use crate::{Error, Result};

/// Holds an exclusive advisory lock for as long as it lives.
struct Locked {
  file: File,
}

impl Drop for Locked {
  fn drop(&mut self) { let _ = FileExt::unlock(&self.file); }
}

/// Read the log at `path`, or an empty string if it does not exist yet.
pub(crate) fn read_log(path: &Path) -> Result<String> {
  match std::fs::read_to_string(path) {
    Ok(text) => Ok(text),
    Err(e) if e.kind() == ErrorKind::NotFound => Ok(String::new()),
    Err(e) => Err(Error::io(path)(e)),
  }
}

/// Blank-line padding needed before appending a record to `existing`.
pub(crate) fn separator(existing: &str) -> &'static str {
  if existing.is_empty() || existing.ends_with("\n\n") {
    ""
  } else if existing.ends_with('\n') {
    "\n"
  } else {
    "\n\n"
  }
}

/// Text to write before a new record: padding plus the closing line of any
/// fence or comment `existing` leaves open, so the record parses.
pub(crate) fn lead_in(existing: &str) -> String {
  let mut out = separator(existing).to_string();
  if let Some(closer) = unclosed_block(existing) {
    out.push_str(closer);
    out.push_str("\n\n");
  }
  out
}

/// Append to the file at `path` under an exclusive lock and return the full
/// text as it stands afterwards.
///
/// `render` sees the current file contents, read under the same lock, so a
/// handle opened before another writer's append still decides section headers
/// and spacing against what is really on disk. The file is created if
/// missing. Existing bytes are never rewritten.
pub(crate) fn append_locked<F>(path: &Path, render: F) -> Result<String>
where
  F: FnOnce(&str) -> String,
{
  if let Some(parent) = path.parent()
    && !parent.as_os_str().is_empty()
  {
    std::fs::create_dir_all(parent).map_err(Error::io(parent))?;
  }

  let file = OpenOptions::new()
    .create(true)
    .read(true)
    .append(true)
    .open(path)
    .map_err(Error::io(path))?;
  FileExt::lock_exclusive(&file).map_err(Error::io(path))?;
  let mut locked = Locked { file };

  let mut text = String::new();
  locked
    .file
    .read_to_string(&mut text)
    .map_err(Error::io(path))?;

  let addition = render(&text);
  locked
    .file
    .write_all(addition.as_bytes())
    .and_then(|()| locked.file.sync_data())
    .map_err(Error::io(path))?;

  text.push_str(&addition);
  Ok(text)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn separator_pads_to_one_blank_line() {
    assert_eq!(separator(""), "");
    assert_eq!(separator("a\n\n"), "");
    assert_eq!(separator("a\n"), "\n");
    assert_eq!(separator("a"), "\n\n");
  }

  #[test]
  fn lead_in_closes_open_blocks() {
    assert_eq!(lead_in("a\n"), "\n");
    assert_eq!(lead_in("```text\nx\n"), "\n```\n\n");
    assert_eq!(lead_in("<!--\nnote"), "\n\n-->\n\n");
  }

  #[test]
  fn append_creates_missing_parents_and_keeps_existing_bytes() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested/log.md");

    let first = append_locked(&path, |_| "one\n".to_string()).unwrap();
    assert_eq!(first, "one\n");

    let second = append_locked(&path, |existing| {
      assert_eq!(existing, "one\n");
      "two\n".to_string()
    })
    .unwrap();
    assert_eq!(second, "one\ntwo\n");
    assert_eq!(read_log(&path).unwrap(), "one\ntwo\n");
  }

  #[test]
  fn missing_log_reads_as_empty() {
    let dir = tempfile::tempdir().unwrap();
    assert_eq!(read_log(&dir.path().join("absent.md")).unwrap(), "");
  }
}
