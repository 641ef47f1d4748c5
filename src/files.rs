//! Input file selection and the read/write collaborators.
//!
//! Reading yields raw text for a selected path. Writing needs a
//! [`WriteCapability`] granted once by `enable_edit_mode` and handed back on
//! every save.

use std::future::Future;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::error::ReviewError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FileKind {
  Content,
  Annotation,
  Criteria,
  Reference,
}

/// Classify a file by name (case-insensitive substring + extension).
pub fn identify_file_type(name: &str) -> Option<FileKind> {
  let n = name.to_lowercase();
  if n.contains("combined") && n.contains("input") && n.ends_with(".jsonl") {
    Some(FileKind::Content)
  } else if n.contains("results") && n.ends_with(".jsonl") {
    Some(FileKind::Annotation)
  } else if n.contains("criteria") && n.ends_with(".jsonl") {
    Some(FileKind::Criteria)
  } else if (n.contains("unitknowledge") || n.contains("unit_knowledge")) && n.ends_with(".json") {
    Some(FileKind::Reference)
  } else {
    None
  }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct SelectedFiles {
  pub content: Option<PathBuf>,
  pub annotation: Option<PathBuf>,
  pub criteria: Option<PathBuf>,
  pub reference: Option<PathBuf>,
}

impl SelectedFiles {
  pub fn get(&self, kind: FileKind) -> Option<&Path> {
    match kind {
      FileKind::Content => self.content.as_deref(),
      FileKind::Annotation => self.annotation.as_deref(),
      FileKind::Criteria => self.criteria.as_deref(),
      FileKind::Reference => self.reference.as_deref(),
    }
  }

  pub fn set(&mut self, kind: FileKind, path: PathBuf) {
    let slot = match kind {
      FileKind::Content => &mut self.content,
      FileKind::Annotation => &mut self.annotation,
      FileKind::Criteria => &mut self.criteria,
      FileKind::Reference => &mut self.reference,
    };
    *slot = Some(path);
  }

  /// Classify each path by file name. Later paths replace earlier ones of the
  /// same kind. Returns the paths that were not recognized.
  pub fn select_paths(&mut self, paths: impl IntoIterator<Item = PathBuf>) -> Vec<PathBuf> {
    let mut ignored = Vec::new();
    for p in paths {
      let kind = p.file_name().and_then(|n| n.to_str()).and_then(identify_file_type);
      match kind {
        Some(k) => {
          debug!(target: "review", path = %p.display(), kind = ?k, "File selected");
          self.set(k, p);
        }
        None => ignored.push(p),
      }
    }
    ignored
  }

  /// Content, annotation and reference are required; criteria is optional.
  pub fn can_load(&self) -> bool {
    self.content.is_some() && self.annotation.is_some() && self.reference.is_some()
  }
}

/// Pre-select every recognized file in a directory.
#[instrument(level = "info", skip(dir), fields(dir = %dir.display()))]
pub async fn scan_dir(dir: &Path) -> Result<SelectedFiles, ReviewError> {
  let mut entries = tokio::fs::read_dir(dir).await.map_err(|e| ReviewError::io(dir, e))?;
  let mut paths = Vec::new();
  while let Some(entry) = entries.next_entry().await.map_err(|e| ReviewError::io(dir, e))? {
    paths.push(entry.path());
  }
  // read_dir order is platform-dependent
  paths.sort();
  let mut files = SelectedFiles::default();
  files.select_paths(paths);
  info!(target: "problem_review", can_load = files.can_load(), "Scanned data directory");
  Ok(files)
}

/// Yields raw text for a user-selected input.
pub trait SourceReader {
  fn read_text(&self, path: &Path) -> impl Future<Output = Result<String, ReviewError>> + Send;
}

/// Persists a full document, replacing whatever the target held.
pub trait SinkWriter {
  fn write_all(&self, cap: &WriteCapability, content: &str) -> impl Future<Output = Result<(), ReviewError>> + Send;
}

/// Permission to overwrite one file, granted once and reused for every save.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct WriteCapability {
  pub token: Uuid,
  pub path: PathBuf,
}

/// Local filesystem collaborator.
#[derive(Clone, Copy, Debug, Default)]
pub struct FsStore;

impl FsStore {
  /// Grant write access to `path`: it must be an existing, writable `.jsonl` file.
  #[instrument(level = "info", skip(self, path), fields(path = %path.display()))]
  pub async fn enable_edit_mode(&self, path: &Path) -> Result<WriteCapability, ReviewError> {
    let is_jsonl = path.extension().and_then(|e| e.to_str()).is_some_and(|e| e.eq_ignore_ascii_case("jsonl"));
    if !is_jsonl {
      return Err(ReviewError::WriteUnavailable(format!("{} is not a .jsonl file", path.display())));
    }
    let meta = tokio::fs::metadata(path)
      .await
      .map_err(|e| ReviewError::WriteUnavailable(format!("{}: {e}", path.display())))?;
    if !meta.is_file() {
      return Err(ReviewError::WriteUnavailable(format!("{} is not a regular file", path.display())));
    }
    if meta.permissions().readonly() {
      return Err(ReviewError::WriteUnavailable(format!("{} is read-only", path.display())));
    }
    let cap = WriteCapability { token: Uuid::new_v4(), path: path.to_path_buf() };
    info!(target: "problem_review", token = %cap.token, "Edit mode enabled");
    Ok(cap)
  }
}

impl SourceReader for FsStore {
  fn read_text(&self, path: &Path) -> impl Future<Output = Result<String, ReviewError>> + Send {
    async move { tokio::fs::read_to_string(path).await.map_err(|e| ReviewError::io(path, e)) }
  }
}

impl SinkWriter for FsStore {
  fn write_all(&self, cap: &WriteCapability, content: &str) -> impl Future<Output = Result<(), ReviewError>> + Send {
    async move {
      let target = &cap.path;
      let mut tmp_name = target.file_name().map(|n| n.to_os_string()).unwrap_or_default();
      tmp_name.push(".saving");
      let tmp = target.with_file_name(tmp_name);

      tokio::fs::write(&tmp, content).await.map_err(|e| ReviewError::io(&tmp, e))?;
      if let Err(e) = tokio::fs::rename(&tmp, target).await {
        warn!(target: "problem_review", path = %target.display(), error = %e, "Rename failed; previous file left intact");
        let _ = tokio::fs::remove_file(&tmp).await;
        return Err(ReviewError::io(target, e));
      }
      debug!(target: "problem_review", path = %target.display(), bytes = content.len(), "File written");
      Ok(())
    }
  }
}
