//! One review session: the merged collection, its cursor and the per-problem
//! search states. Built once per successful load and replaced wholesale by the
//! next one.

use std::sync::Arc;

use tracing::{info, instrument};

use crate::criteria::{summarize, CriteriaSummary};
use crate::domain::{AnnotationRecord, ContentRecord, CriteriaEntry, MergedProblem};
use crate::error::ReviewError;
use crate::files::{FileKind, SelectedFiles, SourceReader};
use crate::join::merge;
use crate::navigation::Cursor;
use crate::parser::{parse_line_delimited, parse_reference_listing};
use crate::search::{options_for, SearchOptions, SearchState, SearchStates};
use crate::units::UnitCatalog;

pub struct ReviewSession {
  /// Each record sits behind its own `Arc`; an edit replaces only the touched
  /// record's allocation, so snapshots can be diffed by pointer.
  pub(crate) problems: Vec<Arc<MergedProblem>>,
  pub(crate) cursor: Cursor,
  pub(crate) searches: SearchStates,
  pub(crate) catalog: Arc<UnitCatalog>,
  pub(crate) unknown_label: String,
  pub(crate) revision: u64,
}

impl ReviewSession {
  pub fn new(problems: Vec<MergedProblem>, catalog: UnitCatalog, unknown_label: impl Into<String>) -> Self {
    Self {
      problems: problems.into_iter().map(Arc::new).collect(),
      cursor: Cursor::default(),
      searches: SearchStates::default(),
      catalog: Arc::new(catalog),
      unknown_label: unknown_label.into(),
      revision: 0,
    }
  }

  /// Read every selected input and join them. Nothing is returned unless all
  /// steps succeed.
  #[instrument(level = "info", skip_all)]
  pub async fn load<R: SourceReader>(reader: &R, files: &SelectedFiles, unknown_label: &str) -> Result<Self, ReviewError> {
    let content_path = files.get(FileKind::Content).ok_or(ReviewError::MissingInput("content dataset"))?;
    let annotation_path = files.get(FileKind::Annotation).ok_or(ReviewError::MissingInput("annotation dataset"))?;
    let reference_path = files.get(FileKind::Reference).ok_or(ReviewError::MissingInput("reference listing"))?;

    let text = reader.read_text(content_path).await?;
    let content: Vec<ContentRecord> = parse_line_delimited(&display_name(content_path), &text);

    let text = reader.read_text(annotation_path).await?;
    let results: Vec<AnnotationRecord> = parse_line_delimited(&display_name(annotation_path), &text);

    let text = reader.read_text(reference_path).await?;
    let rows = parse_reference_listing(&display_name(reference_path), &text)?;

    let criteria: Vec<CriteriaEntry> = match files.get(FileKind::Criteria) {
      Some(p) => parse_line_delimited(&display_name(p), &reader.read_text(p).await?),
      None => Vec::new(),
    };

    let catalog = UnitCatalog::new(rows);
    let merged = merge(results, content, criteria, catalog.index(), unknown_label);
    info!(target: "review", problems = merged.len(), reference_rows = catalog.rows().len(), "Session loaded");
    Ok(Self::new(merged, catalog, unknown_label))
  }

  pub fn len(&self) -> usize { self.problems.len() }

  pub fn is_empty(&self) -> bool { self.problems.is_empty() }

  pub fn problems(&self) -> &[Arc<MergedProblem>] { &self.problems }

  pub fn problem(&self, idx: usize) -> Option<&Arc<MergedProblem>> { self.problems.get(idx) }

  pub fn current_index(&self) -> usize { self.cursor.index() }

  pub fn revision(&self) -> u64 { self.revision }

  // ---- navigation ----

  pub fn go_to_index(&mut self, i: i64) -> bool { self.cursor.go_to_index(i, self.problems.len()) }

  pub fn go_to_first(&mut self) -> bool { self.cursor.go_to_first(self.problems.len()) }

  pub fn go_to_last(&mut self) -> bool { self.cursor.go_to_last(self.problems.len()) }

  pub fn change_problem(&mut self, delta: i64) -> bool { self.cursor.change(delta, self.problems.len()) }

  pub fn search_by_problem_id(&mut self, id: i64) -> bool {
    self.cursor.search_by_id(&self.problems, id, |p| p.problem_id)
  }

  // ---- search state ----

  pub fn search_state(&self, problem_id: i64) -> SearchState { self.searches.get(problem_id) }

  pub fn search_options(&self, problem_id: i64) -> SearchOptions {
    options_for(&self.searches.get(problem_id), &self.catalog)
  }

  pub fn select_curriculum(&mut self, problem_id: i64, name: String) -> SearchState {
    self.searches.select_curriculum(problem_id, name).clone()
  }

  pub fn select_unit(&mut self, problem_id: i64, unit_id: Option<i64>) -> SearchState {
    self.searches.select_unit(problem_id, unit_id, &self.catalog).clone()
  }

  pub fn select_knowledge(&mut self, problem_id: i64, knowledge_id: Option<i64>) -> SearchState {
    self.searches.select_knowledge(problem_id, knowledge_id, &self.catalog).clone()
  }

  pub fn criteria_summary(&self, idx: usize) -> CriteriaSummary {
    self.problems
      .get(idx)
      .map(|p| summarize(&p.criteria, self.catalog.index(), &self.unknown_label))
      .unwrap_or_default()
  }
}

fn display_name(p: &std::path::Path) -> String {
  p.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_else(|| p.display().to_string())
}

#[cfg(test)]
pub(crate) fn fixture_session() -> ReviewSession {
  use crate::join::{fixtures, UNKNOWN_LABEL};
  let catalog = UnitCatalog::new(fixtures::reference_rows());
  let merged = merge(fixtures::annotations(), fixtures::content(), fixtures::criteria(), catalog.index(), UNKNOWN_LABEL);
  ReviewSession::new(merged, catalog, UNKNOWN_LABEL)
}
