//! Core behaviors shared by both HTTP and WebSocket handlers.
//!
//! This includes:
//!   - File selection and the load pipeline
//!   - Navigation (including the 1-based position check) and search by id
//!   - Record edits and search-picker selections
//!   - Edit-mode capability and save

use std::path::PathBuf;

use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::edit::AddOutcome;
use crate::error::ReviewError;
use crate::files::{FileKind, SinkWriter};
use crate::navigation::PAGE_STEP;
use crate::protocol::{problem_view, EditCommand, EditModeOut, FilesOut, NavCommand, ProblemView, SaveOut, SearchCommand};
use crate::serialize::{to_annotation_shape, to_jsonl};
use crate::session::ReviewSession;
use crate::state::AppState;

pub async fn current_files(state: &AppState) -> FilesOut {
  let selected = state.selection.read().await.clone();
  FilesOut { can_load: selected.can_load(), selected, ignored: Vec::new() }
}

#[instrument(level = "info", skip(state, paths), fields(count = paths.len()))]
pub async fn select_files(state: &AppState, paths: Vec<PathBuf>) -> FilesOut {
  let mut sel = state.selection.write().await;
  let ignored = sel.select_paths(paths);
  if !ignored.is_empty() {
    warn!(target: "review", ignored = ignored.len(), "Unrecognized file names ignored");
  }
  FilesOut { selected: sel.clone(), can_load: sel.can_load(), ignored }
}

/// Load every selected input and replace the session. The old session stays
/// in place if anything fails.
#[instrument(level = "info", skip(state))]
pub async fn load(state: &AppState) -> Result<ProblemView, ReviewError> {
  let files = state.selection.read().await.clone();
  let session = ReviewSession::load(&state.store, &files, &state.config.unknown_label).await?;
  if session.is_empty() {
    warn!(target: "review", "Loaded collection is empty");
  }
  let mut slot = state.session.write().await;
  *slot = Some(session);
  info!(target: "review", "Session replaced");
  view_of(state, slot.as_ref()).await
}

pub async fn current(state: &AppState) -> Result<ProblemView, ReviewError> {
  let guard = state.session.read().await;
  view_of(state, guard.as_ref()).await
}

#[instrument(level = "info", skip(state))]
pub async fn navigate(state: &AppState, cmd: NavCommand) -> Result<ProblemView, ReviewError> {
  let mut guard = state.session.write().await;
  let session = guard.as_mut().ok_or(ReviewError::NoSession)?;
  match cmd {
    NavCommand::First => { session.go_to_first(); }
    NavCommand::Last => { session.go_to_last(); }
    NavCommand::Prev => { session.change_problem(-1); }
    NavCommand::Next => { session.change_problem(1); }
    NavCommand::Prev10 => { session.change_problem(-PAGE_STEP); }
    NavCommand::Next10 => { session.change_problem(PAGE_STEP); }
    NavCommand::GoTo { position } => {
      let total = session.len();
      if position < 1 || position as usize > total {
        return Err(ReviewError::Validation(format!("enter a number between 1 and {total}")));
      }
      session.go_to_index(position - 1);
    }
    NavCommand::FindId { problem_id } => {
      if problem_id == 0 {
        return Err(ReviewError::Validation("enter a valid problem id".into()));
      }
      if !session.search_by_problem_id(problem_id) {
        return Err(ReviewError::ProblemNotFound(problem_id));
      }
    }
  }
  view_of(state, guard.as_ref()).await
}

#[instrument(level = "info", skip(state))]
pub async fn edit(state: &AppState, cmd: EditCommand) -> Result<ProblemView, ReviewError> {
  let mut guard = state.session.write().await;
  let session = guard.as_mut().ok_or(ReviewError::NoSession)?;
  let here = session.current_index();
  let changed = match cmd {
    EditCommand::ToggleUnitNecessity { problem_index, unit_index, value } => {
      session.toggle_unit_necessity(problem_index.unwrap_or(here), unit_index, value)
    }
    EditCommand::ToggleKnowledgeNecessity { problem_index, unit_index, knowledge_index, value } => {
      session.toggle_knowledge_necessity(problem_index.unwrap_or(here), unit_index, knowledge_index, value)
    }
    EditCommand::ConfirmBehaviorArea { problem_index, value } => {
      session.set_behavior_area_confirmed(problem_index.unwrap_or(here), &value)?
    }
    EditCommand::UpdateComment { problem_index, value } => {
      session.update_comment(problem_index.unwrap_or(here), &value)
    }
    EditCommand::AddUnit { problem_index } => match session.add_unit_from_search(problem_index.unwrap_or(here))? {
      AddOutcome::Added { unit_id, knowledge_id } => {
        info!(target: "review", unit_id, knowledge_id, "Knowledge added to unit_added");
        true
      }
      AddOutcome::AlreadyPresent => false,
    },
    EditCommand::RemoveUnitAdded { problem_index, add_index, knowledge_index } => {
      session.remove_unit_added(problem_index.unwrap_or(here), add_index, knowledge_index)
    }
  };
  info!(target: "review", changed, revision = session.revision(), "Edit applied");
  view_of(state, guard.as_ref()).await
}

#[instrument(level = "info", skip(state))]
pub async fn search(state: &AppState, cmd: SearchCommand) -> Result<ProblemView, ReviewError> {
  let mut guard = state.session.write().await;
  let session = guard.as_mut().ok_or(ReviewError::NoSession)?;
  let problem_id = session
    .problem(session.current_index())
    .map(|p| p.problem_id)
    .ok_or_else(|| ReviewError::Validation("no problem selected".into()))?;
  match cmd {
    SearchCommand::Curriculum { name } => session.select_curriculum(problem_id, name),
    SearchCommand::Unit { unit_id } => session.select_unit(problem_id, unit_id),
    SearchCommand::Knowledge { knowledge_id } => session.select_knowledge(problem_id, knowledge_id),
  };
  view_of(state, guard.as_ref()).await
}

/// Grant write access to `path`, or to the selected annotation file.
#[instrument(level = "info", skip(state))]
pub async fn enable_edit_mode(state: &AppState, path: Option<PathBuf>) -> Result<EditModeOut, ReviewError> {
  let target = match path {
    Some(p) => p,
    None => state
      .selection
      .read()
      .await
      .get(FileKind::Annotation)
      .map(|p| p.to_path_buf())
      .ok_or(ReviewError::WriteHandleMissing)?,
  };
  let cap = state.store.enable_edit_mode(&target).await?;
  let out = EditModeOut { token: cap.token, path: cap.path.clone() };
  *state.write_cap.write().await = Some(cap);
  Ok(out)
}

/// Serialize the session and write it through the granted capability.
#[instrument(level = "info", skip(state, token), fields(%token))]
pub async fn save(state: &AppState, token: Uuid) -> Result<SaveOut, ReviewError> {
  let cap = state.write_cap.read().await.clone().ok_or(ReviewError::WriteHandleMissing)?;
  if cap.token != token {
    return Err(ReviewError::InvalidCapability);
  }

  let (records, text) = {
    let guard = state.session.read().await;
    let session = guard.as_ref().ok_or(ReviewError::NoSession)?;
    let records = to_annotation_shape(session.problems().iter().map(|p| &**p));
    let text = to_jsonl(&records).map_err(|e| ReviewError::io(&cap.path, e.into()))?;
    (records.len(), text)
  };

  state.store.write_all(&cap, &text).await?;
  info!(target: "review", records, bytes = text.len(), path = %cap.path.display(), "Results saved");
  Ok(SaveOut { records, bytes: text.len(), path: cap.path })
}

async fn view_of(state: &AppState, session: Option<&ReviewSession>) -> Result<ProblemView, ReviewError> {
  let session = session.ok_or(ReviewError::NoSession)?;
  let can_save = state.write_cap.read().await.is_some();
  Ok(problem_view(session, can_save))
}
