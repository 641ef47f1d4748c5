//! Reviewer edits on the merged collection.
//!
//! Every operation addresses a record by its position. Out-of-range positions
//! are no-ops and report `false`. A successful edit bumps the session
//! revision and reallocates only the record it touched.

use std::sync::Arc;

use tracing::{debug, instrument};

use crate::domain::{KnowledgeEntry, MergedProblem, Necessity, UnitCandidate, BEHAVIOR_AREA_OPTIONS};
use crate::error::ReviewError;
use crate::session::ReviewSession;

/// Result of adding a knowledge entry from the search pickers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AddOutcome {
  Added { unit_id: i64, knowledge_id: i64 },
  /// The pair was already present; nothing changed.
  AlreadyPresent,
}

impl ReviewSession {
  /// Copy-on-write access to one record. `f` reports whether it changed anything.
  fn edit_problem<F>(&mut self, idx: usize, f: F) -> bool
  where
    F: FnOnce(&mut MergedProblem) -> bool,
  {
    let Some(slot) = self.problems.get_mut(idx) else { return false };
    let changed = f(Arc::make_mut(slot));
    if changed {
      self.revision += 1;
    }
    changed
  }

  #[instrument(level = "debug", skip(self))]
  pub fn toggle_unit_necessity(&mut self, problem_idx: usize, unit_idx: usize, value: bool) -> bool {
    if !self.has_candidate(problem_idx, unit_idx) {
      return false;
    }
    self.edit_problem(problem_idx, |p| {
      let c = &mut p.unit_candidates[unit_idx];
      c.unit_necessity = c.unit_necessity.toggled(value);
      debug!(target: "review", problem_id = p.problem_id, unit_id = c.unit_id, now = ?c.unit_necessity, "Unit necessity toggled");
      true
    })
  }

  #[instrument(level = "debug", skip(self))]
  pub fn toggle_knowledge_necessity(&mut self, problem_idx: usize, unit_idx: usize, knowledge_idx: usize, value: bool) -> bool {
    let exists = self
      .problems
      .get(problem_idx)
      .and_then(|p| p.unit_candidates.get(unit_idx))
      .is_some_and(|c| knowledge_idx < c.knowledges.len());
    if !exists {
      return false;
    }
    self.edit_problem(problem_idx, |p| {
      let k = &mut p.unit_candidates[unit_idx].knowledges[knowledge_idx];
      k.knowledge_necessity = k.knowledge_necessity.toggled(value);
      debug!(target: "review", problem_id = p.problem_id, knowledge_id = k.knowledge_id, now = ?k.knowledge_necessity, "Knowledge necessity toggled");
      true
    })
  }

  /// Plain set to one of [`BEHAVIOR_AREA_OPTIONS`]; an empty string clears the confirmation.
  pub fn set_behavior_area_confirmed(&mut self, problem_idx: usize, value: &str) -> Result<bool, ReviewError> {
    if !value.is_empty() && !BEHAVIOR_AREA_OPTIONS.contains(&value) {
      return Err(ReviewError::Validation(format!("unknown behavior area '{value}'")));
    }
    if self.problems.get(problem_idx).is_some_and(|p| p.behavior_area_confirmed == value) {
      return Ok(false);
    }
    Ok(self.edit_problem(problem_idx, |p| {
      p.behavior_area_confirmed = value.to_string();
      true
    }))
  }

  pub fn update_comment(&mut self, problem_idx: usize, value: &str) -> bool {
    if self.problems.get(problem_idx).is_some_and(|p| p.comment == value) {
      return false;
    }
    self.edit_problem(problem_idx, |p| {
      p.comment = value.to_string();
      true
    })
  }

  /// Add the knowledge item chosen in this problem's search state to `unit_added`.
  #[instrument(level = "info", skip(self))]
  pub fn add_unit_from_search(&mut self, problem_idx: usize) -> Result<AddOutcome, ReviewError> {
    let problem_id = self
      .problems
      .get(problem_idx)
      .map(|p| p.problem_id)
      .ok_or_else(|| ReviewError::Validation(format!("no problem at position {}", problem_idx + 1)))?;

    let knowledge_id = self
      .searches
      .get(problem_id)
      .knowledge_id
      .ok_or_else(|| ReviewError::Validation("select a knowledge item to add first".into()))?;

    let row = self.catalog.first_for_knowledge(knowledge_id).cloned().ok_or_else(|| {
      ReviewError::Validation(format!("no unit found for knowledge id {knowledge_id}"))
    })?;

    let already = self.problems[problem_idx]
      .unit_added
      .iter()
      .find(|u| u.unit_id == row.unit_id)
      .is_some_and(|u| u.knowledges.iter().any(|k| k.knowledge_id == row.knowledge_id));
    if already {
      debug!(target: "review", problem_id, knowledge_id, "Knowledge already added; nothing to do");
      return Ok(AddOutcome::AlreadyPresent);
    }

    self.edit_problem(problem_idx, |p| {
      let pos = match p.unit_added.iter().position(|u| u.unit_id == row.unit_id) {
        Some(pos) => pos,
        None => {
          p.unit_added.push(UnitCandidate::added(row.unit_id));
          p.unit_added.len() - 1
        }
      };
      p.unit_added[pos].knowledges.push(KnowledgeEntry {
        knowledge_id: row.knowledge_id,
        knowledge_name: row.knowledge_name.clone(),
        knowledge_necessity: Necessity::Unset,
      });
      true
    });
    debug!(target: "review", problem_id, unit_id = row.unit_id, knowledge_id, "Knowledge added");
    Ok(AddOutcome::Added { unit_id: row.unit_id, knowledge_id: row.knowledge_id })
  }

  /// Remove one knowledge entry from an added unit; the unit goes with its last entry.
  #[instrument(level = "info", skip(self))]
  pub fn remove_unit_added(&mut self, problem_idx: usize, add_idx: usize, knowledge_idx: usize) -> bool {
    let Some(target) = self.problems.get(problem_idx).and_then(|p| p.unit_added.get(add_idx)) else {
      return false;
    };
    if knowledge_idx >= target.knowledges.len() && !target.knowledges.is_empty() {
      return false;
    }
    self.edit_problem(problem_idx, |p| {
      let unit = &mut p.unit_added[add_idx];
      if knowledge_idx < unit.knowledges.len() {
        unit.knowledges.remove(knowledge_idx);
      }
      if unit.knowledges.is_empty() {
        p.unit_added.remove(add_idx);
      }
      true
    })
  }

  fn has_candidate(&self, problem_idx: usize, unit_idx: usize) -> bool {
    self.problems.get(problem_idx).is_some_and(|p| unit_idx < p.unit_candidates.len())
  }
}

#[cfg(test)]
mod tests {
  use pretty_assertions::assert_eq;

  use super::*;
  use crate::domain::KnowledgeField;
  use crate::session::fixture_session;

  #[test]
  fn unit_toggle_twice_returns_to_unset() {
    let mut s = fixture_session();
    assert!(s.toggle_unit_necessity(0, 0, true));
    assert_eq!(s.problems()[0].unit_candidates[0].unit_necessity, Necessity::Necessary);
    assert!(s.toggle_unit_necessity(0, 0, true));
    assert_eq!(s.problems()[0].unit_candidates[0].unit_necessity, Necessity::Unset);
  }

  #[test]
  fn unit_toggle_switches_between_values() {
    let mut s = fixture_session();
    s.toggle_unit_necessity(0, 0, true);
    s.toggle_unit_necessity(0, 0, false);
    assert_eq!(s.problems()[0].unit_candidates[0].unit_necessity, Necessity::Unnecessary);
  }

  #[test]
  fn knowledge_toggle_works_on_legacy_field() {
    let mut s = fixture_session();
    assert!(s.toggle_knowledge_necessity(0, 1, 0, false));
    let c = &s.problems()[0].unit_candidates[1];
    assert_eq!(c.knowledge_field, KnowledgeField::Legacy);
    assert_eq!(c.knowledges[0].knowledge_necessity, Necessity::Unnecessary);
    // already Necessary from the source data
    assert!(s.toggle_knowledge_necessity(0, 0, 1, true));
    assert_eq!(s.problems()[0].unit_candidates[0].knowledges[1].knowledge_necessity, Necessity::Unset);
  }

  #[test]
  fn out_of_range_edits_are_noops() {
    let mut s = fixture_session();
    let before: Vec<MergedProblem> = s.problems().iter().map(|p| (**p).clone()).collect();
    assert!(!s.toggle_unit_necessity(9, 0, true));
    assert!(!s.toggle_unit_necessity(0, 9, true));
    assert!(!s.toggle_knowledge_necessity(0, 0, 9, true));
    assert!(!s.update_comment(9, "x"));
    assert!(!s.remove_unit_added(1, 5, 0));
    let after: Vec<MergedProblem> = s.problems().iter().map(|p| (**p).clone()).collect();
    assert_eq!(before, after);
    assert_eq!(s.revision(), 0);
  }

  #[test]
  fn edit_reallocates_only_the_touched_record() {
    let mut s = fixture_session();
    let snapshot: Vec<Arc<MergedProblem>> = s.problems().to_vec();
    s.update_comment(1, "looks fine");
    assert!(Arc::ptr_eq(&snapshot[0], &s.problems()[0]));
    assert!(!Arc::ptr_eq(&snapshot[1], &s.problems()[1]));
    assert!(Arc::ptr_eq(&snapshot[2], &s.problems()[2]));
    assert_eq!(snapshot[1].comment, "check");
    assert_eq!(s.problems()[1].comment, "looks fine");
  }

  #[test]
  fn behavior_confirm_and_comment_are_plain_sets() {
    let mut s = fixture_session();
    assert!(s.set_behavior_area_confirmed(0, "이해 능력").unwrap());
    assert!(!s.set_behavior_area_confirmed(0, "이해 능력").unwrap());
    assert_eq!(s.problems()[0].behavior_area_confirmed, "이해 능력");
    assert!(s.set_behavior_area_confirmed(0, "").unwrap());
    assert_eq!(s.problems()[0].behavior_area_confirmed, "");
    assert!(s.update_comment(1, ""));
    assert_eq!(s.problems()[1].comment, "");
  }

  #[test]
  fn behavior_confirm_rejects_values_outside_the_option_list() {
    let mut s = fixture_session();
    let before = s.revision();
    let err = s.set_behavior_area_confirmed(0, "암기 능력").unwrap_err();
    assert_eq!(err.kind(), "validation");
    assert_eq!(s.problems()[0].behavior_area_confirmed, "");
    assert_eq!(s.revision(), before);
    assert!(s.set_behavior_area_confirmed(0, "문제 해결 능력").unwrap());
  }

  #[test]
  fn add_requires_a_selected_knowledge() {
    let mut s = fixture_session();
    let err = s.add_unit_from_search(0).unwrap_err();
    assert_eq!(err.kind(), "validation");
    assert!(s.problems()[0].unit_added.is_empty());
  }

  #[test]
  fn add_rejects_knowledge_missing_from_reference() {
    let mut s = fixture_session();
    s.select_knowledge(101, Some(4040));
    assert!(matches!(s.add_unit_from_search(0), Err(ReviewError::Validation(_))));
  }

  #[test]
  fn add_twice_creates_one_entry() {
    let mut s = fixture_session();
    s.select_knowledge(101, Some(21));
    assert_eq!(s.add_unit_from_search(0).unwrap(), AddOutcome::Added { unit_id: 2, knowledge_id: 21 });
    assert_eq!(s.add_unit_from_search(0).unwrap(), AddOutcome::AlreadyPresent);

    let added = &s.problems()[0].unit_added;
    assert_eq!(added.len(), 1);
    assert_eq!(added[0].unit_id, 2);
    assert_eq!(added[0].knowledge_field, KnowledgeField::Valid);
    assert_eq!(added[0].confidence_score, None);
    assert_eq!(added[0].knowledges.len(), 1);
    assert_eq!(added[0].knowledges[0].knowledge_name, "bisector");
  }

  #[test]
  fn add_appends_to_existing_added_unit() {
    let mut s = fixture_session();
    s.select_knowledge(102, Some(21));
    s.add_unit_from_search(1).unwrap();
    let added = &s.problems()[1].unit_added;
    assert_eq!(added.len(), 1);
    let ids: Vec<i64> = added[0].knowledges.iter().map(|k| k.knowledge_id).collect();
    assert_eq!(ids, vec![20, 21]);
  }

  #[test]
  fn add_then_remove_restores_prior_state() {
    let mut s = fixture_session();
    let before = s.problems()[1].unit_added.clone();
    s.select_knowledge(102, Some(70));
    s.add_unit_from_search(1).unwrap();
    assert_eq!(s.problems()[1].unit_added.len(), 2);
    assert!(s.remove_unit_added(1, 1, 0));
    assert_eq!(s.problems()[1].unit_added, before);
  }

  #[test]
  fn removing_last_knowledge_drops_the_unit() {
    let mut s = fixture_session();
    assert!(s.remove_unit_added(1, 0, 0));
    assert!(s.problems()[1].unit_added.is_empty());
  }
}
