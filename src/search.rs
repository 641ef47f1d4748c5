//! Per-problem search state for picking a curriculum / unit / knowledge triple to add.
//!
//! Kept apart from the merged records. Selections cascade: picking a curriculum
//! clears the unit and knowledge, picking a unit clears the knowledge, and
//! picking a knowledge back-fills its unit and curriculum. A triple can never
//! hold a unit that the chosen curriculum does not contain.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::units::UnitCatalog;
use crate::util::dedup_first_seen;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchState {
  pub curriculum_name: String,
  pub unit_id: Option<i64>,
  pub knowledge_id: Option<i64>,
}

/// Partial update. `None` leaves a field alone; `Some(None)` clears an id.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SearchStatePatch {
  pub curriculum_name: Option<String>,
  pub unit_id: Option<Option<i64>>,
  pub knowledge_id: Option<Option<i64>>,
}

#[derive(Clone, Debug, Default)]
pub struct SearchStates {
  by_problem: HashMap<i64, SearchState>,
}

impl SearchStates {
  pub fn get(&self, problem_id: i64) -> SearchState {
    self.by_problem.get(&problem_id).cloned().unwrap_or_default()
  }

  /// Shallow-merge `patch` into the existing (or default) state.
  pub fn update(&mut self, problem_id: i64, patch: SearchStatePatch) -> &SearchState {
    let st = self.by_problem.entry(problem_id).or_default();
    if let Some(c) = patch.curriculum_name { st.curriculum_name = c; }
    if let Some(u) = patch.unit_id { st.unit_id = u; }
    if let Some(k) = patch.knowledge_id { st.knowledge_id = k; }
    st
  }

  pub fn select_curriculum(&mut self, problem_id: i64, name: String) -> &SearchState {
    self.update(problem_id, SearchStatePatch {
      curriculum_name: Some(name),
      unit_id: Some(None),
      knowledge_id: Some(None),
    })
  }

  pub fn select_unit(&mut self, problem_id: i64, unit_id: Option<i64>, catalog: &UnitCatalog) -> &SearchState {
    let curriculum_name = unit_id
      .and_then(|u| catalog.first_for_unit(u))
      .map(|r| r.curriculum_name.clone());
    self.update(problem_id, SearchStatePatch {
      curriculum_name,
      unit_id: Some(unit_id),
      knowledge_id: Some(None),
    })
  }

  pub fn select_knowledge(&mut self, problem_id: i64, knowledge_id: Option<i64>, catalog: &UnitCatalog) -> &SearchState {
    let mut patch = SearchStatePatch { knowledge_id: Some(knowledge_id), ..Default::default() };
    if let Some(r) = knowledge_id.and_then(|k| catalog.first_for_knowledge(k)) {
      patch.unit_id = Some(Some(r.unit_id));
      patch.curriculum_name = Some(r.curriculum_name.clone());
    }
    self.update(problem_id, patch)
  }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct SearchOptions {
  pub curricula: Vec<String>,
  pub units: Vec<UnitOption>,
  pub knowledges: Vec<KnowledgeOption>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct UnitOption {
  pub unit_id: i64,
  pub unit_name: String,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct KnowledgeOption {
  pub knowledge_id: i64,
  pub knowledge_name: String,
}

/// Option lists for the three pickers, narrowed by whatever is already selected.
pub fn options_for(state: &SearchState, catalog: &UnitCatalog) -> SearchOptions {
  let filtered: Vec<_> = catalog
    .rows()
    .iter()
    .filter(|r| state.curriculum_name.is_empty() || r.curriculum_name == state.curriculum_name)
    .filter(|r| state.unit_id.map_or(true, |u| r.unit_id == u))
    .filter(|r| state.knowledge_id.map_or(true, |k| r.knowledge_id == k))
    .collect();

  SearchOptions {
    curricula: dedup_first_seen(filtered.iter().map(|r| r.curriculum_name.clone()), |s| s.clone()),
    units: dedup_first_seen(
      filtered.iter().map(|r| UnitOption { unit_id: r.unit_id, unit_name: r.unit_name.clone() }),
      |o| o.unit_id,
    ),
    knowledges: dedup_first_seen(
      filtered.iter().map(|r| KnowledgeOption { knowledge_id: r.knowledge_id, knowledge_name: r.knowledge_name.clone() }),
      |o| o.knowledge_id,
    ),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::join::fixtures::reference_rows;

  fn catalog() -> UnitCatalog { UnitCatalog::new(reference_rows()) }

  #[test]
  fn default_state_is_empty() {
    let s = SearchStates::default();
    assert_eq!(s.get(1), SearchState { curriculum_name: String::new(), unit_id: None, knowledge_id: None });
  }

  #[test]
  fn selecting_unit_backfills_curriculum() {
    let mut s = SearchStates::default();
    let st = s.select_unit(1, Some(7), &catalog()).clone();
    assert_eq!(st, SearchState { curriculum_name: "Algebra".into(), unit_id: Some(7), knowledge_id: None });
  }

  #[test]
  fn selecting_curriculum_clears_unit_and_knowledge() {
    let cat = catalog();
    let mut s = SearchStates::default();
    s.select_knowledge(1, Some(21), &cat);
    assert_eq!(s.get(1).unit_id, Some(2));
    assert_eq!(s.get(1).curriculum_name, "Geometry");

    let st = s.select_curriculum(1, "Arithmetic".into()).clone();
    assert_eq!(st, SearchState { curriculum_name: "Arithmetic".into(), unit_id: None, knowledge_id: None });
  }

  #[test]
  fn selecting_unit_clears_knowledge() {
    let cat = catalog();
    let mut s = SearchStates::default();
    s.select_knowledge(1, Some(10), &cat);
    s.select_unit(1, Some(2), &cat);
    assert_eq!(s.get(1), SearchState { curriculum_name: "Geometry".into(), unit_id: Some(2), knowledge_id: None });
  }

  #[test]
  fn unknown_knowledge_keeps_rest_of_state() {
    let cat = catalog();
    let mut s = SearchStates::default();
    s.select_curriculum(3, "Geometry".into());
    s.select_knowledge(3, Some(404), &cat);
    assert_eq!(s.get(3), SearchState { curriculum_name: "Geometry".into(), unit_id: None, knowledge_id: Some(404) });
  }

  #[test]
  fn states_are_independent_per_problem() {
    let mut s = SearchStates::default();
    s.select_curriculum(1, "Algebra".into());
    assert_eq!(s.get(2), SearchState::default());
  }

  #[test]
  fn options_narrow_with_selection() {
    let cat = catalog();
    let all = options_for(&SearchState::default(), &cat);
    assert_eq!(all.curricula, vec!["Arithmetic", "Geometry", "Algebra"]);
    assert_eq!(all.units.len(), 3);
    assert_eq!(all.knowledges.len(), 5);

    let geo = options_for(&SearchState { curriculum_name: "Geometry".into(), ..Default::default() }, &cat);
    assert_eq!(geo.units, vec![UnitOption { unit_id: 2, unit_name: "Angles".into() }]);
    assert_eq!(geo.knowledges.iter().map(|k| k.knowledge_id).collect::<Vec<_>>(), vec![20, 21]);
  }
}
