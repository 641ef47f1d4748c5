//! Curriculum reference listing: unit index plus lookups used by search and add.

use std::collections::HashMap;

use tracing::{debug, instrument};

use crate::domain::{UnitInfo, UnitKnowledgeRow};

pub type UnitIndex = HashMap<i64, UnitInfo>;

/// First row wins for each unit_id; later rows never rename a unit.
pub fn build_unit_index(rows: &[UnitKnowledgeRow]) -> UnitIndex {
  let mut index = UnitIndex::with_capacity(rows.len());
  for row in rows {
    index.entry(row.unit_id).or_insert_with(|| UnitInfo {
      unit_id: row.unit_id,
      unit_name: row.unit_name.clone(),
      curriculum_name: row.curriculum_name.clone(),
    });
  }
  index
}

/// The reference rows together with their unit index. Immutable for a session.
#[derive(Clone, Debug, Default)]
pub struct UnitCatalog {
  rows: Vec<UnitKnowledgeRow>,
  index: UnitIndex,
}

impl UnitCatalog {
  #[instrument(level = "debug", skip_all, fields(rows = rows.len()))]
  pub fn new(rows: Vec<UnitKnowledgeRow>) -> Self {
    let index = build_unit_index(&rows);
    debug!(target: "review", units = index.len(), "Built unit index");
    Self { rows, index }
  }

  pub fn rows(&self) -> &[UnitKnowledgeRow] { &self.rows }

  pub fn index(&self) -> &UnitIndex { &self.index }

  /// First reference row for a unit.
  pub fn first_for_unit(&self, unit_id: i64) -> Option<&UnitKnowledgeRow> {
    self.rows.iter().find(|r| r.unit_id == unit_id)
  }

  /// First reference row for a knowledge item.
  pub fn first_for_knowledge(&self, knowledge_id: i64) -> Option<&UnitKnowledgeRow> {
    self.rows.iter().find(|r| r.knowledge_id == knowledge_id)
  }
}

#[cfg(test)]
pub(crate) fn row(curriculum: &str, unit_id: i64, unit: &str, knowledge_id: i64, knowledge: &str) -> UnitKnowledgeRow {
  UnitKnowledgeRow {
    curriculum_name: curriculum.into(),
    unit_id,
    unit_name: unit.into(),
    knowledge_id,
    knowledge_name: knowledge.into(),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn first_occurrence_of_unit_wins() {
    let idx = build_unit_index(&[row("C1", 1, "A", 10, "k"), row("C2", 1, "B", 11, "k2")]);
    assert_eq!(idx.len(), 1);
    assert_eq!(idx[&1].unit_name, "A");
    assert_eq!(idx[&1].curriculum_name, "C1");
  }

  #[test]
  fn catalog_finds_first_matching_rows() {
    let cat = UnitCatalog::new(vec![
      row("Algebra", 7, "Linear", 70, "slope"),
      row("Algebra", 7, "Linear", 71, "intercept"),
      row("Geometry", 8, "Circles", 71, "dup knowledge"),
    ]);
    assert_eq!(cat.first_for_unit(7).map(|r| r.knowledge_id), Some(70));
    assert_eq!(cat.first_for_knowledge(71).map(|r| r.unit_id), Some(7));
    assert!(cat.first_for_knowledge(99).is_none());
    assert_eq!(cat.index()[&8].unit_name, "Circles");
  }
}
