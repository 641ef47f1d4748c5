//! Read-only views over a problem's grading criteria.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::domain::CriteriaEntry;
use crate::units::UnitIndex;
use crate::util::dedup_first_seen;

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct CriteriaSummary {
  /// Unified category names, first-seen order.
  pub categories: Vec<String>,
  pub unit_groups: Vec<CriteriaUnitGroup>,
  /// knowledge_id -> checked flag, for entries that carry one.
  pub checked: BTreeMap<i64, bool>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CriteriaUnitGroup {
  pub unit_id: i64,
  pub unit_name: String,
  pub curriculum_name: String,
  pub knowledges: Vec<CriteriaKnowledge>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CriteriaKnowledge {
  pub knowledge_id: i64,
  pub knowledge_name: String,
  pub knowledge_checked: bool,
}

pub fn summarize(criteria: &[CriteriaEntry], units: &UnitIndex, unknown_label: &str) -> CriteriaSummary {
  let categories = dedup_first_seen(
    criteria.iter().filter_map(|c| c.category_base_name.clone()).filter(|s| !s.is_empty()),
    |s| s.clone(),
  );

  let mut unit_groups: Vec<CriteriaUnitGroup> = Vec::new();
  for c in criteria {
    let pos = match unit_groups.iter().position(|g| g.unit_id == c.unit_id) {
      Some(p) => p,
      None => {
        let info = units.get(&c.unit_id);
        unit_groups.push(CriteriaUnitGroup {
          unit_id: c.unit_id,
          unit_name: info.map(|u| u.unit_name.clone()).unwrap_or_else(|| unknown_label.to_string()),
          curriculum_name: info.map(|u| u.curriculum_name.clone()).unwrap_or_else(|| unknown_label.to_string()),
          knowledges: Vec::new(),
        });
        unit_groups.len() - 1
      }
    };
    let group = &mut unit_groups[pos];
    // knowledge_id 0 marks a unit-level row with no knowledge attached
    if c.knowledge_id != 0 && !group.knowledges.iter().any(|k| k.knowledge_id == c.knowledge_id) {
      group.knowledges.push(CriteriaKnowledge {
        knowledge_id: c.knowledge_id,
        knowledge_name: c.knowledge_name.clone(),
        knowledge_checked: c.knowledge_checked.unwrap_or(false),
      });
    }
  }

  let mut checked = BTreeMap::new();
  for c in criteria {
    match c.knowledge_checked {
      Some(flag) if c.knowledge_id != 0 => { checked.insert(c.knowledge_id, flag); }
      _ => {}
    }
  }

  CriteriaSummary { categories, unit_groups, checked }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::join::{fixtures, UNKNOWN_LABEL};
  use crate::units::build_unit_index;

  #[test]
  fn groups_by_unit_and_collects_categories() {
    let idx = build_unit_index(&fixtures::reference_rows());
    let mut crit = fixtures::criteria();
    crit.retain(|c| c.problem_id == 101);
    crit.push(CriteriaEntry {
      problem_id: 101,
      unit_id: 42,
      knowledge_id: 0,
      knowledge_name: String::new(),
      knowledge_checked: None,
      category_base_name: Some("word problems".into()),
    });

    let s = summarize(&crit, &idx, UNKNOWN_LABEL);
    assert_eq!(s.categories, vec!["arith".to_string(), "word problems".to_string()]);
    assert_eq!(s.unit_groups.len(), 2);
    assert_eq!(s.unit_groups[0].unit_name, "Operations");
    assert_eq!(s.unit_groups[0].knowledges.len(), 2);
    assert_eq!(s.unit_groups[1].unit_name, UNKNOWN_LABEL);
    assert!(s.unit_groups[1].knowledges.is_empty());
    assert_eq!(s.checked.get(&10), Some(&true));
    assert_eq!(s.checked.get(&11), Some(&false));
  }

  #[test]
  fn missing_checked_flag_reads_as_false_in_groups_only() {
    let idx = build_unit_index(&fixtures::reference_rows());
    let crit: Vec<CriteriaEntry> = fixtures::criteria().into_iter().filter(|c| c.problem_id == 102).collect();
    let s = summarize(&crit, &idx, UNKNOWN_LABEL);
    assert!(!s.unit_groups[0].knowledges[0].knowledge_checked);
    assert!(s.checked.is_empty());
    assert!(s.categories.is_empty());
  }
}
