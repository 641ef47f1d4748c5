//! Left join of the annotation dataset with content, criteria and the unit index.
//!
//! The annotation dataset drives the result: one merged problem per annotation
//! record, in file order. Content and criteria are lookups; a content record
//! without an annotation is dropped. Unit and curriculum names always come from
//! the unit index, never from the annotation payload.

use std::collections::HashMap;

use tracing::{debug, instrument};

use crate::domain::{AnnotationRecord, ContentRecord, CriteriaEntry, MergedProblem, ProblemHtml, UnitCandidate};
use crate::units::UnitIndex;

/// Fallback shown when a unit id is absent from the reference listing.
pub const UNKNOWN_LABEL: &str = "알 수 없음";

#[instrument(level = "info", skip_all, fields(results = results.len(), content = content.len(), criteria = criteria.len()))]
pub fn merge(
  results: Vec<AnnotationRecord>,
  content: Vec<ContentRecord>,
  criteria: Vec<CriteriaEntry>,
  units: &UnitIndex,
  unknown_label: &str,
) -> Vec<MergedProblem> {
  // Later duplicates overwrite earlier ones.
  let mut html_by_id: HashMap<i64, ProblemHtml> = HashMap::with_capacity(content.len());
  for rec in content {
    html_by_id.insert(rec.problem_id, rec.problem_html);
  }

  let mut criteria_by_id: HashMap<i64, Vec<CriteriaEntry>> = HashMap::new();
  for entry in criteria {
    criteria_by_id.entry(entry.problem_id).or_default().push(entry);
  }

  let mut without_content = 0usize;
  let merged: Vec<MergedProblem> = results
    .into_iter()
    .map(|r| {
      let problem_html = match html_by_id.get(&r.problem_id) {
        Some(h) => h.clone(),
        None => {
          without_content += 1;
          ProblemHtml::default()
        }
      };
      MergedProblem {
        problem_id: r.problem_id,
        problem_html,
        behavior_area: r.behavior_area,
        behavior_reason: r.behavior_reason,
        behavior_area_confirmed: r.behavior_area_confirmed,
        comment: r.comment,
        unit_added: r.unit_added,
        unit_candidates: r
          .unit_candidates
          .into_iter()
          .map(|c| enrich_candidate(c, units, unknown_label))
          .collect(),
        criteria: criteria_by_id.get(&r.problem_id).cloned().unwrap_or_default(),
      }
    })
    .collect();

  debug!(target: "review", merged = merged.len(), without_content, "Join complete");
  merged
}

/// Overwrite denormalized names from the index. Necessity flags are already
/// normalized to `Unset` by deserialization.
fn enrich_candidate(mut c: UnitCandidate, units: &UnitIndex, unknown_label: &str) -> UnitCandidate {
  let info = units.get(&c.unit_id);
  c.unit_name = Some(
    info.map(|u| u.unit_name.as_str())
      .filter(|s| !s.is_empty())
      .unwrap_or(unknown_label)
      .to_string(),
  );
  c.curriculum_name = Some(
    info.map(|u| u.curriculum_name.as_str())
      .filter(|s| !s.is_empty())
      .unwrap_or(unknown_label)
      .to_string(),
  );
  c
}
