//! Reverse join: project the merged collection back to the annotation shape.

use tracing::{debug, instrument};

use crate::domain::{AnnotationRecord, KnowledgeField, KnowledgeEntry, MergedProblem, UnitCandidate};

/// Drops content and criteria. Candidate lists are written under the canonical
/// `valid_knowledges` name without the join-populated names; added units are
/// written as held in memory.
pub fn to_annotation_shape<'a, I>(merged: I) -> Vec<AnnotationRecord>
where
  I: IntoIterator<Item = &'a MergedProblem>,
{
  merged
    .into_iter()
    .map(|p| AnnotationRecord {
      problem_id: p.problem_id,
      behavior_area: p.behavior_area.clone(),
      behavior_reason: p.behavior_reason.clone(),
      behavior_area_confirmed: p.behavior_area_confirmed.clone(),
      unit_added: p.unit_added.clone(),
      comment: p.comment.clone(),
      unit_candidates: p.unit_candidates.iter().map(canonical_candidate).collect(),
    })
    .collect()
}

fn canonical_candidate(c: &UnitCandidate) -> UnitCandidate {
  UnitCandidate {
    unit_id: c.unit_id,
    unit_name: None,
    curriculum_name: None,
    confidence_score: c.confidence_score,
    unit_necessity: c.unit_necessity,
    knowledges: c
      .knowledges
      .iter()
      .map(|k| KnowledgeEntry {
        knowledge_id: k.knowledge_id,
        knowledge_name: k.knowledge_name.clone(),
        knowledge_necessity: k.knowledge_necessity,
      })
      .collect(),
    knowledge_field: KnowledgeField::Valid,
    extra: c.extra.clone(),
  }
}

/// One JSON record per line, trailing newline included.
#[instrument(level = "debug", skip_all, fields(records = records.len()))]
pub fn to_jsonl(records: &[AnnotationRecord]) -> Result<String, serde_json::Error> {
  let mut out = String::new();
  for r in records {
    out.push_str(&serde_json::to_string(r)?);
    out.push('\n');
  }
  debug!(target: "review", bytes = out.len(), "Serialized annotation dataset");
  Ok(out)
}
