//! Domain records: the four input datasets and the merged problem the reviewer edits.

use serde::{Deserialize, Deserializer, Serialize, Serializer, ser::SerializeMap};
use serde_json::{Map, Value};
use tracing::warn;

/// Values accepted for the confirmed behavior area; `""` clears it.
pub const BEHAVIOR_AREA_OPTIONS: [&str; 4] = ["계산 능력", "이해 능력", "추론 능력", "문제 해결 능력"];

/// Reviewer judgment on a unit or knowledge entry. Encoded as `true` / `false` / `null`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Option<bool>", into = "Option<bool>")]
pub enum Necessity {
  Necessary,
  Unnecessary,
  #[default]
  Unset,
}

impl From<Option<bool>> for Necessity {
  fn from(v: Option<bool>) -> Self {
    match v {
      Some(true) => Necessity::Necessary,
      Some(false) => Necessity::Unnecessary,
      None => Necessity::Unset,
    }
  }
}

impl From<Necessity> for Option<bool> {
  fn from(n: Necessity) -> Self {
    match n {
      Necessity::Necessary => Some(true),
      Necessity::Unnecessary => Some(false),
      Necessity::Unset => None,
    }
  }
}

impl Necessity {
  /// Set to `value`, or clear it when it already holds `value`.
  pub fn toggled(self, value: bool) -> Necessity {
    let wanted = Necessity::from(Some(value));
    if self == wanted { Necessity::Unset } else { wanted }
  }
}

/// Treats an explicit JSON `null` the same as an absent field.
pub fn null_as_default<'de, D, T>(d: D) -> Result<T, D::Error>
where
  D: Deserializer<'de>,
  T: Default + Deserialize<'de>,
{
  Ok(Option::<T>::deserialize(d)?.unwrap_or_default())
}

/// A value of the wrong type falls back to the default instead of failing the record.
fn lenient<'de, D, T>(d: D) -> Result<T, D::Error>
where
  D: Deserializer<'de>,
  T: Default + serde::de::DeserializeOwned,
{
  Ok(serde_json::from_value(Value::deserialize(d)?).unwrap_or_default())
}

/// Parse array elements one by one, dropping the ones that do not fit.
fn elements<T: serde::de::DeserializeOwned>(v: Value) -> Vec<T> {
  let Value::Array(items) = v else { return Vec::new() };
  items
    .into_iter()
    .filter_map(|item| match serde_json::from_value::<T>(item) {
      Ok(t) => Some(t),
      Err(e) => {
        warn!(target: "review", error = %e, "Dropping malformed list element");
        None
      }
    })
    .collect()
}

/// Anything that is not a JSON array becomes an empty list.
fn list_or_empty<'de, D, T>(d: D) -> Result<Vec<T>, D::Error>
where
  D: Deserializer<'de>,
  T: serde::de::DeserializeOwned,
{
  Ok(elements(Value::deserialize(d)?))
}

/// Like [`list_or_empty`] but remembers that the key was present. `null` counts as absent.
fn present_list<'de, D, T>(d: D) -> Result<Option<Vec<T>>, D::Error>
where
  D: Deserializer<'de>,
  T: serde::de::DeserializeOwned,
{
  match Value::deserialize(d)? {
    Value::Null => Ok(None),
    v => Ok(Some(elements(v))),
  }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ProblemHtml {
  #[serde(default, skip_serializing_if = "Option::is_none")] pub question_html: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")] pub choice_html: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")] pub explanation_html: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")] pub correct_answer_html: Option<String>,
}

/// One line of the content dataset.
#[derive(Clone, Debug, Deserialize)]
pub struct ContentRecord {
  pub problem_id: i64,
  #[serde(default, deserialize_with = "null_as_default")]
  pub problem_html: ProblemHtml,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeEntry {
  pub knowledge_id: i64,
  #[serde(default, deserialize_with = "lenient")]
  pub knowledge_name: String,
  #[serde(default, deserialize_with = "lenient")]
  pub knowledge_necessity: Necessity,
}

/// Which source field name carried a unit's knowledge list.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum KnowledgeField {
  /// `valid_knowledges`, the canonical name.
  #[default]
  Valid,
  /// `knowledges`, the older synonym.
  Legacy,
  /// Both names were present; the list is written back under each.
  Both,
  /// Neither field was present.
  Absent,
}

impl KnowledgeField {
  pub fn keys(self) -> &'static [&'static str] {
    match self {
      KnowledgeField::Valid => &["valid_knowledges"],
      KnowledgeField::Legacy => &["knowledges"],
      KnowledgeField::Both => &["valid_knowledges", "knowledges"],
      KnowledgeField::Absent => &[],
    }
  }
}

/// A classifier-proposed unit, or a reviewer-added one (same shape).
#[derive(Clone, Debug, PartialEq)]
pub struct UnitCandidate {
  pub unit_id: i64,
  pub unit_name: Option<String>,
  pub curriculum_name: Option<String>,
  pub confidence_score: Option<f64>,
  pub unit_necessity: Necessity,
  pub knowledges: Vec<KnowledgeEntry>,
  pub knowledge_field: KnowledgeField,
  /// Source keys this model does not know about, written back untouched.
  pub extra: Map<String, Value>,
}

impl UnitCandidate {
  /// A fresh reviewer-added unit with an empty `valid_knowledges` list.
  pub fn added(unit_id: i64) -> Self {
    Self {
      unit_id,
      unit_name: None,
      curriculum_name: None,
      confidence_score: None,
      unit_necessity: Necessity::Unset,
      knowledges: Vec::new(),
      knowledge_field: KnowledgeField::Valid,
      extra: Map::new(),
    }
  }
}

#[derive(Deserialize)]
struct RawUnitCandidate {
  unit_id: i64,
  #[serde(default, deserialize_with = "lenient")] unit_name: Option<String>,
  #[serde(default, deserialize_with = "lenient")] curriculum_name: Option<String>,
  #[serde(default, deserialize_with = "lenient")] confidence_score: Option<f64>,
  #[serde(default, deserialize_with = "lenient")] unit_necessity: Necessity,
  #[serde(default, deserialize_with = "present_list")] valid_knowledges: Option<Vec<KnowledgeEntry>>,
  #[serde(default, deserialize_with = "present_list")] knowledges: Option<Vec<KnowledgeEntry>>,
  #[serde(flatten)] extra: Map<String, Value>,
}

impl<'de> Deserialize<'de> for UnitCandidate {
  fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
    let raw = RawUnitCandidate::deserialize(d)?;
    let (knowledges, knowledge_field) = match (raw.valid_knowledges, raw.knowledges) {
      (Some(v), Some(_)) => (v, KnowledgeField::Both),
      (Some(v), None) => (v, KnowledgeField::Valid),
      (None, Some(k)) => (k, KnowledgeField::Legacy),
      (None, None) => (Vec::new(), KnowledgeField::Absent),
    };
    Ok(UnitCandidate {
      unit_id: raw.unit_id,
      unit_name: raw.unit_name,
      curriculum_name: raw.curriculum_name,
      confidence_score: raw.confidence_score,
      unit_necessity: raw.unit_necessity,
      knowledges,
      knowledge_field,
      extra: raw.extra,
    })
  }
}

impl Serialize for UnitCandidate {
  fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
    let mut m = s.serialize_map(None)?;
    m.serialize_entry("unit_id", &self.unit_id)?;
    if let Some(name) = &self.unit_name {
      m.serialize_entry("unit_name", name)?;
    }
    if let Some(name) = &self.curriculum_name {
      m.serialize_entry("curriculum_name", name)?;
    }
    m.serialize_entry("confidence_score", &self.confidence_score)?;
    m.serialize_entry("unit_necessity", &self.unit_necessity)?;
    for key in self.knowledge_field.keys() {
      m.serialize_entry(key, &self.knowledges)?;
    }
    for (k, v) in &self.extra {
      m.serialize_entry(k, v)?;
    }
    m.end()
  }
}

/// One line of the annotation (results) dataset. Also the persisted output shape.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnnotationRecord {
  pub problem_id: i64,
  #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
  pub behavior_area: Option<String>,
  #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
  pub behavior_reason: Option<String>,
  #[serde(default, deserialize_with = "lenient")]
  pub behavior_area_confirmed: String,
  #[serde(default, deserialize_with = "list_or_empty")]
  pub unit_added: Vec<UnitCandidate>,
  #[serde(default, deserialize_with = "lenient")]
  pub comment: String,
  #[serde(default, deserialize_with = "list_or_empty")]
  pub unit_candidates: Vec<UnitCandidate>,
}

/// One line of the grading-criteria dataset.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CriteriaEntry {
  pub problem_id: i64,
  pub unit_id: i64,
  #[serde(default)]
  pub knowledge_id: i64,
  #[serde(default, deserialize_with = "null_as_default")]
  pub knowledge_name: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub knowledge_checked: Option<bool>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub category_base_name: Option<String>,
}

/// One row of the curriculum reference listing.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UnitKnowledgeRow {
  pub curriculum_name: String,
  pub unit_id: i64,
  pub unit_name: String,
  pub knowledge_id: i64,
  pub knowledge_name: String,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct UnitInfo {
  pub unit_id: i64,
  pub unit_name: String,
  pub curriculum_name: String,
}

/// The joined record the reviewer pages through and edits.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MergedProblem {
  pub problem_id: i64,
  pub problem_html: ProblemHtml,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub behavior_area: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub behavior_reason: Option<String>,
  pub behavior_area_confirmed: String,
  pub comment: String,
  pub unit_added: Vec<UnitCandidate>,
  pub unit_candidates: Vec<UnitCandidate>,
  pub criteria: Vec<CriteriaEntry>,
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn necessity_round_trips_through_nullable_bool() {
    let n: Necessity = serde_json::from_value(json!(null)).unwrap();
    assert_eq!(n, Necessity::Unset);
    let n: Necessity = serde_json::from_value(json!(false)).unwrap();
    assert_eq!(n, Necessity::Unnecessary);
    assert_eq!(serde_json::to_value(Necessity::Necessary).unwrap(), json!(true));
  }

  #[test]
  fn toggled_clears_when_value_repeats() {
    assert_eq!(Necessity::Unset.toggled(true), Necessity::Necessary);
    assert_eq!(Necessity::Necessary.toggled(true), Necessity::Unset);
    assert_eq!(Necessity::Necessary.toggled(false), Necessity::Unnecessary);
  }

  #[test]
  fn candidate_remembers_knowledge_field_name() {
    let c: UnitCandidate = serde_json::from_value(json!({
      "unit_id": 4,
      "knowledges": [{"knowledge_id": 9, "knowledge_name": "k"}]
    }))
    .unwrap();
    assert_eq!(c.knowledge_field, KnowledgeField::Legacy);
    assert_eq!(c.knowledges[0].knowledge_necessity, Necessity::Unset);

    let out = serde_json::to_value(&c).unwrap();
    assert!(out.get("knowledges").is_some());
    assert!(out.get("valid_knowledges").is_none());
  }

  #[test]
  fn valid_knowledges_wins_when_both_present() {
    let c: UnitCandidate = serde_json::from_value(json!({
      "unit_id": 1,
      "valid_knowledges": [],
      "knowledges": [{"knowledge_id": 2, "knowledge_name": "x"}]
    }))
    .unwrap();
    assert_eq!(c.knowledge_field, KnowledgeField::Both);
    assert!(c.knowledges.is_empty());

    let out = serde_json::to_value(&c).unwrap();
    assert_eq!(out["valid_knowledges"], json!([]));
    assert_eq!(out["knowledges"], json!([]));
  }

  #[test]
  fn unknown_candidate_keys_are_written_back() {
    let c: UnitCandidate = serde_json::from_value(json!({
      "unit_id": 3,
      "valid_knowledges": [],
      "source": "manual",
      "reviewed_at": 1712
    }))
    .unwrap();
    assert_eq!(c.extra.len(), 2);
    let out = serde_json::to_value(&c).unwrap();
    assert_eq!(out["source"], json!("manual"));
    assert_eq!(out["reviewed_at"], json!(1712));
  }

  #[test]
  fn badly_typed_nested_fields_keep_the_record() {
    let r: AnnotationRecord = serde_json::from_value(json!({
      "problem_id": 2,
      "comment": "reviewer note",
      "behavior_area": 7,
      "unit_candidates": [
        {"unit_id": 1, "confidence_score": "0.8", "unit_necessity": "yes",
         "valid_knowledges": [{"knowledge_id": null, "knowledge_name": "gone"}, {"knowledge_id": 11, "knowledge_name": 5}]},
        {"unit_id": "not a number"}
      ]
    }))
    .unwrap();
    assert_eq!(r.comment, "reviewer note");
    assert_eq!(r.behavior_area, None);
    assert_eq!(r.unit_candidates.len(), 1);
    let c = &r.unit_candidates[0];
    assert_eq!(c.confidence_score, None);
    assert_eq!(c.unit_necessity, Necessity::Unset);
    assert_eq!(c.knowledge_field, KnowledgeField::Valid);
    assert_eq!(c.knowledges.len(), 1);
    assert_eq!(c.knowledges[0].knowledge_id, 11);
    assert_eq!(c.knowledges[0].knowledge_name, "");
  }

  #[test]
  fn annotation_coerces_non_array_unit_added() {
    let r: AnnotationRecord = serde_json::from_value(json!({
      "problem_id": 5,
      "unit_added": {"oops": true},
      "comment": null
    }))
    .unwrap();
    assert!(r.unit_added.is_empty());
    assert!(r.unit_candidates.is_empty());
    assert_eq!(r.comment, "");
  }
}
