//! Raw record parsing for newline-delimited datasets and whole JSON documents.

use serde::de::DeserializeOwned;
use tracing::{debug, instrument, warn};

use crate::domain::UnitKnowledgeRow;
use crate::error::ReviewError;
use crate::util::trunc_for_log;

/// Parse one record per non-blank line. Lines that fail to parse are logged and dropped.
#[instrument(level = "debug", skip(source_name, text), fields(%source_name, text_len = text.len()))]
pub fn parse_line_delimited<T: DeserializeOwned>(source_name: &str, text: &str) -> Vec<T> {
  let mut out = Vec::new();
  let mut dropped = 0usize;
  for (lineno, line) in text.lines().enumerate() {
    let line = line.trim();
    if line.is_empty() {
      continue;
    }
    match serde_json::from_str::<T>(line) {
      Ok(rec) => out.push(rec),
      Err(e) => {
        dropped += 1;
        warn!(target: "review", %source_name, line = lineno + 1, error = %e, excerpt = %trunc_for_log(line, 80), "Dropping malformed line");
      }
    }
  }
  debug!(target: "review", %source_name, records = out.len(), dropped, "Parsed line-delimited dataset");
  out
}

/// Parse the whole text as one document. Failure is fatal to the caller.
pub fn parse_document<T: DeserializeOwned>(source_name: &str, text: &str) -> Result<T, ReviewError> {
  serde_json::from_str::<T>(text).map_err(|e| ReviewError::Document {
    source_name: source_name.to_string(),
    message: e.to_string(),
  })
}

/// The reference listing is an object whose first value is the row array.
/// An empty object yields no rows; keys after the first are ignored.
#[instrument(level = "debug", skip(source_name, text), fields(%source_name, text_len = text.len()))]
pub fn parse_reference_listing(source_name: &str, text: &str) -> Result<Vec<UnitKnowledgeRow>, ReviewError> {
  let doc: serde_json::Map<String, serde_json::Value> = parse_document(source_name, text)?;
  let Some((key, first)) = doc.into_iter().next() else {
    warn!(target: "review", %source_name, "Reference listing has no top-level key; no rows loaded");
    return Ok(Vec::new());
  };
  let rows: Vec<UnitKnowledgeRow> = serde_json::from_value(first).map_err(|e| ReviewError::Document {
    source_name: source_name.to_string(),
    message: format!("key '{key}': {e}"),
  })?;
  debug!(target: "review", %source_name, %key, rows = rows.len(), "Parsed reference listing");
  Ok(rows)
}
