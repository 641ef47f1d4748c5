//! Loading review configuration (input locations, static assets, labels) from TOML.
//!
//! See `ReviewConfig` for the expected schema. Every field is optional.

use std::path::PathBuf;

use serde::Deserialize;
use tracing::{error, info};

use crate::join::UNKNOWN_LABEL;

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct ReviewConfig {
  /// Directory scanned at startup; recognized inputs are pre-selected.
  pub data_dir: Option<PathBuf>,
  /// Front-end assets served with an index.html fallback.
  pub static_dir: PathBuf,
  /// Shown when a unit id is missing from the reference listing.
  pub unknown_label: String,
  pub inputs: InputPaths,
}

/// Explicit input paths. These win over files discovered in `data_dir`.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct InputPaths {
  #[serde(default)] pub content: Option<PathBuf>,
  #[serde(default)] pub annotation: Option<PathBuf>,
  #[serde(default)] pub criteria: Option<PathBuf>,
  #[serde(default)] pub reference: Option<PathBuf>,
}

impl Default for ReviewConfig {
  fn default() -> Self {
    Self {
      data_dir: None,
      static_dir: PathBuf::from("./static"),
      unknown_label: UNKNOWN_LABEL.to_string(),
      inputs: InputPaths::default(),
    }
  }
}

pub fn parse_config(s: &str) -> Result<ReviewConfig, toml::de::Error> {
  toml::from_str::<ReviewConfig>(s)
}

/// Load from REVIEW_CONFIG_PATH (falls back to defaults on any IO/parse error),
/// then apply REVIEW_DATA_DIR.
pub fn load_review_config_from_env() -> ReviewConfig {
  let mut cfg = match std::env::var("REVIEW_CONFIG_PATH") {
    Ok(path) => match std::fs::read_to_string(&path) {
      Ok(s) => match parse_config(&s) {
        Ok(cfg) => {
          info!(target: "problem_review", %path, "Loaded review config (TOML)");
          cfg
        }
        Err(e) => {
          error!(target: "problem_review", %path, error = %e, "Failed to parse TOML config; using defaults");
          ReviewConfig::default()
        }
      },
      Err(e) => {
        error!(target: "problem_review", %path, error = %e, "Failed to read TOML config file; using defaults");
        ReviewConfig::default()
      }
    },
    Err(_) => ReviewConfig::default(),
  };
  if let Ok(dir) = std::env::var("REVIEW_DATA_DIR") {
    cfg.data_dir = Some(PathBuf::from(dir));
  }
  cfg
}
