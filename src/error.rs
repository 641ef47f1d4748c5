//! Error taxonomy shared by the load pipeline, the edit model and the API layer.

use axum::{http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReviewError {
  /// A whole-document input could not be parsed. Fatal to the load.
  #[error("failed to parse {source_name}: {message}")]
  Document { source_name: String, message: String },

  /// A required dataset has not been selected yet.
  #[error("missing required input: {0}")]
  MissingInput(&'static str),

  #[error("no data loaded")]
  NoSession,

  /// User-facing input validation. State is left unchanged.
  #[error("{0}")]
  Validation(String),

  #[error("problem id {0} not found")]
  ProblemNotFound(i64),

  #[error("write not available: {0}")]
  WriteUnavailable(String),

  #[error("no write handle; enable edit mode first")]
  WriteHandleMissing,

  #[error("write capability does not match the granted handle")]
  InvalidCapability,

  #[error("I/O error on {path}: {source}")]
  Io {
    path: String,
    #[source]
    source: std::io::Error,
  },
}

impl ReviewError {
  pub fn io(path: impl AsRef<std::path::Path>, source: std::io::Error) -> Self {
    ReviewError::Io { path: path.as_ref().display().to_string(), source }
  }

  /// Stable machine-readable tag used by both HTTP and WebSocket replies.
  pub fn kind(&self) -> &'static str {
    match self {
      ReviewError::Document { .. } => "document",
      ReviewError::MissingInput(_) => "missing_input",
      ReviewError::NoSession => "no_session",
      ReviewError::Validation(_) => "validation",
      ReviewError::ProblemNotFound(_) => "problem_not_found",
      ReviewError::WriteUnavailable(_) => "write_unavailable",
      ReviewError::WriteHandleMissing => "write_handle_missing",
      ReviewError::InvalidCapability => "invalid_capability",
      ReviewError::Io { .. } => "io",
    }
  }

  fn status(&self) -> StatusCode {
    match self {
      ReviewError::Document { .. } => StatusCode::UNPROCESSABLE_ENTITY,
      ReviewError::MissingInput(_) | ReviewError::NoSession => StatusCode::CONFLICT,
      ReviewError::Validation(_) => StatusCode::BAD_REQUEST,
      ReviewError::ProblemNotFound(_) => StatusCode::NOT_FOUND,
      ReviewError::WriteUnavailable(_) | ReviewError::WriteHandleMissing => StatusCode::PRECONDITION_FAILED,
      ReviewError::InvalidCapability => StatusCode::FORBIDDEN,
      ReviewError::Io { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }
}

#[derive(Debug, Serialize)]
pub struct ErrorOut {
  pub kind: &'static str,
  pub message: String,
}

impl From<&ReviewError> for ErrorOut {
  fn from(e: &ReviewError) -> Self {
    ErrorOut { kind: e.kind(), message: e.to_string() }
  }
}

impl IntoResponse for ReviewError {
  fn into_response(self) -> axum::response::Response {
    (self.status(), Json(ErrorOut::from(&self))).into_response()
  }
}
