//! HTTP endpoint handlers. These are thin wrappers that forward to core logic.
//! Each handler is instrumented; failures come back as `{kind, message}` JSON.

use std::sync::Arc;
use axum::{extract::State, Json, response::IntoResponse};
use tracing::{info, instrument};

use crate::error::ReviewError;
use crate::logic;
use crate::protocol::*;
use crate::state::AppState;

#[instrument(level = "info", skip(state))]
pub async fn http_health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  let loaded = state.session.read().await.is_some();
  Json(HealthOut { ok: true, loaded })
}

#[instrument(level = "info", skip(state))]
pub async fn http_get_files(State(state): State<Arc<AppState>>) -> Json<FilesOut> {
  Json(logic::current_files(&state).await)
}

#[instrument(level = "info", skip(state, body), fields(count = body.paths.len()))]
pub async fn http_post_files(
  State(state): State<Arc<AppState>>,
  Json(body): Json<SelectFilesIn>,
) -> Json<FilesOut> {
  Json(logic::select_files(&state, body.paths).await)
}

#[instrument(level = "info", skip(state))]
pub async fn http_post_load(State(state): State<Arc<AppState>>) -> Result<Json<ProblemView>, ReviewError> {
  let view = logic::load(&state).await?;
  info!(target: "review", total = view.total, "HTTP load served");
  Ok(Json(view))
}

#[instrument(level = "info", skip(state))]
pub async fn http_get_problem(State(state): State<Arc<AppState>>) -> Result<Json<ProblemView>, ReviewError> {
  Ok(Json(logic::current(&state).await?))
}

#[instrument(level = "info", skip(state))]
pub async fn http_post_navigate(
  State(state): State<Arc<AppState>>,
  Json(cmd): Json<NavCommand>,
) -> Result<Json<ProblemView>, ReviewError> {
  Ok(Json(logic::navigate(&state, cmd).await?))
}

#[instrument(level = "info", skip(state))]
pub async fn http_post_edit(
  State(state): State<Arc<AppState>>,
  Json(cmd): Json<EditCommand>,
) -> Result<Json<ProblemView>, ReviewError> {
  Ok(Json(logic::edit(&state, cmd).await?))
}

#[instrument(level = "info", skip(state))]
pub async fn http_post_search(
  State(state): State<Arc<AppState>>,
  Json(cmd): Json<SearchCommand>,
) -> Result<Json<ProblemView>, ReviewError> {
  Ok(Json(logic::search(&state, cmd).await?))
}

#[instrument(level = "info", skip(state, body))]
pub async fn http_post_edit_mode(
  State(state): State<Arc<AppState>>,
  body: Option<Json<EditModeIn>>,
) -> Result<Json<EditModeOut>, ReviewError> {
  let path = body.and_then(|Json(b)| b.path);
  Ok(Json(logic::enable_edit_mode(&state, path).await?))
}

#[instrument(level = "info", skip(state, body))]
pub async fn http_post_save(
  State(state): State<Arc<AppState>>,
  Json(body): Json<SaveIn>,
) -> Result<Json<SaveOut>, ReviewError> {
  let out = logic::save(&state, body.token).await?;
  info!(target: "review", records = out.records, "HTTP save served");
  Ok(Json(out))
}
