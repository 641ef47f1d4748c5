//! Problem Review · annotation review backend
//!
//! - Axum HTTP + WebSocket API over one in-memory review session
//! - Joins content, annotation, criteria and curriculum reference files
//! - Static front end fallback (<static_dir>/index.html)
//!
//! Important env variables:
//!   PORT                : u16 (default 3000)
//!   REVIEW_CONFIG_PATH  : path to TOML config (inputs, static dir, labels)
//!   REVIEW_DATA_DIR     : directory scanned for input files at startup
//!   LOG_LEVEL           : tracing filter, e.g. "debug" or full directives
//!   LOG_FORMAT          : "pretty" (default) or "json"

mod telemetry;
mod util;
mod error;
mod domain;
mod config;
mod parser;
mod units;
mod join;
mod criteria;
mod navigation;
mod search;
mod session;
mod edit;
mod serialize;
mod files;
mod state;
mod protocol;
mod logic;
mod routes;

use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tracing::{info, instrument};

use crate::routes::build_router;
use crate::state::AppState;

#[instrument(level = "info", skip_all)]
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
  telemetry::init_tracing();

  // Config, initial file selection; no session until the first load.
  let state = Arc::new(AppState::from_env().await);

  let app = build_router(state.clone());

  let addr: SocketAddr = std::env::var("PORT")
    .ok()
    .and_then(|p| p.parse::<u16>().ok())
    .map(|port| SocketAddr::from(([127, 0, 0, 1], port)))
    .unwrap_or_else(|| SocketAddr::from(([127, 0, 0, 1], 3000)));

  let listener = TcpListener::bind(addr).await?;
  info!(target: "problem_review", %addr, "HTTP server listening");
  axum::serve(listener, app).await?;
  Ok(())
}
