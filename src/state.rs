//! Application state: the current file selection, the review session and the
//! granted write capability.
//!
//! There is exactly one session at a time. A load builds the replacement
//! session completely before swapping it in, so a failed load never exposes a
//! partial collection.

use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{info, instrument, warn};

use crate::config::{load_review_config_from_env, ReviewConfig};
use crate::files::{scan_dir, FileKind, FsStore, SelectedFiles, WriteCapability};
use crate::session::ReviewSession;

pub struct AppState {
    pub config: ReviewConfig,
    pub store: FsStore,
    pub selection: Arc<RwLock<SelectedFiles>>,
    pub session: Arc<RwLock<Option<ReviewSession>>>,
    pub write_cap: Arc<RwLock<Option<WriteCapability>>>,
}

impl AppState {
    /// Build state from env: load config, pre-select inputs from the data directory.
    #[instrument(level = "info", skip_all)]
    pub async fn from_env() -> Self {
        let config = load_review_config_from_env();
        let selection = initial_selection(&config).await;
        info!(target: "problem_review", can_load = selection.can_load(), static_dir = %config.static_dir.display(), "Review state ready");
        Self::new(config, selection)
    }

    pub fn new(config: ReviewConfig, selection: SelectedFiles) -> Self {
        Self {
            config,
            store: FsStore,
            selection: Arc::new(RwLock::new(selection)),
            session: Arc::new(RwLock::new(None)),
            write_cap: Arc::new(RwLock::new(None)),
        }
    }
}

async fn initial_selection(config: &ReviewConfig) -> SelectedFiles {
    let mut selection = match &config.data_dir {
        Some(dir) => match scan_dir(dir).await {
            Ok(s) => s,
            Err(e) => {
                warn!(target: "problem_review", dir = %dir.display(), error = %e, "Could not scan data directory");
                SelectedFiles::default()
            }
        },
        None => SelectedFiles::default(),
    };
    let explicit = [
        (FileKind::Content, &config.inputs.content),
        (FileKind::Annotation, &config.inputs.annotation),
        (FileKind::Criteria, &config.inputs.criteria),
        (FileKind::Reference, &config.inputs.reference),
    ];
    for (kind, path) in explicit {
        if let Some(p) = path {
            selection.set(kind, p.clone());
        }
    }
    selection
}
