//! Public protocol structs for WebSocket and HTTP endpoints (serde ready).
//! Keep this small and stable to evolve backend and frontend independently.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::criteria::CriteriaSummary;
use crate::domain::{MergedProblem, BEHAVIOR_AREA_OPTIONS};
use crate::error::ErrorOut;
use crate::files::SelectedFiles;
use crate::search::{SearchOptions, SearchState};
use crate::session::ReviewSession;

/// Cursor moves. `GoTo` takes the 1-based position shown to the reviewer.
#[derive(Clone, Debug, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum NavCommand {
    First,
    Last,
    Prev,
    Next,
    Prev10,
    Next10,
    GoTo { position: i64 },
    FindId { problem_id: i64 },
}

/// Record edits. `problem_index` (0-based) defaults to the current record.
#[derive(Clone, Debug, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum EditCommand {
    ToggleUnitNecessity {
        #[serde(default)]
        problem_index: Option<usize>,
        unit_index: usize,
        value: bool,
    },
    ToggleKnowledgeNecessity {
        #[serde(default)]
        problem_index: Option<usize>,
        unit_index: usize,
        knowledge_index: usize,
        value: bool,
    },
    ConfirmBehaviorArea {
        #[serde(default)]
        problem_index: Option<usize>,
        value: String,
    },
    UpdateComment {
        #[serde(default)]
        problem_index: Option<usize>,
        value: String,
    },
    AddUnit {
        #[serde(default)]
        problem_index: Option<usize>,
    },
    RemoveUnitAdded {
        #[serde(default)]
        problem_index: Option<usize>,
        add_index: usize,
        knowledge_index: usize,
    },
}

/// Search-picker selections for the current record.
#[derive(Clone, Debug, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum SearchCommand {
    Curriculum { name: String },
    Unit { unit_id: Option<i64> },
    Knowledge { knowledge_id: Option<i64> },
}

/// Messages the client can send over WebSocket.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientWsMessage {
    Ping,
    SelectFiles { paths: Vec<PathBuf> },
    Load,
    Current,
    Navigate { command: NavCommand },
    Edit { command: EditCommand },
    Search { command: SearchCommand },
    EnableEditMode {
        #[serde(default)]
        path: Option<PathBuf>,
    },
    Save { token: Uuid },
}

/// Messages the server sends back over WebSocket.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerWsMessage {
    Pong,
    Files { files: FilesOut },
    Problem { view: Box<ProblemView> },
    EditMode { edit_mode: EditModeOut },
    Saved { saved: SaveOut },
    Error { error: ErrorOut },
}

/// Everything the viewer needs to render one record. `problem` is `None` only
/// when the loaded collection is empty.
#[derive(Debug, Serialize)]
pub struct ProblemView {
    pub index: usize,
    /// 1-based, for display; 0 on an empty collection.
    pub position: usize,
    pub total: usize,
    pub revision: u64,
    pub problem: Option<MergedProblem>,
    pub search_state: SearchState,
    pub search_options: SearchOptions,
    pub criteria: CriteriaSummary,
    pub behavior_area_options: &'static [&'static str],
    pub can_save: bool,
}

/// Build the view of the record under the cursor.
pub fn problem_view(session: &ReviewSession, can_save: bool) -> ProblemView {
    let index = session.current_index();
    let Some(problem) = session.problem(index) else {
        return ProblemView {
            index: 0,
            position: 0,
            total: 0,
            revision: session.revision(),
            problem: None,
            search_state: SearchState::default(),
            search_options: SearchOptions::default(),
            criteria: CriteriaSummary::default(),
            behavior_area_options: &BEHAVIOR_AREA_OPTIONS,
            can_save,
        };
    };
    ProblemView {
        index,
        position: index + 1,
        total: session.len(),
        revision: session.revision(),
        problem: Some((**problem).clone()),
        search_state: session.search_state(problem.problem_id),
        search_options: session.search_options(problem.problem_id),
        criteria: session.criteria_summary(index),
        behavior_area_options: &BEHAVIOR_AREA_OPTIONS,
        can_save,
    }
}

//
// HTTP request/response DTOs
//

#[derive(Debug, Deserialize)]
pub struct SelectFilesIn {
    pub paths: Vec<PathBuf>,
}

#[derive(Debug, Serialize)]
pub struct FilesOut {
    pub selected: SelectedFiles,
    pub can_load: bool,
    pub ignored: Vec<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
pub struct EditModeIn {
    #[serde(default)]
    pub path: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
pub struct EditModeOut {
    pub token: Uuid,
    pub path: PathBuf,
}

#[derive(Debug, Deserialize)]
pub struct SaveIn {
    pub token: Uuid,
}

#[derive(Debug, Serialize)]
pub struct SaveOut {
    pub records: usize,
    pub bytes: usize,
    pub path: PathBuf,
}

#[derive(Serialize)]
pub struct HealthOut {
    pub ok: bool,
    pub loaded: bool,
}
