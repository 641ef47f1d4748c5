//! WebSocket upgrade + message loop. Each client message is parsed as JSON and
//! forwarded to core logic. We reply with a single JSON message per request.

use std::sync::Arc;
use axum::{
  extract::{
    ws::{Message, WebSocket},
    State, WebSocketUpgrade,
  },
  response::IntoResponse,
};
use tracing::{info, error, instrument, debug};

use crate::error::{ErrorOut, ReviewError};
use crate::logic;
use crate::protocol::{ClientWsMessage, ProblemView, ServerWsMessage};
use crate::state::AppState;

#[instrument(level = "info", skip(state))]
pub async fn ws_upgrade(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> impl IntoResponse {
  info!(target: "problem_review", "WebSocket upgrade requested");
  ws.on_upgrade(move |socket| handle_ws(socket, state))
}

#[instrument(level = "info", skip(socket, state))]
async fn handle_ws(mut socket: WebSocket, state: Arc<AppState>) {
  info!(target: "problem_review", "WebSocket connected");
  while let Some(Ok(msg)) = socket.recv().await {
    match msg {
      Message::Text(txt) => {
        let reply_msg = match serde_json::from_str::<ClientWsMessage>(&txt) {
          Ok(incoming) => {
            debug!(target: "problem_review", "WS received: {:?}", &incoming);
            handle_client_ws(incoming, &state).await
          }
          Err(e) => ServerWsMessage::Error {
            error: ErrorOut { kind: "invalid_message", message: format!("Invalid JSON: {}", e) },
          },
        };

        let out = serde_json::to_string(&reply_msg).unwrap_or_else(|e| {
          serde_json::json!({ "type": "error", "error": { "kind": "serialization", "message": e.to_string() } }).to_string()
        });

        if let Err(e) = socket.send(Message::Text(out)).await {
          error!(target: "problem_review", error = %e, "WS send error");
          break;
        }
      }
      Message::Ping(payload) => { let _ = socket.send(Message::Pong(payload)).await; }
      Message::Close(_) => break,
      _ => {}
    }
  }
  info!(target: "problem_review", "WebSocket disconnected");
}

fn reply<T>(res: Result<T, ReviewError>, ok: impl FnOnce(T) -> ServerWsMessage) -> ServerWsMessage {
  match res {
    Ok(v) => ok(v),
    Err(e) => {
      debug!(target: "review", kind = e.kind(), error = %e, "WS request rejected");
      ServerWsMessage::Error { error: ErrorOut::from(&e) }
    }
  }
}

#[instrument(level = "info", skip(state))]
pub(crate) async fn handle_client_ws(msg: ClientWsMessage, state: &AppState) -> ServerWsMessage {
  let problem = |view: ProblemView| ServerWsMessage::Problem { view: Box::new(view) };
  match msg {
    ClientWsMessage::Ping => ServerWsMessage::Pong,

    ClientWsMessage::SelectFiles { paths } => {
      ServerWsMessage::Files { files: logic::select_files(state, paths).await }
    }

    ClientWsMessage::Load => reply(logic::load(state).await, problem),

    ClientWsMessage::Current => reply(logic::current(state).await, problem),

    ClientWsMessage::Navigate { command } => reply(logic::navigate(state, command).await, problem),

    ClientWsMessage::Edit { command } => reply(logic::edit(state, command).await, problem),

    ClientWsMessage::Search { command } => reply(logic::search(state, command).await, problem),

    ClientWsMessage::EnableEditMode { path } => {
      reply(logic::enable_edit_mode(state, path).await, |edit_mode| ServerWsMessage::EditMode { edit_mode })
    }

    ClientWsMessage::Save { token } => {
      reply(logic::save(state, token).await, |saved| ServerWsMessage::Saved { saved })
    }
  }
}
