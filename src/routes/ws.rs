//! WebSocket upgrade + message loop. Each connection owns one interaction
//! session; every client frame is parsed as a `ClientCommand` and answered
//! with a single JSON message. Frames are handled one at a time, so a submit
//! finishes before the next command is read.

use std::sync::Arc;
use axum::{
  extract::{
    ws::{Message, WebSocket},
    State, WebSocketUpgrade,
  },
  response::IntoResponse,
};
use tracing::{info, error, instrument, debug};

use crate::logic::{run_command, snapshot};
use crate::protocol::{ClientCommand, ServerMessage};
use crate::state::AppState;

#[instrument(level = "info", skip(state))]
pub async fn ws_upgrade(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> impl IntoResponse {
  info!(target: "differentie_backend", "WebSocket upgrade requested");
  ws.on_upgrade(move |socket| handle_ws(socket, state))
}

#[instrument(level = "info", skip(socket, state))]
async fn handle_ws(mut socket: WebSocket, state: Arc<AppState>) {
  let (session_id, session) = state.create_session().await;
  info!(target: "differentie_backend", %session_id, "WebSocket connected");

  let hello = {
    let ctrl = session.lock().await;
    snapshot(&session_id, &ctrl)
  };
  if send_json(&mut socket, &hello).await.is_err() {
    let _ = state.remove_session(&session_id).await;
    return;
  }

  while let Some(Ok(msg)) = socket.recv().await {
    match msg {
      Message::Text(txt) => {
        // Parse, dispatch, serialize response.
        let reply = match serde_json::from_str::<ClientCommand>(&txt) {
          Ok(cmd) => {
            debug!(target: "differentie_backend", ?cmd, "WS received");
            run_command(&state, &session_id, &session, cmd).await
          }
          Err(e) => ServerMessage::Error { message: format!("Invalid JSON: {}", e) },
        };

        if let Err(e) = send_json(&mut socket, &reply).await {
          error!(target: "differentie_backend", error = %e, "WS send error");
          break;
        }
      }
      Message::Ping(payload) => { let _ = socket.send(Message::Pong(payload)).await; }
      Message::Close(_) => break,
      _ => {}
    }
  }

  let _ = state.remove_session(&session_id).await;
  info!(target: "differentie_backend", %session_id, "WebSocket disconnected");
}

async fn send_json(socket: &mut WebSocket, msg: &ServerMessage) -> Result<(), axum::Error> {
  let out = serde_json::to_string(msg).unwrap_or_else(|e| {
    serde_json::json!({ "type": "error", "message": format!("Serialization error: {}", e) }).to_string()
  });
  socket.send(Message::Text(out)).await
}
