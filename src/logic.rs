//! Core behaviors shared by both HTTP and WebSocket handlers.
//!
//! This includes:
//!   - Applying client commands to an interaction session
//!   - Running a submit without holding the session lock across the generation call
//!   - Upload conversion and the raw chat contract

use tracing::{debug, instrument};

use crate::controller::InteractionController;
use crate::errors::AppResult;
use crate::generation::{complete_within, ChatRequest};
use crate::protocol::{ClientCommand, ServerMessage};
use crate::state::{AppState, Session};
use crate::upload::UploadedFile;

/// Current state of a session as a wire message.
pub fn snapshot(session_id: &str, ctrl: &InteractionController) -> ServerMessage {
  ServerMessage::State {
    session_id: session_id.to_string(),
    loading: ctrl.is_loading(),
    state: ctrl.screen().clone(),
  }
}

/// Apply one command and report the resulting state.
///
/// Problems already shown as the screen's notice come back as a state message;
/// anything else (e.g. a command for another screen) is an error message.
#[instrument(level = "info", skip(state, session), fields(%session_id))]
pub async fn run_command(
  state: &AppState,
  session_id: &str,
  session: &Session,
  cmd: ClientCommand,
) -> ServerMessage {
  let result = match cmd {
    ClientCommand::Ping => return ServerMessage::Pong,
    ClientCommand::GetState => Ok(()),
    ClientCommand::Submit => submit_session(state, session).await,
    other => {
      let mut ctrl = session.lock().await;
      apply_local(&mut ctrl, other)
    }
  };

  let ctrl = session.lock().await;
  match result {
    Err(e) if ctrl.notice() != Some(e.to_string().as_str()) => {
      debug!(target: "differentie_backend", error = %e, "Command refused");
      ServerMessage::Error { message: e.to_string() }
    }
    _ => snapshot(session_id, &ctrl),
  }
}

fn apply_local(ctrl: &mut InteractionController, cmd: ClientCommand) -> AppResult<()> {
  match cmd {
    ClientCommand::SelectMode { mode } => ctrl.select_mode(mode),
    ClientCommand::Back => {
      ctrl.back();
      Ok(())
    }
    ClientCommand::SetSourceText { text } => ctrl.set_source_text(text),
    ClientCommand::SelectIntent { intent } => ctrl.select_intent(intent),
    ClientCommand::SetCustomText { text } => ctrl.set_custom_text(text),
    ClientCommand::UpdateSpec(patch) => ctrl.update_spec(patch),
    ClientCommand::Reset => {
      ctrl.reset();
      Ok(())
    }
    ClientCommand::DismissNotice => {
      ctrl.dismiss_notice();
      Ok(())
    }
    ClientCommand::Ping | ClientCommand::GetState | ClientCommand::Submit => Ok(()),
  }
}

/// begin (locked) -> generate (unlocked) -> finish (locked, ticket-checked).
#[instrument(level = "info", skip_all)]
pub async fn submit_session(state: &AppState, session: &Session) -> AppResult<()> {
  let pending = session.lock().await.begin_submit()?;
  let Some(pending) = pending else {
    return Ok(());
  };

  let result = pending
    .run(state.generator.as_ref(), state.config.generation_timeout())
    .await;

  let applied = session.lock().await.finish_submit(pending.ticket, result);
  debug!(target: "differentie_backend", ticket = pending.ticket, applied, "Generation settled");
  Ok(())
}

/// Convert an upload and feed it into the session's source text.
#[instrument(level = "info", skip(state, session, file), fields(file_name = %file.file_name))]
pub async fn upload_into_session(state: &AppState, session: &Session, file: UploadedFile) -> AppResult<()> {
  let result = state.extractor.extract_text(file).await;
  session.lock().await.apply_upload(result)
}

/// The raw `{message, aiModel}` contract, served by the configured backend.
#[instrument(level = "info", skip(state, req), fields(message_len = req.message.len()))]
pub async fn do_chat(state: &AppState, req: ChatRequest) -> AppResult<String> {
  complete_within(state.generator.as_ref(), &req.message, state.config.generation_timeout()).await
}
