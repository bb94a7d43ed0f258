//! HTTP endpoint handlers. These are thin wrappers that forward to core logic.
//! Each handler is instrumented and logs parameters and basic result info.

use std::sync::Arc;

use axum::{
  extract::{Multipart, Path, State},
  http::StatusCode,
  response::IntoResponse,
  Json,
};
use tracing::{info, instrument};

use crate::domain::{DifferentiationIntent, GeneratedSections, NewExerciseSpec};
use crate::errors::{AppError, AppResult};
use crate::generation::{ChatRequest, ChatResponse};
use crate::logic::{do_chat, run_command, snapshot, upload_into_session};
use crate::protocol::*;
use crate::sections::extract_sections;
use crate::state::AppState;
use crate::templates::{build_creation_prompt, build_prompt};
use crate::upload::{FileKind, UploadedFile, UPLOAD_FAILED};

#[instrument(level = "info", skip(state))]
pub async fn http_health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  Json(HealthOut { ok: true, backend: state.generator.name() })
}

#[instrument(level = "info")]
pub async fn http_get_intents() -> impl IntoResponse {
  Json(IntentsOut {
    intents: DifferentiationIntent::ALL.iter().map(|i| i.info()).collect(),
  })
}

#[instrument(level = "info", skip(state, body), fields(message_len = body.message.len()))]
pub async fn http_post_chat(
  State(state): State<Arc<AppState>>,
  Json(body): Json<ChatRequest>,
) -> AppResult<Json<ChatResponse>> {
  let response = do_chat(&state, body).await?;
  Ok(Json(ChatResponse { response }))
}

#[instrument(level = "info", skip(state, multipart))]
pub async fn http_post_upload(
  State(state): State<Arc<AppState>>,
  multipart: Multipart,
) -> AppResult<Json<UploadOut>> {
  let file = read_upload(multipart).await?;
  let content = state.extractor.extract_text(file).await?;
  Ok(Json(UploadOut { content }))
}

#[instrument(level = "info", skip(body), fields(intent = ?body.intent, source_len = body.source_text.len()))]
pub async fn http_post_differentiate_prompt(Json(body): Json<DifferentiateIn>) -> AppResult<Json<PromptOut>> {
  if body.source_text.trim().is_empty() {
    return Err(AppError::Validation(crate::controller::MISSING_SOURCE_OR_INTENT.into()));
  }
  let prompt = build_prompt(body.intent, &body.source_text, &body.custom_text)?;
  Ok(Json(PromptOut { prompt }))
}

#[instrument(level = "info", skip(spec))]
pub async fn http_post_create_prompt(Json(spec): Json<NewExerciseSpec>) -> AppResult<Json<PromptOut>> {
  let prompt = build_creation_prompt(&spec)?;
  Ok(Json(PromptOut { prompt }))
}

#[instrument(level = "info", skip(body), fields(markdown_len = body.markdown.len()))]
pub async fn http_post_sections(Json(body): Json<SectionsIn>) -> Json<GeneratedSections> {
  Json(extract_sections(&body.markdown))
}

#[instrument(level = "info", skip(state))]
pub async fn http_create_session(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  let (id, session) = state.create_session().await;
  let ctrl = session.lock().await;
  (StatusCode::CREATED, Json(snapshot(&id, &ctrl)))
}

#[instrument(level = "info", skip(state), fields(%id))]
pub async fn http_get_session(
  State(state): State<Arc<AppState>>,
  Path(id): Path<String>,
) -> AppResult<Json<ServerMessage>> {
  let session = state.get_session(&id).await?;
  let ctrl = session.lock().await;
  Ok(Json(snapshot(&id, &ctrl)))
}

#[instrument(level = "info", skip(state), fields(%id))]
pub async fn http_delete_session(
  State(state): State<Arc<AppState>>,
  Path(id): Path<String>,
) -> AppResult<StatusCode> {
  state.remove_session(&id).await?;
  Ok(StatusCode::NO_CONTENT)
}

#[instrument(level = "info", skip(state, cmd), fields(%id))]
pub async fn http_post_command(
  State(state): State<Arc<AppState>>,
  Path(id): Path<String>,
  Json(cmd): Json<ClientCommand>,
) -> AppResult<impl IntoResponse> {
  let session = state.get_session(&id).await?;
  let reply = run_command(&state, &id, &session, cmd).await;
  let status = match &reply {
    ServerMessage::Error { .. } => StatusCode::BAD_REQUEST,
    _ => StatusCode::OK,
  };
  info!(target: "differentie_backend", session_id = %id, %status, "HTTP command applied");
  Ok((status, Json(reply)))
}

#[instrument(level = "info", skip(state, multipart), fields(%id))]
pub async fn http_post_session_upload(
  State(state): State<Arc<AppState>>,
  Path(id): Path<String>,
  multipart: Multipart,
) -> AppResult<Json<ServerMessage>> {
  let session = state.get_session(&id).await?;
  let file = match read_upload(multipart).await {
    Ok(file) => file,
    Err(e) => {
      session.lock().await.apply_upload(Err(e))?;
      let ctrl = session.lock().await;
      return Ok(Json(snapshot(&id, &ctrl)));
    }
  };
  upload_into_session(&state, &session, file).await?;
  let ctrl = session.lock().await;
  Ok(Json(snapshot(&id, &ctrl)))
}

/// Pull the `file` field out of a multipart body. The extension is checked
/// before the content is read.
async fn read_upload(mut multipart: Multipart) -> AppResult<UploadedFile> {
  while let Some(field) = multipart
    .next_field()
    .await
    .map_err(|e| upload_error("multipart", e))?
  {
    if field.name() != Some("file") {
      continue;
    }
    let file_name = field.file_name().unwrap_or_default().to_string();
    FileKind::from_file_name(&file_name)?;
    let bytes = field.bytes().await.map_err(|e| upload_error("multipart body", e))?;
    return Ok(UploadedFile { file_name, bytes: bytes.to_vec() });
  }
  Err(AppError::UploadRejected(UPLOAD_FAILED.into()))
}

fn upload_error(stage: &str, cause: impl std::fmt::Display) -> AppError {
  tracing::warn!(target: "differentie_backend", %stage, error = %cause, "Could not read upload");
  AppError::UploadRejected(UPLOAD_FAILED.into())
}
