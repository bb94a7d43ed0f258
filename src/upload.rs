//! Turning an uploaded exercise file into plain text.
//!
//! Only `.docx`, `.pdf` and `.txt` are accepted; anything else is rejected
//! before any network call. Plain text is decoded locally, documents are
//! forwarded as multipart to the configured extraction service.

use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use tracing::{error, info, instrument, warn};

use crate::errors::{AppError, AppResult};

pub const UNSUPPORTED_FILE: &str = "Alleen .docx, .pdf en .txt bestanden worden ondersteund";
pub const UPLOAD_FAILED: &str = "Er is een fout opgetreden bij het uploaden van het bestand";
pub const FILE_TOO_LARGE: &str = "Het bestand is te groot";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FileKind {
  Docx,
  Pdf,
  Txt,
}

impl FileKind {
  /// Case-insensitive match on the file name's extension.
  pub fn from_file_name(name: &str) -> AppResult<Self> {
    let lower = name.trim().to_lowercase();
    if lower.ends_with(".docx") {
      Ok(FileKind::Docx)
    } else if lower.ends_with(".pdf") {
      Ok(FileKind::Pdf)
    } else if lower.ends_with(".txt") {
      Ok(FileKind::Txt)
    } else {
      Err(AppError::UploadRejected(UNSUPPORTED_FILE.into()))
    }
  }
}

#[derive(Clone, Debug)]
pub struct UploadedFile {
  pub file_name: String,
  pub bytes: Vec<u8>,
}

#[derive(Deserialize)]
struct ExtractionResponse {
  content: String,
}

#[derive(Clone)]
pub struct Extractor {
  pub client: reqwest::Client,
  pub endpoint: Option<String>,
  pub max_bytes: usize,
}

impl Extractor {
  pub fn new(endpoint: Option<String>, max_bytes: usize) -> Self {
    Self { client: reqwest::Client::new(), endpoint, max_bytes }
  }

  #[instrument(level = "info", skip(self, file), fields(file_name = %file.file_name, size = file.bytes.len()))]
  pub async fn extract_text(&self, file: UploadedFile) -> AppResult<String> {
    let kind = FileKind::from_file_name(&file.file_name)?;
    if file.bytes.len() > self.max_bytes {
      warn!(target: "differentie_backend", max = self.max_bytes, "Upload exceeds size limit");
      return Err(AppError::UploadRejected(FILE_TOO_LARGE.into()));
    }

    let text = match kind {
      FileKind::Txt => decode_plain_text(file.bytes)?,
      FileKind::Docx | FileKind::Pdf => self.extract_remote(file).await?,
    };
    info!(target: "differentie_backend", ?kind, text_len = text.len(), "Upload converted to text");
    Ok(text)
  }

  async fn extract_remote(&self, file: UploadedFile) -> AppResult<String> {
    let Some(endpoint) = &self.endpoint else {
      error!(target: "differentie_backend", "No extraction endpoint configured for documents");
      return Err(AppError::UploadRejected(UPLOAD_FAILED.into()));
    };

    let part = Part::bytes(file.bytes).file_name(file.file_name);
    let form = Form::new().part("file", part);
    let res = self
      .client
      .post(endpoint)
      .multipart(form)
      .send()
      .await
      .map_err(|e| rejected("extraction transport", e))?;

    if !res.status().is_success() {
      return Err(rejected("extraction status", res.status()));
    }
    let body: ExtractionResponse = res.json().await.map_err(|e| rejected("extraction body", e))?;
    Ok(body.content)
  }
}

fn decode_plain_text(bytes: Vec<u8>) -> AppResult<String> {
  let text = String::from_utf8(bytes).map_err(|e| rejected("utf-8 decoding", e))?;
  Ok(text.strip_prefix('\u{feff}').map(str::to_string).unwrap_or(text))
}

fn rejected(stage: &str, cause: impl std::fmt::Display) -> AppError {
  error!(target: "differentie_backend", %stage, error = %cause, "Upload extraction failed");
  AppError::UploadRejected(UPLOAD_FAILED.into())
}

#[cfg(test)]
mod tests {
  use super::*;

  fn file(name: &str, bytes: &[u8]) -> UploadedFile {
    UploadedFile { file_name: name.into(), bytes: bytes.to_vec() }
  }

  #[test]
  fn extensions_are_case_insensitive() {
    assert_eq!(FileKind::from_file_name("Toets.DOCX").unwrap(), FileKind::Docx);
    assert_eq!(FileKind::from_file_name("sommen.Pdf").unwrap(), FileKind::Pdf);
    assert_eq!(FileKind::from_file_name("les.txt").unwrap(), FileKind::Txt);
  }

  #[test]
  fn other_extensions_are_rejected() {
    for name in ["foto.png", "oefening.doc", "txt", "werkblad.txt.exe"] {
      assert_eq!(
        FileKind::from_file_name(name).unwrap_err(),
        AppError::UploadRejected(UNSUPPORTED_FILE.into()),
        "{name}"
      );
    }
  }

  #[tokio::test]
  async fn plain_text_is_decoded_locally() {
    let ex = Extractor::new(None, 1024);
    let text = ex.extract_text(file("les.txt", "\u{feff}Opdracht 1: 3 + 4 = ?".as_bytes())).await.unwrap();
    assert_eq!(text, "Opdracht 1: 3 + 4 = ?");
  }

  #[tokio::test]
  async fn invalid_utf8_is_rejected() {
    let ex = Extractor::new(None, 1024);
    let err = ex.extract_text(file("les.txt", &[0xff, 0xfe, 0x00])).await.unwrap_err();
    assert_eq!(err, AppError::UploadRejected(UPLOAD_FAILED.into()));
  }

  #[tokio::test]
  async fn documents_need_an_extraction_endpoint() {
    let ex = Extractor::new(None, 1024);
    let err = ex.extract_text(file("toets.pdf", b"%PDF-1.4")).await.unwrap_err();
    assert_eq!(err, AppError::UploadRejected(UPLOAD_FAILED.into()));
  }

  #[tokio::test]
  async fn oversized_files_are_rejected() {
    let ex = Extractor::new(None, 4);
    let err = ex.extract_text(file("les.txt", b"12345")).await.unwrap_err();
    assert_eq!(err, AppError::UploadRejected(FILE_TOO_LARGE.into()));
  }
}
