use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// User-facing message for any generation failure. The cause is only logged.
pub const GENERATION_FAILED_MESSAGE: &str = "Er is een fout opgetreden. Probeer het opnieuw.";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AppError {
    /// A required local field is missing; never reaches the network.
    #[error("{0}")]
    Validation(String),

    /// Unsupported file type or failed text extraction.
    #[error("{0}")]
    UploadRejected(String),

    /// Transport, status or body failure of the generation service.
    #[error("{}", GENERATION_FAILED_MESSAGE)]
    GenerationFailed { cause: String },

    #[error("Niet gevonden: {0}")]
    NotFound(String),
}

pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    pub fn generation(cause: impl Into<String>) -> Self {
        AppError::GenerationFailed { cause: cause.into() }
    }

    fn error_code(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::UploadRejected(_) => "UPLOAD_REJECTED",
            AppError::GenerationFailed { .. } => "GENERATION_FAILED",
            AppError::NotFound(_) => "NOT_FOUND",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::UploadRejected(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::GenerationFailed { .. } => StatusCode::BAD_GATEWAY,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: &'static str,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            error: self.to_string(),
            code: self.error_code(),
        };
        (self.status_code(), Json(body)).into_response()
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::generation(err.to_string())
    }
}
