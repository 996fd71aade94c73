use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Errors surfaced by quiz operations.
///
/// `Validation` and `NotFound` are raised before any write happens, so a
/// failed call never leaves a partially mutated quiz behind.
#[derive(Error, Debug)]
pub enum QuizError {
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Validation(String),
    #[error("Generation endpoint unavailable: {0}")]
    GenerationUnavailable(String),
    #[error("Malformed generation output: {0}")]
    MalformedGenerationOutput(String),
    #[error("Storage error: {0}")]
    Storage(#[from] anyhow::Error),
}

impl QuizError {
    pub fn validation(message: impl Into<String>) -> Self {
        QuizError::Validation(message.into())
    }

    pub fn quiz_not_found(quiz_id: impl std::fmt::Display) -> Self {
        QuizError::NotFound(format!("Quiz with id {} not found", quiz_id))
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            QuizError::NotFound(_) => StatusCode::NOT_FOUND,
            QuizError::Validation(_) => StatusCode::BAD_REQUEST,
            QuizError::GenerationUnavailable(_) => StatusCode::BAD_GATEWAY,
            QuizError::MalformedGenerationOutput(_) => StatusCode::UNPROCESSABLE_ENTITY,
            QuizError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Short label used for metrics and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            QuizError::NotFound(_) => "not_found",
            QuizError::Validation(_) => "validation",
            QuizError::GenerationUnavailable(_) => "generation_unavailable",
            QuizError::MalformedGenerationOutput(_) => "malformed_generation_output",
            QuizError::Storage(_) => "storage",
        }
    }
}

impl From<validator::ValidationErrors> for QuizError {
    fn from(errors: validator::ValidationErrors) -> Self {
        QuizError::Validation(errors.to_string())
    }
}

impl IntoResponse for QuizError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, kind = self.kind(), "Quiz request failed");
        } else {
            tracing::debug!(error = %self, kind = self.kind(), "Quiz request rejected");
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

pub type QuizResult<T> = Result<T, QuizError>;
