use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Operation-level errors surfaced to HTTP callers.
///
/// Upstream service failures are deliberately absent here: during `finish`
/// they are captured per answer, and an exhausted scoring chain degrades to
/// an error-shaped report instead of failing the request.
#[derive(Debug, Error)]
pub enum CoachError {
    /// Session does not exist or is not owned by the caller
    #[error("Session not found")]
    NotFound,

    /// Client sent an unusable request (missing audio, malformed index)
    #[error("{0}")]
    InvalidInput(String),

    /// Operation not valid for the session's lifecycle state
    #[error("{0}")]
    InvalidState(String),

    /// Session or blob store failure
    #[error("storage error: {0}")]
    Storage(#[from] anyhow::Error),
}

impl IntoResponse for CoachError {
    fn into_response(self) -> Response {
        let status = match &self {
            CoachError::NotFound => StatusCode::NOT_FOUND,
            CoachError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            CoachError::InvalidState(_) => StatusCode::CONFLICT,
            CoachError::Storage(e) => {
                error!("Storage failure: {e:#}");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
