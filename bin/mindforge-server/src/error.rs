//! Unified server error type.
//!
//! Every handler returns `Result<T, ServerError>`, which implements
//! [`axum::response::IntoResponse`] so errors become a JSON body
//! `{"error": "..."}` with a matching status code.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use mindforge_core::{ContentError, TaskError};
use serde_json::json;
use thiserror::Error;

/// All errors that can occur in the mindforge-server request lifecycle.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The caller referenced a resource that does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The caller sent an invalid request, or asked for an action that does
    /// not apply in the current state.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// The request conflicts with existing state (duplicate key, retry limit).
    #[error("conflict: {0}")]
    Conflict(String),
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, client_message) = match self {
            ServerError::NotFound(m) => (StatusCode::NOT_FOUND, m),
            ServerError::BadRequest(m) => (StatusCode::BAD_REQUEST, m),
            ServerError::Conflict(m) => (StatusCode::CONFLICT, m),
        };
        (status, Json(json!({ "error": client_message }))).into_response()
    }
}

impl From<ContentError> for ServerError {
    fn from(e: ContentError) -> Self {
        match e {
            ContentError::MissingParent { .. } => ServerError::NotFound(e.to_string()),
            ContentError::DuplicateKey(_) => ServerError::Conflict(e.to_string()),
            ContentError::EmptyField { .. } => ServerError::BadRequest(e.to_string()),
        }
    }
}

impl From<TaskError> for ServerError {
    fn from(e: TaskError) -> Self {
        match e {
            TaskError::NotFound(_) => ServerError::NotFound(e.to_string()),
            TaskError::RetryLimitReached { .. } => ServerError::Conflict(e.to_string()),
            TaskError::InvalidPayload(_) => ServerError::BadRequest(e.to_string()),
        }
    }
}

impl From<validator::ValidationErrors> for ServerError {
    fn from(e: validator::ValidationErrors) -> Self {
        ServerError::BadRequest(e.to_string())
    }
}

