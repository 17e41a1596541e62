use thiserror::Error;

use crate::content::ContentKind;

/// Errors produced by [`ContentStore`](crate::ContentStore) writes.
///
/// Lookups of unknown ids are not errors; they return `None`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContentError {
    /// A write names a parent entity that does not exist.
    #[error("{kind} '{id}' does not exist")]
    MissingParent { kind: ContentKind, id: String },

    /// Another subject already uses this key.
    #[error("subject with key '{0}' already exists")]
    DuplicateKey(String),

    /// A required text field was empty.
    #[error("{field} must not be empty")]
    EmptyField { field: &'static str },
}

/// Errors produced by [`TaskStore`](crate::TaskStore) operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TaskError {
    /// The referenced task does not exist.
    #[error("task not found: {0}")]
    NotFound(String),

    /// `retry_count` has reached `max_retries`.
    #[error("task {id} reached its retry limit ({max_retries})")]
    RetryLimitReached { id: String, max_retries: u32 },

    /// The payload does not match the shape its task type requires.
    #[error("invalid task payload: {0}")]
    InvalidPayload(String),
}
