//! Error types for tracker services.

use database::DatabaseError;
use habit_core::ValidationError;
use thiserror::Error;

/// Errors surfaced by the tracker services.
#[derive(Debug, Error)]
pub enum TrackerError {
    /// Referenced habit, execution or user does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// The record exists but belongs to someone else.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// The request cannot be applied (inactive habit, bad range, ...).
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Invalid user input.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Persistence failed; the transaction was rolled back.
    #[error("database error: {0}")]
    Database(DatabaseError),

    /// The delivery worker is gone and reminders cannot be queued.
    #[error("reminder queue closed")]
    QueueClosed,
}

impl From<DatabaseError> for TrackerError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::NotFound { entity, id } => TrackerError::NotFound { entity, id },
            other => TrackerError::Database(other),
        }
    }
}

/// Result type for tracker operations.
pub type Result<T> = std::result::Result<T, TrackerError>;
