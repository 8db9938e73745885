//! Error types for the HTTP API.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;
use tracker::TrackerError;

/// Errors returned by handlers.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Service error.
    #[error(transparent)]
    Tracker(#[from] TrackerError),

    /// Missing or malformed caller identity.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Tracker(TrackerError::NotFound { .. }) => StatusCode::NOT_FOUND,
            ApiError::Tracker(TrackerError::Forbidden(_)) => StatusCode::FORBIDDEN,
            ApiError::Tracker(TrackerError::BadRequest(_)) => StatusCode::BAD_REQUEST,
            ApiError::Tracker(TrackerError::Validation(_)) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Tracker(TrackerError::Database(_) | TrackerError::QueueClosed) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!("Internal error: {}", self);
            "internal server error".to_string()
        } else {
            self.to_string()
        };

        let body = serde_json::json!({
            "error": message
        });

        (status, Json(body)).into_response()
    }
}

/// Result type for handlers.
pub type Result<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn status_of(err: TrackerError) -> StatusCode {
        ApiError::from(err).into_response().status()
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            status_of(TrackerError::NotFound {
                entity: "Habit",
                id: "1".to_string()
            }),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(TrackerError::Forbidden("no".to_string())),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            status_of(TrackerError::BadRequest("inactive".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(TrackerError::Validation(
                habit_core::ValidationError::InvalidTargetDays(0)
            )),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            ApiError::Unauthorized("missing".to_string())
                .into_response()
                .status(),
            StatusCode::UNAUTHORIZED
        );
    }
}
