//! Error types for notification delivery.

use thiserror::Error;

/// Errors that can occur when delivering a notification.
#[derive(Debug, Error)]
pub enum NotifyError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The recipient blocked the bot (HTTP 403).
    #[error("Chat {chat_id} blocked the bot")]
    Blocked { chat_id: i64 },

    /// Rate limited; the request may be retried after the given delay (HTTP 429).
    #[error("Rate limited, retry after {seconds}s")]
    RetryAfter { seconds: u64 },

    /// The API rejected the request (HTTP 400).
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Any other error response from the API.
    #[error("API error {code}: {description}")]
    Api { code: i64, description: String },

    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Result type for notification operations.
pub type Result<T> = std::result::Result<T, NotifyError>;
