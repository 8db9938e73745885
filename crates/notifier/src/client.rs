//! Telegram Bot API HTTP client.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::TelegramConfig;
use crate::error::{NotifyError, Result};

/// Fallback delay when a 429 response carries no `retry_after`.
const DEFAULT_RETRY_AFTER_SECS: u64 = 1;

/// `sendMessage` request body.
#[derive(Debug, Serialize)]
struct SendMessageRequest<'a> {
    chat_id: i64,
    text: &'a str,
    parse_mode: &'static str,
    disable_web_page_preview: bool,
}

/// Bot API response envelope.
#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
    error_code: Option<i64>,
    parameters: Option<ResponseParameters>,
}

#[derive(Debug, Deserialize)]
struct ResponseParameters {
    retry_after: Option<u64>,
}

/// The part of a sent message we care about.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SentMessage {
    pub message_id: i64,
}

/// Client for the Telegram Bot API.
#[derive(Debug, Clone)]
pub struct TelegramClient {
    http: Client,
    config: TelegramConfig,
}

impl TelegramClient {
    /// Create a client. No request is made until the first send.
    pub fn new(config: TelegramConfig) -> Result<Self> {
        if config.token.trim().is_empty() {
            return Err(NotifyError::Config("bot token is empty".to_string()));
        }

        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(NotifyError::Http)?;

        Ok(Self { http, config })
    }

    /// Send an HTML-formatted text message to a chat.
    pub async fn send_message(&self, chat_id: i64, text: &str) -> Result<SentMessage> {
        let request = SendMessageRequest {
            chat_id,
            text,
            parse_mode: "HTML",
            disable_web_page_preview: true,
        };

        debug!(chat_id, "Sending Telegram message");
        let response = self
            .http
            .post(self.config.method_url("sendMessage"))
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        let parsed = serde_json::from_str::<ApiResponse<SentMessage>>(&body);

        if status.is_success() {
            let envelope = parsed?;
            if envelope.ok {
                if let Some(message) = envelope.result {
                    return Ok(message);
                }
            }
            return Err(classify(chat_id, status.as_u16().into(), envelope));
        }

        match parsed {
            Ok(envelope) => Err(classify(chat_id, status.as_u16().into(), envelope)),
            Err(_) => {
                warn!(chat_id, status = %status, "Unparseable Telegram error response");
                Err(classify_code(chat_id, status.as_u16().into(), body, None))
            }
        }
    }
}

fn classify(chat_id: i64, http_code: i64, envelope: ApiResponse<SentMessage>) -> NotifyError {
    let code = envelope.error_code.unwrap_or(http_code);
    let description = envelope
        .description
        .unwrap_or_else(|| "no description".to_string());
    let retry_after = envelope.parameters.and_then(|p| p.retry_after);
    classify_code(chat_id, code, description, retry_after)
}

fn classify_code(
    chat_id: i64,
    code: i64,
    description: String,
    retry_after: Option<u64>,
) -> NotifyError {
    match code {
        403 => NotifyError::Blocked { chat_id },
        429 => NotifyError::RetryAfter {
            seconds: retry_after.unwrap_or(DEFAULT_RETRY_AFTER_SECS),
        },
        400 => NotifyError::BadRequest(description),
        _ => NotifyError::Api { code, description },
    }
}
