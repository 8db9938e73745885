//! Notifier trait and implementations.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::client::TelegramClient;
use crate::error::{NotifyError, Result};

/// Trait for delivering a text message to a chat.
///
/// Abstracted to support different transports (Telegram, tests, etc.)
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Send an HTML-formatted message.
    ///
    /// # Arguments
    /// * `chat_id` - Telegram chat ID (the user's Telegram ID for private chats)
    /// * `text` - Message content
    async fn send(&self, chat_id: i64, text: &str) -> Result<()>;
}

#[async_trait]
impl Notifier for TelegramClient {
    async fn send(&self, chat_id: i64, text: &str) -> Result<()> {
        self.send_message(chat_id, text).await.map(|_| ())
    }
}

/// A notifier that only logs, for running the scheduler without a bot.
#[derive(Debug, Clone, Default)]
pub struct LoggingNotifier;

#[async_trait]
impl Notifier for LoggingNotifier {
    async fn send(&self, chat_id: i64, text: &str) -> Result<()> {
        tracing::info!("[dry-run] Message to {}: {}", chat_id, text);
        Ok(())
    }
}

/// A message captured by [`RecordingNotifier`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentNotification {
    pub chat_id: i64,
    pub text: String,
}

#[derive(Debug, Default)]
struct RecordingState {
    sent: Vec<SentNotification>,
    blocked: HashSet<i64>,
    rate_limited: HashMap<i64, (u32, u64)>,
    rejected: HashSet<i64>,
    attempts: u32,
}

/// A notifier for tests that records deliveries and can simulate failures.
#[derive(Debug, Clone, Default)]
pub struct RecordingNotifier {
    state: Arc<Mutex<RecordingState>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer every send to `chat_id` as blocked.
    pub fn block(&self, chat_id: i64) {
        self.lock().blocked.insert(chat_id);
    }

    /// Answer the next `times` sends to `chat_id` with a zero-second retry-after.
    pub fn rate_limit(&self, chat_id: i64, times: u32) {
        self.rate_limit_for(chat_id, times, 0);
    }

    /// Like [`rate_limit`](Self::rate_limit), asking the caller to wait `seconds`.
    pub fn rate_limit_for(&self, chat_id: i64, times: u32, seconds: u64) {
        self.lock().rate_limited.insert(chat_id, (times, seconds));
    }

    /// Answer every send to `chat_id` with a bad request.
    pub fn reject(&self, chat_id: i64) {
        self.lock().rejected.insert(chat_id);
    }

    /// Successfully delivered messages, in order.
    pub fn sent(&self) -> Vec<SentNotification> {
        self.lock().sent.clone()
    }

    /// Number of send calls, including failed ones.
    pub fn attempts(&self) -> u32 {
        self.lock().attempts
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, RecordingState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, chat_id: i64, text: &str) -> Result<()> {
        let mut state = self.lock();
        state.attempts += 1;

        if state.blocked.contains(&chat_id) {
            return Err(NotifyError::Blocked { chat_id });
        }
        if state.rejected.contains(&chat_id) {
            return Err(NotifyError::BadRequest("chat not found".to_string()));
        }
        if let Some((remaining, seconds)) = state.rate_limited.get_mut(&chat_id) {
            if *remaining > 0 {
                *remaining -= 1;
                return Err(NotifyError::RetryAfter { seconds: *seconds });
            }
        }

        state.sent.push(SentNotification {
            chat_id,
            text: text.to_string(),
        });
        Ok(())
    }
}
