//! Reminder delivery: duplicate suppression and rate-limit retries.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::dedup::{DedupStore, DEFAULT_DEDUP_TTL};
use crate::error::{NotifyError, Result};
use crate::sender::Notifier;

/// One outbound message for one chat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReminderJob {
    pub chat_id: i64,
    pub text: String,
    /// Idempotency keys covered by this message, one per habit.
    pub keys: Vec<String>,
}

/// What happened to a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// The message went out.
    Sent,
    /// Every key was already claimed; nothing was sent.
    Duplicate,
    /// The recipient blocked the bot.
    Blocked,
}

/// Delivery settings.
#[derive(Debug, Clone)]
pub struct DispatchConfig {
    /// Retries after a rate-limit response.
    pub max_retries: u32,
    /// Lifetime of a claimed idempotency key.
    pub dedup_ttl: Duration,
    /// Upper bound on a single retry wait.
    pub max_retry_wait: Duration,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            dedup_ttl: DEFAULT_DEDUP_TTL,
            max_retry_wait: Duration::from_secs(60),
        }
    }
}

/// Delivers reminder jobs at most once per idempotency key.
#[derive(Clone)]
pub struct Dispatcher {
    notifier: Arc<dyn Notifier>,
    dedup: Arc<dyn DedupStore>,
    config: DispatchConfig,
}

impl Dispatcher {
    pub fn new(
        notifier: Arc<dyn Notifier>,
        dedup: Arc<dyn DedupStore>,
        config: DispatchConfig,
    ) -> Self {
        Self {
            notifier,
            dedup,
            config,
        }
    }

    /// Deliver a job.
    ///
    /// Keys are claimed before sending. The message goes out if at least
    /// one key was free. If delivery fails for any reason other than a
    /// block, the keys claimed here are released so a later attempt can
    /// send again.
    pub async fn deliver(&self, job: &ReminderJob) -> Result<DeliveryOutcome> {
        let mut claimed = Vec::with_capacity(job.keys.len());
        for key in &job.keys {
            if self.dedup.claim(key, self.config.dedup_ttl).await {
                claimed.push(key.as_str());
            }
        }

        if claimed.is_empty() && !job.keys.is_empty() {
            debug!(chat_id = job.chat_id, "Skipping duplicate reminder");
            return Ok(DeliveryOutcome::Duplicate);
        }

        match self.send_with_retry(job).await {
            Ok(()) => {
                info!(chat_id = job.chat_id, keys = claimed.len(), "Reminder sent");
                Ok(DeliveryOutcome::Sent)
            }
            Err(NotifyError::Blocked { chat_id }) => {
                warn!(chat_id, "Recipient blocked the bot");
                Ok(DeliveryOutcome::Blocked)
            }
            Err(e) => {
                for key in claimed {
                    self.dedup.release(key).await;
                }
                Err(e)
            }
        }
    }

    async fn send_with_retry(&self, job: &ReminderJob) -> Result<()> {
        let mut attempt = 0;
        loop {
            match self.notifier.send(job.chat_id, &job.text).await {
                Err(NotifyError::RetryAfter { seconds }) if attempt < self.config.max_retries => {
                    attempt += 1;
                    let wait = Duration::from_secs(seconds).min(self.config.max_retry_wait);
                    warn!(
                        chat_id = job.chat_id,
                        attempt,
                        wait_secs = wait.as_secs(),
                        "Rate limited, retrying"
                    );
                    tokio::time::sleep(wait).await;
                }
                Err(NotifyError::BadRequest(description)) => {
                    warn!(chat_id = job.chat_id, %description, "Telegram rejected reminder");
                    return Err(NotifyError::BadRequest(description));
                }
                other => return other,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dedup::MemoryDedupStore;
    use crate::sender::RecordingNotifier;

    fn job(chat_id: i64, keys: &[&str]) -> ReminderJob {
        ReminderJob {
            chat_id,
            text: "⏰ <b>Reminder!</b>".to_string(),
            keys: keys.iter().map(|k| k.to_string()).collect(),
        }
    }

    fn dispatcher(notifier: &RecordingNotifier, dedup: &Arc<MemoryDedupStore>) -> Dispatcher {
        Dispatcher::new(
            Arc::new(notifier.clone()),
            dedup.clone(),
            DispatchConfig::default(),
        )
    }

    #[tokio::test]
    async fn test_duplicate_job_is_suppressed() {
        let notifier = RecordingNotifier::new();
        let dedup = Arc::new(MemoryDedupStore::new());
        let dispatcher = dispatcher(&notifier, &dedup);
        let reminder = job(555, &["42_2026-10-19_0900"]);

        assert_eq!(dispatcher.deliver(&reminder).await.unwrap(), DeliveryOutcome::Sent);
        assert_eq!(
            dispatcher.deliver(&reminder).await.unwrap(),
            DeliveryOutcome::Duplicate
        );
        assert_eq!(notifier.sent().len(), 1);
    }

    #[tokio::test]
    async fn test_retries_rate_limited_send() {
        let notifier = RecordingNotifier::new();
        notifier.rate_limit(555, 2);
        let dedup = Arc::new(MemoryDedupStore::new());
        let dispatcher = dispatcher(&notifier, &dedup);

        let outcome = dispatcher.deliver(&job(555, &["k"])).await.unwrap();
        assert_eq!(outcome, DeliveryOutcome::Sent);
        assert_eq!(notifier.attempts(), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_retries_and_releases_keys() {
        let notifier = RecordingNotifier::new();
        notifier.rate_limit(555, 10);
        let dedup = Arc::new(MemoryDedupStore::new());
        let dispatcher = dispatcher(&notifier, &dedup);

        let result = dispatcher.deliver(&job(555, &["k"])).await;
        assert!(matches!(result, Err(NotifyError::RetryAfter { .. })));
        assert_eq!(notifier.attempts(), 4);
        assert!(dedup.is_empty());
    }

    #[tokio::test]
    async fn test_blocked_keeps_claim() {
        let notifier = RecordingNotifier::new();
        notifier.block(555);
        let dedup = Arc::new(MemoryDedupStore::new());
        let dispatcher = dispatcher(&notifier, &dedup);

        let outcome = dispatcher.deliver(&job(555, &["k"])).await.unwrap();
        assert_eq!(outcome, DeliveryOutcome::Blocked);
        assert_eq!(dedup.len(), 1);
    }

    #[tokio::test]
    async fn test_bad_request_is_not_retried() {
        let notifier = RecordingNotifier::new();
        notifier.reject(555);
        let dedup = Arc::new(MemoryDedupStore::new());
        let dispatcher = dispatcher(&notifier, &dedup);

        let result = dispatcher.deliver(&job(555, &["k"])).await;
        assert!(matches!(result, Err(NotifyError::BadRequest(_))));
        assert_eq!(notifier.attempts(), 1);
        assert!(dedup.is_empty());
    }

    #[tokio::test]
    async fn test_partially_claimed_batch_still_sends() {
        let notifier = RecordingNotifier::new();
        let dedup = Arc::new(MemoryDedupStore::new());
        let dispatcher = dispatcher(&notifier, &dedup);

        dispatcher.deliver(&job(555, &["a"])).await.unwrap();
        let outcome = dispatcher.deliver(&job(555, &["a", "b"])).await.unwrap();
        assert_eq!(outcome, DeliveryOutcome::Sent);
        assert_eq!(notifier.sent().len(), 2);
    }
}
