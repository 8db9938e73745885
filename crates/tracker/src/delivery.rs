//! Reminder delivery, off the scan path.
//!
//! The reminder scan only queues [`ReminderJob`]s. A [`DeliveryWorker`]
//! drains the queue and runs up to `concurrency` deliveries at once, so a
//! chat waiting out a rate-limit delay holds one slot and delays nobody else.

use std::sync::Arc;

use database::{user, Database};
use notifier::{DeliveryOutcome, Dispatcher, ReminderJob};
use tokio::sync::{mpsc, Semaphore};
use tokio::task::{JoinError, JoinSet};
use tracing::{error, info, warn};

/// Jobs that can wait in the queue before the scan has to wait for room.
pub const DEFAULT_QUEUE_SIZE: usize = 256;

/// Deliveries in flight at once.
pub const DEFAULT_DELIVERY_CONCURRENCY: usize = 8;

/// Create the queue between the reminder scan and the delivery worker.
pub fn reminder_queue(
    capacity: usize,
) -> (mpsc::Sender<ReminderJob>, mpsc::Receiver<ReminderJob>) {
    mpsc::channel(capacity.max(1))
}

/// Totals for a delivery worker's lifetime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeliveryReport {
    pub sent: usize,
    pub duplicates: usize,
    pub blocked: usize,
    /// Jobs whose delivery failed for a reason other than a block.
    pub failed: usize,
}

impl DeliveryReport {
    fn record(&mut self, done: std::result::Result<Option<DeliveryOutcome>, JoinError>) {
        match done {
            Ok(Some(DeliveryOutcome::Sent)) => self.sent += 1,
            Ok(Some(DeliveryOutcome::Duplicate)) => self.duplicates += 1,
            Ok(Some(DeliveryOutcome::Blocked)) => self.blocked += 1,
            Ok(None) => self.failed += 1,
            Err(e) => {
                error!(error = %e, "Reminder delivery task panicked");
                self.failed += 1;
            }
        }
    }
}

/// Delivers queued reminders and flags users who blocked the bot.
#[derive(Clone)]
pub struct DeliveryWorker {
    db: Database,
    dispatcher: Dispatcher,
    limit: Arc<Semaphore>,
}

impl DeliveryWorker {
    pub fn new(db: Database, dispatcher: Dispatcher, concurrency: usize) -> Self {
        Self {
            db,
            dispatcher,
            limit: Arc::new(Semaphore::new(concurrency.max(1))),
        }
    }

    /// Deliver jobs until every sender is dropped, then wait for the
    /// deliveries still in flight.
    pub async fn run(self, mut jobs: mpsc::Receiver<ReminderJob>) -> DeliveryReport {
        let mut report = DeliveryReport::default();
        let mut in_flight = JoinSet::new();

        loop {
            tokio::select! {
                Some(done) = in_flight.join_next(), if !in_flight.is_empty() => {
                    report.record(done);
                }
                job = jobs.recv() => {
                    let Some(job) = job else { break };
                    let Ok(permit) = self.limit.clone().acquire_owned().await else {
                        break;
                    };
                    let worker = self.clone();
                    in_flight.spawn(async move {
                        let outcome = worker.deliver(job).await;
                        drop(permit);
                        outcome
                    });
                }
            }
        }

        while let Some(done) = in_flight.join_next().await {
            report.record(done);
        }

        info!(
            sent = report.sent,
            duplicates = report.duplicates,
            blocked = report.blocked,
            failed = report.failed,
            "Reminder delivery stopped"
        );
        report
    }

    /// Deliver one job. `None` means it failed and its keys were released.
    async fn deliver(&self, job: ReminderJob) -> Option<DeliveryOutcome> {
        match self.dispatcher.deliver(&job).await {
            Ok(DeliveryOutcome::Blocked) => {
                self.mark_blocked(job.chat_id).await;
                Some(DeliveryOutcome::Blocked)
            }
            Ok(outcome) => Some(outcome),
            Err(e) => {
                error!(chat_id = job.chat_id, error = %e, "Reminder delivery failed");
                None
            }
        }
    }

    async fn mark_blocked(&self, telegram_id: i64) {
        match user::set_bot_blocked(self.db.pool(), telegram_id, true).await {
            Ok(_) => warn!(telegram_id, "User blocked the bot, reminders disabled"),
            Err(e) => error!(telegram_id, error = %e, "Failed to mark user as blocked"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{dispatcher, seed_user, test_db};
    use notifier::RecordingNotifier;

    fn job(chat_id: i64, key: &str) -> ReminderJob {
        ReminderJob {
            chat_id,
            text: "⏰ <b>Reminder!</b>".to_string(),
            keys: vec![key.to_string()],
        }
    }

    #[tokio::test]
    async fn test_blocked_user_is_flagged_and_others_still_served() {
        let db = test_db().await;
        for telegram_id in [1, 2, 3] {
            seed_user(&db, telegram_id, "UTC").await;
        }
        let notifier = RecordingNotifier::new();
        notifier.block(1);
        notifier.reject(2);

        let worker = DeliveryWorker::new(db.clone(), dispatcher(&notifier), 4);
        let (tx, rx) = reminder_queue(8);
        for chat_id in [1, 2, 3] {
            tx.send(job(chat_id, &format!("{}_2026-10-19_0900", chat_id)))
                .await
                .unwrap();
        }
        drop(tx);

        let report = worker.run(rx).await;
        assert_eq!(
            report,
            DeliveryReport {
                sent: 1,
                duplicates: 0,
                blocked: 1,
                failed: 1,
            }
        );
        assert_eq!(notifier.sent()[0].chat_id, 3);

        let flagged = user::get_user_by_telegram_id(db.pool(), 1).await.unwrap();
        assert!(flagged.is_bot_blocked);
        let rejected = user::get_user_by_telegram_id(db.pool(), 2).await.unwrap();
        assert!(!rejected.is_bot_blocked);
    }

    #[tokio::test]
    async fn test_duplicate_jobs_are_suppressed() {
        let db = test_db().await;
        let notifier = RecordingNotifier::new();
        let worker = DeliveryWorker::new(db, dispatcher(&notifier), 1);

        let (tx, rx) = reminder_queue(8);
        tx.send(job(555, "42_2026-10-19_0900")).await.unwrap();
        tx.send(job(555, "42_2026-10-19_0900")).await.unwrap();
        drop(tx);

        let report = worker.run(rx).await;
        assert_eq!(report.sent, 1);
        assert_eq!(report.duplicates, 1);
        assert_eq!(notifier.sent().len(), 1);
    }

    #[tokio::test]
    async fn test_rate_limited_chat_does_not_hold_up_others() {
        let db = test_db().await;
        let notifier = RecordingNotifier::new();
        // Far longer than this test is willing to wait
        notifier.rate_limit_for(1, u32::MAX, 60);
        let worker = DeliveryWorker::new(db, dispatcher(&notifier), 4);

        let (tx, rx) = reminder_queue(8);
        let handle = tokio::spawn(worker.run(rx));
        tx.send(job(1, "1_2026-10-19_0900")).await.unwrap();
        for chat_id in [2, 3] {
            tx.send(job(chat_id, &format!("{}_2026-10-19_0900", chat_id)))
                .await
                .unwrap();
        }

        let served = tokio::time::timeout(std::time::Duration::from_secs(5), async {
            while notifier.sent().len() < 2 {
                tokio::time::sleep(std::time::Duration::from_millis(10)).await;
            }
        })
        .await;
        assert!(served.is_ok(), "other chats waited on the rate limit");

        let chats: Vec<i64> = notifier.sent().iter().map(|m| m.chat_id).collect();
        assert!(chats.contains(&2) && chats.contains(&3));
        handle.abort();
    }
}
