//! Per-minute reminder scan across user timezones.
//!
//! A run scans every minute since the previous run, so a late tick or a
//! wall-clock jump does not lose a reminder minute. Minutes older than the
//! catch-up window are dropped with a warning. Due reminders are queued for
//! the [`DeliveryWorker`](crate::delivery::DeliveryWorker) and the scan never
//! waits on a send.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Timelike, Utc};
use database::{habit, Database, DueHabit};
use habit_core::{idempotency_key, reminder_text, LocalMoment, TimeResolver};
use notifier::ReminderJob;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::error::{Result, TrackerError};
use crate::runner::{PeriodicJob, Schedule};

/// Past minutes a run still scans after a late tick.
pub const DEFAULT_CATCH_UP_MINUTES: i64 = 15;

/// Counters for one reminder scan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReminderReport {
    /// Minutes scanned.
    pub minutes: usize,
    /// Timezones scanned per minute.
    pub timezones: usize,
    /// Timezone scans that failed.
    pub failed_timezones: usize,
    /// Habits found due.
    pub due_habits: usize,
    /// Jobs handed to the delivery queue, one per user and minute.
    pub queued: usize,
}

/// Finds habits due in each timezone and queues one reminder per user.
#[derive(Clone)]
pub struct ReminderScheduler {
    db: Database,
    resolver: TimeResolver,
    queue: mpsc::Sender<ReminderJob>,
    catch_up: Duration,
    last_scanned: Arc<Mutex<Option<DateTime<Utc>>>>,
}

impl ReminderScheduler {
    pub fn new(db: Database, resolver: TimeResolver, queue: mpsc::Sender<ReminderJob>) -> Self {
        Self {
            db,
            resolver,
            queue,
            catch_up: Duration::minutes(DEFAULT_CATCH_UP_MINUTES),
            last_scanned: Arc::default(),
        }
    }

    /// Limit how many past minutes a late run scans.
    pub fn with_catch_up(mut self, minutes: i64) -> Self {
        self.catch_up = Duration::minutes(minutes.max(0));
        self
    }

    /// Reminder times match to the minute, so the scan runs on every minute.
    pub fn schedule() -> Schedule {
        Schedule::every(std::time::Duration::from_secs(60)).aligned_to_minute()
    }

    /// Run one scan. A failing timezone does not stop the others.
    pub async fn run_once(&self) -> Result<ReminderReport> {
        let current = minute_of(self.resolver.now());
        let minutes = self.minutes_to_scan(current);
        let mut report = ReminderReport {
            minutes: minutes.len(),
            ..Default::default()
        };
        if minutes.is_empty() {
            return Ok(report);
        }

        let zones = habit::active_timezones(self.db.pool()).await?;
        *self.last_scanned() = Some(current);
        report.timezones = zones.len();

        for minute in &minutes {
            for timezone in &zones {
                if let Err(e) = self.scan_timezone(timezone, *minute, &mut report).await {
                    report.failed_timezones += 1;
                    error!(
                        timezone = %timezone,
                        minute = %minute,
                        error = %e,
                        "Reminder scan failed for timezone"
                    );
                }
            }
        }

        if report.due_habits > 0 || report.minutes > 1 {
            info!(
                minutes = report.minutes,
                due = report.due_habits,
                queued = report.queued,
                failed_timezones = report.failed_timezones,
                "Reminder scan complete"
            );
        }
        Ok(report)
    }

    /// Minutes from the one after the last scan up to `current`.
    fn minutes_to_scan(&self, current: DateTime<Utc>) -> Vec<DateTime<Utc>> {
        let last = *self.last_scanned();
        let first = match last {
            None => current,
            Some(prev) if prev == current => return Vec::new(),
            Some(prev) if prev > current => {
                warn!(last = %prev, now = %current, "Clock moved backwards, rescanning from now");
                current
            }
            Some(prev) => {
                let next = prev + Duration::minutes(1);
                let earliest = current - self.catch_up;
                if next < earliest {
                    warn!(
                        from = %next,
                        until = %earliest,
                        "Reminder minutes outside the catch-up window skipped"
                    );
                    earliest
                } else {
                    next
                }
            }
        };

        let mut minutes = Vec::new();
        let mut minute = first;
        while minute <= current {
            minutes.push(minute);
            minute += Duration::minutes(1);
        }
        minutes
    }

    async fn scan_timezone(
        &self,
        timezone: &str,
        minute: DateTime<Utc>,
        report: &mut ReminderReport,
    ) -> Result<()> {
        let moment = LocalMoment::at(minute, self.resolver.zone(timezone));
        let due =
            habit::habits_due_for_reminder(self.db.pool(), timezone, moment.time, moment.date)
                .await?;
        debug!(
            timezone = %timezone,
            local_time = %moment.time,
            due = due.len(),
            "Scanned timezone"
        );
        report.due_habits += due.len();

        for job in batch_by_user(&due, moment) {
            self.queue
                .send(job)
                .await
                .map_err(|_| TrackerError::QueueClosed)?;
            report.queued += 1;
        }

        Ok(())
    }

    fn last_scanned(&self) -> MutexGuard<'_, Option<DateTime<Utc>>> {
        self.last_scanned.lock().unwrap_or_else(|e| e.into_inner())
    }
}

fn minute_of(instant: DateTime<Utc>) -> DateTime<Utc> {
    instant
        .with_second(0)
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(instant)
}

/// One job per user, listing all of that user's due habits.
fn batch_by_user(due: &[DueHabit], moment: LocalMoment) -> Vec<ReminderJob> {
    let mut by_user: BTreeMap<i64, (i64, Vec<&DueHabit>)> = BTreeMap::new();
    for item in due {
        by_user
            .entry(item.user_id)
            .or_insert_with(|| (item.telegram_id, Vec::new()))
            .1
            .push(item);
    }

    by_user
        .into_values()
        .map(|(chat_id, habits)| {
            let names: Vec<&str> = habits.iter().map(|h| h.habit_name.as_str()).collect();
            ReminderJob {
                chat_id,
                text: reminder_text(&names),
                keys: habits
                    .iter()
                    .map(|h| idempotency_key(h.habit_id, moment.date, moment.time))
                    .collect(),
            }
        })
        .collect()
}

#[async_trait]
impl PeriodicJob for ReminderScheduler {
    fn name(&self) -> &'static str {
        "reminders"
    }

    async fn run(&self) -> Result<()> {
        self.run_once().await.map(|_| ())
    }
}
