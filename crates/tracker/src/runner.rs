//! Periodic background loops.
//!
//! Each loop awaits its job before waiting for the next tick, and ticks
//! missed while a run was in progress are skipped. A job therefore never
//! overlaps with itself.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Timelike, Utc};
use tokio::sync::watch;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, error, info};

use crate::error::Result;

/// A job run on a fixed period.
#[async_trait]
pub trait PeriodicJob: Send + Sync {
    /// Name used in logs.
    fn name(&self) -> &'static str;

    /// Run once. Errors are logged by the runner and the loop continues.
    async fn run(&self) -> Result<()>;
}

/// When a periodic job runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Schedule {
    pub every: Duration,
    /// Start on the next wall-clock minute boundary.
    pub align_to_minute: bool,
}

impl Schedule {
    pub fn every(every: Duration) -> Self {
        Self {
            every,
            align_to_minute: false,
        }
    }

    pub fn aligned_to_minute(mut self) -> Self {
        self.align_to_minute = true;
        self
    }
}

/// Time from `now` until the next whole minute.
pub fn delay_to_next_minute(now: DateTime<Utc>) -> Duration {
    let into_minute = Duration::from_secs(u64::from(now.second()))
        + Duration::from_nanos(u64::from(now.nanosecond() % 1_000_000_000));
    if into_minute.is_zero() {
        return Duration::ZERO;
    }
    Duration::from_secs(60).saturating_sub(into_minute)
}

/// Run `job` on `schedule` until `shutdown` flips to `true`.
pub async fn run_periodic(
    job: Arc<dyn PeriodicJob>,
    schedule: Schedule,
    mut shutdown: watch::Receiver<bool>,
) {
    let start = if schedule.align_to_minute {
        Instant::now() + delay_to_next_minute(Utc::now())
    } else {
        Instant::now()
    };
    let mut ticker = interval_at(start, schedule.every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    info!(job = job.name(), every_secs = schedule.every.as_secs(), "Starting periodic job");

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
                continue;
            }
        }

        debug!(job = job.name(), "Running periodic job");
        if let Err(e) = job.run().await {
            error!(job = job.name(), error = %e, "Periodic job failed");
        }

        if *shutdown.borrow() {
            break;
        }
    }

    info!(job = job.name(), "Periodic job stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TrackerError;
    use chrono::TimeZone;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingJob {
        runs: AtomicUsize,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl PeriodicJob for CountingJob {
        fn name(&self) -> &'static str {
            "counting"
        }

        async fn run(&self) -> Result<()> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);
            // Longer than the period
            tokio::time::sleep(Duration::from_secs(25)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            self.runs.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(TrackerError::BadRequest("boom".to_string()));
            }
            Ok(())
        }
    }

    #[test]
    fn test_delay_to_next_minute() {
        let at = |s| Utc.with_ymd_and_hms(2026, 10, 19, 9, 0, s).unwrap();
        assert_eq!(delay_to_next_minute(at(0)), Duration::ZERO);
        assert_eq!(delay_to_next_minute(at(45)), Duration::from_secs(15));
        assert_eq!(delay_to_next_minute(at(59)), Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_runs_never_overlap() {
        let job = Arc::new(CountingJob::default());
        let (tx, rx) = watch::channel(false);
        let handle = tokio::spawn(run_periodic(
            job.clone(),
            Schedule::every(Duration::from_secs(10)),
            rx,
        ));

        tokio::time::sleep(Duration::from_secs(100)).await;
        tx.send(true).unwrap();
        handle.await.unwrap();

        assert_eq!(job.max_in_flight.load(Ordering::SeqCst), 1);
        let runs = job.runs.load(Ordering::SeqCst);
        assert!((3..=4).contains(&runs), "runs = {}", runs);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failures_do_not_stop_the_loop() {
        let job = Arc::new(CountingJob {
            fail: true,
            ..Default::default()
        });
        let (tx, rx) = watch::channel(false);
        let handle = tokio::spawn(run_periodic(
            job.clone(),
            Schedule::every(Duration::from_secs(30)),
            rx,
        ));

        tokio::time::sleep(Duration::from_secs(70)).await;
        tx.send(true).unwrap();
        handle.await.unwrap();

        assert!(job.runs.load(Ordering::SeqCst) >= 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stops_while_idle() {
        let job = Arc::new(CountingJob::default());
        let (tx, rx) = watch::channel(false);
        let handle = tokio::spawn(run_periodic(
            job.clone(),
            Schedule::every(Duration::from_secs(3600)),
            rx,
        ));

        // Let the immediate first tick start its run and finish
        tokio::time::sleep(Duration::from_secs(30)).await;
        tx.send(true).unwrap();
        handle.await.unwrap();

        assert_eq!(job.runs.load(Ordering::SeqCst), 1);
    }
}
