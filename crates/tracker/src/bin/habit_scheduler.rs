//! Background process: per-minute reminder scan, reminder delivery and
//! hourly streak maintenance.

use std::sync::Arc;

use database::Database;
use habit_core::TimeResolver;
use notifier::{Dispatcher, LoggingNotifier, MemoryDedupStore, Notifier, TelegramClient};
use tokio::sync::watch;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use tracker::delivery::DEFAULT_QUEUE_SIZE;
use tracker::{
    reminder_queue, run_periodic, DeliveryWorker, ReminderScheduler, Schedule, SchedulerConfig,
    StreakMaintenanceJob,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = SchedulerConfig::from_env()?;
    info!(
        maintenance_secs = config.maintenance_interval.as_secs(),
        dry_run = config.dry_run,
        delivery_concurrency = config.delivery_concurrency,
        "Starting habit scheduler"
    );

    let db = Database::connect(&config.database_url).await?;
    db.migrate().await?;

    let notifier: Arc<dyn Notifier> = if config.dry_run {
        warn!("NOTIFY_DRY_RUN set, reminders will only be logged");
        Arc::new(LoggingNotifier)
    } else {
        Arc::new(TelegramClient::new(config.telegram.clone())?)
    };
    let dispatcher = Dispatcher::new(
        notifier,
        Arc::new(MemoryDedupStore::new()),
        config.dispatch.clone(),
    );

    let (jobs_tx, jobs_rx) = reminder_queue(DEFAULT_QUEUE_SIZE);
    let worker = DeliveryWorker::new(db.clone(), dispatcher, config.delivery_concurrency);
    let delivery = tokio::spawn(worker.run(jobs_rx));

    let resolver = TimeResolver::system();
    let reminders = Arc::new(ReminderScheduler::new(
        db.clone(),
        resolver.clone(),
        jobs_tx,
    ));
    let maintenance = Arc::new(StreakMaintenanceJob::new(db.clone(), resolver));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let reminder_loop = tokio::spawn(run_periodic(
        reminders,
        ReminderScheduler::schedule(),
        shutdown_rx.clone(),
    ));
    let maintenance_loop = tokio::spawn(run_periodic(
        maintenance,
        Schedule::every(config.maintenance_interval),
        shutdown_rx,
    ));

    tokio::signal::ctrl_c().await?;
    info!("Shutdown requested, waiting for running jobs");
    let _ = shutdown_tx.send(true);

    // The scan loop owns the only queue sender; once it stops the worker
    // drains what is left and exits.
    let _ = reminder_loop.await;
    let _ = delivery.await;
    let _ = maintenance_loop.await;
    db.close().await;

    info!("Habit scheduler stopped");
    Ok(())
}
