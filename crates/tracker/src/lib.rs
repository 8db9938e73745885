//! Habit tracking services.
//!
//! - [`ExecutionRecorder`] records daily outcomes and moves streak counters
//! - [`HabitService`] and [`UserService`] manage habits and accounts
//! - [`ReminderScheduler`] queues due reminders once per minute
//! - [`DeliveryWorker`] sends queued reminders
//! - [`StreakMaintenanceJob`] resets streaks that missed a day
//! - [`runner`] drives the two background jobs

pub mod config;
pub mod delivery;
pub mod error;
pub mod habits;
pub mod maintenance;
pub mod recorder;
pub mod reminders;
pub mod runner;
pub mod users;

#[cfg(test)]
mod testing;

pub use config::{ConfigError, HabitDefaults, SchedulerConfig};
pub use delivery::{reminder_queue, DeliveryReport, DeliveryWorker};
pub use error::{Result, TrackerError};
pub use habits::{CreateHabit, HabitService, HabitUpdate, HabitView};
pub use maintenance::StreakMaintenanceJob;
pub use recorder::ExecutionRecorder;
pub use reminders::{ReminderReport, ReminderScheduler};
pub use runner::{run_periodic, PeriodicJob, Schedule};
pub use users::UserService;
