//! Configuration loaded from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use notifier::{DispatchConfig, TelegramConfig, DEFAULT_API_URL, DEFAULT_DEDUP_TTL};

use crate::delivery::DEFAULT_DELIVERY_CONCURRENCY;

/// Default number of days it takes to form a habit.
pub const DEFAULT_TARGET_DAYS: i64 = 21;

/// Values applied to new habits when the caller leaves them out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HabitDefaults {
    pub target_days: i64,
}

impl Default for HabitDefaults {
    fn default() -> Self {
        Self {
            target_days: DEFAULT_TARGET_DAYS,
        }
    }
}

impl HabitDefaults {
    /// Load from `DAYS_TO_FORM_HABIT` (default: 21).
    pub fn from_env() -> Result<Self, ConfigError> {
        let target_days = parse_var("DAYS_TO_FORM_HABIT", DEFAULT_TARGET_DAYS)?;
        if target_days <= 0 {
            return Err(ConfigError::Invalid {
                var: "DAYS_TO_FORM_HABIT",
                value: target_days.to_string(),
            });
        }
        Ok(Self { target_days })
    }
}

/// Scheduler process configuration.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// SQLite database URL.
    pub database_url: String,
    /// Telegram Bot API settings.
    pub telegram: TelegramConfig,
    /// Log reminders instead of sending them.
    pub dry_run: bool,
    /// Period of the streak maintenance job.
    pub maintenance_interval: Duration,
    /// Delivery retry and dedup settings.
    pub dispatch: DispatchConfig,
    /// Reminders delivered at once.
    pub delivery_concurrency: usize,
}

impl SchedulerConfig {
    /// Load configuration from environment variables.
    ///
    /// | Variable | Description | Default |
    /// |----------|-------------|---------|
    /// | `SQLITE_PATH` | SQLite path or URL | `sqlite:habits.db?mode=rwc` |
    /// | `TELEGRAM_BOT_TOKEN` | Bot token | (required unless dry run) |
    /// | `TELEGRAM_API_URL` | Bot API base URL | `https://api.telegram.org` |
    /// | `NOTIFY_DRY_RUN` | Log reminders instead of sending | `false` |
    /// | `MAINTENANCE_INTERVAL_SECS` | Maintenance period | `3600` |
    /// | `NOTIFY_MAX_RETRIES` | Retries after a rate limit | `3` |
    /// | `NOTIFY_CONCURRENCY` | Reminders delivered at once | `8` |
    ///
    /// The reminder scan always runs once a minute.
    pub fn from_env() -> Result<Self, ConfigError> {
        let database_url = database_url_from_env();
        let dry_run = parse_bool("NOTIFY_DRY_RUN");

        let token = match env::var("TELEGRAM_BOT_TOKEN") {
            Ok(token) if !token.trim().is_empty() => token,
            _ if dry_run => String::from("dry-run"),
            _ => return Err(ConfigError::MissingBotToken),
        };
        let api_url = env::var("TELEGRAM_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string());

        let maintenance_secs: u64 = parse_var("MAINTENANCE_INTERVAL_SECS", 3600)?;
        let max_retries: u32 = parse_var("NOTIFY_MAX_RETRIES", 3)?;
        let delivery_concurrency: usize =
            parse_var("NOTIFY_CONCURRENCY", DEFAULT_DELIVERY_CONCURRENCY)?;

        Ok(Self {
            database_url,
            telegram: TelegramConfig::new(token).with_base_url(api_url),
            dry_run,
            maintenance_interval: Duration::from_secs(maintenance_secs.max(1)),
            dispatch: DispatchConfig {
                max_retries,
                dedup_ttl: DEFAULT_DEDUP_TTL,
                ..DispatchConfig::default()
            },
            delivery_concurrency: delivery_concurrency.max(1),
        })
    }
}

/// `SQLITE_PATH` as a sqlite URL (default: `sqlite:habits.db?mode=rwc`).
pub fn database_url_from_env() -> String {
    let path = env::var("SQLITE_PATH").unwrap_or_else(|_| "sqlite:habits.db?mode=rwc".to_string());
    database::sqlite_url_from_path(&path)
}

fn parse_var<T: FromStr>(var: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(var) {
        Ok(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { var, value }),
        Err(_) => Ok(default),
    }
}

fn parse_bool(var: &str) -> bool {
    env::var(var)
        .map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(false)
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("TELEGRAM_BOT_TOKEN environment variable is required")]
    MissingBotToken,

    #[error("Invalid value for {var}: {value}")]
    Invalid { var: &'static str, value: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_habit_defaults() {
        assert_eq!(HabitDefaults::default().target_days, 21);
    }

    #[test]
    fn test_parse_var_rejects_garbage() {
        std::env::set_var("TRACKER_TEST_INTERVAL", "soon");
        let result: Result<u64, _> = parse_var("TRACKER_TEST_INTERVAL", 60);
        assert!(matches!(result, Err(ConfigError::Invalid { .. })));

        std::env::set_var("TRACKER_TEST_INTERVAL", " 90 ");
        assert_eq!(parse_var::<u64>("TRACKER_TEST_INTERVAL", 60).unwrap(), 90);

        std::env::remove_var("TRACKER_TEST_INTERVAL");
        assert_eq!(parse_var::<u64>("TRACKER_TEST_INTERVAL", 60).unwrap(), 60);
    }
}
