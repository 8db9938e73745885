//! Configuration loaded from environment variables.

use std::env;
use std::net::SocketAddr;

use tracker::config::database_url_from_env;
use tracker::HabitDefaults;

/// API server configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server bind address.
    pub addr: SocketAddr,
    /// SQLite database URL.
    pub database_url: String,
    /// Defaults for new habits.
    pub habit_defaults: HabitDefaults,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// | Variable | Description | Default |
    /// |----------|-------------|---------|
    /// | `API_ADDR` | Server bind address | `127.0.0.1:8000` |
    /// | `SQLITE_PATH` | SQLite path or URL | `sqlite:habits.db?mode=rwc` |
    /// | `DAYS_TO_FORM_HABIT` | Default target days for new habits | `21` |
    pub fn from_env() -> Result<Self, ConfigError> {
        let addr = env::var("API_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:8000".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidAddr)?;

        let database_url = database_url_from_env();
        let habit_defaults = HabitDefaults::from_env()?;

        Ok(Self {
            addr,
            database_url,
            habit_defaults,
        })
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid API_ADDR format")]
    InvalidAddr,

    #[error(transparent)]
    Tracker(#[from] tracker::ConfigError),
}
