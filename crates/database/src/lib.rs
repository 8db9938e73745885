//! SQLite persistence layer for the habit tracker.
//!
//! This crate provides async database operations for users, habits and
//! their daily executions using SQLx with SQLite, plus the set-based
//! queries used by the reminder scheduler and the streak maintenance job.
//!
//! # Example
//!
//! ```no_run
//! use chrono::NaiveTime;
//! use database::{habit, user, Database, NewHabit, NewUser};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Connect and run migrations
//!     let db = Database::connect("sqlite:habits.db?mode=rwc").await?;
//!     db.migrate().await?;
//!
//!     let owner = user::upsert_user(
//!         db.pool(),
//!         &NewUser { telegram_id: 555, ..Default::default() },
//!     )
//!     .await?;
//!
//!     habit::create_habit(
//!         db.pool(),
//!         &NewHabit {
//!             user_id: owner.id,
//!             name: "Read".to_string(),
//!             description: None,
//!             target_days: 21,
//!             time_to_remind: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
//!         },
//!     )
//!     .await?;
//!
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod execution;
pub mod habit;
pub mod models;
pub mod user;

pub use error::{DatabaseError, Result};
pub use models::{DueHabit, Execution, ExecutionFilter, Habit, NewHabit, NewUser, User};

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Sqlite, SqlitePool, Transaction};
use std::str::FromStr;
use std::time::Duration;

/// Database connection wrapper.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Default pool size for database connections.
    const DEFAULT_POOL_SIZE: u32 = 10;

    /// How long a writer waits for the SQLite write lock.
    const BUSY_TIMEOUT: Duration = Duration::from_secs(10);

    /// Connect to a SQLite database.
    ///
    /// The URL should be in the format `sqlite:path/to/db.sqlite?mode=rwc`.
    /// Use `?mode=rwc` to create the database file if it doesn't exist.
    ///
    /// # Example
    ///
    /// ```no_run
    /// # async fn example() -> database::Result<()> {
    /// // File database
    /// let db = database::Database::connect("sqlite:data/habits.db?mode=rwc").await?;
    ///
    /// // In-memory database (for testing)
    /// let db = database::Database::connect("sqlite::memory:").await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn connect(url: &str) -> Result<Self> {
        Self::connect_with_pool_size(url, Self::DEFAULT_POOL_SIZE).await
    }

    /// Connect to a SQLite database with a custom pool size.
    pub async fn connect_with_pool_size(url: &str, pool_size: u32) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .foreign_keys(true)
            .busy_timeout(Self::BUSY_TIMEOUT);

        let pool = SqlitePoolOptions::new()
            .max_connections(pool_size)
            .acquire_timeout(Duration::from_secs(30))
            .connect_with(options)
            .await?;

        tracing::info!(
            "Connected to database: {} (pool size: {})",
            url,
            pool_size
        );

        Ok(Self { pool })
    }

    /// Run database migrations.
    ///
    /// This should be called once after connecting to ensure the schema is up to date.
    pub async fn migrate(&self) -> Result<()> {
        tracing::info!("Running database migrations...");

        sqlx::migrate!("./migrations").run(&self.pool).await?;

        tracing::info!("Migrations complete");
        Ok(())
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Start a transaction.
    pub async fn begin(&self) -> Result<Transaction<'static, Sqlite>> {
        Ok(self.pool.begin().await?)
    }

    /// Close the database connection pool.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

/// Turn a plain file path into a SQLite URL; URLs pass through unchanged.
pub fn sqlite_url_from_path(path: &str) -> String {
    if path.starts_with("sqlite:") {
        path.to_string()
    } else {
        format!("sqlite:{}?mode=rwc", path)
    }
}
