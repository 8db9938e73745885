//! Database models.

use chrono::{NaiveDate, NaiveTime};
use habit_core::{ExecutionStatus, StreakCounters};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A user of the bot, identified by their Telegram ID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct User {
    /// Internal ID.
    pub id: i64,
    /// Telegram user ID (also the chat ID for private messages).
    pub telegram_id: i64,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    /// IANA timezone name (e.g., "Europe/Moscow"). Defaults to "UTC".
    pub timezone: String,
    pub is_active: bool,
    /// Set once Telegram reports that the user blocked the bot.
    pub is_bot_blocked: bool,
    pub created_at: String,
    pub updated_at: String,
}

/// Profile data used to register a user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewUser {
    pub telegram_id: i64,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    /// Stored as "UTC" when absent.
    pub timezone: Option<String>,
}

/// A daily habit owned by one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Habit {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub description: Option<String>,
    /// Days needed to form the habit.
    pub target_days: i64,
    /// Local reminder time in the owner's timezone.
    pub time_to_remind: NaiveTime,
    pub is_active: bool,
    pub current_streak: i64,
    pub max_streak: i64,
    pub created_at: String,
    pub updated_at: String,
}

impl Habit {
    /// The streak counters as a value for the streak rules.
    pub fn counters(&self) -> StreakCounters {
        StreakCounters::new(self.current_streak, self.max_streak)
    }
}

/// Fields for inserting a habit. Streaks always start at zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewHabit {
    pub user_id: i64,
    pub name: String,
    pub description: Option<String>,
    pub target_days: i64,
    pub time_to_remind: NaiveTime,
}

/// The outcome of a habit on one local calendar date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Execution {
    pub id: i64,
    pub habit_id: i64,
    pub execution_date: NaiveDate,
    #[sqlx(try_from = "String")]
    pub status: ExecutionStatus,
    pub created_at: String,
    pub updated_at: String,
}

/// Filter for listing a habit's executions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionFilter {
    pub status: Option<ExecutionStatus>,
    /// Inclusive lower bound.
    pub start_date: Option<NaiveDate>,
    /// Inclusive upper bound.
    pub end_date: Option<NaiveDate>,
    pub skip: i64,
    pub limit: i64,
}

impl Default for ExecutionFilter {
    fn default() -> Self {
        Self {
            status: None,
            start_date: None,
            end_date: None,
            skip: 0,
            limit: 100,
        }
    }
}

/// A habit whose reminder is due, joined with its owner's chat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct DueHabit {
    pub habit_id: i64,
    pub habit_name: String,
    pub user_id: i64,
    pub telegram_id: i64,
}
