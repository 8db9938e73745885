//! Habit persistence, including the scheduler and maintenance queries.

use chrono::{NaiveDate, NaiveTime};
use habit_core::{ExecutionStatus, StreakCounters};
use sqlx::{Executor, Sqlite, SqliteConnection};
use tracing::debug;

use crate::error::{DatabaseError, Result};
use crate::models::{DueHabit, Habit, NewHabit};

const HABIT_COLUMNS: &str = "id, user_id, name, description, target_days, time_to_remind, \
     is_active, current_streak, max_streak, created_at, updated_at";

/// Insert a habit with zeroed streaks.
pub async fn create_habit<'e, E>(executor: E, new_habit: &NewHabit) -> Result<Habit>
where
    E: Executor<'e, Database = Sqlite>,
{
    let habit = sqlx::query_as::<_, Habit>(&format!(
        r#"
        INSERT INTO habits (user_id, name, description, target_days, time_to_remind)
        VALUES (?, ?, ?, ?, ?)
        RETURNING {HABIT_COLUMNS}
        "#
    ))
    .bind(new_habit.user_id)
    .bind(&new_habit.name)
    .bind(&new_habit.description)
    .bind(new_habit.target_days)
    .bind(new_habit.time_to_remind)
    .fetch_one(executor)
    .await?;

    Ok(habit)
}

/// Get a habit by ID.
pub async fn get_habit<'e, E>(executor: E, id: i64) -> Result<Habit>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, Habit>(&format!("SELECT {HABIT_COLUMNS} FROM habits WHERE id = ?"))
        .bind(id)
        .fetch_optional(executor)
        .await?
        .ok_or_else(|| DatabaseError::not_found("Habit", id))
}

/// Read a habit inside a transaction and take the database write lock.
///
/// SQLite has no `SELECT ... FOR UPDATE`; a no-op `UPDATE ... RETURNING` as
/// the first statement of the transaction takes the write lock up front, so
/// a concurrent recorder for the same habit waits (busy timeout) until this
/// transaction commits or rolls back instead of reading stale counters.
pub async fn lock_habit(conn: &mut SqliteConnection, id: i64) -> Result<Habit> {
    let habit = sqlx::query_as::<_, Habit>(&format!(
        "UPDATE habits SET id = id WHERE id = ? RETURNING {HABIT_COLUMNS}"
    ))
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or_else(|| DatabaseError::not_found("Habit", id))?;

    debug!(habit_id = id, "Locked habit for update");
    Ok(habit)
}

/// List a user's habits.
///
/// Active-only lists are ordered by reminder time then name (the order the
/// bot shows them in); full lists are newest first.
pub async fn list_habits_for_user<'e, E>(
    executor: E,
    user_id: i64,
    active_only: bool,
    skip: i64,
    limit: i64,
) -> Result<Vec<Habit>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let sql = if active_only {
        format!(
            "SELECT {HABIT_COLUMNS} FROM habits WHERE user_id = ? AND is_active = 1 \
             ORDER BY time_to_remind ASC, name ASC LIMIT ? OFFSET ?"
        )
    } else {
        format!(
            "SELECT {HABIT_COLUMNS} FROM habits WHERE user_id = ? \
             ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?"
        )
    };

    let habits = sqlx::query_as::<_, Habit>(&sql)
        .bind(user_id)
        .bind(limit)
        .bind(skip)
        .fetch_all(executor)
        .await?;

    Ok(habits)
}

/// Write a habit's editable fields. Streak counters are not touched.
pub async fn update_habit<'e, E>(executor: E, habit: &Habit) -> Result<Habit>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, Habit>(&format!(
        r#"
        UPDATE habits
        SET name = ?, description = ?, target_days = ?, time_to_remind = ?,
            is_active = ?, updated_at = CURRENT_TIMESTAMP
        WHERE id = ?
        RETURNING {HABIT_COLUMNS}
        "#
    ))
    .bind(&habit.name)
    .bind(&habit.description)
    .bind(habit.target_days)
    .bind(habit.time_to_remind)
    .bind(habit.is_active)
    .bind(habit.id)
    .fetch_optional(executor)
    .await?
    .ok_or_else(|| DatabaseError::not_found("Habit", habit.id))
}

/// Store new streak counters for a habit.
pub async fn set_streaks<'e, E>(executor: E, id: i64, counters: StreakCounters) -> Result<()>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query(
        r#"
        UPDATE habits
        SET current_streak = ?, max_streak = ?, updated_at = CURRENT_TIMESTAMP
        WHERE id = ?
        "#,
    )
    .bind(counters.current)
    .bind(counters.max)
    .bind(id)
    .execute(executor)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::not_found("Habit", id));
    }

    Ok(())
}

/// Delete a habit. Its executions go with it.
pub async fn delete_habit<'e, E>(executor: E, id: i64) -> Result<()>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query("DELETE FROM habits WHERE id = ?")
        .bind(id)
        .execute(executor)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::not_found("Habit", id));
    }

    Ok(())
}

/// Distinct timezones of reachable users that have at least one active habit.
pub async fn active_timezones<'e, E>(executor: E) -> Result<Vec<String>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let zones = sqlx::query_scalar::<_, String>(
        r#"
        SELECT DISTINCT u.timezone
        FROM users u
        INNER JOIN habits h ON h.user_id = u.id
        WHERE u.is_active = 1
          AND u.is_bot_blocked = 0
          AND h.is_active = 1
        ORDER BY u.timezone
        "#,
    )
    .fetch_all(executor)
    .await?;

    Ok(zones)
}

/// Active habits in `timezone` whose reminder time is `local_time` and that
/// are not yet done on `local_date`.
pub async fn habits_due_for_reminder<'e, E>(
    executor: E,
    timezone: &str,
    local_time: NaiveTime,
    local_date: NaiveDate,
) -> Result<Vec<DueHabit>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let habits = sqlx::query_as::<_, DueHabit>(
        r#"
        SELECT h.id AS habit_id, h.name AS habit_name, u.id AS user_id, u.telegram_id
        FROM habits h
        INNER JOIN users u ON u.id = h.user_id
        WHERE h.is_active = 1
          AND u.is_active = 1
          AND u.is_bot_blocked = 0
          AND u.timezone = ?
          AND h.time_to_remind = ?
          AND NOT EXISTS (
              SELECT 1 FROM executions e
              WHERE e.habit_id = h.id
                AND e.execution_date = ?
                AND e.status = ?
          )
        ORDER BY u.id, h.name
        "#,
    )
    .bind(timezone)
    .bind(local_time)
    .bind(local_date)
    .bind(ExecutionStatus::Done.as_str())
    .fetch_all(executor)
    .await?;

    Ok(habits)
}

/// Distinct timezones of owners of active habits with a running streak.
pub async fn streak_timezones<'e, E>(executor: E) -> Result<Vec<String>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let zones = sqlx::query_scalar::<_, String>(
        r#"
        SELECT DISTINCT u.timezone
        FROM users u
        INNER JOIN habits h ON h.user_id = u.id
        WHERE h.is_active = 1 AND h.current_streak > 0
        ORDER BY u.timezone
        "#,
    )
    .fetch_all(executor)
    .await?;

    Ok(zones)
}

/// Reset the streak of every active habit in `timezone` that has a running
/// streak but no `done` execution on the day before `today`. `max_streak`
/// is kept.
///
/// A habit already done `today` restarts at 1 rather than 0: the completion
/// recorded today still counts, only the run before the gap is dropped.
///
/// Returns the number of habits reset. Running it again on unchanged data
/// resets nothing.
pub async fn reset_missed_streaks<'e, E>(
    executor: E,
    timezone: &str,
    today: NaiveDate,
) -> Result<u64>
where
    E: Executor<'e, Database = Sqlite>,
{
    let yesterday = today.pred_opt().unwrap_or(today);
    let done = ExecutionStatus::Done.as_str();

    let result = sqlx::query(
        r#"
        UPDATE habits
        SET current_streak = CASE
                WHEN EXISTS (
                    SELECT 1 FROM executions t
                    WHERE t.habit_id = habits.id AND t.execution_date = ? AND t.status = ?
                ) THEN 1
                ELSE 0
            END,
            updated_at = CURRENT_TIMESTAMP
        WHERE is_active = 1
          AND current_streak > 0
          AND user_id IN (SELECT id FROM users WHERE timezone = ?)
          AND NOT EXISTS (
              SELECT 1 FROM executions y
              WHERE y.habit_id = habits.id AND y.execution_date = ? AND y.status = ?
          )
          AND NOT (
              current_streak = 1
              AND EXISTS (
                  SELECT 1 FROM executions t
                  WHERE t.habit_id = habits.id AND t.execution_date = ? AND t.status = ?
              )
          )
        "#,
    )
    .bind(today)
    .bind(done)
    .bind(timezone)
    .bind(yesterday)
    .bind(done)
    .bind(today)
    .bind(done)
    .execute(executor)
    .await?;

    Ok(result.rows_affected())
}
