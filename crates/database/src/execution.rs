//! Execution store: one row per (habit, local date).

use std::collections::HashSet;

use chrono::NaiveDate;
use habit_core::ExecutionStatus;
use sqlx::{Executor, QueryBuilder, Sqlite};
use tracing::debug;

use crate::error::{DatabaseError, Result};
use crate::models::{Execution, ExecutionFilter};

const EXECUTION_COLUMNS: &str =
    "id, habit_id, execution_date, status, created_at, updated_at";

/// Look up the execution of a habit on a date.
pub async fn find_execution<'e, E>(
    executor: E,
    habit_id: i64,
    date: NaiveDate,
) -> Result<Option<Execution>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let execution = sqlx::query_as::<_, Execution>(&format!(
        "SELECT {EXECUTION_COLUMNS} FROM executions WHERE habit_id = ? AND execution_date = ?"
    ))
    .bind(habit_id)
    .bind(date)
    .fetch_optional(executor)
    .await?;

    debug!(
        habit_id,
        date = %date,
        found = execution.is_some(),
        "Looked up execution"
    );
    Ok(execution)
}

/// Get an execution by ID.
pub async fn get_execution<'e, E>(executor: E, id: i64) -> Result<Execution>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, Execution>(&format!(
        "SELECT {EXECUTION_COLUMNS} FROM executions WHERE id = ?"
    ))
    .bind(id)
    .fetch_optional(executor)
    .await?
    .ok_or_else(|| DatabaseError::not_found("Execution", id))
}

/// Set the status of a habit on a date, inserting the row if needed.
///
/// The insert resolves conflicts on `(habit_id, execution_date)` inside
/// SQLite, so a racing insert turns into an update instead of a second row
/// or a constraint error.
pub async fn upsert_execution<'e, E>(
    executor: E,
    habit_id: i64,
    date: NaiveDate,
    status: ExecutionStatus,
) -> Result<Execution>
where
    E: Executor<'e, Database = Sqlite>,
{
    let execution = sqlx::query_as::<_, Execution>(&format!(
        r#"
        INSERT INTO executions (habit_id, execution_date, status)
        VALUES (?, ?, ?)
        ON CONFLICT(habit_id, execution_date) DO UPDATE SET
            status = excluded.status,
            updated_at = CURRENT_TIMESTAMP
        RETURNING {EXECUTION_COLUMNS}
        "#
    ))
    .bind(habit_id)
    .bind(date)
    .bind(status.as_str())
    .fetch_one(executor)
    .await?;

    Ok(execution)
}

/// IDs among `habit_ids` that are `done` on `date`, in one query.
pub async fn done_habit_ids<'e, E>(
    executor: E,
    habit_ids: &[i64],
    date: NaiveDate,
) -> Result<HashSet<i64>>
where
    E: Executor<'e, Database = Sqlite>,
{
    if habit_ids.is_empty() {
        return Ok(HashSet::new());
    }

    let mut builder = QueryBuilder::<Sqlite>::new(
        "SELECT habit_id FROM executions WHERE execution_date = ",
    );
    builder.push_bind(date);
    builder.push(" AND status = ");
    builder.push_bind(ExecutionStatus::Done.as_str());
    builder.push(" AND habit_id IN (");
    let mut ids = builder.separated(", ");
    for id in habit_ids {
        ids.push_bind(*id);
    }
    ids.push_unseparated(")");

    let done = builder
        .build_query_scalar::<i64>()
        .fetch_all(executor)
        .await?;
    debug!(date = %date, done = done.len(), "Resolved done habits");

    Ok(done.into_iter().collect())
}

/// List a habit's executions, newest date first.
pub async fn list_executions<'e, E>(
    executor: E,
    habit_id: i64,
    filter: &ExecutionFilter,
) -> Result<Vec<Execution>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let mut builder = QueryBuilder::<Sqlite>::new(format!(
        "SELECT {EXECUTION_COLUMNS} FROM executions WHERE habit_id = "
    ));
    builder.push_bind(habit_id);

    if let Some(status) = filter.status {
        builder.push(" AND status = ");
        builder.push_bind(status.as_str());
    }
    if let Some(start) = filter.start_date {
        builder.push(" AND execution_date >= ");
        builder.push_bind(start);
    }
    if let Some(end) = filter.end_date {
        builder.push(" AND execution_date <= ");
        builder.push_bind(end);
    }

    builder.push(" ORDER BY execution_date DESC LIMIT ");
    builder.push_bind(filter.limit);
    builder.push(" OFFSET ");
    builder.push_bind(filter.skip);

    let executions = builder
        .build_query_as::<Execution>()
        .fetch_all(executor)
        .await?;

    Ok(executions)
}
