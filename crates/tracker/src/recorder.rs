//! Execution recording: the only online path that moves streak counters.

use chrono::NaiveDate;
use database::{execution, habit, Database, Execution, ExecutionFilter, User};
use habit_core::{compute_delta, ExecutionStatus, StreakChange, TimeResolver};
use sqlx::SqliteConnection;
use tracing::{debug, error, info};

use crate::error::{Result, TrackerError};
use crate::habits::ensure_owner;

/// What a recording did inside its transaction.
enum Recorded {
    /// The execution already had the requested status.
    Unchanged(Execution),
    Applied {
        execution: Execution,
        change: StreakChange,
    },
}

/// Records habit executions and applies the streak rules.
#[derive(Debug, Clone)]
pub struct ExecutionRecorder {
    db: Database,
    resolver: TimeResolver,
}

impl ExecutionRecorder {
    pub fn new(db: Database, resolver: TimeResolver) -> Self {
        Self { db, resolver }
    }

    /// Record `status` for a habit on `date`, or on the owner's today.
    ///
    /// Concurrent recordings for the same habit are serialized; the
    /// execution row and the habit's counters are committed together.
    pub async fn record(
        &self,
        habit_id: i64,
        owner: &User,
        status: ExecutionStatus,
        date: Option<NaiveDate>,
    ) -> Result<Execution> {
        let target_date = date.unwrap_or_else(|| self.resolver.today_for(&owner.timezone));

        let mut tx = self.db.begin().await?;
        let outcome = self
            .apply(&mut *tx, habit_id, owner, status, target_date)
            .await;
        let recorded = match outcome {
            Ok(recorded) => recorded,
            Err(e) => {
                if let Err(rollback_err) = tx.rollback().await {
                    error!(habit_id, error = %rollback_err, "Rollback failed");
                }
                if matches!(e, TrackerError::Database(_)) {
                    error!(habit_id, date = %target_date, error = %e, "Recording rolled back");
                }
                return Err(e);
            }
        };

        match recorded {
            Recorded::Unchanged(execution) => {
                tx.rollback().await.map_err(database::DatabaseError::from)?;
                debug!(habit_id, date = %target_date, status = %status, "Status unchanged");
                Ok(execution)
            }
            Recorded::Applied { execution, change } => {
                if let Err(e) = tx.commit().await {
                    error!(habit_id, date = %target_date, error = %e, "Commit failed");
                    return Err(database::DatabaseError::from(e).into());
                }
                info!(
                    habit_id,
                    execution_id = execution.id,
                    date = %target_date,
                    status = %status,
                    streak_changed = change.changed,
                    current_streak = change.counters.current,
                    max_streak = change.counters.max,
                    "Recorded execution"
                );
                Ok(execution)
            }
        }
    }

    /// Change the status of an existing execution, on that execution's date.
    pub async fn update_status(
        &self,
        owner: &User,
        execution_id: i64,
        status: ExecutionStatus,
    ) -> Result<Execution> {
        let existing = execution::get_execution(self.db.pool(), execution_id).await?;
        self.record(existing.habit_id, owner, status, Some(existing.execution_date))
            .await
    }

    /// Get one execution, checking ownership through its habit.
    pub async fn get(&self, owner: &User, execution_id: i64) -> Result<Execution> {
        let found = execution::get_execution(self.db.pool(), execution_id).await?;
        let habit = habit::get_habit(self.db.pool(), found.habit_id).await?;
        ensure_owner(&habit, owner)?;
        Ok(found)
    }

    /// List a habit's executions, newest first.
    pub async fn list(
        &self,
        owner: &User,
        habit_id: i64,
        filter: &ExecutionFilter,
    ) -> Result<Vec<Execution>> {
        if let (Some(start), Some(end)) = (filter.start_date, filter.end_date) {
            if start > end {
                return Err(TrackerError::BadRequest(format!(
                    "start_date {} is after end_date {}",
                    start, end
                )));
            }
        }

        let habit = habit::get_habit(self.db.pool(), habit_id).await?;
        ensure_owner(&habit, owner)?;
        Ok(execution::list_executions(self.db.pool(), habit_id, filter).await?)
    }

    async fn apply(
        &self,
        conn: &mut SqliteConnection,
        habit_id: i64,
        owner: &User,
        status: ExecutionStatus,
        date: NaiveDate,
    ) -> Result<Recorded> {
        let habit = habit::lock_habit(conn, habit_id).await?;
        ensure_owner(&habit, owner)?;
        if !habit.is_active {
            return Err(TrackerError::BadRequest(format!(
                "habit {} is inactive",
                habit_id
            )));
        }

        let existing = execution::find_execution(&mut *conn, habit_id, date).await?;
        let previous = match existing {
            Some(found) if found.status == status => return Ok(Recorded::Unchanged(found)),
            Some(found) => Some(found.status),
            None => None,
        };

        let is_today = self.resolver.is_today(&owner.timezone, date);
        let change = compute_delta(habit.counters(), previous, status, is_today);

        let execution = execution::upsert_execution(&mut *conn, habit_id, date, status).await?;
        if change.changed {
            habit::set_streaks(&mut *conn, habit_id, change.counters).await?;
        }

        Ok(Recorded::Applied { execution, change })
    }
}
