//! Habit management for a single owner.

use chrono::NaiveTime;
use database::{execution, habit, Database, Habit, NewHabit, User};
use habit_core::validation::{validate_description, validate_habit_name, validate_target_days};
use habit_core::{truncate_to_minute, TimeResolver};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::HabitDefaults;
use crate::error::{Result, TrackerError};

/// Input for creating a habit.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CreateHabit {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Falls back to [`HabitDefaults::target_days`].
    #[serde(default)]
    pub target_days: Option<i64>,
    pub time_to_remind: NaiveTime,
}

/// Partial update of a habit. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct HabitUpdate {
    pub name: Option<String>,
    /// A blank description clears it.
    pub description: Option<String>,
    pub target_days: Option<i64>,
    pub time_to_remind: Option<NaiveTime>,
    pub is_active: Option<bool>,
}

/// A habit as listed to its owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HabitView {
    #[serde(flatten)]
    pub habit: Habit,
    /// Whether the habit is already done on the owner's today.
    pub done_today: bool,
}

/// Fail unless `owner` owns `habit`.
pub(crate) fn ensure_owner(habit: &Habit, owner: &User) -> Result<()> {
    if habit.user_id != owner.id {
        warn!(
            habit_id = habit.id,
            user_id = owner.id,
            "Access to another user's habit, potential probe"
        );
        return Err(TrackerError::Forbidden(format!(
            "habit {} does not belong to user {}",
            habit.id, owner.id
        )));
    }
    Ok(())
}

/// Habit CRUD scoped to the requesting user.
#[derive(Debug, Clone)]
pub struct HabitService {
    db: Database,
    resolver: TimeResolver,
    defaults: HabitDefaults,
}

impl HabitService {
    pub fn new(db: Database, resolver: TimeResolver, defaults: HabitDefaults) -> Self {
        Self {
            db,
            resolver,
            defaults,
        }
    }

    /// Create a habit with zeroed streaks.
    pub async fn create(&self, owner: &User, input: CreateHabit) -> Result<Habit> {
        let new_habit = NewHabit {
            user_id: owner.id,
            name: validate_habit_name(&input.name)?,
            description: validate_description(input.description.as_deref())?,
            target_days: validate_target_days(
                input.target_days.unwrap_or(self.defaults.target_days),
            )?,
            time_to_remind: truncate_to_minute(input.time_to_remind),
        };

        let habit = habit::create_habit(self.db.pool(), &new_habit).await?;
        info!(habit_id = habit.id, user_id = owner.id, "Created habit");
        Ok(habit)
    }

    /// Get one of the owner's habits.
    pub async fn get(&self, owner: &User, habit_id: i64) -> Result<Habit> {
        let habit = habit::get_habit(self.db.pool(), habit_id).await?;
        ensure_owner(&habit, owner)?;
        Ok(habit)
    }

    /// List the owner's habits with a per-habit "done today" flag.
    pub async fn list(
        &self,
        owner: &User,
        active_only: bool,
        skip: i64,
        limit: i64,
    ) -> Result<Vec<HabitView>> {
        let habits =
            habit::list_habits_for_user(self.db.pool(), owner.id, active_only, skip, limit)
                .await?;

        let today = self.resolver.today_for(&owner.timezone);
        let ids: Vec<i64> = habits.iter().map(|h| h.id).collect();
        let done = execution::done_habit_ids(self.db.pool(), &ids, today).await?;

        Ok(habits
            .into_iter()
            .map(|habit| HabitView {
                done_today: done.contains(&habit.id),
                habit,
            })
            .collect())
    }

    /// Apply a partial update. Streak counters are never touched.
    pub async fn update(&self, owner: &User, habit_id: i64, changes: HabitUpdate) -> Result<Habit> {
        let mut habit = self.get(owner, habit_id).await?;

        if let Some(name) = changes.name {
            habit.name = validate_habit_name(&name)?;
        }
        if let Some(description) = changes.description {
            habit.description = validate_description(Some(&description))?;
        }
        if let Some(days) = changes.target_days {
            habit.target_days = validate_target_days(days)?;
        }
        if let Some(time) = changes.time_to_remind {
            habit.time_to_remind = truncate_to_minute(time);
        }
        if let Some(active) = changes.is_active {
            habit.is_active = active;
        }

        let habit = habit::update_habit(self.db.pool(), &habit).await?;
        info!(habit_id, user_id = owner.id, "Updated habit");
        Ok(habit)
    }

    /// Delete a habit and its executions.
    pub async fn delete(&self, owner: &User, habit_id: i64) -> Result<()> {
        self.get(owner, habit_id).await?;
        habit::delete_habit(self.db.pool(), habit_id).await?;
        info!(habit_id, user_id = owner.id, "Deleted habit");
        Ok(())
    }
}
