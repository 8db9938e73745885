//! Habit routes.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use database::Habit;
use serde::Deserialize;
use tracker::{CreateHabit, HabitUpdate, HabitView};

use crate::auth::CurrentUser;
use crate::error::Result;
use crate::state::AppState;

/// Query parameters for listing habits.
#[derive(Debug, Deserialize)]
pub struct ListParams {
    #[serde(default = "default_active_only")]
    pub active_only: bool,
    #[serde(default)]
    pub skip: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_active_only() -> bool {
    true
}

fn default_limit() -> i64 {
    100
}

/// Create a habit.
pub async fn create(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(req): Json<CreateHabit>,
) -> Result<(StatusCode, Json<Habit>)> {
    let habit = state.habits.create(&user, req).await?;
    Ok((StatusCode::CREATED, Json(habit)))
}

/// List the caller's habits.
pub async fn list(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<HabitView>>> {
    let habits = state
        .habits
        .list(
            &user,
            params.active_only,
            params.skip.max(0),
            params.limit.clamp(1, 1000),
        )
        .await?;
    Ok(Json(habits))
}

/// Get one habit.
pub async fn get(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<Habit>> {
    Ok(Json(state.habits.get(&user, id).await?))
}

/// Partially update a habit.
pub async fn update(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
    Json(req): Json<HabitUpdate>,
) -> Result<Json<Habit>> {
    Ok(Json(state.habits.update(&user, id, req).await?))
}

/// Delete a habit and its executions.
pub async fn delete(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
) -> Result<StatusCode> {
    state.habits.delete(&user, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApiError;
    use crate::routes::testing::{caller, test_state};
    use chrono::NaiveTime;
    use tracker::TrackerError;

    fn new_habit(name: &str) -> CreateHabit {
        serde_json::from_value(serde_json::json!({
            "name": name,
            "time_to_remind": "09:00:00"
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn test_habit_lifecycle() {
        let state = test_state().await;
        let owner = caller(&state, 1).await;

        let (status, Json(created)) = create(State(state.clone()), owner.clone(), Json(new_habit("Read")))
            .await
            .unwrap();
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created.target_days, 21);
        assert_eq!(created.time_to_remind, NaiveTime::from_hms_opt(9, 0, 0).unwrap());

        let Json(listed) = list(
            State(state.clone()),
            owner.clone(),
            Query(ListParams {
                active_only: true,
                skip: 0,
                limit: 100,
            }),
        )
        .await
        .unwrap();
        assert_eq!(listed.len(), 1);
        assert!(!listed[0].done_today);

        let Json(updated) = update(
            State(state.clone()),
            owner.clone(),
            Path(created.id),
            Json(HabitUpdate {
                target_days: Some(30),
                ..Default::default()
            }),
        )
        .await
        .unwrap();
        assert_eq!(updated.target_days, 30);

        let status = delete(State(state.clone()), owner.clone(), Path(created.id))
            .await
            .unwrap();
        assert_eq!(status, StatusCode::NO_CONTENT);

        let missing = get(State(state), owner, Path(created.id)).await;
        assert!(matches!(
            missing,
            Err(ApiError::Tracker(TrackerError::NotFound { .. }))
        ));
    }

    #[tokio::test]
    async fn test_other_users_habit_is_forbidden() {
        let state = test_state().await;
        let owner = caller(&state, 1).await;
        let intruder = caller(&state, 2).await;

        let (_, Json(created)) = create(State(state.clone()), owner, Json(new_habit("Read")))
            .await
            .unwrap();

        let result = get(State(state), intruder, Path(created.id)).await;
        assert!(matches!(
            result,
            Err(ApiError::Tracker(TrackerError::Forbidden(_)))
        ));
    }
}
