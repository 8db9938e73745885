//! Execution routes: recording daily outcomes.

use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::NaiveDate;
use database::{Execution, ExecutionFilter};
use habit_core::ExecutionStatus;
use serde::Deserialize;

use crate::auth::CurrentUser;
use crate::error::Result;
use crate::state::AppState;

/// Body of a recording request.
#[derive(Debug, Deserialize)]
pub struct RecordRequest {
    pub status: ExecutionStatus,
}

/// Query parameters for listing executions.
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub status: Option<ExecutionStatus>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub skip: Option<i64>,
    pub limit: Option<i64>,
}

impl ListParams {
    fn into_filter(self) -> ExecutionFilter {
        let defaults = ExecutionFilter::default();
        ExecutionFilter {
            status: self.status,
            start_date: self.start_date,
            end_date: self.end_date,
            skip: self.skip.unwrap_or(defaults.skip).max(0),
            limit: self.limit.unwrap_or(defaults.limit).clamp(1, 1000),
        }
    }
}

/// Record a status for the caller's today.
pub async fn record_today(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(habit_id): Path<i64>,
    Json(req): Json<RecordRequest>,
) -> Result<Json<Execution>> {
    let execution = state
        .recorder
        .record(habit_id, &user, req.status, None)
        .await?;
    Ok(Json(execution))
}

/// Record a status for an explicit date.
pub async fn record_for_date(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path((habit_id, date)): Path<(i64, NaiveDate)>,
    Json(req): Json<RecordRequest>,
) -> Result<Json<Execution>> {
    let execution = state
        .recorder
        .record(habit_id, &user, req.status, Some(date))
        .await?;
    Ok(Json(execution))
}

/// List a habit's executions.
pub async fn list(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(habit_id): Path<i64>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<Execution>>> {
    let executions = state
        .recorder
        .list(&user, habit_id, &params.into_filter())
        .await?;
    Ok(Json(executions))
}

/// Get one execution.
pub async fn get(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<Execution>> {
    Ok(Json(state.recorder.get(&user, id).await?))
}

/// Change an execution's status.
pub async fn update(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
    Json(req): Json<RecordRequest>,
) -> Result<Json<Execution>> {
    Ok(Json(state.recorder.update_status(&user, id, req.status).await?))
}
