//! Route handlers for the habit API.

pub mod executions;
pub mod habits;
pub mod health;
pub mod users;

use axum::routing::{get, post};
use axum::Router;

use crate::state::AppState;

/// Build the router with all routes.
pub fn router() -> Router<AppState> {
    Router::new()
        // Health check
        .route("/health", get(health::health))
        // Current user
        .route("/users/me", get(users::me).patch(users::update_me))
        // Habits
        .route("/habits", post(habits::create).get(habits::list))
        .route(
            "/habits/:id",
            get(habits::get).patch(habits::update).delete(habits::delete),
        )
        // Executions
        .route(
            "/habits/:id/executions",
            post(executions::record_today).get(executions::list),
        )
        .route("/habits/:id/executions/:date", post(executions::record_for_date))
        .route(
            "/executions/:id",
            get(executions::get).patch(executions::update),
        )
}
