//! Current-user routes.

use axum::extract::State;
use axum::Json;
use database::User;
use serde::Deserialize;

use crate::auth::CurrentUser;
use crate::error::Result;
use crate::state::AppState;

/// Settings the user may change.
#[derive(Debug, Deserialize)]
pub struct UpdateMe {
    pub timezone: String,
}

/// Get the calling user.
pub async fn me(CurrentUser(user): CurrentUser) -> Json<User> {
    Json(user)
}

/// Update the calling user's settings.
pub async fn update_me(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(req): Json<UpdateMe>,
) -> Result<Json<User>> {
    let user = state.users.set_timezone(&user, &req.timezone).await?;
    Ok(Json(user))
}
