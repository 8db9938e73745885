//! User CRUD operations.

use sqlx::{Executor, Sqlite};
use tracing::info;

use crate::error::{DatabaseError, Result};
use crate::models::{NewUser, User};

const USER_COLUMNS: &str = "id, telegram_id, username, first_name, last_name, timezone, \
     is_active, is_bot_blocked, created_at, updated_at";

/// Create a new user.
pub async fn create_user<'e, E>(executor: E, new_user: &NewUser) -> Result<User>
where
    E: Executor<'e, Database = Sqlite>,
{
    let timezone = new_user.timezone.as_deref().unwrap_or("UTC");

    sqlx::query_as::<_, User>(&format!(
        r#"
        INSERT INTO users (telegram_id, username, first_name, last_name, timezone)
        VALUES (?, ?, ?, ?, ?)
        RETURNING {USER_COLUMNS}
        "#
    ))
    .bind(new_user.telegram_id)
    .bind(&new_user.username)
    .bind(&new_user.first_name)
    .bind(&new_user.last_name)
    .bind(timezone)
    .fetch_one(executor)
    .await
    .map_err(|e| {
        if let sqlx::Error::Database(ref db_err) = e {
            if db_err.is_unique_violation() {
                return DatabaseError::AlreadyExists {
                    entity: "User",
                    id: new_user.telegram_id.to_string(),
                };
            }
        }
        DatabaseError::Sqlx(e)
    })
}

/// Get a user by internal ID.
pub async fn get_user<'e, E>(executor: E, id: i64) -> Result<User>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?"))
        .bind(id)
        .fetch_optional(executor)
        .await?
        .ok_or_else(|| DatabaseError::not_found("User", id))
}

/// Get a user by Telegram ID.
pub async fn get_user_by_telegram_id<'e, E>(executor: E, telegram_id: i64) -> Result<User>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, User>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE telegram_id = ?"
    ))
    .bind(telegram_id)
    .fetch_optional(executor)
    .await?
    .ok_or_else(|| DatabaseError::not_found("User", telegram_id))
}

/// Register a user on first contact, or refresh the profile of a known one.
///
/// The stored timezone is only set on insert; changing it goes through
/// [`update_timezone`].
pub async fn upsert_user<'e, E>(executor: E, new_user: &NewUser) -> Result<User>
where
    E: Executor<'e, Database = Sqlite>,
{
    let timezone = new_user.timezone.as_deref().unwrap_or("UTC");

    let user = sqlx::query_as::<_, User>(&format!(
        r#"
        INSERT INTO users (telegram_id, username, first_name, last_name, timezone)
        VALUES (?, ?, ?, ?, ?)
        ON CONFLICT(telegram_id) DO UPDATE SET
            username = excluded.username,
            first_name = excluded.first_name,
            last_name = excluded.last_name,
            updated_at = CURRENT_TIMESTAMP
        RETURNING {USER_COLUMNS}
        "#
    ))
    .bind(new_user.telegram_id)
    .bind(&new_user.username)
    .bind(&new_user.first_name)
    .bind(&new_user.last_name)
    .bind(timezone)
    .fetch_one(executor)
    .await?;

    Ok(user)
}

/// Change a user's timezone. The caller validates the name.
pub async fn update_timezone<'e, E>(executor: E, user_id: i64, timezone: &str) -> Result<User>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, User>(&format!(
        r#"
        UPDATE users
        SET timezone = ?, updated_at = CURRENT_TIMESTAMP
        WHERE id = ?
        RETURNING {USER_COLUMNS}
        "#
    ))
    .bind(timezone)
    .bind(user_id)
    .fetch_optional(executor)
    .await?
    .ok_or_else(|| DatabaseError::not_found("User", user_id))
}

/// Record whether a user has blocked the bot.
///
/// Returns `false` when no user has this Telegram ID.
pub async fn set_bot_blocked<'e, E>(executor: E, telegram_id: i64, blocked: bool) -> Result<bool>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query(
        r#"
        UPDATE users
        SET is_bot_blocked = ?, updated_at = CURRENT_TIMESTAMP
        WHERE telegram_id = ?
        "#,
    )
    .bind(blocked)
    .bind(telegram_id)
    .execute(executor)
    .await?;

    let updated = result.rows_affected() > 0;
    if updated {
        info!(telegram_id, blocked, "Updated bot-blocked flag");
    }
    Ok(updated)
}
