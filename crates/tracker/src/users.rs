//! User registration and settings.

use database::{user, Database, NewUser, User};
use habit_core::validation::validate_timezone;
use tracing::info;

use crate::error::Result;

/// User-facing operations on accounts.
#[derive(Debug, Clone)]
pub struct UserService {
    db: Database,
}

impl UserService {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Register a user on first contact, or refresh a known user's profile.
    ///
    /// An invalid timezone in the profile is stored as UTC.
    pub async fn register(&self, profile: &NewUser) -> Result<User> {
        let mut profile = profile.clone();
        profile.timezone = profile
            .timezone
            .as_deref()
            .and_then(|tz| validate_timezone(tz).ok());

        let user = user::upsert_user(self.db.pool(), &profile).await?;
        info!(user_id = user.id, telegram_id = user.telegram_id, "Registered user");
        Ok(user)
    }

    pub async fn get(&self, user_id: i64) -> Result<User> {
        Ok(user::get_user(self.db.pool(), user_id).await?)
    }

    pub async fn get_by_telegram_id(&self, telegram_id: i64) -> Result<User> {
        Ok(user::get_user_by_telegram_id(self.db.pool(), telegram_id).await?)
    }

    /// Change a user's timezone. The name must be a valid IANA zone.
    pub async fn set_timezone(&self, owner: &User, timezone: &str) -> Result<User> {
        let timezone = validate_timezone(timezone)?;
        let user = user::update_timezone(self.db.pool(), owner.id, &timezone).await?;
        info!(user_id = user.id, timezone = %user.timezone, "Updated timezone");
        Ok(user)
    }
}
