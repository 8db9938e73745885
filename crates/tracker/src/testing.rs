//! Shared fixtures for service tests.

use std::sync::Arc;

use chrono::{NaiveTime, TimeZone, Utc};
use database::{habit, user, Database, Habit, NewHabit, NewUser, User};
use habit_core::{FixedClock, TimeResolver};
use notifier::{DispatchConfig, Dispatcher, MemoryDedupStore, RecordingNotifier};

pub(crate) async fn test_db() -> Database {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    db.migrate().await.unwrap();
    db
}

/// A clock at the given UTC wall time.
pub(crate) fn clock_at(y: i32, m: u32, d: u32, h: u32, min: u32) -> FixedClock {
    FixedClock::new(Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap())
}

pub(crate) fn resolver(clock: &FixedClock) -> TimeResolver {
    TimeResolver::new(Arc::new(clock.clone()))
}

/// A dispatcher over `notifier` with a fresh in-memory dedup store.
pub(crate) fn dispatcher(notifier: &RecordingNotifier) -> Dispatcher {
    Dispatcher::new(
        Arc::new(notifier.clone()),
        Arc::new(MemoryDedupStore::new()),
        DispatchConfig::default(),
    )
}

pub(crate) fn time(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap()
}

pub(crate) async fn seed_user(db: &Database, telegram_id: i64, timezone: &str) -> User {
    user::upsert_user(
        db.pool(),
        &NewUser {
            telegram_id,
            timezone: Some(timezone.to_string()),
            ..Default::default()
        },
    )
    .await
    .unwrap()
}

pub(crate) async fn seed_habit(db: &Database, owner: &User, name: &str, remind_at: NaiveTime) -> Habit {
    habit::create_habit(
        db.pool(),
        &NewHabit {
            user_id: owner.id,
            name: name.to_string(),
            description: None,
            target_days: 21,
            time_to_remind: remind_at,
        },
    )
    .await
    .unwrap()
}

pub(crate) async fn reload(db: &Database, habit_id: i64) -> Habit {
    habit::get_habit(db.pool(), habit_id).await.unwrap()
}
