//! Application state shared across handlers.

use database::Database;
use habit_core::TimeResolver;
use tracker::{ExecutionRecorder, HabitDefaults, HabitService, UserService};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub users: UserService,
    pub habits: HabitService,
    pub recorder: ExecutionRecorder,
}

impl AppState {
    /// Create new application state.
    pub fn new(db: Database, resolver: TimeResolver, defaults: HabitDefaults) -> Self {
        Self {
            users: UserService::new(db.clone()),
            habits: HabitService::new(db.clone(), resolver.clone(), defaults),
            recorder: ExecutionRecorder::new(db, resolver),
        }
    }
}
