//! Hourly streak reset for habits that missed a day.

use async_trait::async_trait;
use database::{habit, Database};
use habit_core::TimeResolver;
use tracing::{debug, info};

use crate::error::Result;
use crate::runner::PeriodicJob;

/// Resets the running streak of habits with no completion on the owner's
/// local yesterday.
///
/// The recorder only moves counters for the owner's today, so a day the
/// user never touched is only noticed here.
#[derive(Debug, Clone)]
pub struct StreakMaintenanceJob {
    db: Database,
    resolver: TimeResolver,
}

impl StreakMaintenanceJob {
    pub fn new(db: Database, resolver: TimeResolver) -> Self {
        Self { db, resolver }
    }

    /// Run one pass and return the number of habits reset.
    ///
    /// All zones are reset in one transaction. A second pass on unchanged
    /// data resets nothing.
    pub async fn run_once(&self) -> Result<u64> {
        let zones = habit::streak_timezones(self.db.pool()).await?;
        if zones.is_empty() {
            debug!("No running streaks to check");
            return Ok(0);
        }

        let mut tx = self.db.begin().await?;
        let mut total = 0;
        for timezone in &zones {
            let today = self.resolver.today_for(timezone);
            let reset = habit::reset_missed_streaks(&mut *tx, timezone, today).await?;
            if reset > 0 {
                info!(timezone = %timezone, today = %today, reset, "Reset missed streaks");
            }
            total += reset;
        }
        tx.commit().await.map_err(database::DatabaseError::from)?;

        info!(total, zones = zones.len(), "Streak maintenance complete");
        Ok(total)
    }
}

#[async_trait]
impl PeriodicJob for StreakMaintenanceJob {
    fn name(&self) -> &'static str {
        "streak-maintenance"
    }

    async fn run(&self) -> Result<()> {
        self.run_once().await.map(|_| ())
    }
}
