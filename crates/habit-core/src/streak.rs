//! Streak counter rules.
//!
//! Counters only move for the owner's current day. A backdated (or future)
//! execution is stored by the caller but leaves the counters alone; the
//! nightly maintenance pass is what turns a missed day into a reset.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::status::ExecutionStatus;

/// The two counters stored on a habit.
///
/// `max >= current` holds for every value produced by [`compute_delta`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StreakCounters {
    pub current: i64,
    pub max: i64,
}

impl StreakCounters {
    pub fn new(current: i64, max: i64) -> Self {
        Self { current, max }
    }
}

/// Result of applying one status transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreakChange {
    /// Whether the counters differ from the input.
    pub changed: bool,
    pub counters: StreakCounters,
}

impl StreakChange {
    fn unchanged(counters: StreakCounters) -> Self {
        Self {
            changed: false,
            counters,
        }
    }

    fn to(counters: StreakCounters) -> Self {
        Self {
            changed: true,
            counters,
        }
    }
}

/// Compute the counters after `previous -> new` for a habit.
///
/// * `Done` after anything but `Done`: current + 1, max follows if exceeded.
/// * `NotDone` with a positive streak: current resets to 0, max is kept.
/// * `Pending` after `Done` with a positive streak: undo of the completion,
///   current - 1, and max - 1 if the completion had just set the record.
/// * anything else, or `is_today == false`: no change.
///
/// `Done -> NotDone` resets while `Done -> Pending` only steps back by one.
/// An explicit failure and an undo are different user intents.
pub fn compute_delta(
    counters: StreakCounters,
    previous: Option<ExecutionStatus>,
    new: ExecutionStatus,
    is_today: bool,
) -> StreakChange {
    if !is_today {
        debug!("Execution is not for today, streak unchanged");
        return StreakChange::unchanged(counters);
    }

    let StreakCounters { current, max } = counters;

    match new {
        ExecutionStatus::Done if previous != Some(ExecutionStatus::Done) => {
            let current = current + 1;
            StreakChange::to(StreakCounters::new(current, max.max(current)))
        }
        ExecutionStatus::NotDone if current > 0 => {
            StreakChange::to(StreakCounters::new(0, max))
        }
        ExecutionStatus::Pending if previous == Some(ExecutionStatus::Done) && current > 0 => {
            let max = if max == current { max - 1 } else { max };
            StreakChange::to(StreakCounters::new(current - 1, max))
        }
        _ => StreakChange::unchanged(counters),
    }
}
