//! Core domain logic for the habit tracker.
//!
//! Everything in this crate is free of I/O: the streak rules, the
//! conversion of instants into a user's local calendar, reminder keys and
//! input validation. Persistence lives in the `database` crate and the
//! orchestration of both in `tracker`.
//!
//! # Example
//!
//! ```
//! use habit_core::{compute_delta, ExecutionStatus, StreakCounters};
//!
//! let counters = StreakCounters::new(2, 5);
//! let change = compute_delta(counters, None, ExecutionStatus::Done, true);
//! assert!(change.changed);
//! assert_eq!(change.counters, StreakCounters::new(3, 5));
//! ```

pub mod clock;
pub mod reminder;
pub mod status;
pub mod streak;
pub mod timezone;
pub mod validation;

pub use clock::{Clock, FixedClock, SystemClock};
pub use reminder::{idempotency_key, reminder_text, truncate_to_minute};
pub use status::{ExecutionStatus, ParseStatusError};
pub use streak::{compute_delta, StreakChange, StreakCounters};
pub use timezone::{resolve_zone, LocalMoment, TimeResolver, ZoneLookup};
pub use validation::ValidationError;
