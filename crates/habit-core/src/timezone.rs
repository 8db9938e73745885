//! Conversion of absolute instants into a user's local calendar.
//!
//! Every "is this for today" decision in the tracker goes through
//! [`TimeResolver`]. A timezone string that is not a valid IANA name never
//! fails a request: it resolves to UTC and the fallback is reported through
//! [`ZoneLookup::Fallback`] so it can be logged.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use chrono_tz::Tz;
use tracing::warn;

use crate::clock::{Clock, SystemClock};
use crate::reminder::truncate_to_minute;

/// Outcome of looking up a stored timezone name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ZoneLookup {
    /// The name parsed as an IANA zone (absent names count as UTC).
    Valid(Tz),
    /// The name was not recognised and UTC was substituted.
    Fallback { requested: String },
}

impl ZoneLookup {
    /// The zone to compute with.
    pub fn tz(&self) -> Tz {
        match self {
            ZoneLookup::Valid(tz) => *tz,
            ZoneLookup::Fallback { .. } => Tz::UTC,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, ZoneLookup::Fallback { .. })
    }
}

/// Look up an IANA timezone name.
///
/// `None` or an empty string is the documented default (`UTC`), not a
/// fallback.
pub fn resolve_zone(name: Option<&str>) -> ZoneLookup {
    let name = name.map(str::trim).unwrap_or_default();
    if name.is_empty() {
        return ZoneLookup::Valid(Tz::UTC);
    }

    match name.parse::<Tz>() {
        Ok(tz) => ZoneLookup::Valid(tz),
        Err(_) => ZoneLookup::Fallback {
            requested: name.to_string(),
        },
    }
}

/// Local calendar date and minute-truncated wall time in one zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalMoment {
    pub date: NaiveDate,
    pub time: NaiveTime,
}

impl LocalMoment {
    /// Convert an instant into the given zone.
    pub fn at(instant: DateTime<Utc>, tz: Tz) -> Self {
        let local = instant.with_timezone(&tz);
        Self {
            date: local.date_naive(),
            time: truncate_to_minute(local.time()),
        }
    }
}

/// Resolves "today" (and friends) for a user's stored timezone.
#[derive(Debug, Clone)]
pub struct TimeResolver {
    clock: Arc<dyn Clock>,
}

impl TimeResolver {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }

    /// A resolver backed by the wall clock.
    pub fn system() -> Self {
        Self::new(Arc::new(SystemClock))
    }

    /// Current absolute instant.
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Resolve a zone name, logging when UTC had to be substituted.
    pub fn zone(&self, timezone: &str) -> Tz {
        let lookup = resolve_zone(Some(timezone));
        if let ZoneLookup::Fallback { requested } = &lookup {
            warn!(timezone = %requested, "Invalid timezone, using UTC");
        }
        lookup.tz()
    }

    /// The local calendar date for a user in `timezone`.
    pub fn today_for(&self, timezone: &str) -> NaiveDate {
        self.local_moment(timezone).date
    }

    /// The local calendar date before [`today_for`](Self::today_for).
    pub fn yesterday_for(&self, timezone: &str) -> NaiveDate {
        let today = self.today_for(timezone);
        today.pred_opt().unwrap_or(today)
    }

    /// Whether `date` is today for a user in `timezone`.
    pub fn is_today(&self, timezone: &str, date: NaiveDate) -> bool {
        self.today_for(timezone) == date
    }

    /// Local date and minute-truncated time in `timezone`.
    pub fn local_moment(&self, timezone: &str) -> LocalMoment {
        LocalMoment::at(self.now(), self.zone(timezone))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use chrono::TimeZone;

    fn resolver_at(y: i32, m: u32, d: u32, h: u32, min: u32) -> TimeResolver {
        let instant = Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap();
        TimeResolver::new(Arc::new(FixedClock::new(instant)))
    }

    #[test]
    fn test_resolve_valid_zone() {
        let lookup = resolve_zone(Some("Asia/Yekaterinburg"));
        assert_eq!(lookup, ZoneLookup::Valid(chrono_tz::Asia::Yekaterinburg));
        assert!(!lookup.is_fallback());
    }

    #[test]
    fn test_resolve_missing_zone_is_utc() {
        assert_eq!(resolve_zone(None), ZoneLookup::Valid(Tz::UTC));
        assert_eq!(resolve_zone(Some("  ")), ZoneLookup::Valid(Tz::UTC));
    }

    #[test]
    fn test_resolve_invalid_zone_falls_back() {
        let lookup = resolve_zone(Some("Mars/Olympus_Mons"));
        assert!(lookup.is_fallback());
        assert_eq!(lookup.tz(), Tz::UTC);
    }

    #[test]
    fn test_today_differs_across_zones() {
        // 22:30 UTC on Oct 19 is already Oct 20 in Yekaterinburg (UTC+5)
        let resolver = resolver_at(2026, 10, 19, 22, 30);
        assert_eq!(
            resolver.today_for("UTC"),
            NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
        );
        assert_eq!(
            resolver.today_for("Asia/Yekaterinburg"),
            NaiveDate::from_ymd_opt(2026, 10, 20).unwrap()
        );
        assert_eq!(
            resolver.today_for("America/New_York"),
            NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
        );
    }

    #[test]
    fn test_invalid_zone_uses_utc_date() {
        let resolver = resolver_at(2026, 10, 19, 23, 59);
        assert_eq!(
            resolver.today_for("Not/AZone"),
            NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
        );
    }

    #[test]
    fn test_yesterday_and_is_today() {
        let resolver = resolver_at(2026, 3, 1, 0, 30);
        let today = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        assert!(resolver.is_today("UTC", today));
        assert_eq!(
            resolver.yesterday_for("UTC"),
            NaiveDate::from_ymd_opt(2026, 2, 28).unwrap()
        );
    }

    #[test]
    fn test_local_moment_truncates_seconds() {
        let instant = Utc.with_ymd_and_hms(2026, 10, 19, 4, 0, 42).unwrap();
        let moment = LocalMoment::at(instant, chrono_tz::Asia::Yekaterinburg);
        assert_eq!(moment.time, NaiveTime::from_hms_opt(9, 0, 0).unwrap());
        assert_eq!(moment.date, NaiveDate::from_ymd_opt(2026, 10, 19).unwrap());
    }
}
