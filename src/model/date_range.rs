use crate::clock::Clock;
use anyhow::ensure;
use chrono::{Datelike, Days, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// How far back the default range reaches.
pub const DEFAULT_DAYS_BACK: u64 = 30;

/// An inclusive range of calendar dates. `start` is never after `end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> crate::Result<Self> {
        ensure!(start <= end, "Start date cannot be after end date.");
        Ok(Self { start, end })
    }

    /// From `DEFAULT_DAYS_BACK` days ago through today.
    pub fn default_for<C: Clock + ?Sized>(clock: &C) -> Self {
        let end = clock.today();
        Self {
            start: days_before(end, DEFAULT_DAYS_BACK),
            end,
        }
    }

    /// The last `days` days including today, so `last_days(1)` is just today.
    pub fn last_days<C: Clock + ?Sized>(days: u64, clock: &C) -> crate::Result<Self> {
        ensure!(days > 0, "The number of days must be at least 1");
        let end = clock.today();
        Ok(Self {
            start: days_before(end, days - 1),
            end,
        })
    }

    /// The first of the current month through today.
    pub fn this_month<C: Clock + ?Sized>(clock: &C) -> Self {
        let end = clock.today();
        Self {
            start: end.with_day(1).unwrap_or(end),
            end,
        }
    }

    /// Fills whichever bound is missing from the default range, then validates.
    pub fn resolve<C: Clock + ?Sized>(
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
        clock: &C,
    ) -> crate::Result<Self> {
        let default = Self::default_for(clock);
        Self::new(start.unwrap_or(default.start), end.unwrap_or(default.end))
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }
}

impl Display for DateRange {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} to {}", self.start, self.end)
    }
}

fn days_before(date: NaiveDate, days: u64) -> NaiveDate {
    date.checked_sub_days(Days::new(days)).unwrap_or(NaiveDate::MIN)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use chrono::{TimeZone, Utc};

    fn clock() -> FixedClock {
        FixedClock::new(Utc.with_ymd_and_hms(2024, 3, 15, 18, 30, 0).unwrap())
    }

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn test_default_range() {
        let range = DateRange::default_for(&clock());
        assert_eq!(range.start(), date("2024-02-14"));
        assert_eq!(range.end(), date("2024-03-15"));
    }

    #[test]
    fn test_presets() {
        let week = DateRange::last_days(7, &clock()).unwrap();
        assert_eq!(week.start(), date("2024-03-09"));
        assert_eq!(week.end(), date("2024-03-15"));

        let today = DateRange::last_days(1, &clock()).unwrap();
        assert_eq!(today.start(), today.end());
        assert!(DateRange::last_days(0, &clock()).is_err());

        let month = DateRange::this_month(&clock());
        assert_eq!(month.start(), date("2024-03-01"));
    }

    #[test]
    fn test_start_after_end() {
        let err = DateRange::new(date("2024-02-02"), date("2024-02-01")).unwrap_err();
        assert_eq!(err.to_string(), "Start date cannot be after end date.");
        assert!(DateRange::new(date("2024-02-01"), date("2024-02-01")).is_ok());
    }

    #[test]
    fn test_resolve_fills_missing_bounds() {
        let range = DateRange::resolve(None, Some(date("2024-03-01")), &clock()).unwrap();
        assert_eq!(range.start(), date("2024-02-14"));
        assert_eq!(range.to_string(), "2024-02-14 to 2024-03-01");

        let err = DateRange::resolve(Some(date("2024-04-01")), None, &clock());
        assert!(err.is_err());
    }
}
