//! Explicit time input for every ledger operation

use chrono::{DateTime, Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

pub const ONE_DAY: i64 = 86_400;
pub const ONE_WEEK: i64 = 7 * ONE_DAY;
/// 365-day year; also the accrual year used by the interest index
pub const ONE_YEAR: i64 = 365 * ONE_DAY;
pub const SECONDS_PER_YEAR: i64 = ONE_YEAR;

/// Timestamp and calendar year an operation executes at.
///
/// Nothing in the token reads a wall clock; callers pass this in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccrualContext {
    /// Unix seconds
    pub now: i64,
    pub year: i32,
}

impl AccrualContext {
    /// Context at `now`, with the UTC calendar year derived from it
    pub fn at(now: i64) -> Self {
        let year = DateTime::from_timestamp(now, 0)
            .map(|dt| dt.year())
            .unwrap_or(1970);
        Self { now, year }
    }

    /// Context for an explicitly chosen accounting year
    pub fn with_year(now: i64, year: i32) -> Self {
        Self { now, year }
    }

    /// Same context moved forward by `seconds`
    pub fn advance(&self, seconds: i64) -> Self {
        Self::at(self.now + seconds)
    }
}

/// Unix timestamp of 1 January 00:00:00 UTC of `year`
pub fn year_start(year: i32) -> Option<i64> {
    NaiveDate::from_ymd_opt(year, 1, 1)?
        .and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc().timestamp())
}

#[cfg(test)]
mod tests {
    use super::*;

    const JAN_1_2023: i64 = 1_672_531_200;
    const JAN_1_2024: i64 = 1_704_067_200;

    #[test]
    fn test_year_from_timestamp() {
        assert_eq!(AccrualContext::at(JAN_1_2023).year, 2023);
        assert_eq!(AccrualContext::at(JAN_1_2024 - 1).year, 2023);
        assert_eq!(AccrualContext::at(JAN_1_2024).year, 2024);
    }

    #[test]
    fn test_year_start() {
        assert_eq!(year_start(2023), Some(JAN_1_2023));
        assert_eq!(year_start(2024), Some(JAN_1_2024));
    }

    #[test]
    fn test_advance_recomputes_year() {
        let ctx = AccrualContext::at(JAN_1_2023).advance(ONE_YEAR);
        assert_eq!(ctx.now, JAN_1_2024);
        assert_eq!(ctx.year, 2024);
    }
}
