//! Bucket granularity and its string forms.
//!
//! Hour and day buckets are fixed-width in UTC; month buckets follow the
//! calendar and have no fixed millisecond width.
//!
//! ```
//! use date_bucketizer::Granularity;
//!
//! let g: Granularity = "Hour".parse().unwrap();
//! assert_eq!(g, Granularity::Hour);
//! assert_eq!(g.to_string(), "hour");
//! assert_eq!(g.millis_multiplier(), Some(3_600_000));
//! ```

use std::{fmt, str::FromStr};

use chrono::{DateTime, Datelike, Days, Duration, NaiveTime, TimeZone, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{BucketizerError, Result};

/// Number of milliseconds in an hour.
pub const MILLIS_PER_HOUR: i64 = 60 * 60 * 1000;
/// Number of milliseconds in a day.
pub const MILLIS_PER_DAY: i64 = 24 * MILLIS_PER_HOUR;

/// Unit size of one bucket.
///
/// Deserializes through [`FromStr`], so config files accept the same names as the CLI.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum Granularity {
    /// UTC hour
    Hour,
    /// UTC day
    #[default]
    Day,
    /// calendar months, UTC
    Month,
}

impl Granularity {
    /// Fixed per-bucket width in milliseconds; `None` for calendar months.
    pub const fn millis_multiplier(self) -> Option<i64> {
        match self {
            Granularity::Hour => Some(MILLIS_PER_HOUR),
            Granularity::Day => Some(MILLIS_PER_DAY),
            Granularity::Month => None,
        }
    }

    /// Clears every component finer than this granularity, in UTC.
    ///
    /// Minutes, seconds and sub-second parts are always cleared; hours too
    /// for day and month; the day-of-month is reset to 1 for month.
    pub fn zero_out(self, date: DateTime<Utc>) -> DateTime<Utc> {
        let midnight = date.date_naive().and_time(NaiveTime::MIN);
        let zeroed = match self {
            Granularity::Hour => midnight + Duration::hours(date.hour() as i64),
            Granularity::Day => midnight,
            Granularity::Month => midnight - Days::new(date.day0() as u64),
        };
        zeroed.and_utc()
    }

    /// Moves `date` forward by `count` buckets without zeroing it first.
    ///
    /// Month steps keep the day-of-month; callers pass month-zeroed dates.
    pub(crate) fn add_buckets(self, date: DateTime<Utc>, count: i64) -> Result<DateTime<Utc>> {
        let out = match self.millis_multiplier() {
            Some(mult) => count
                .checked_mul(mult)
                .and_then(Duration::try_milliseconds)
                .and_then(|d| date.checked_add_signed(d)),
            None => add_months(date, count),
        };
        out.ok_or_else(|| {
            BucketizerError::OutOfRange(format!("{date} + {count} {} buckets", self))
        })
    }

    /// Whole buckets from `base` to `date`; negative when `date` precedes `base`.
    ///
    /// Both inputs are expected to be zeroed for month granularity; for fixed
    /// widths the result is floored.
    pub(crate) fn buckets_between(self, base: DateTime<Utc>, date: DateTime<Utc>) -> i64 {
        match self.millis_multiplier() {
            Some(mult) => (date - base).num_milliseconds().div_euclid(mult),
            None => month_index(date) - month_index(base),
        }
    }
}

/// Linear month index: `year * 12 + month0`.
fn month_index(date: DateTime<Utc>) -> i64 {
    date.year() as i64 * 12 + date.month0() as i64
}

fn add_months(date: DateTime<Utc>, count: i64) -> Option<DateTime<Utc>> {
    let idx = month_index(date).checked_add(count)?;
    let year = i32::try_from(idx.div_euclid(12)).ok()?;
    let month = idx.rem_euclid(12) as u32 + 1;
    Utc.with_ymd_and_hms(year, month, date.day(), date.hour(), date.minute(), date.second())
        .single()
        .and_then(|d| d.with_nanosecond(date.nanosecond()))
}

/// Display/parse for config and CLI ergonomics (`"hour"`, `"day"`, `"month"`).
impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Granularity::Hour => "hour",
            Granularity::Day => "day",
            Granularity::Month => "month",
        };
        f.write_str(s)
    }
}

impl TryFrom<String> for Granularity {
    type Error = BucketizerError;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl FromStr for Granularity {
    type Err = BucketizerError;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        // "M" is month, "m" is left unmapped so it can't be mistaken for minute
        if trimmed == "M" {
            return Ok(Granularity::Month);
        }
        match trimmed.to_lowercase().as_str() {
            "h" | "hour" | "hours" => Ok(Granularity::Hour),
            "d" | "day" | "days" => Ok(Granularity::Day),
            "mo" | "month" | "months" | "year" => Ok(Granularity::Month),
            _ => Err(BucketizerError::InvalidArgument(format!(
                "unknown granularity: {s:?} (expected hour, day or month)"
            ))),
        }
    }
}
