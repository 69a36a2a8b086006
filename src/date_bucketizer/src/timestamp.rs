//! Timestamp parsing and formatting at the crate's edges.
//!
//! What this module provides:
//! - [`parse_timestamp`]: RFC-3339 with any offset, or integer epoch milliseconds, to UTC.
//! - [`from_epoch_millis`]: epoch milliseconds to UTC.
//! - [`to_rfc3339_millis`]: UTC to an RFC-3339 string with millisecond precision.
//!
//! Examples
//! - "1980-02-02T05:04:05+02:00" -> "1980-02-02T03:04:05.000Z"
//! - "318308645000" -> "1980-02-02T03:04:05.000Z"

use chrono::{DateTime, SecondsFormat, Utc};

use crate::error::{BucketizerError, Result};

/// Parses an RFC-3339 timestamp or a signed integer of epoch milliseconds.
///
/// Surrounding whitespace is ignored.
pub fn parse_timestamp(s: &str) -> Result<DateTime<Utc>> {
    let trimmed = s.trim();
    if let Ok(millis) = trimmed.parse::<i64>() {
        return from_epoch_millis(millis);
    }
    DateTime::parse_from_rfc3339(trimmed)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| BucketizerError::Parse {
            input: s.to_string(),
            message: e.to_string(),
        })
}

/// Epoch milliseconds -> UTC.
pub fn from_epoch_millis(millis: i64) -> Result<DateTime<Utc>> {
    DateTime::<Utc>::from_timestamp_millis(millis).ok_or_else(|| BucketizerError::Parse {
        input: millis.to_string(),
        message: "epoch milliseconds out of range".into(),
    })
}

/// Format a UTC datetime as an RFC-3339 string with millisecond precision.
pub fn to_rfc3339_millis(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Millis, true)
}
