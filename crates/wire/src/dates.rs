//! Date and timestamp handling at the wire boundary.
//!
//! Parsing is explicit: each accepted layout is tried in order and anything else is rejected,
//! so a malformed value never silently becomes "now" or the epoch.
//!
//! Accepted timestamp layouts:
//! - RFC 3339 (`2024-03-01T10:15:00.000Z`, `2024-03-01T10:15:00+05:30`)
//! - ISO 8601 with a compact offset (`2024-03-01T10:15:00.000+0000`)
//! - ISO 8601 without an offset, read as UTC (`2024-03-01T10:15:00`)
//! - calendar date, read as midnight UTC (`2024-03-01`)
//!
//! Output is always `YYYY-MM-DD` for calendar dates and RFC 3339 with milliseconds and a `Z`
//! suffix for timestamps.

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parse a wire timestamp into UTC.
///
/// Returns `None` if `value` matches none of the accepted layouts.
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f%z") {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(value, DATE_FORMAT)
        .ok()
        .and_then(start_of_day)
}

/// Parse a wire calendar date.
///
/// Accepts a bare `YYYY-MM-DD` or any timestamp layout accepted by [`parse_timestamp`], in which
/// case the UTC calendar day is taken.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    NaiveDate::parse_from_str(value, DATE_FORMAT)
        .ok()
        .or_else(|| parse_timestamp(value).map(|dt| dt.date_naive()))
}

/// Midnight UTC at the start of `date`.
pub fn start_of_day(date: NaiveDate) -> Option<DateTime<Utc>> {
    date.and_hms_opt(0, 0, 0).map(|naive| naive.and_utc())
}

/// Render a calendar date as `YYYY-MM-DD`.
pub fn format_iso_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Render a timestamp as RFC 3339 with millisecond precision (`2024-03-01T10:15:00.000Z`).
pub fn format_iso_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
}
