//! Date helpers shared by every timeline component.
//!
//! `days_between` is the only date-difference function in the crate. It takes
//! the earlier date first and returns `later - earlier`, so a date after the
//! reference point always yields a positive count.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeDelta};

/// Parse a stored date string.
///
/// Accepts `YYYY-MM-DD`, RFC 3339 timestamps and naive timestamps as written
/// by the database. Returns `None` for anything else.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(stamp) = DateTime::parse_from_rfc3339(raw) {
        return Some(stamp.date_naive());
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|stamp| stamp.date())
}

/// Whole days from `earlier` to `later`; negative when the arguments are swapped.
pub fn days_between(earlier: NaiveDate, later: NaiveDate) -> i64 {
    later.signed_duration_since(earlier).num_days()
}

/// Shift a date, saturating at the calendar limits.
pub fn add_days(date: NaiveDate, days: i64) -> NaiveDate {
    let limit = if days < 0 { NaiveDate::MIN } else { NaiveDate::MAX };
    TimeDelta::try_days(days)
        .and_then(|delta| date.checked_add_signed(delta))
        .unwrap_or(limit)
}

/// Format as `YYYY-MM-DD`
pub fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}
