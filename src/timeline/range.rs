//! Date Range Calculator
//!
//! Derives the visible `[start, end]` window from every known date, padded
//! according to a [`RangePolicy`]. Unparseable dates are skipped and
//! reported back to the caller instead of failing the calculation.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::dates::{add_days, days_between, parse_date};
use crate::config::RangePolicy;
use crate::domain::{Milestone, Post};

/// Inclusive calendar window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// Number of calendar days covered, both ends included. Zero when inverted.
    pub fn day_count(&self) -> i64 {
        (days_between(self.start, self.end) + 1).max(0)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    pub fn check(&self) -> Result<(), InvalidRangeError> {
        if self.start > self.end {
            return Err(InvalidRangeError {
                start: self.start,
                end: self.end,
            });
        }
        Ok(())
    }
}

/// Range whose start lies after its end
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidRangeError {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl std::fmt::Display for InvalidRangeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Invalid range: start {} is after end {}", self.start, self.end)
    }
}

impl std::error::Error for InvalidRangeError {}

/// Which field an unparseable date came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateField {
    PostStart,
    PostEnd,
    Milestone,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedDate {
    pub field: DateField,
    pub id: u32,
    pub raw: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeReport {
    pub range: DateRange,
    /// Dates that could not be parsed and were left out
    pub skipped: Vec<SkippedDate>,
    /// True when nothing was dated and the fallback window was used
    pub fallback: bool,
}

/// Compute the padded window covering every post and milestone date.
pub fn calculate_range(
    posts: &[Post],
    milestones: &[Milestone],
    policy: &RangePolicy,
    today: NaiveDate,
) -> RangeReport {
    let mut skipped = Vec::new();
    let mut bounds: Option<(NaiveDate, NaiveDate)> = None;

    let mut visit = |raw: &str, field: DateField, id: u32| match parse_date(raw) {
        Some(date) => {
            bounds = Some(match bounds {
                Some((lo, hi)) => (lo.min(date), hi.max(date)),
                None => (date, date),
            });
        }
        None => skipped.push(SkippedDate {
            field,
            id,
            raw: raw.to_string(),
        }),
    };

    for post in posts {
        if let Some(raw) = &post.start_date {
            visit(raw, DateField::PostStart, post.id);
        }
        if let Some(raw) = &post.end_date {
            visit(raw, DateField::PostEnd, post.id);
        }
    }
    for milestone in milestones {
        visit(&milestone.date, DateField::Milestone, milestone.id);
    }

    let (range, fallback) = match bounds {
        Some((earliest, latest)) => (
            DateRange::new(
                add_days(earliest, policy.pad_before_days.saturating_neg()),
                add_days(latest, policy.pad_after_days),
            ),
            false,
        ),
        None => (
            DateRange::new(
                add_days(today, policy.empty_before_days.saturating_neg()),
                add_days(today, policy.empty_after_days),
            ),
            true,
        ),
    };

    RangeReport {
        range,
        skipped,
        fallback,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn post(id: u32, start: Option<&str>, end: Option<&str>) -> Post {
        Post::new(id, 1, format!("Post {}", id)).with_dates(start, end)
    }

    fn milestone(id: u32, date: &str) -> Milestone {
        Milestone::new(id, 1, format!("M{}", id), date.to_string())
    }

    #[test]
    fn test_empty_input_uses_fallback_window() {
        let today = d(2024, 6, 15);
        let report = calculate_range(&[], &[], &RangePolicy::default(), today);
        assert!(report.fallback);
        assert_eq!(report.range.start, d(2024, 5, 16));
        assert_eq!(report.range.end, d(2024, 9, 13));
        assert!(report.skipped.is_empty());
    }

    #[test]
    fn test_padding_around_items_and_milestones() {
        let posts = vec![post(1, Some("2024-01-01"), Some("2024-03-01"))];
        let milestones = vec![milestone(9, "2024-02-01")];
        let report = calculate_range(&posts, &milestones, &RangePolicy::default(), d(2030, 1, 1));

        assert!(!report.fallback);
        assert!(report.range.start <= d(2023, 12, 25));
        assert!(report.range.end >= d(2024, 3, 31));
        assert_eq!(report.range.start, d(2023, 12, 25));
        assert_eq!(report.range.end, d(2024, 3, 31));
    }

    #[test]
    fn test_range_covers_every_date() {
        let posts = vec![
            post(1, Some("2024-05-10"), None),
            post(2, None, Some("2024-08-01")),
            post(3, Some("2023-11-30"), Some("2024-01-02")),
        ];
        let milestones = vec![milestone(1, "2025-01-01")];
        let policy = RangePolicy {
            pad_before_days: 0,
            pad_after_days: 0,
            ..RangePolicy::default()
        };
        let range = calculate_range(&posts, &milestones, &policy, d(2024, 1, 1)).range;
        assert_eq!(range.start, d(2023, 11, 30));
        assert_eq!(range.end, d(2025, 1, 1));
    }

    #[test]
    fn test_extreme_padding_saturates() {
        let policy = RangePolicy {
            pad_before_days: i64::MAX,
            pad_after_days: i64::MAX,
            empty_before_days: i64::MAX,
            empty_after_days: i64::MAX,
        };
        let posts = vec![post(1, Some("2024-01-01"), None)];
        let report = calculate_range(&posts, &[], &policy, d(2024, 1, 1));
        assert_eq!(report.range.start, NaiveDate::MIN);
        assert_eq!(report.range.end, NaiveDate::MAX);

        let empty = calculate_range(&[], &[], &policy, d(2024, 1, 1));
        assert_eq!(empty.range.start, NaiveDate::MIN);
        assert_eq!(empty.range.end, NaiveDate::MAX);
    }

    #[test]
    fn test_invalid_dates_are_skipped() {
        let posts = vec![
            post(1, Some("not a date"), Some("2024-04-01")),
            post(2, Some("2024-03-01"), None),
        ];
        let milestones = vec![milestone(5, "garbage")];
        let report = calculate_range(&posts, &milestones, &RangePolicy::default(), d(2024, 1, 1));

        assert_eq!(report.skipped.len(), 2);
        assert_eq!(report.skipped[0].field, DateField::PostStart);
        assert_eq!(report.skipped[0].id, 1);
        assert_eq!(report.skipped[1].field, DateField::Milestone);
        assert_eq!(report.range.start, d(2024, 2, 23));
        assert_eq!(report.range.end, d(2024, 5, 1));
    }

    #[test]
    fn test_only_invalid_dates_falls_back() {
        let posts = vec![post(1, Some("??"), None)];
        let report = calculate_range(&posts, &[], &RangePolicy::default(), d(2024, 1, 31));
        assert!(report.fallback);
        assert_eq!(report.skipped.len(), 1);
    }

    #[test]
    fn test_idempotent() {
        let posts = vec![post(1, Some("2024-01-01"), Some("2024-01-08"))];
        let a = calculate_range(&posts, &[], &RangePolicy::default(), d(2024, 1, 1));
        let b = calculate_range(&posts, &[], &RangePolicy::default(), d(2024, 1, 1));
        assert_eq!(a, b);
    }

    #[test]
    fn test_check_rejects_inverted_range() {
        let range = DateRange::new(d(2024, 2, 1), d(2024, 1, 1));
        assert!(range.check().is_err());
        assert_eq!(range.day_count(), 0);
        assert_eq!(DateRange::new(d(2024, 1, 1), d(2024, 1, 1)).day_count(), 1);
    }
}
