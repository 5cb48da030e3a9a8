//! Scale/Grid Generator
//!
//! Splits a date range into calendar intervals (day, week, month, quarter,
//! year) with a primary label per column and secondary labels merged across
//! runs of columns that share the same value.

use chrono::{Datelike, Months, NaiveDate};
use serde::{Deserialize, Serialize};

use super::dates::{add_days, days_between};
use super::range::{DateRange, InvalidRangeError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeScale {
    Day,
    Week,
    #[default]
    Month,
    Quarter,
    Year,
}

impl TimeScale {
    pub const ALL: [TimeScale; 5] = [
        TimeScale::Day,
        TimeScale::Week,
        TimeScale::Month,
        TimeScale::Quarter,
        TimeScale::Year,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TimeScale::Day => "day",
            TimeScale::Week => "week",
            TimeScale::Month => "month",
            TimeScale::Quarter => "quarter",
            TimeScale::Year => "year",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|scale| scale.as_str() == s)
    }

    /// First day of the calendar period containing `date`
    fn period_start(&self, date: NaiveDate) -> NaiveDate {
        match self {
            TimeScale::Day => date,
            TimeScale::Week => add_days(date, -i64::from(date.weekday().num_days_from_monday())),
            TimeScale::Month => date.with_day(1).unwrap_or(date),
            TimeScale::Quarter => {
                let month0 = date.month0() / 3 * 3;
                NaiveDate::from_ymd_opt(date.year(), month0 + 1, 1).unwrap_or(date)
            }
            TimeScale::Year => NaiveDate::from_ymd_opt(date.year(), 1, 1).unwrap_or(date),
        }
    }

    /// Last day of the calendar period containing `date`; `None` past the calendar end
    fn period_end(&self, date: NaiveDate) -> Option<NaiveDate> {
        let start = self.period_start(date);
        let next = match self {
            TimeScale::Day => start.succ_opt()?,
            TimeScale::Week => start.checked_add_signed(chrono::Duration::days(7))?,
            TimeScale::Month => start.checked_add_months(Months::new(1))?,
            TimeScale::Quarter => start.checked_add_months(Months::new(3))?,
            TimeScale::Year => start.checked_add_months(Months::new(12))?,
        };
        next.pred_opt()
    }

    fn primary_label(&self, date: NaiveDate) -> String {
        match self {
            TimeScale::Day => date.format("%-d").to_string(),
            TimeScale::Week => format!("W{}", date.iso_week().week()),
            TimeScale::Month => date.format("%b").to_string(),
            TimeScale::Quarter => format!("Q{}", date.month0() / 3 + 1),
            TimeScale::Year => date.format("%Y").to_string(),
        }
    }

    fn secondary_label(&self, date: NaiveDate) -> String {
        match self {
            TimeScale::Day => date.format("%a").to_string(),
            TimeScale::Week => date.format("%b %Y").to_string(),
            TimeScale::Month | TimeScale::Quarter => date.format("%Y").to_string(),
            TimeScale::Year => String::new(),
        }
    }
}

/// One primary interval, clipped to the requested range
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridColumn {
    pub start: NaiveDate,
    /// Inclusive
    pub end: NaiveDate,
    /// Calendar days in this column
    pub days: i64,
    pub primary: String,
    pub left: f64,
    pub width: f64,
}

/// A secondary label spanning consecutive columns
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecondarySpan {
    pub label: String,
    pub first_column: usize,
    /// Number of columns covered
    pub span: usize,
    pub left: f64,
    pub width: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Grid {
    pub scale: TimeScale,
    pub cell_width: f64,
    pub columns: Vec<GridColumn>,
    pub secondary: Vec<SecondarySpan>,
}

impl Grid {
    pub fn total_width(&self) -> f64 {
        self.columns.len() as f64 * self.cell_width
    }

    /// Index of the column containing `date`
    pub fn column_at(&self, date: NaiveDate) -> Option<usize> {
        self.columns
            .iter()
            .position(|col| col.start <= date && date <= col.end)
    }
}

/// Build the header grid for `range` at the given scale.
pub fn generate_grid(
    range: &DateRange,
    scale: TimeScale,
    cell_width: f64,
) -> Result<Grid, InvalidRangeError> {
    range.check()?;

    let mut columns: Vec<GridColumn> = Vec::new();
    let mut secondary: Vec<SecondarySpan> = Vec::new();
    let mut cursor = range.start;

    loop {
        let end = match scale.period_end(cursor) {
            Some(period_end) => period_end.min(range.end),
            None => range.end,
        };
        let index = columns.len();
        let left = index as f64 * cell_width;

        let label = scale.secondary_label(cursor);
        match secondary.last_mut() {
            Some(current) if current.label == label => {
                current.span += 1;
                current.width += cell_width;
            }
            _ => secondary.push(SecondarySpan {
                label,
                first_column: index,
                span: 1,
                left,
                width: cell_width,
            }),
        }

        columns.push(GridColumn {
            start: cursor,
            end,
            days: days_between(cursor, end) + 1,
            primary: scale.primary_label(cursor),
            left,
            width: cell_width,
        });

        if end >= range.end {
            break;
        }
        match end.succ_opt() {
            Some(next) => cursor = next,
            None => break,
        }
    }

    Ok(Grid {
        scale,
        cell_width,
        columns,
        secondary,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn assert_tiles(grid: &Grid, range: &DateRange) {
        let first = grid.columns.first().unwrap();
        let last = grid.columns.last().unwrap();
        assert_eq!(first.start, range.start);
        assert_eq!(last.end, range.end);
        for pair in grid.columns.windows(2) {
            assert_eq!(add_days(pair[0].end, 1), pair[1].start, "gap or overlap in {:?}", grid.scale);
            assert!(pair[0].start <= pair[0].end);
        }
        let days: i64 = grid.columns.iter().map(|c| c.days).sum();
        assert_eq!(days, range.day_count());
    }

    #[test]
    fn test_every_scale_tiles_range() {
        let ranges = [
            DateRange::new(d(2023, 12, 25), d(2024, 3, 31)),
            DateRange::new(d(2024, 2, 29), d(2026, 1, 1)),
            DateRange::new(d(2024, 1, 3), d(2024, 1, 9)),
        ];
        for range in &ranges {
            for scale in TimeScale::ALL {
                let grid = generate_grid(range, scale, 10.0).unwrap();
                assert_tiles(&grid, range);
            }
        }
    }

    #[test]
    fn test_single_day_range_has_one_interval() {
        let range = DateRange::new(d(2024, 5, 5), d(2024, 5, 5));
        for scale in TimeScale::ALL {
            let grid = generate_grid(&range, scale, 20.0).unwrap();
            assert_eq!(grid.columns.len(), 1);
            assert_eq!(grid.secondary.len(), 1);
        }
    }

    #[test]
    fn test_inverted_range_fails() {
        let range = DateRange::new(d(2024, 5, 6), d(2024, 5, 5));
        let err = generate_grid(&range, TimeScale::Day, 20.0).unwrap_err();
        assert_eq!(err.start, d(2024, 5, 6));
    }

    #[test]
    fn test_month_scale_merges_years() {
        let range = DateRange::new(d(2024, 1, 1), d(2025, 2, 28));
        let grid = generate_grid(&range, TimeScale::Month, 100.0).unwrap();

        assert_eq!(grid.columns.len(), 14);
        assert_eq!(grid.columns[0].primary, "Jan");
        assert_eq!(grid.columns[13].primary, "Feb");
        assert_eq!(grid.secondary.len(), 2);
        assert_eq!(grid.secondary[0].label, "2024");
        assert_eq!(grid.secondary[0].span, 12);
        assert_eq!(grid.secondary[0].width, 1200.0);
        assert_eq!(grid.secondary[1].label, "2025");
        assert_eq!(grid.secondary[1].first_column, 12);
        assert_eq!(grid.secondary[1].left, 1200.0);
        assert_eq!(grid.secondary[1].span, 2);
        assert_eq!(grid.total_width(), 1400.0);
    }

    #[test]
    fn test_week_scale_clips_partial_weeks() {
        // 2024-01-03 is a Wednesday
        let range = DateRange::new(d(2024, 1, 3), d(2024, 1, 16));
        let grid = generate_grid(&range, TimeScale::Week, 50.0).unwrap();

        assert_eq!(grid.columns.len(), 3);
        assert_eq!(grid.columns[0].end, d(2024, 1, 7));
        assert_eq!(grid.columns[0].days, 5);
        assert_eq!(grid.columns[1].primary, "W2");
        assert_eq!(grid.columns[2].days, 2);
        assert_eq!(grid.secondary.len(), 1);
        assert_eq!(grid.secondary[0].label, "Jan 2024");
    }

    #[test]
    fn test_quarter_and_day_labels() {
        let range = DateRange::new(d(2024, 11, 15), d(2025, 4, 1));
        let grid = generate_grid(&range, TimeScale::Quarter, 80.0).unwrap();
        let labels: Vec<_> = grid.columns.iter().map(|c| c.primary.as_str()).collect();
        assert_eq!(labels, vec!["Q4", "Q1", "Q2"]);
        assert_eq!(grid.secondary.len(), 2);

        let days = DateRange::new(d(2024, 1, 1), d(2024, 1, 3));
        let grid = generate_grid(&days, TimeScale::Day, 30.0).unwrap();
        let labels: Vec<_> = grid.columns.iter().map(|c| c.primary.as_str()).collect();
        assert_eq!(labels, vec!["1", "2", "3"]);
        assert_eq!(grid.secondary[0].label, "Mon");
        assert_eq!(grid.secondary.len(), 3);
    }

    #[test]
    fn test_year_scale_single_secondary_span() {
        let range = DateRange::new(d(2022, 6, 1), d(2025, 6, 1));
        let grid = generate_grid(&range, TimeScale::Year, 120.0).unwrap();
        assert_eq!(grid.columns.len(), 4);
        assert_eq!(grid.secondary.len(), 1);
        assert_eq!(grid.secondary[0].span, 4);
        assert_eq!(grid.column_at(d(2024, 12, 31)), Some(2));
        assert_eq!(grid.column_at(d(2030, 1, 1)), None);
    }

    #[test]
    fn test_scale_names() {
        assert_eq!(TimeScale::parse("quarter"), Some(TimeScale::Quarter));
        assert_eq!(TimeScale::default(), TimeScale::Month);
        assert_eq!(TimeScale::parse("decade"), None);
    }
}
