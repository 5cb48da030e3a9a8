//! Position Calculator
//!
//! Maps posts and milestones to pixel rectangles. Positions are a pure
//! function of (items, range start, layout parameters): nothing is cached
//! and rows follow input order, so repeated layouts of the same input are
//! identical.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::dates::{add_days, days_between, parse_date};
use crate::config::LayoutParams;
use crate::domain::{Milestone, Post, TimelineSnapshot};

/// Pixel rectangle
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    pub fn center_x(&self) -> f64 {
        self.left + self.width / 2.0
    }

    pub fn center_y(&self) -> f64 {
        self.top + self.height / 2.0
    }
}

/// Key of a placed element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ItemKey {
    Post(u32),
    Milestone(u32),
}

pub type PositionMap = BTreeMap<ItemKey, Rect>;

/// Dates a post actually occupies after defaults are applied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EffectiveSpan {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl EffectiveSpan {
    /// Inclusive duration, never below one day
    pub fn days(&self) -> i64 {
        (days_between(self.start, self.end) + 1).max(1)
    }
}

/// Resolve a post's dates: a missing or unparseable start becomes `today`,
/// a missing or unparseable end becomes start + `default_duration_days`.
pub fn effective_span(post: &Post, today: NaiveDate, default_duration_days: i64) -> EffectiveSpan {
    let start = post
        .start_date
        .as_deref()
        .and_then(parse_date)
        .unwrap_or(today);
    let end = post
        .end_date
        .as_deref()
        .and_then(parse_date)
        .unwrap_or_else(|| add_days(start, default_duration_days));
    EffectiveSpan { start, end }
}

pub struct PositionCalculator {
    origin: NaiveDate,
    params: LayoutParams,
    today: NaiveDate,
}

impl PositionCalculator {
    /// `origin` is the first day of the grid
    pub fn new(origin: NaiveDate, params: LayoutParams, today: NaiveDate) -> Self {
        Self {
            origin,
            params,
            today,
        }
    }

    /// Horizontal pixel offset of a date, clamped to the grid start
    pub fn offset_of(&self, date: NaiveDate) -> f64 {
        days_between(self.origin, date).max(0) as f64 * self.params.cell_width
    }

    /// Date under a horizontal pixel offset
    pub fn date_at(&self, offset: f64) -> NaiveDate {
        let days = (offset / self.params.cell_width).floor() as i64;
        add_days(self.origin, days)
    }

    /// Top of the given row
    pub fn row_top(&self, row: usize) -> f64 {
        let p = &self.params;
        p.header_height + p.padding + row as f64 * (p.row_height + p.row_gap)
    }

    /// Height of all post rows
    pub fn content_height(&self, post_count: usize) -> f64 {
        post_count as f64 * (self.params.row_height + self.params.row_gap)
    }

    pub fn place_post(&self, post: &Post, row: usize) -> Rect {
        let span = effective_span(post, self.today, self.params.default_duration_days);
        Rect {
            left: self.offset_of(span.start),
            top: self.row_top(row),
            width: span.days() as f64 * self.params.cell_width,
            height: self.params.row_height,
        }
    }

    /// Milestones are zero-width lines spanning all rows. `None` when the
    /// milestone date cannot be parsed.
    pub fn place_milestone(&self, milestone: &Milestone, post_count: usize) -> Option<Rect> {
        let date = parse_date(&milestone.date)?;
        let height = if post_count == 0 {
            self.params.empty_content_height
        } else {
            self.content_height(post_count)
        };
        Some(Rect {
            left: self.offset_of(date),
            top: 0.0,
            width: 0.0,
            height,
        })
    }

    pub fn place_posts(&self, posts: &[Post]) -> Vec<(u32, Rect)> {
        posts
            .iter()
            .enumerate()
            .map(|(row, post)| (post.id, self.place_post(post, row)))
            .collect()
    }

    pub fn place_milestones(&self, milestones: &[Milestone], post_count: usize) -> Vec<(u32, Rect)> {
        milestones
            .iter()
            .filter_map(|m| self.place_milestone(m, post_count).map(|rect| (m.id, rect)))
            .collect()
    }

    /// Place every post and milestone of a snapshot
    pub fn layout(&self, snapshot: &TimelineSnapshot) -> PositionMap {
        let mut positions = PositionMap::new();
        for (id, rect) in self.place_posts(&snapshot.posts) {
            positions.insert(ItemKey::Post(id), rect);
        }
        for (id, rect) in self.place_milestones(&snapshot.milestones, snapshot.posts.len()) {
            positions.insert(ItemKey::Milestone(id), rect);
        }
        positions
    }
}
