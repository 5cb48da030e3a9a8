//! Post filtering for the timeline and board views.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::{Post, Priority};
use crate::timeline::effective_span;

/// Active filter criteria. Empty collections and `None` mean "no constraint".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterState {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub status_ids: Vec<u32>,
    pub assignee_ids: Vec<String>,
    pub priorities: Vec<Priority>,
    pub tags: Vec<String>,
    pub search_term: String,
}

impl FilterState {
    /// Number of criteria currently constraining the result
    pub fn active_count(&self) -> usize {
        [
            self.start_date.is_some(),
            self.end_date.is_some(),
            !self.status_ids.is_empty(),
            !self.assignee_ids.is_empty(),
            !self.priorities.is_empty(),
            !self.tags.is_empty(),
            !self.search_term.trim().is_empty(),
        ]
        .iter()
        .filter(|active| **active)
        .count()
    }

    pub fn is_empty(&self) -> bool {
        self.active_count() == 0
    }

    /// Whether a single post satisfies every active criterion.
    ///
    /// Date bounds are tested against the post's effective span, so an
    /// undated post counts as starting `today`.
    pub fn matches(&self, post: &Post, today: NaiveDate, default_duration_days: i64) -> bool {
        if self.start_date.is_some() || self.end_date.is_some() {
            let span = effective_span(post, today, default_duration_days);
            if let Some(from) = self.start_date {
                if span.end < from {
                    return false;
                }
            }
            if let Some(to) = self.end_date {
                if span.start > to {
                    return false;
                }
            }
        }

        if !self.status_ids.is_empty()
            && !post.status_id.is_some_and(|id| self.status_ids.contains(&id))
        {
            return false;
        }

        if !self.assignee_ids.is_empty()
            && !post
                .assignee_id
                .as_ref()
                .is_some_and(|id| self.assignee_ids.contains(id))
        {
            return false;
        }

        if !self.priorities.is_empty()
            && !post.priority.is_some_and(|p| self.priorities.contains(&p))
        {
            return false;
        }

        if !self.tags.is_empty() && !post.tags.iter().any(|t| self.tags.contains(t)) {
            return false;
        }

        let term = self.search_term.trim().to_lowercase();
        if !term.is_empty() {
            let in_title = post.title.to_lowercase().contains(&term);
            let in_description = post
                .description
                .as_ref()
                .is_some_and(|d| d.to_lowercase().contains(&term));
            if !in_title && !in_description {
                return false;
            }
        }

        true
    }

    /// Posts that pass, in input order
    pub fn apply<'a>(&self, posts: &'a [Post], today: NaiveDate, default_duration_days: i64) -> Vec<&'a Post> {
        posts
            .iter()
            .filter(|post| self.matches(post, today, default_duration_days))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn posts() -> Vec<Post> {
        let mut a = Post::new(1, 1, "Login page".to_string()).with_dates(Some("2024-01-01"), Some("2024-01-10"));
        a.status_id = Some(1);
        a.priority = Some(Priority::High);
        a.tags = vec!["ui".to_string()];
        a.assignee_id = Some("u1".to_string());

        let mut b = Post::new(2, 1, "Billing API".to_string()).with_dates(Some("2024-02-01"), Some("2024-02-05"));
        b.status_id = Some(2);
        b.description = Some("Stripe webhooks for LOGIN events".to_string());
        b.tags = vec!["api".to_string()];

        let c = Post::new(3, 1, "Undated".to_string());
        vec![a, b, c]
    }

    fn ids(found: Vec<&Post>) -> Vec<u32> {
        found.iter().map(|p| p.id).collect()
    }

    #[test]
    fn test_empty_filter_passes_everything() {
        let filter = FilterState::default();
        assert!(filter.is_empty());
        assert_eq!(ids(filter.apply(&posts(), day(2024, 3, 1), 7)), vec![1, 2, 3]);
    }

    #[test]
    fn test_search_is_case_insensitive_over_title_and_description() {
        let filter = FilterState {
            search_term: "login".to_string(),
            ..Default::default()
        };
        assert_eq!(filter.active_count(), 1);
        assert_eq!(ids(filter.apply(&posts(), day(2024, 3, 1), 7)), vec![1, 2]);
    }

    #[test]
    fn test_date_bounds_use_overlap() {
        let filter = FilterState {
            start_date: Some(day(2024, 1, 8)),
            end_date: Some(day(2024, 1, 31)),
            ..Default::default()
        };
        // Undated post starts today (2024-03-01) and falls outside
        assert_eq!(ids(filter.apply(&posts(), day(2024, 3, 1), 7)), vec![1]);
        // With today inside the window it is included
        assert_eq!(ids(filter.apply(&posts(), day(2024, 1, 20), 7)), vec![1, 3]);
    }

    #[test]
    fn test_criteria_combine() {
        let filter = FilterState {
            status_ids: vec![1, 2],
            tags: vec!["api".to_string()],
            ..Default::default()
        };
        assert_eq!(filter.active_count(), 2);
        assert_eq!(ids(filter.apply(&posts(), day(2024, 3, 1), 7)), vec![2]);

        let filter = FilterState {
            priorities: vec![Priority::High],
            assignee_ids: vec!["u1".to_string()],
            ..Default::default()
        };
        assert_eq!(ids(filter.apply(&posts(), day(2024, 3, 1), 7)), vec![1]);
    }

    #[test]
    fn test_blank_search_is_inactive() {
        let filter = FilterState {
            search_term: "   ".to_string(),
            ..Default::default()
        };
        assert!(filter.is_empty());
    }
}
