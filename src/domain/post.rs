//! Post Entity
//!
//! A post is a dated unit of work on a roadmap. It is shown as a card on the
//! kanban board and as a bar on the timeline.

use serde::{Deserialize, Serialize};
use super::entity::Entity;
use super::status::Status;

/// Bar colour used when neither priority nor status provide one
pub const DEFAULT_BAR_COLOR: &str = "#3b82f6";

/// Post priority, drives the bar colour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
    Urgent,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
            Priority::Urgent => "urgent",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "low" => Some(Priority::Low),
            "medium" => Some(Priority::Medium),
            "high" => Some(Priority::High),
            "urgent" => Some(Priority::Urgent),
            _ => None,
        }
    }

    /// Bar colour (hex)
    pub fn color(&self) -> &'static str {
        match self {
            Priority::Urgent => "#ef4444",
            Priority::High => "#f97316",
            Priority::Medium => "#eab308",
            Priority::Low => "#22c55e",
        }
    }
}

/// A roadmap post (feature, task)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    /// Unique identifier
    pub id: u32,
    pub roadmap_id: u32,
    pub title: String,
    pub description: Option<String>,
    /// Kanban column
    pub status_id: Option<u32>,
    pub assignee_id: Option<String>,
    /// Raw start date as stored (`YYYY-MM-DD` or RFC 3339)
    pub start_date: Option<String>,
    /// Raw end date as stored
    pub end_date: Option<String>,
    pub priority: Option<Priority>,
    /// Completion percentage, 0-100
    pub progress: Option<u8>,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Position within its status column
    pub order: i32,
}

impl Post {
    pub fn new(id: u32, roadmap_id: u32, title: String) -> Self {
        Self {
            id,
            roadmap_id,
            title,
            description: None,
            status_id: None,
            assignee_id: None,
            start_date: None,
            end_date: None,
            priority: None,
            progress: None,
            tags: Vec::new(),
            order: 0,
        }
    }

    /// Builder-style helper for dated posts
    pub fn with_dates(mut self, start: Option<&str>, end: Option<&str>) -> Self {
        self.start_date = start.map(str::to_string);
        self.end_date = end.map(str::to_string);
        self
    }

    /// Colour of the timeline bar: priority first, then status colour.
    pub fn bar_color<'a>(&self, status: Option<&'a Status>) -> &'a str {
        match (self.priority, status) {
            (Some(priority), _) => priority.color(),
            (None, Some(status)) => status.color.as_str(),
            (None, None) => DEFAULT_BAR_COLOR,
        }
    }
}

impl Entity for Post {
    type Id = u32;
    const KIND: &'static str = "Post";

    fn id(&self) -> Self::Id {
        self.id
    }
}
