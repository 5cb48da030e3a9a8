//! Milestone Entity
//!
//! A single-date marker drawn as a full-height vertical line.

use serde::{Deserialize, Serialize};
use super::entity::Entity;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Milestone {
    pub id: u32,
    pub roadmap_id: u32,
    pub title: String,
    pub description: Option<String>,
    /// Raw date as stored
    pub date: String,
    pub color: Option<String>,
    #[serde(default)]
    pub is_completed: bool,
}

impl Milestone {
    pub fn new(id: u32, roadmap_id: u32, title: String, date: String) -> Self {
        Self {
            id,
            roadmap_id,
            title,
            description: None,
            date,
            color: None,
            is_completed: false,
        }
    }

    /// Apply a partial update
    pub fn apply(&mut self, patch: &MilestonePatch) {
        if let Some(title) = &patch.title {
            self.title = title.clone();
        }
        if let Some(description) = &patch.description {
            self.description = description.clone();
        }
        if let Some(date) = &patch.date {
            self.date = date.clone();
        }
        if let Some(color) = &patch.color {
            self.color = color.clone();
        }
        if let Some(done) = patch.is_completed {
            self.is_completed = done;
        }
    }
}

impl Entity for Milestone {
    type Id = u32;
    const KIND: &'static str = "Milestone";

    fn id(&self) -> Self::Id {
        self.id
    }
}

/// Fields accepted when creating a milestone
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewMilestone {
    pub roadmap_id: u32,
    pub title: String,
    pub description: Option<String>,
    pub date: String,
    pub color: Option<String>,
}

/// Partial update; `None` leaves a field untouched. Nullable fields use a
/// nested option so they can be cleared.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MilestonePatch {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub date: Option<String>,
    pub color: Option<Option<String>>,
    pub is_completed: Option<bool>,
}
