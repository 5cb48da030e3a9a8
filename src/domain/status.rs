//! Status Entity
//!
//! Statuses are the kanban columns of a roadmap.

use serde::{Deserialize, Serialize};
use super::entity::Entity;

/// Seeded when a roadmap has no statuses: (name, colour)
pub const DEFAULT_STATUSES: [(&str, &str); 3] = [
    ("To Do", "#4299e1"),
    ("In Progress", "#ed8936"),
    ("Done", "#48bb78"),
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Status {
    pub id: u32,
    pub roadmap_id: u32,
    pub name: String,
    /// Hex colour
    pub color: String,
    /// Column position
    pub order: i32,
}

impl Status {
    pub fn new(id: u32, roadmap_id: u32, name: String, color: String, order: i32) -> Self {
        Self {
            id,
            roadmap_id,
            name,
            color,
            order,
        }
    }
}

impl Entity for Status {
    type Id = u32;
    const KIND: &'static str = "Status";

    fn id(&self) -> Self::Id {
        self.id
    }
}
