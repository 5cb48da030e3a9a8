//! Roadmap Entity and access rules

use serde::{Deserialize, Serialize};
use super::entity::Entity;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Roadmap {
    pub id: u32,
    pub title: String,
    pub description: Option<String>,
    pub is_public: bool,
    pub owner_id: String,
}

impl Roadmap {
    pub fn new(id: u32, title: String, owner_id: String) -> Self {
        Self {
            id,
            title,
            description: None,
            is_public: false,
            owner_id,
        }
    }
}

impl Entity for Roadmap {
    type Id = u32;
    const KIND: &'static str = "Roadmap";

    fn id(&self) -> Self::Id {
        self.id
    }
}

/// What a user wants to do with a roadmap
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    View,
    Edit,
    Delete,
}

/// Single capability lookup for every roadmap action.
///
/// The owner may do anything; everyone else may only view public roadmaps.
pub fn has_permission(user_id: &str, roadmap: &Roadmap, action: Action) -> bool {
    if roadmap.owner_id == user_id {
        return true;
    }
    action == Action::View && roadmap.is_public
}
