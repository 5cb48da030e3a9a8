//! Domain Layer
//!
//! Roadmap entities and core abstractions.
//! This layer has NO external dependencies (except serde for serialization).

mod entity;
mod post;
mod milestone;
mod dependency;
mod status;
mod roadmap;
mod user;

use serde::{Deserialize, Serialize};

pub use entity::{Entity, DomainError, DomainResult};
pub use post::{Post, Priority, DEFAULT_BAR_COLOR};
pub use milestone::{Milestone, MilestonePatch, NewMilestone};
pub use dependency::{Dependency, DependencyType, NewDependency};
pub use status::{Status, DEFAULT_STATUSES};
pub use roadmap::{has_permission, Action, Roadmap};
pub use user::User;

/// Everything the timeline renders for one roadmap, fetched as a whole
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimelineSnapshot {
    pub posts: Vec<Post>,
    pub milestones: Vec<Milestone>,
    pub dependencies: Vec<Dependency>,
}

impl TimelineSnapshot {
    pub fn new(posts: Vec<Post>, milestones: Vec<Milestone>, dependencies: Vec<Dependency>) -> Self {
        Self {
            posts,
            milestones,
            dependencies,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.posts.is_empty() && self.milestones.is_empty() && self.dependencies.is_empty()
    }

    pub fn post(&self, id: u32) -> Option<&Post> {
        self.posts.iter().find(|p| p.id == id)
    }
}
