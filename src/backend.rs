//! Backend abstraction
//!
//! The timeline never talks to storage directly. Implementations may be
//! SQLite, a remote API, or an in-memory double for tests.

use async_trait::async_trait;

use crate::domain::{
    Dependency, DomainResult, Milestone, MilestonePatch, NewDependency, NewMilestone, Post, Status,
};

/// Data access needed by a timeline session
///
/// All operations are async to support various backends.
#[async_trait]
pub trait TimelineBackend: Send + Sync {
    async fn fetch_posts(&self, roadmap_id: u32) -> DomainResult<Vec<Post>>;

    async fn fetch_milestones(&self, roadmap_id: u32) -> DomainResult<Vec<Milestone>>;

    async fn fetch_dependencies(&self, roadmap_id: u32) -> DomainResult<Vec<Dependency>>;

    async fn fetch_statuses(&self, roadmap_id: u32) -> DomainResult<Vec<Status>>;

    async fn create_milestone(&self, milestone: &NewMilestone) -> DomainResult<Milestone>;

    async fn update_milestone(&self, id: u32, patch: &MilestonePatch) -> DomainResult<Milestone>;

    async fn delete_milestone(&self, id: u32) -> DomainResult<()>;

    async fn create_dependency(&self, dependency: &NewDependency) -> DomainResult<Dependency>;

    async fn delete_dependency(&self, id: u32) -> DomainResult<()>;

    /// Move a post to a status column at the given order
    async fn update_post_status(&self, post_id: u32, status_id: u32, order: i32) -> DomainResult<Post>;
}
