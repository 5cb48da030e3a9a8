//! SQLite Timeline Backend
//!
//! `TimelineBackend` over the local repositories, acting on behalf of one
//! user. Every call goes through `has_permission` for the owning roadmap.

use async_trait::async_trait;

use roadmap_timeline::domain::{
    has_permission, Action, Dependency, DomainError, DomainResult, Milestone, MilestonePatch, NewDependency,
    NewMilestone, Post, Roadmap, Status,
};
use roadmap_timeline::TimelineBackend;

use crate::db::DbState;
use crate::dependency_repo::DependencyRepository;
use crate::milestone_repo::MilestoneRepository;
use crate::post_repo::PostRepository;
use crate::roadmap_repo::RoadmapRepository;
use crate::status_repo::StatusRepository;
use crate::traits::{Repository, RoadmapScoped};

pub struct SqliteBackend {
    user_id: String,
    pub roadmaps: RoadmapRepository,
    pub statuses: StatusRepository,
    pub posts: PostRepository,
    pub milestones: MilestoneRepository,
    pub dependencies: DependencyRepository,
}

impl SqliteBackend {
    pub fn new(db: &DbState, user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            roadmaps: RoadmapRepository::new(db.connection()),
            statuses: StatusRepository::new(db.connection()),
            posts: PostRepository::new(db.connection()),
            milestones: MilestoneRepository::new(db.connection()),
            dependencies: DependencyRepository::new(db.connection()),
        }
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    async fn authorize(&self, roadmap_id: u32, action: Action) -> DomainResult<Roadmap> {
        let roadmap = self
            .roadmaps
            .find_by_id(roadmap_id)
            .await?
            .ok_or_else(|| DomainError::not_found::<Roadmap>(roadmap_id))?;
        if !has_permission(&self.user_id, &roadmap, action) {
            log::warn!("{} denied {:?} on roadmap {}", self.user_id, action, roadmap_id);
            return Err(DomainError::PermissionDenied(format!(
                "{:?} on roadmap {}",
                action, roadmap_id
            )));
        }
        Ok(roadmap)
    }

    async fn status_in_roadmap(&self, status_id: u32, roadmap_id: u32) -> DomainResult<Status> {
        match self.statuses.find_by_id(status_id).await? {
            Some(status) if status.roadmap_id == roadmap_id => Ok(status),
            Some(_) => Err(DomainError::InvalidInput(format!(
                "Status {} belongs to another roadmap",
                status_id
            ))),
            None => Err(DomainError::not_found::<Status>(status_id)),
        }
    }

    /// New roadmap owned by the acting user, seeded with the default statuses
    pub async fn create_roadmap(&self, title: &str, description: Option<String>, is_public: bool) -> DomainResult<Roadmap> {
        let mut roadmap = Roadmap::new(0, title.to_string(), self.user_id.clone());
        roadmap.description = description;
        roadmap.is_public = is_public;

        let created = self.roadmaps.create(&roadmap).await?;
        self.statuses.ensure_default_statuses(created.id).await?;
        Ok(created)
    }

    pub async fn delete_roadmap(&self, roadmap_id: u32) -> DomainResult<()> {
        self.authorize(roadmap_id, Action::Delete).await?;
        self.roadmaps.delete(roadmap_id).await
    }

    /// Appended to the end of its status column
    pub async fn create_post(&self, post: &Post) -> DomainResult<Post> {
        self.authorize(post.roadmap_id, Action::Edit).await?;
        if let Some(status_id) = post.status_id {
            self.status_in_roadmap(status_id, post.roadmap_id).await?;
        }
        self.posts.create(post).await
    }
}

#[async_trait]
impl TimelineBackend for SqliteBackend {
    async fn fetch_posts(&self, roadmap_id: u32) -> DomainResult<Vec<Post>> {
        self.authorize(roadmap_id, Action::View).await?;
        self.posts.list_by_roadmap(roadmap_id).await
    }

    async fn fetch_milestones(&self, roadmap_id: u32) -> DomainResult<Vec<Milestone>> {
        self.authorize(roadmap_id, Action::View).await?;
        self.milestones.list_by_roadmap(roadmap_id).await
    }

    async fn fetch_dependencies(&self, roadmap_id: u32) -> DomainResult<Vec<Dependency>> {
        self.authorize(roadmap_id, Action::View).await?;
        self.dependencies.list_by_roadmap(roadmap_id).await
    }

    async fn fetch_statuses(&self, roadmap_id: u32) -> DomainResult<Vec<Status>> {
        self.authorize(roadmap_id, Action::View).await?;
        self.statuses.list_by_roadmap(roadmap_id).await
    }

    async fn create_milestone(&self, milestone: &NewMilestone) -> DomainResult<Milestone> {
        self.authorize(milestone.roadmap_id, Action::Edit).await?;
        self.milestones.create_from(milestone).await
    }

    async fn update_milestone(&self, id: u32, patch: &MilestonePatch) -> DomainResult<Milestone> {
        let existing = self
            .milestones
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::not_found::<Milestone>(id))?;
        self.authorize(existing.roadmap_id, Action::Edit).await?;
        self.milestones.patch(id, patch).await
    }

    async fn delete_milestone(&self, id: u32) -> DomainResult<()> {
        let existing = self
            .milestones
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::not_found::<Milestone>(id))?;
        self.authorize(existing.roadmap_id, Action::Edit).await?;
        self.milestones.delete(id).await
    }

    async fn create_dependency(&self, dependency: &NewDependency) -> DomainResult<Dependency> {
        self.authorize(dependency.roadmap_id, Action::Edit).await?;
        self.dependencies.create_from(dependency).await
    }

    async fn delete_dependency(&self, id: u32) -> DomainResult<()> {
        let existing = self
            .dependencies
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::not_found::<Dependency>(id))?;
        self.authorize(existing.roadmap_id, Action::Edit).await?;
        self.dependencies.delete(id).await
    }

    async fn update_post_status(&self, post_id: u32, status_id: u32, order: i32) -> DomainResult<Post> {
        let post = self
            .posts
            .find_by_id(post_id)
            .await?
            .ok_or_else(|| DomainError::not_found::<Post>(post_id))?;
        self.authorize(post.roadmap_id, Action::Edit).await?;
        self.status_in_roadmap(status_id, post.roadmap_id).await?;
        self.posts.update_status(post_id, status_id, order).await
    }
}
