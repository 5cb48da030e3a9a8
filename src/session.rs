//! Timeline Session
//!
//! Owns a `TimelineEngine` for one roadmap and routes user mutations to a
//! `TimelineBackend`. Updates, deletes and moves are applied locally first
//! and reverted if the backend rejects them; creates are inserted only once
//! the backend returns the stored entity. Every outcome leaves a `Notice`.

use std::fmt;

use crate::backend::TimelineBackend;
use crate::board::{Board, OrderChange};
use crate::domain::{
    Dependency, DomainError, DomainResult, Milestone, MilestonePatch, NewDependency, NewMilestone, Status,
    TimelineSnapshot,
};
use crate::timeline::TimelineEngine;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Error,
}

/// User-visible notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
        }
    }

    fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationKind {
    CreateMilestone,
    UpdateMilestone,
    DeleteMilestone,
    CreateDependency,
    DeleteDependency,
    MovePost,
}

impl MutationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MutationKind::CreateMilestone => "create milestone",
            MutationKind::UpdateMilestone => "update milestone",
            MutationKind::DeleteMilestone => "delete milestone",
            MutationKind::CreateDependency => "create dependency",
            MutationKind::DeleteDependency => "delete dependency",
            MutationKind::MovePost => "update post status",
        }
    }

    fn done(&self) -> &'static str {
        match self {
            MutationKind::CreateMilestone => "Milestone created",
            MutationKind::UpdateMilestone => "Milestone updated",
            MutationKind::DeleteMilestone => "Milestone deleted",
            MutationKind::CreateDependency => "Dependency created",
            MutationKind::DeleteDependency => "Dependency deleted",
            MutationKind::MovePost => "Post status updated",
        }
    }
}

/// A rejected mutation. Local state has already been restored.
#[derive(Debug, Clone, PartialEq)]
pub struct MutationError {
    pub kind: MutationKind,
    pub source: DomainError,
}

impl fmt::Display for MutationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Failed to {}: {}", self.kind.as_str(), self.source)
    }
}

impl std::error::Error for MutationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.source)
    }
}

pub type MutationResult<T> = Result<T, MutationError>;

/// Which fetches failed during a load
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub failed: Vec<&'static str>,
}

impl LoadReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

pub struct TimelineSession<B: TimelineBackend> {
    backend: B,
    engine: TimelineEngine,
    roadmap_id: Option<u32>,
    statuses: Vec<Status>,
    notices: Vec<Notice>,
}

impl<B: TimelineBackend> TimelineSession<B> {
    pub fn new(backend: B, engine: TimelineEngine) -> Self {
        Self {
            backend,
            engine,
            roadmap_id: None,
            statuses: Vec::new(),
            notices: Vec::new(),
        }
    }

    pub fn engine(&self) -> &TimelineEngine {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut TimelineEngine {
        &mut self.engine
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn snapshot(&self) -> &TimelineSnapshot {
        self.engine.snapshot()
    }

    pub fn statuses(&self) -> &[Status] {
        &self.statuses
    }

    pub fn roadmap_id(&self) -> Option<u32> {
        self.roadmap_id
    }

    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    /// Hand pending notices to the caller
    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    /// Current kanban view of the loaded posts
    pub fn board(&self) -> Board {
        Board::build(&self.statuses, &self.engine.snapshot().posts)
    }

    /// Fetch everything for a roadmap. A failed fetch leaves that list
    /// empty; the timeline still renders with whatever did load.
    pub async fn load(&mut self, roadmap_id: u32) -> DomainResult<LoadReport> {
        let mut report = LoadReport::default();

        let posts = degrade(self.backend.fetch_posts(roadmap_id).await, "posts", roadmap_id, &mut report);
        let milestones = degrade(
            self.backend.fetch_milestones(roadmap_id).await,
            "milestones",
            roadmap_id,
            &mut report,
        );
        let dependencies = degrade(
            self.backend.fetch_dependencies(roadmap_id).await,
            "dependencies",
            roadmap_id,
            &mut report,
        );
        self.statuses = degrade(
            self.backend.fetch_statuses(roadmap_id).await,
            "statuses",
            roadmap_id,
            &mut report,
        );

        self.roadmap_id = Some(roadmap_id);
        self.engine
            .set_snapshot(TimelineSnapshot::new(posts, milestones, dependencies))?;

        if !report.is_complete() {
            self.notices
                .push(Notice::error(format!("Failed to load {}", report.failed.join(", "))));
        }
        log::info!(
            "Loaded roadmap {}: {} posts, {} milestones, {} dependencies",
            roadmap_id,
            self.snapshot().posts.len(),
            self.snapshot().milestones.len(),
            self.snapshot().dependencies.len()
        );
        Ok(report)
    }

    /// Re-fetch the current roadmap
    pub async fn reload(&mut self) -> DomainResult<LoadReport> {
        let roadmap_id = self
            .roadmap_id
            .ok_or_else(|| DomainError::InvalidInput("No roadmap loaded".to_string()))?;
        self.load(roadmap_id).await
    }

    pub async fn create_milestone(&mut self, milestone: NewMilestone) -> MutationResult<Milestone> {
        let kind = MutationKind::CreateMilestone;
        if milestone.title.trim().is_empty() {
            return Err(self.fail(kind, DomainError::InvalidInput("Milestone title is required".to_string())));
        }

        match self.backend.create_milestone(&milestone).await {
            Ok(created) => {
                let stored = created.clone();
                self.commit(kind, |snapshot| snapshot.milestones.push(stored))?;
                Ok(created)
            }
            Err(e) => Err(self.fail(kind, e)),
        }
    }

    pub async fn update_milestone(&mut self, id: u32, patch: MilestonePatch) -> MutationResult<Milestone> {
        let kind = MutationKind::UpdateMilestone;
        let previous = match self.snapshot().milestones.iter().find(|m| m.id == id) {
            Some(m) => m.clone(),
            None => return Err(self.fail(kind, DomainError::not_found::<Milestone>(id))),
        };

        let mut optimistic = previous.clone();
        optimistic.apply(&patch);
        self.apply_local(kind, |snapshot| replace_milestone(snapshot, optimistic))?;

        match self.backend.update_milestone(id, &patch).await {
            Ok(saved) => {
                let stored = saved.clone();
                self.commit(kind, |snapshot| replace_milestone(snapshot, stored))?;
                Ok(saved)
            }
            Err(e) => {
                self.rollback(kind, |snapshot| replace_milestone(snapshot, previous));
                Err(self.fail(kind, e))
            }
        }
    }

    pub async fn delete_milestone(&mut self, id: u32) -> MutationResult<()> {
        let kind = MutationKind::DeleteMilestone;
        let index = match self.snapshot().milestones.iter().position(|m| m.id == id) {
            Some(i) => i,
            None => return Err(self.fail(kind, DomainError::not_found::<Milestone>(id))),
        };
        let removed = self.snapshot().milestones[index].clone();
        self.apply_local(kind, |snapshot| {
            snapshot.milestones.remove(index);
        })?;

        match self.backend.delete_milestone(id).await {
            Ok(()) => self.commit(kind, |_| {}),
            Err(e) => {
                self.rollback(kind, |snapshot| {
                    let at = index.min(snapshot.milestones.len());
                    snapshot.milestones.insert(at, removed);
                });
                Err(self.fail(kind, e))
            }
        }
    }

    /// Rejects self-dependencies and duplicate (source, target) pairs
    /// before calling the backend.
    pub async fn create_dependency(&mut self, dependency: NewDependency) -> MutationResult<Dependency> {
        let kind = MutationKind::CreateDependency;
        if dependency.source_id == dependency.target_id {
            return Err(self.fail(
                kind,
                DomainError::InvalidInput("A post cannot depend on itself".to_string()),
            ));
        }
        let duplicate = self
            .snapshot()
            .dependencies
            .iter()
            .any(|d| d.links(dependency.source_id, dependency.target_id));
        if duplicate {
            return Err(self.fail(
                kind,
                DomainError::Conflict(format!(
                    "Dependency {} -> {} already exists",
                    dependency.source_id, dependency.target_id
                )),
            ));
        }

        match self.backend.create_dependency(&dependency).await {
            Ok(created) => {
                let stored = created.clone();
                self.commit(kind, |snapshot| snapshot.dependencies.push(stored))?;
                Ok(created)
            }
            Err(e) => Err(self.fail(kind, e)),
        }
    }

    pub async fn delete_dependency(&mut self, id: u32) -> MutationResult<()> {
        let kind = MutationKind::DeleteDependency;
        let index = match self.snapshot().dependencies.iter().position(|d| d.id == id) {
            Some(i) => i,
            None => return Err(self.fail(kind, DomainError::not_found::<Dependency>(id))),
        };
        let removed = self.snapshot().dependencies[index].clone();
        self.apply_local(kind, |snapshot| {
            snapshot.dependencies.remove(index);
        })?;

        match self.backend.delete_dependency(id).await {
            Ok(()) => self.commit(kind, |_| {}),
            Err(e) => {
                self.rollback(kind, |snapshot| {
                    let at = index.min(snapshot.dependencies.len());
                    snapshot.dependencies.insert(at, removed);
                });
                Err(self.fail(kind, e))
            }
        }
    }

    /// Drop a post into a status column at `index`. Returns the reordered
    /// placements, the moved post first.
    pub async fn move_post(&mut self, post_id: u32, status_id: u32, index: usize) -> MutationResult<Vec<OrderChange>> {
        let kind = MutationKind::MovePost;
        let mut board = self.board();
        let changes = match board.move_card(post_id, status_id, index) {
            Ok(changes) => changes,
            Err(e) => return Err(self.fail(kind, e)),
        };
        let Some(moved) = changes.first().copied() else {
            return Ok(changes);
        };

        let previous = self.snapshot().posts.clone();
        let local = changes.clone();
        self.apply_local(kind, |snapshot| {
            for change in &local {
                if let Some(post) = snapshot.posts.iter_mut().find(|p| p.id == change.post_id) {
                    post.status_id = Some(change.status_id);
                    post.order = change.order;
                }
            }
        })?;

        match self
            .backend
            .update_post_status(moved.post_id, moved.status_id, moved.order)
            .await
        {
            Ok(saved) => {
                self.commit(kind, |snapshot| {
                    if let Some(post) = snapshot.posts.iter_mut().find(|p| p.id == saved.id) {
                        *post = saved;
                    }
                })?;
                Ok(changes)
            }
            Err(e) => {
                self.rollback(kind, |snapshot| snapshot.posts = previous);
                Err(self.fail(kind, e))
            }
        }
    }

    fn apply_local<F>(&mut self, kind: MutationKind, f: F) -> MutationResult<()>
    where
        F: FnOnce(&mut TimelineSnapshot),
    {
        self.engine
            .update_snapshot(f)
            .map_err(|source| MutationError { kind, source })
    }

    fn commit<F>(&mut self, kind: MutationKind, f: F) -> MutationResult<()>
    where
        F: FnOnce(&mut TimelineSnapshot),
    {
        self.apply_local(kind, f)?;
        self.notices.push(Notice::success(kind.done()));
        Ok(())
    }

    fn rollback<F>(&mut self, kind: MutationKind, f: F)
    where
        F: FnOnce(&mut TimelineSnapshot),
    {
        if let Err(e) = self.engine.update_snapshot(f) {
            log::error!("Relayout after reverting {} failed: {}", kind.as_str(), e);
        }
    }

    fn fail(&mut self, kind: MutationKind, source: DomainError) -> MutationError {
        let error = MutationError { kind, source };
        log::warn!("{}", error);
        self.notices.push(Notice::error(error.to_string()));
        error
    }
}

fn degrade<T>(result: DomainResult<Vec<T>>, what: &'static str, roadmap_id: u32, report: &mut LoadReport) -> Vec<T> {
    match result {
        Ok(items) => items,
        Err(e) => {
            log::warn!("Failed to fetch {} for roadmap {}: {}", what, roadmap_id, e);
            report.failed.push(what);
            Vec::new()
        }
    }
}

fn replace_milestone(snapshot: &mut TimelineSnapshot, milestone: Milestone) {
    if let Some(slot) = snapshot.milestones.iter_mut().find(|m| m.id == milestone.id) {
        *slot = milestone;
    }
}
