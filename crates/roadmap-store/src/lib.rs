//! Roadmap Store
//!
//! SQLite persistence for roadmaps and a `TimelineBackend` built on it.
//! - db: connection and migrations
//! - traits: repository interfaces
//! - *_repo: one repository per entity
//! - backend: permission-checked backend for timeline sessions
//! - export_job: the `roadmap-export` tool

mod traits;
mod db;
mod roadmap_repo;
mod status_repo;
mod post_repo;
mod milestone_repo;
mod dependency_repo;
mod backend;
pub mod export_job;

#[cfg(test)]
mod tests;

pub use traits::{Repository, RoadmapScoped};
pub use db::{init_db, DbState, SharedConnection};
pub use roadmap_repo::RoadmapRepository;
pub use status_repo::StatusRepository;
pub use post_repo::PostRepository;
pub use milestone_repo::MilestoneRepository;
pub use dependency_repo::DependencyRepository;
pub use backend::SqliteBackend;
