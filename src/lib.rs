//! Roadmap Timeline
//!
//! Layout engine and data plumbing for a roadmap Gantt view:
//! - domain: roadmap entities and errors
//! - timeline: date range, grid, positions, connectors, viewport
//! - filter / group / board: derived views over posts
//! - export: JSON and CSV snapshots
//! - backend / session: storage abstraction and optimistic mutations

pub mod domain;
pub mod config;
pub mod timeline;
pub mod filter;
pub mod group;
pub mod board;
pub mod export;
pub mod backend;
pub mod session;

pub use backend::TimelineBackend;
pub use config::TimelineConfig;
pub use session::{MutationError, Notice, NoticeLevel, TimelineSession};
pub use timeline::TimelineEngine;
