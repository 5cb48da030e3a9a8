//! Repository Layer - Core Traits
//!
//! Abstract interfaces for data access.

use async_trait::async_trait;
use roadmap_timeline::domain::{DomainResult, Entity};

/// Core repository trait for CRUD operations
///
/// Generic over any Entity type.
#[async_trait]
pub trait Repository<T: Entity>: Send + Sync {
    /// Create a new entity; the returned copy carries the assigned id
    async fn create(&self, entity: &T) -> DomainResult<T>;

    /// Find entity by ID
    async fn find_by_id(&self, id: T::Id) -> DomainResult<Option<T>>;

    /// List all entities
    async fn list(&self) -> DomainResult<Vec<T>>;

    /// Update an existing entity
    async fn update(&self, entity: &T) -> DomainResult<T>;

    /// Delete entity by ID
    async fn delete(&self, id: T::Id) -> DomainResult<()>;
}

/// Entities that belong to a single roadmap
#[async_trait]
pub trait RoadmapScoped<T: Entity>: Repository<T> {
    async fn list_by_roadmap(&self, roadmap_id: u32) -> DomainResult<Vec<T>>;
}
