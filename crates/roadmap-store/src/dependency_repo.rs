//! Dependency Repository
//!
//! Each ordered (source, target) pair is stored at most once and a post
//! cannot depend on itself.

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};

use roadmap_timeline::domain::{Dependency, DependencyType, DomainError, DomainResult, NewDependency, Post};

use crate::db::{db_err, not_initialized, SharedConnection};
use crate::post_repo::load_post;
use crate::traits::{Repository, RoadmapScoped};

const COLUMNS: &str = "id, roadmap_id, source_id, target_id, dependency_type";

pub struct DependencyRepository {
    conn: SharedConnection,
}

impl DependencyRepository {
    pub fn new(conn: SharedConnection) -> Self {
        Self { conn }
    }

    pub async fn create_from(&self, dependency: &NewDependency) -> DomainResult<Dependency> {
        self.create(&Dependency {
            id: 0,
            roadmap_id: dependency.roadmap_id,
            source_id: dependency.source_id,
            target_id: dependency.target_id,
            dependency_type: dependency.dependency_type,
        })
        .await
    }
}

pub(crate) fn load_dependency(conn: &Connection, id: u32) -> DomainResult<Option<Dependency>> {
    conn.query_row(
        &format!("SELECT {} FROM dependencies WHERE id = ?", COLUMNS),
        params![id],
        row_to_dependency,
    )
    .optional()
    .map_err(db_err)
}

#[async_trait]
impl Repository<Dependency> for DependencyRepository {
    async fn create(&self, entity: &Dependency) -> DomainResult<Dependency> {
        if entity.source_id == entity.target_id {
            return Err(DomainError::InvalidInput("A post cannot depend on itself".to_string()));
        }
        let guard = self.conn.lock().await;
        let conn = guard.as_ref().ok_or_else(not_initialized)?;

        for post_id in [entity.source_id, entity.target_id] {
            match load_post(conn, post_id)? {
                Some(post) if post.roadmap_id == entity.roadmap_id => {}
                Some(_) => {
                    return Err(DomainError::InvalidInput(format!(
                        "Post {} belongs to another roadmap",
                        post_id
                    )))
                }
                None => return Err(DomainError::not_found::<Post>(post_id)),
            }
        }

        let exists: bool = conn
            .query_row(
                "SELECT EXISTS(SELECT 1 FROM dependencies WHERE source_id = ? AND target_id = ?)",
                params![entity.source_id, entity.target_id],
                |row| row.get(0),
            )
            .map_err(db_err)?;
        if exists {
            return Err(DomainError::Conflict(format!(
                "Dependency {} -> {} already exists",
                entity.source_id, entity.target_id
            )));
        }

        conn.execute(
            "INSERT INTO dependencies (roadmap_id, source_id, target_id, dependency_type) VALUES (?, ?, ?, ?)",
            params![
                entity.roadmap_id,
                entity.source_id,
                entity.target_id,
                entity.dependency_type.as_str()
            ],
        )
        .map_err(db_err)?;

        let mut dependency = entity.clone();
        dependency.id = conn.last_insert_rowid() as u32;
        Ok(dependency)
    }

    async fn find_by_id(&self, id: u32) -> DomainResult<Option<Dependency>> {
        let guard = self.conn.lock().await;
        let conn = guard.as_ref().ok_or_else(not_initialized)?;
        load_dependency(conn, id)
    }

    async fn list(&self) -> DomainResult<Vec<Dependency>> {
        let guard = self.conn.lock().await;
        let conn = guard.as_ref().ok_or_else(not_initialized)?;

        let mut stmt = conn
            .prepare(&format!("SELECT {} FROM dependencies ORDER BY id", COLUMNS))
            .map_err(db_err)?;
        let rows = stmt.query_map([], row_to_dependency).map_err(db_err)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(db_err)
    }

    /// Only the dependency type can change; endpoints are fixed
    async fn update(&self, entity: &Dependency) -> DomainResult<Dependency> {
        let guard = self.conn.lock().await;
        let conn = guard.as_ref().ok_or_else(not_initialized)?;

        let changed = conn
            .execute(
                "UPDATE dependencies SET dependency_type = ? WHERE id = ?",
                params![entity.dependency_type.as_str(), entity.id],
            )
            .map_err(db_err)?;
        if changed == 0 {
            return Err(DomainError::not_found::<Dependency>(entity.id));
        }
        load_dependency(conn, entity.id)?.ok_or_else(|| DomainError::not_found::<Dependency>(entity.id))
    }

    async fn delete(&self, id: u32) -> DomainResult<()> {
        let guard = self.conn.lock().await;
        let conn = guard.as_ref().ok_or_else(not_initialized)?;

        let changed = conn
            .execute("DELETE FROM dependencies WHERE id = ?", params![id])
            .map_err(db_err)?;
        if changed == 0 {
            return Err(DomainError::not_found::<Dependency>(id));
        }
        Ok(())
    }
}

#[async_trait]
impl RoadmapScoped<Dependency> for DependencyRepository {
    async fn list_by_roadmap(&self, roadmap_id: u32) -> DomainResult<Vec<Dependency>> {
        let guard = self.conn.lock().await;
        let conn = guard.as_ref().ok_or_else(not_initialized)?;

        let mut stmt = conn
            .prepare(&format!(
                "SELECT {} FROM dependencies WHERE roadmap_id = ? ORDER BY id",
                COLUMNS
            ))
            .map_err(db_err)?;
        let rows = stmt.query_map(params![roadmap_id], row_to_dependency).map_err(db_err)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(db_err)
    }
}

fn row_to_dependency(row: &rusqlite::Row) -> rusqlite::Result<Dependency> {
    let kind: String = row.get(4)?;
    Ok(Dependency {
        id: row.get(0)?,
        roadmap_id: row.get(1)?,
        source_id: row.get(2)?,
        target_id: row.get(3)?,
        dependency_type: DependencyType::parse(&kind).unwrap_or(DependencyType::FinishToStart),
    })
}
