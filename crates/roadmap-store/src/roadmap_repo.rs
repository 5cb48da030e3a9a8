//! Roadmap Repository

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};

use roadmap_timeline::domain::{DomainError, DomainResult, Roadmap};

use crate::db::{db_err, not_initialized, SharedConnection};
use crate::traits::Repository;

const COLUMNS: &str = "id, title, description, is_public, owner_id";

pub struct RoadmapRepository {
    conn: SharedConnection,
}

impl RoadmapRepository {
    pub fn new(conn: SharedConnection) -> Self {
        Self { conn }
    }

    /// Roadmaps a user may see: their own plus public ones
    pub async fn list_visible(&self, user_id: &str) -> DomainResult<Vec<Roadmap>> {
        let guard = self.conn.lock().await;
        let conn = guard.as_ref().ok_or_else(not_initialized)?;

        let mut stmt = conn
            .prepare(&format!(
                "SELECT {} FROM roadmaps WHERE owner_id = ? OR is_public = 1 ORDER BY id",
                COLUMNS
            ))
            .map_err(db_err)?;
        let rows = stmt.query_map(params![user_id], row_to_roadmap).map_err(db_err)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(db_err)
    }
}

pub(crate) fn load_roadmap(conn: &Connection, id: u32) -> DomainResult<Option<Roadmap>> {
    conn.query_row(
        &format!("SELECT {} FROM roadmaps WHERE id = ?", COLUMNS),
        params![id],
        row_to_roadmap,
    )
    .optional()
    .map_err(db_err)
}

#[async_trait]
impl Repository<Roadmap> for RoadmapRepository {
    async fn create(&self, entity: &Roadmap) -> DomainResult<Roadmap> {
        if entity.title.trim().is_empty() {
            return Err(DomainError::InvalidInput("Roadmap title is required".to_string()));
        }
        let guard = self.conn.lock().await;
        let conn = guard.as_ref().ok_or_else(not_initialized)?;

        conn.execute(
            "INSERT INTO roadmaps (title, description, is_public, owner_id, updated_at) VALUES (?, ?, ?, ?, ?)",
            params![
                entity.title,
                entity.description,
                entity.is_public,
                entity.owner_id,
                chrono::Utc::now().timestamp_millis()
            ],
        )
        .map_err(db_err)?;

        let mut roadmap = entity.clone();
        roadmap.id = conn.last_insert_rowid() as u32;
        Ok(roadmap)
    }

    async fn find_by_id(&self, id: u32) -> DomainResult<Option<Roadmap>> {
        let guard = self.conn.lock().await;
        let conn = guard.as_ref().ok_or_else(not_initialized)?;
        load_roadmap(conn, id)
    }

    async fn list(&self) -> DomainResult<Vec<Roadmap>> {
        let guard = self.conn.lock().await;
        let conn = guard.as_ref().ok_or_else(not_initialized)?;

        let mut stmt = conn
            .prepare(&format!("SELECT {} FROM roadmaps ORDER BY id", COLUMNS))
            .map_err(db_err)?;
        let rows = stmt.query_map([], row_to_roadmap).map_err(db_err)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(db_err)
    }

    async fn update(&self, entity: &Roadmap) -> DomainResult<Roadmap> {
        let guard = self.conn.lock().await;
        let conn = guard.as_ref().ok_or_else(not_initialized)?;

        let changed = conn
            .execute(
                "UPDATE roadmaps SET title = ?, description = ?, is_public = ?, updated_at = ? WHERE id = ?",
                params![
                    entity.title,
                    entity.description,
                    entity.is_public,
                    chrono::Utc::now().timestamp_millis(),
                    entity.id
                ],
            )
            .map_err(db_err)?;
        if changed == 0 {
            return Err(DomainError::not_found::<Roadmap>(entity.id));
        }
        Ok(entity.clone())
    }

    async fn delete(&self, id: u32) -> DomainResult<()> {
        let guard = self.conn.lock().await;
        let conn = guard.as_ref().ok_or_else(not_initialized)?;

        conn.execute("DELETE FROM roadmaps WHERE id = ?", params![id])
            .map_err(db_err)?;
        Ok(())
    }
}

fn row_to_roadmap(row: &rusqlite::Row) -> rusqlite::Result<Roadmap> {
    Ok(Roadmap {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        is_public: row.get(3)?,
        owner_id: row.get(4)?,
    })
}
