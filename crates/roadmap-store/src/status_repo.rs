//! Status Repository
//!
//! Kanban columns. Positions within a roadmap are kept sequential.

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};

use roadmap_timeline::domain::{DomainError, DomainResult, Status, DEFAULT_STATUSES};

use crate::db::{db_err, not_initialized, SharedConnection};
use crate::traits::{Repository, RoadmapScoped};

const COLUMNS: &str = "id, roadmap_id, name, color, position";

pub struct StatusRepository {
    conn: SharedConnection,
}

impl StatusRepository {
    pub fn new(conn: SharedConnection) -> Self {
        Self { conn }
    }

    /// Seed the default columns when a roadmap has none. Returns the
    /// roadmap's statuses either way.
    pub async fn ensure_default_statuses(&self, roadmap_id: u32) -> DomainResult<Vec<Status>> {
        let guard = self.conn.lock().await;
        let conn = guard.as_ref().ok_or_else(not_initialized)?;

        let existing = list_statuses(conn, roadmap_id)?;
        if !existing.is_empty() {
            return Ok(existing);
        }

        for (position, (name, color)) in DEFAULT_STATUSES.iter().enumerate() {
            conn.execute(
                "INSERT INTO statuses (roadmap_id, name, color, position) VALUES (?, ?, ?, ?)",
                params![roadmap_id, name, color, position as i32],
            )
            .map_err(db_err)?;
        }
        log::info!("Seeded default statuses for roadmap {}", roadmap_id);
        list_statuses(conn, roadmap_id)
    }

    /// Put the given ids first, in that order, then reindex 0..n
    pub async fn reorder(&self, roadmap_id: u32, ordered_ids: &[u32]) -> DomainResult<Vec<Status>> {
        let guard = self.conn.lock().await;
        let conn = guard.as_ref().ok_or_else(not_initialized)?;

        let current = list_statuses(conn, roadmap_id)?;
        if let Some(unknown) = ordered_ids.iter().find(|id| !current.iter().any(|s| s.id == **id)) {
            return Err(DomainError::InvalidInput(format!(
                "Status {} does not belong to roadmap {}",
                unknown, roadmap_id
            )));
        }

        let rest = current.iter().map(|s| s.id).filter(|id| !ordered_ids.contains(id));
        for (position, id) in ordered_ids.iter().copied().chain(rest).enumerate() {
            conn.execute(
                "UPDATE statuses SET position = ? WHERE id = ?",
                params![position as i32, id],
            )
            .map_err(db_err)?;
        }
        list_statuses(conn, roadmap_id)
    }
}

pub(crate) fn load_status(conn: &Connection, id: u32) -> DomainResult<Option<Status>> {
    conn.query_row(
        &format!("SELECT {} FROM statuses WHERE id = ?", COLUMNS),
        params![id],
        row_to_status,
    )
    .optional()
    .map_err(db_err)
}

pub(crate) fn list_statuses(conn: &Connection, roadmap_id: u32) -> DomainResult<Vec<Status>> {
    let mut stmt = conn
        .prepare(&format!(
            "SELECT {} FROM statuses WHERE roadmap_id = ? ORDER BY position, id",
            COLUMNS
        ))
        .map_err(db_err)?;
    let rows = stmt.query_map(params![roadmap_id], row_to_status).map_err(db_err)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(db_err)
}

#[async_trait]
impl Repository<Status> for StatusRepository {
    /// Appended after the existing columns
    async fn create(&self, entity: &Status) -> DomainResult<Status> {
        let guard = self.conn.lock().await;
        let conn = guard.as_ref().ok_or_else(not_initialized)?;

        let position: i32 = conn
            .query_row(
                "SELECT COALESCE(MAX(position), -1) + 1 FROM statuses WHERE roadmap_id = ?",
                params![entity.roadmap_id],
                |row| row.get(0),
            )
            .map_err(db_err)?;
        conn.execute(
            "INSERT INTO statuses (roadmap_id, name, color, position) VALUES (?, ?, ?, ?)",
            params![entity.roadmap_id, entity.name, entity.color, position],
        )
        .map_err(db_err)?;

        let mut status = entity.clone();
        status.id = conn.last_insert_rowid() as u32;
        status.order = position;
        Ok(status)
    }

    async fn find_by_id(&self, id: u32) -> DomainResult<Option<Status>> {
        let guard = self.conn.lock().await;
        let conn = guard.as_ref().ok_or_else(not_initialized)?;
        load_status(conn, id)
    }

    async fn list(&self) -> DomainResult<Vec<Status>> {
        let guard = self.conn.lock().await;
        let conn = guard.as_ref().ok_or_else(not_initialized)?;

        let mut stmt = conn
            .prepare(&format!("SELECT {} FROM statuses ORDER BY roadmap_id, position, id", COLUMNS))
            .map_err(db_err)?;
        let rows = stmt.query_map([], row_to_status).map_err(db_err)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(db_err)
    }

    async fn update(&self, entity: &Status) -> DomainResult<Status> {
        let guard = self.conn.lock().await;
        let conn = guard.as_ref().ok_or_else(not_initialized)?;

        let changed = conn
            .execute(
                "UPDATE statuses SET name = ?, color = ?, position = ? WHERE id = ?",
                params![entity.name, entity.color, entity.order, entity.id],
            )
            .map_err(db_err)?;
        if changed == 0 {
            return Err(DomainError::not_found::<Status>(entity.id));
        }
        Ok(entity.clone())
    }

    async fn delete(&self, id: u32) -> DomainResult<()> {
        let guard = self.conn.lock().await;
        let conn = guard.as_ref().ok_or_else(not_initialized)?;

        let Some(status) = load_status(conn, id)? else {
            return Ok(());
        };
        conn.execute("DELETE FROM statuses WHERE id = ?", params![id])
            .map_err(db_err)?;

        // Close the gap
        for (position, remaining) in list_statuses(conn, status.roadmap_id)?.iter().enumerate() {
            conn.execute(
                "UPDATE statuses SET position = ? WHERE id = ?",
                params![position as i32, remaining.id],
            )
            .map_err(db_err)?;
        }
        Ok(())
    }
}

#[async_trait]
impl RoadmapScoped<Status> for StatusRepository {
    async fn list_by_roadmap(&self, roadmap_id: u32) -> DomainResult<Vec<Status>> {
        let guard = self.conn.lock().await;
        let conn = guard.as_ref().ok_or_else(not_initialized)?;
        list_statuses(conn, roadmap_id)
    }
}

fn row_to_status(row: &rusqlite::Row) -> rusqlite::Result<Status> {
    Ok(Status {
        id: row.get(0)?,
        roadmap_id: row.get(1)?,
        name: row.get(2)?,
        color: row.get(3)?,
        order: row.get(4)?,
    })
}
