//! Milestone Repository

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};

use roadmap_timeline::domain::{DomainError, DomainResult, Milestone, MilestonePatch, NewMilestone};

use crate::db::{db_err, not_initialized, SharedConnection};
use crate::traits::{Repository, RoadmapScoped};

const COLUMNS: &str = "id, roadmap_id, title, description, date, color, is_completed";

pub struct MilestoneRepository {
    conn: SharedConnection,
}

impl MilestoneRepository {
    pub fn new(conn: SharedConnection) -> Self {
        Self { conn }
    }

    pub async fn create_from(&self, milestone: &NewMilestone) -> DomainResult<Milestone> {
        let mut entity = Milestone::new(0, milestone.roadmap_id, milestone.title.clone(), milestone.date.clone());
        entity.description = milestone.description.clone();
        entity.color = milestone.color.clone();
        self.create(&entity).await
    }

    /// Apply a partial update and return the stored result
    pub async fn patch(&self, id: u32, patch: &MilestonePatch) -> DomainResult<Milestone> {
        let mut milestone = self
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::not_found::<Milestone>(id))?;
        milestone.apply(patch);
        self.update(&milestone).await
    }
}

pub(crate) fn load_milestone(conn: &Connection, id: u32) -> DomainResult<Option<Milestone>> {
    conn.query_row(
        &format!("SELECT {} FROM milestones WHERE id = ?", COLUMNS),
        params![id],
        row_to_milestone,
    )
    .optional()
    .map_err(db_err)
}

fn validate(milestone: &Milestone) -> DomainResult<()> {
    if milestone.title.trim().is_empty() {
        return Err(DomainError::InvalidInput("Milestone title is required".to_string()));
    }
    if milestone.date.trim().is_empty() {
        return Err(DomainError::InvalidInput("Milestone date is required".to_string()));
    }
    Ok(())
}

#[async_trait]
impl Repository<Milestone> for MilestoneRepository {
    async fn create(&self, entity: &Milestone) -> DomainResult<Milestone> {
        validate(entity)?;
        let guard = self.conn.lock().await;
        let conn = guard.as_ref().ok_or_else(not_initialized)?;

        conn.execute(
            "INSERT INTO milestones (roadmap_id, title, description, date, color, is_completed, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?)",
            params![
                entity.roadmap_id,
                entity.title,
                entity.description,
                entity.date,
                entity.color,
                entity.is_completed,
                chrono::Utc::now().timestamp_millis()
            ],
        )
        .map_err(db_err)?;

        let mut milestone = entity.clone();
        milestone.id = conn.last_insert_rowid() as u32;
        Ok(milestone)
    }

    async fn find_by_id(&self, id: u32) -> DomainResult<Option<Milestone>> {
        let guard = self.conn.lock().await;
        let conn = guard.as_ref().ok_or_else(not_initialized)?;
        load_milestone(conn, id)
    }

    async fn list(&self) -> DomainResult<Vec<Milestone>> {
        let guard = self.conn.lock().await;
        let conn = guard.as_ref().ok_or_else(not_initialized)?;

        let mut stmt = conn
            .prepare(&format!("SELECT {} FROM milestones ORDER BY date, id", COLUMNS))
            .map_err(db_err)?;
        let rows = stmt.query_map([], row_to_milestone).map_err(db_err)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(db_err)
    }

    async fn update(&self, entity: &Milestone) -> DomainResult<Milestone> {
        validate(entity)?;
        let guard = self.conn.lock().await;
        let conn = guard.as_ref().ok_or_else(not_initialized)?;

        let changed = conn
            .execute(
                "UPDATE milestones SET title = ?, description = ?, date = ?, color = ?, is_completed = ?, updated_at = ? WHERE id = ?",
                params![
                    entity.title,
                    entity.description,
                    entity.date,
                    entity.color,
                    entity.is_completed,
                    chrono::Utc::now().timestamp_millis(),
                    entity.id
                ],
            )
            .map_err(db_err)?;
        if changed == 0 {
            return Err(DomainError::not_found::<Milestone>(entity.id));
        }
        Ok(entity.clone())
    }

    async fn delete(&self, id: u32) -> DomainResult<()> {
        let guard = self.conn.lock().await;
        let conn = guard.as_ref().ok_or_else(not_initialized)?;

        let changed = conn
            .execute("DELETE FROM milestones WHERE id = ?", params![id])
            .map_err(db_err)?;
        if changed == 0 {
            return Err(DomainError::not_found::<Milestone>(id));
        }
        Ok(())
    }
}

#[async_trait]
impl RoadmapScoped<Milestone> for MilestoneRepository {
    async fn list_by_roadmap(&self, roadmap_id: u32) -> DomainResult<Vec<Milestone>> {
        let guard = self.conn.lock().await;
        let conn = guard.as_ref().ok_or_else(not_initialized)?;

        let mut stmt = conn
            .prepare(&format!(
                "SELECT {} FROM milestones WHERE roadmap_id = ? ORDER BY date, id",
                COLUMNS
            ))
            .map_err(db_err)?;
        let rows = stmt.query_map(params![roadmap_id], row_to_milestone).map_err(db_err)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(db_err)
    }
}

fn row_to_milestone(row: &rusqlite::Row) -> rusqlite::Result<Milestone> {
    Ok(Milestone {
        id: row.get(0)?,
        roadmap_id: row.get(1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        date: row.get(4)?,
        color: row.get(5)?,
        is_completed: row.get(6)?,
    })
}
