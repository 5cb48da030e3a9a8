//! Post Repository
//!
//! Posts are ordered within their status column. New posts go to the end
//! of the column; moves keep every affected column indexed 0, 1, 2, ...

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};

use roadmap_timeline::domain::{DomainError, DomainResult, Post, Priority};

use crate::db::{db_err, not_initialized, SharedConnection};
use crate::traits::{Repository, RoadmapScoped};

const COLUMNS: &str =
    "id, roadmap_id, title, description, status_id, assignee_id, start_date, end_date, priority, progress, tags, position";

pub struct PostRepository {
    conn: SharedConnection,
}

impl PostRepository {
    pub fn new(conn: SharedConnection) -> Self {
        Self { conn }
    }

    /// Move a post into `status_id` at `order` (clamped to the column
    /// length). Both the old and the new column are reindexed.
    pub async fn update_status(&self, post_id: u32, status_id: u32, order: i32) -> DomainResult<Post> {
        let guard = self.conn.lock().await;
        let conn = guard.as_ref().ok_or_else(not_initialized)?;

        let post = load_post(conn, post_id)?.ok_or_else(|| DomainError::not_found::<Post>(post_id))?;

        let mut column: Vec<u32> = column_ids(conn, post.roadmap_id, Some(status_id))?
            .into_iter()
            .filter(|id| *id != post_id)
            .collect();
        let index = (order.max(0) as usize).min(column.len());
        column.insert(index, post_id);

        let now = chrono::Utc::now().timestamp_millis();
        conn.execute(
            "UPDATE posts SET status_id = ?, updated_at = ? WHERE id = ?",
            params![status_id, now, post_id],
        )
        .map_err(db_err)?;
        write_positions(conn, &column)?;

        if post.status_id != Some(status_id) {
            let old_column = column_ids(conn, post.roadmap_id, post.status_id)?;
            write_positions(conn, &old_column)?;
        }

        load_post(conn, post_id)?.ok_or_else(|| DomainError::not_found::<Post>(post_id))
    }

    /// Reindex one column to be sequential (0, 1, 2, ...)
    pub async fn reindex(&self, roadmap_id: u32, status_id: Option<u32>) -> DomainResult<()> {
        let guard = self.conn.lock().await;
        let conn = guard.as_ref().ok_or_else(not_initialized)?;
        let ids = column_ids(conn, roadmap_id, status_id)?;
        write_positions(conn, &ids)
    }
}

pub(crate) fn load_post(conn: &Connection, id: u32) -> DomainResult<Option<Post>> {
    conn.query_row(
        &format!("SELECT {} FROM posts WHERE id = ?", COLUMNS),
        params![id],
        row_to_post,
    )
    .optional()
    .map_err(db_err)
}

/// Ids in one column of a roadmap, by current position
fn column_ids(conn: &Connection, roadmap_id: u32, status_id: Option<u32>) -> DomainResult<Vec<u32>> {
    let mut stmt = conn
        .prepare(
            "SELECT id FROM posts WHERE roadmap_id = ?1 AND status_id IS ?2 ORDER BY position, id",
        )
        .map_err(db_err)?;
    let rows = stmt
        .query_map(params![roadmap_id, status_id], |row| row.get(0))
        .map_err(db_err)?;
    rows.collect::<Result<Vec<u32>, _>>().map_err(db_err)
}

fn write_positions(conn: &Connection, ids: &[u32]) -> DomainResult<()> {
    for (position, id) in ids.iter().enumerate() {
        conn.execute(
            "UPDATE posts SET position = ? WHERE id = ?",
            params![position as i32, *id],
        )
        .map_err(db_err)?;
    }
    Ok(())
}

fn encode_tags(tags: &[String]) -> DomainResult<String> {
    serde_json::to_string(tags).map_err(|e| DomainError::Internal(e.to_string()))
}

#[async_trait]
impl Repository<Post> for PostRepository {
    async fn create(&self, entity: &Post) -> DomainResult<Post> {
        if entity.title.trim().is_empty() {
            return Err(DomainError::InvalidInput("Post title is required".to_string()));
        }
        let guard = self.conn.lock().await;
        let conn = guard.as_ref().ok_or_else(not_initialized)?;

        let position: i32 = conn
            .query_row(
                "SELECT COALESCE(MAX(position), -1) + 1 FROM posts WHERE roadmap_id = ?1 AND status_id IS ?2",
                params![entity.roadmap_id, entity.status_id],
                |row| row.get(0),
            )
            .map_err(db_err)?;

        conn.execute(
            "INSERT INTO posts (roadmap_id, title, description, status_id, assignee_id, start_date, end_date, priority, progress, tags, position, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            params![
                entity.roadmap_id,
                entity.title,
                entity.description,
                entity.status_id,
                entity.assignee_id,
                entity.start_date,
                entity.end_date,
                entity.priority.map(|p| p.as_str()),
                entity.progress,
                encode_tags(&entity.tags)?,
                position,
                chrono::Utc::now().timestamp_millis()
            ],
        )
        .map_err(db_err)?;

        let mut post = entity.clone();
        post.id = conn.last_insert_rowid() as u32;
        post.order = position;
        Ok(post)
    }

    async fn find_by_id(&self, id: u32) -> DomainResult<Option<Post>> {
        let guard = self.conn.lock().await;
        let conn = guard.as_ref().ok_or_else(not_initialized)?;
        load_post(conn, id)
    }

    async fn list(&self) -> DomainResult<Vec<Post>> {
        let guard = self.conn.lock().await;
        let conn = guard.as_ref().ok_or_else(not_initialized)?;

        let mut stmt = conn
            .prepare(&format!("SELECT {} FROM posts ORDER BY roadmap_id, position, id", COLUMNS))
            .map_err(db_err)?;
        let rows = stmt.query_map([], row_to_post).map_err(db_err)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(db_err)
    }

    async fn update(&self, entity: &Post) -> DomainResult<Post> {
        let guard = self.conn.lock().await;
        let conn = guard.as_ref().ok_or_else(not_initialized)?;

        let changed = conn
            .execute(
                "UPDATE posts SET title = ?, description = ?, status_id = ?, assignee_id = ?, start_date = ?, end_date = ?,
                 priority = ?, progress = ?, tags = ?, position = ?, updated_at = ? WHERE id = ?",
                params![
                    entity.title,
                    entity.description,
                    entity.status_id,
                    entity.assignee_id,
                    entity.start_date,
                    entity.end_date,
                    entity.priority.map(|p| p.as_str()),
                    entity.progress,
                    encode_tags(&entity.tags)?,
                    entity.order,
                    chrono::Utc::now().timestamp_millis(),
                    entity.id
                ],
            )
            .map_err(db_err)?;
        if changed == 0 {
            return Err(DomainError::not_found::<Post>(entity.id));
        }
        Ok(entity.clone())
    }

    async fn delete(&self, id: u32) -> DomainResult<()> {
        let guard = self.conn.lock().await;
        let conn = guard.as_ref().ok_or_else(not_initialized)?;

        let Some(post) = load_post(conn, id)? else {
            return Ok(());
        };
        conn.execute("DELETE FROM posts WHERE id = ?", params![id])
            .map_err(db_err)?;
        let ids = column_ids(conn, post.roadmap_id, post.status_id)?;
        write_positions(conn, &ids)
    }
}

#[async_trait]
impl RoadmapScoped<Post> for PostRepository {
    async fn list_by_roadmap(&self, roadmap_id: u32) -> DomainResult<Vec<Post>> {
        let guard = self.conn.lock().await;
        let conn = guard.as_ref().ok_or_else(not_initialized)?;

        let mut stmt = conn
            .prepare(&format!(
                "SELECT {} FROM posts WHERE roadmap_id = ? ORDER BY position, id",
                COLUMNS
            ))
            .map_err(db_err)?;
        let rows = stmt.query_map(params![roadmap_id], row_to_post).map_err(db_err)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(db_err)
    }
}

fn row_to_post(row: &rusqlite::Row) -> rusqlite::Result<Post> {
    let priority: Option<String> = row.get(8)?;
    let tags: String = row.get(10)?;
    Ok(Post {
        id: row.get(0)?,
        roadmap_id: row.get(1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        status_id: row.get(4)?,
        assignee_id: row.get(5)?,
        start_date: row.get(6)?,
        end_date: row.get(7)?,
        priority: priority.as_deref().and_then(Priority::parse),
        progress: row.get(9)?,
        tags: serde_json::from_str(&tags).unwrap_or_default(),
        order: row.get(11)?,
    })
}
