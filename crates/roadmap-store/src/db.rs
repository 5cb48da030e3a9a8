//! Database Connection and Setup
//!
//! Manages the SQLite connection and migrations.

use rusqlite::Connection;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;

use roadmap_timeline::domain::{DomainError, DomainResult};

/// Connection shared by every repository
pub type SharedConnection = Arc<Mutex<Option<Connection>>>;

/// Database state wrapper
#[derive(Clone)]
pub struct DbState {
    pub conn: SharedConnection,
}

impl DbState {
    pub fn new() -> Self {
        Self {
            conn: Arc::new(Mutex::new(None)),
        }
    }

    pub fn connection(&self) -> SharedConnection {
        Arc::clone(&self.conn)
    }
}

impl Default for DbState {
    fn default() -> Self {
        Self::new()
    }
}

/// Open (or create) the database at `db_path`; `:memory:` works for tests.
pub async fn init_db(db_path: &Path) -> DomainResult<DbState> {
    let conn = Connection::open(db_path)
        .map_err(|e| DomainError::Internal(format!("Failed to open {}: {}", db_path.display(), e)))?;

    run_migrations(&conn)?;

    let state = DbState::new();
    *state.conn.lock().await = Some(conn);
    log::info!("Database ready at {}", db_path.display());
    Ok(state)
}

pub(crate) fn db_err(e: rusqlite::Error) -> DomainError {
    DomainError::Internal(e.to_string())
}

pub(crate) fn not_initialized() -> DomainError {
    DomainError::Internal("Database not initialized".to_string())
}

/// Check if a column exists in a table
fn column_exists(conn: &Connection, table: &str, column: &str) -> DomainResult<bool> {
    let mut stmt = conn
        .prepare(&format!("PRAGMA table_info({})", table))
        .map_err(db_err)?;
    let names = stmt
        .query_map([], |row| row.get::<_, String>(1))
        .map_err(db_err)?;
    for name in names {
        if name.map_err(db_err)? == column {
            return Ok(true);
        }
    }
    Ok(false)
}

fn run_migrations(conn: &Connection) -> DomainResult<()> {
    conn.execute_batch(
        "PRAGMA foreign_keys = ON;

        CREATE TABLE IF NOT EXISTS roadmaps (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            title TEXT NOT NULL,
            description TEXT,
            is_public INTEGER NOT NULL DEFAULT 0,
            owner_id TEXT NOT NULL,
            updated_at INTEGER NOT NULL DEFAULT 0
        );

        CREATE TABLE IF NOT EXISTS statuses (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            roadmap_id INTEGER NOT NULL REFERENCES roadmaps(id) ON DELETE CASCADE,
            name TEXT NOT NULL,
            color TEXT NOT NULL,
            position INTEGER NOT NULL DEFAULT 0
        );

        CREATE TABLE IF NOT EXISTS posts (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            roadmap_id INTEGER NOT NULL REFERENCES roadmaps(id) ON DELETE CASCADE,
            title TEXT NOT NULL,
            description TEXT,
            status_id INTEGER REFERENCES statuses(id) ON DELETE SET NULL,
            assignee_id TEXT,
            start_date TEXT,
            end_date TEXT,
            priority TEXT,
            progress INTEGER,
            tags TEXT NOT NULL DEFAULT '[]',
            position INTEGER NOT NULL DEFAULT 0,
            updated_at INTEGER NOT NULL DEFAULT 0
        );

        CREATE TABLE IF NOT EXISTS milestones (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            roadmap_id INTEGER NOT NULL REFERENCES roadmaps(id) ON DELETE CASCADE,
            title TEXT NOT NULL,
            description TEXT,
            date TEXT NOT NULL,
            color TEXT,
            updated_at INTEGER NOT NULL DEFAULT 0
        );

        CREATE TABLE IF NOT EXISTS dependencies (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            roadmap_id INTEGER NOT NULL REFERENCES roadmaps(id) ON DELETE CASCADE,
            source_id INTEGER NOT NULL REFERENCES posts(id) ON DELETE CASCADE,
            target_id INTEGER NOT NULL REFERENCES posts(id) ON DELETE CASCADE,
            dependency_type TEXT NOT NULL DEFAULT 'finish-to-start',
            UNIQUE (source_id, target_id),
            CHECK (source_id != target_id)
        );

        CREATE INDEX IF NOT EXISTS idx_posts_roadmap ON posts(roadmap_id);
        CREATE INDEX IF NOT EXISTS idx_posts_status ON posts(status_id, position);
        CREATE INDEX IF NOT EXISTS idx_milestones_roadmap ON milestones(roadmap_id);
        CREATE INDEX IF NOT EXISTS idx_dependencies_roadmap ON dependencies(roadmap_id);",
    )
    .map_err(db_err)?;

    // Completion flag arrived after the first schema
    if !column_exists(conn, "milestones", "is_completed")? {
        conn.execute(
            "ALTER TABLE milestones ADD COLUMN is_completed INTEGER NOT NULL DEFAULT 0",
            [],
        )
        .map_err(|e| DomainError::Internal(format!("Failed to add is_completed: {}", e)))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[tokio::test]
    async fn test_migrations_are_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("roadmap.db");

        init_db(&path).await.unwrap();
        let state = init_db(&path).await.unwrap();

        let guard = state.conn.lock().await;
        let conn = guard.as_ref().unwrap();
        assert!(column_exists(conn, "milestones", "is_completed").unwrap());
        assert!(!column_exists(conn, "milestones", "nope").unwrap());
    }

    #[tokio::test]
    async fn test_memory_db() {
        let state = init_db(&PathBuf::from(":memory:")).await.unwrap();
        assert!(state.conn.lock().await.is_some());
    }
}
