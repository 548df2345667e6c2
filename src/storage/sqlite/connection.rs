use rusqlite::Connection;
use std::path::Path;
use std::sync::{Arc, Mutex};

use crate::errors::{TattlerError, TattlerResult};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS alerted_posts (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL,
    expires_at INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_alerted_posts_expires_at ON alerted_posts(expires_at);

CREATE TABLE IF NOT EXISTS scheduled_jobs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    cron TEXT,
    minute_offset INTEGER,
    interval_minutes INTEGER,
    run_at INTEGER,
    data TEXT NOT NULL DEFAULT '{}',
    last_run_at INTEGER,
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS applied_migrations (
    name TEXT PRIMARY KEY,
    applied_at TEXT NOT NULL DEFAULT (datetime('now'))
);
"#;

/// Legacy time-ordered collection, only found in databases from older releases
pub const LEGACY_ALERTS_TABLE: &str = "alerted_posts_legacy";

#[derive(Clone)]
pub struct SqliteStorage {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStorage {
    pub fn new<P: AsRef<Path>>(path: P) -> TattlerResult<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch(SCHEMA)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn in_memory() -> TattlerResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn connection(&self) -> Result<std::sync::MutexGuard<'_, Connection>, TattlerError> {
        self.conn
            .lock()
            .map_err(|_| TattlerError::Database(rusqlite::Error::InvalidQuery))
    }

    pub fn table_exists(&self, table: &str) -> TattlerResult<bool> {
        let conn = self.connection()?;
        let exists: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1)",
            [table],
            |row| row.get(0),
        )?;
        Ok(exists)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_in_memory_storage() {
        let storage = SqliteStorage::in_memory().unwrap();

        assert!(storage.table_exists("alerted_posts").unwrap());
        assert!(storage.table_exists("scheduled_jobs").unwrap());
        assert!(storage.table_exists("applied_migrations").unwrap());
        assert!(!storage.table_exists(LEGACY_ALERTS_TABLE).unwrap());
    }

    #[test]
    fn test_reopen_file_storage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tattler.db");

        SqliteStorage::new(&path).unwrap();
        let storage = SqliteStorage::new(&path).unwrap();
        assert!(storage.table_exists("alerted_posts").unwrap());
    }
}
