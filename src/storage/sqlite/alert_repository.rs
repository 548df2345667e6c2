use chrono::{DateTime, Utc};

use crate::errors::TattlerResult;
use crate::storage::sqlite::connection::LEGACY_ALERTS_TABLE;
use crate::storage::sqlite::SqliteStorage;
use crate::storage::traits::AlertRepository;

const ALERTED_VALUE: &str = "true";

pub fn alert_key(post_id: &str) -> String {
    format!("alerted~{}", post_id)
}

pub struct SqliteAlertRepository {
    storage: SqliteStorage,
}

impl SqliteAlertRepository {
    pub fn new(storage: SqliteStorage) -> Self {
        Self { storage }
    }

    #[cfg(test)]
    pub fn is_alerted(&self, post_id: &str, now: DateTime<Utc>) -> TattlerResult<bool> {
        let conn = self.storage.connection()?;
        let mut stmt = conn.prepare(
            "SELECT EXISTS(SELECT 1 FROM alerted_posts WHERE key = ?1 AND expires_at > ?2)",
        )?;
        let exists: bool = stmt.query_row((alert_key(post_id), now.timestamp_millis()), |row| {
            row.get(0)
        })?;
        Ok(exists)
    }
}

impl AlertRepository for SqliteAlertRepository {
    fn mark_alerted(&self, post_id: &str, expires_at: DateTime<Utc>) -> TattlerResult<()> {
        let conn = self.storage.connection()?;
        conn.execute(
            "INSERT INTO alerted_posts (key, value, expires_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, expires_at = excluded.expires_at",
            (alert_key(post_id), ALERTED_VALUE, expires_at.timestamp_millis()),
        )?;
        Ok(())
    }

    fn get_unalerted(&self, post_ids: &[String], now: DateTime<Utc>) -> TattlerResult<Vec<String>> {
        if post_ids.is_empty() {
            return Ok(Vec::new());
        }

        let conn = self.storage.connection()?;

        // ?1 is the clock, keys follow
        let placeholders: Vec<String> = (0..post_ids.len()).map(|i| format!("?{}", i + 2)).collect();
        let query = format!(
            "SELECT key FROM alerted_posts WHERE expires_at > ?1 AND key IN ({})",
            placeholders.join(", ")
        );

        let mut params: Vec<rusqlite::types::Value> = vec![now.timestamp_millis().into()];
        params.extend(post_ids.iter().map(|id| alert_key(id).into()));

        let mut stmt = conn.prepare(&query)?;
        let alerted: Vec<String> = stmt
            .query_map(rusqlite::params_from_iter(params), |row| row.get(0))?
            .collect::<Result<_, _>>()?;

        Ok(post_ids
            .iter()
            .filter(|id| !alerted.contains(&alert_key(id)))
            .cloned()
            .collect())
    }

    fn purge_expired(&self, now: DateTime<Utc>) -> TattlerResult<usize> {
        let conn = self.storage.connection()?;
        let removed = conn.execute(
            "DELETE FROM alerted_posts WHERE expires_at <= ?1",
            [now.timestamp_millis()],
        )?;
        Ok(removed)
    }

    fn legacy_entries(&self) -> TattlerResult<Vec<(String, i64)>> {
        if !self.storage.table_exists(LEGACY_ALERTS_TABLE)? {
            return Ok(Vec::new());
        }

        let conn = self.storage.connection()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT member, score FROM {} ORDER BY score ASC",
            LEGACY_ALERTS_TABLE
        ))?;
        let entries = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    fn drop_legacy(&self) -> TattlerResult<()> {
        let conn = self.storage.connection()?;
        conn.execute_batch(&format!("DROP TABLE IF EXISTS {};", LEGACY_ALERTS_TABLE))?;
        Ok(())
    }
}
