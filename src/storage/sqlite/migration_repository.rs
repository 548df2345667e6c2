use crate::errors::TattlerResult;
use crate::storage::sqlite::SqliteStorage;
use crate::storage::traits::MigrationRepository;

pub struct SqliteMigrationRepository {
    storage: SqliteStorage,
}

impl SqliteMigrationRepository {
    pub fn new(storage: SqliteStorage) -> Self {
        Self { storage }
    }
}

impl MigrationRepository for SqliteMigrationRepository {
    fn is_applied(&self, name: &str) -> TattlerResult<bool> {
        let conn = self.storage.connection()?;
        let applied: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM applied_migrations WHERE name = ?1)",
            [name],
            |row| row.get(0),
        )?;
        Ok(applied)
    }

    fn mark_applied(&self, name: &str) -> TattlerResult<()> {
        let conn = self.storage.connection()?;
        conn.execute(
            "INSERT OR IGNORE INTO applied_migrations (name) VALUES (?1)",
            [name],
        )?;
        Ok(())
    }
}
