//! SQLite-backed key/value storage for the request collection.

use rusqlite::{params, OptionalExtension};

use super::Database;
use crate::store::{KeyValueStorage, StoreError, StoreResult};

impl KeyValueStorage for Database {
    fn get_item(&self, key: &str) -> StoreResult<Option<String>> {
        self.conn
            .query_row(
                "SELECT value FROM local_storage WHERE key = ?",
                [key],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| StoreError::Storage(e.into()))
    }

    fn set_item(&self, key: &str, value: &str) -> StoreResult<()> {
        self.conn
            .execute(
                r#"
                INSERT INTO local_storage (key, value, updated_at)
                VALUES (?1, ?2, datetime('now'))
                ON CONFLICT(key) DO UPDATE SET
                    value = excluded.value,
                    updated_at = datetime('now')
                "#,
                params![key, value],
            )
            .map_err(|e| StoreError::Storage(e.into()))?;
        Ok(())
    }
}
