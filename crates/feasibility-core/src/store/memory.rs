//! In-memory key/value storage.

use std::collections::HashMap;
use std::sync::Mutex;

use super::{KeyValueStorage, StoreError, StoreResult};

/// Process-local storage, used by tests and embedded hosts without a database.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    items: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStorage for MemoryStorage {
    fn get_item(&self, key: &str) -> StoreResult<Option<String>> {
        let items = self
            .items
            .lock()
            .map_err(|e| StoreError::Unavailable(format!("Lock poisoned: {}", e)))?;
        Ok(items.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> StoreResult<()> {
        let mut items = self
            .items
            .lock()
            .map_err(|e| StoreError::Unavailable(format!("Lock poisoned: {}", e)))?;
        items.insert(key.to_string(), value.to_string());
        Ok(())
    }
}
