//! Request record store.
//!
//! The whole collection of [`RequestRecord`]s is serialised as one JSON array
//! under a single storage key. Saves are whole-collection overwrites with
//! last-writer-wins semantics; there is no versioning or merge.
//!
//! The persisted format carries no schema version, so a collection that fails
//! to read or parse is treated as empty (read-repair-by-reset). The next save
//! replaces the bad value.

mod memory;
mod query;

pub use memory::*;
pub use query::*;

use thiserror::Error;
use tracing::{debug, warn};

use crate::db::DbError;
use crate::models::RequestRecord;

/// Storage key holding the request collection.
pub const REQUESTS_KEY: &str = "feasibility_requests";

/// Store errors.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Storage error: {0}")]
    Storage(#[from] DbError),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    #[error("Invalid record: {0}")]
    InvalidRecord(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Minimal string key/value storage, in the shape of browser local storage.
pub trait KeyValueStorage {
    fn get_item(&self, key: &str) -> StoreResult<Option<String>>;
    fn set_item(&self, key: &str, value: &str) -> StoreResult<()>;
}

impl<T: KeyValueStorage + ?Sized> KeyValueStorage for &T {
    fn get_item(&self, key: &str) -> StoreResult<Option<String>> {
        (**self).get_item(key)
    }

    fn set_item(&self, key: &str, value: &str) -> StoreResult<()> {
        (**self).set_item(key, value)
    }
}

/// Persistent collection of request records.
pub struct FormStore<S> {
    storage: S,
}

impl<S: KeyValueStorage> FormStore<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Read the collection. Storage failures propagate; unparsable content
    /// reads as empty.
    fn read_collection(&self) -> StoreResult<Vec<RequestRecord>> {
        let Some(raw) = self.storage.get_item(REQUESTS_KEY)? else {
            return Ok(Vec::new());
        };

        match serde_json::from_str(&raw) {
            Ok(records) => Ok(records),
            Err(e) => {
                warn!(error = %e, "Request collection is corrupt, resetting to empty");
                Ok(Vec::new())
            }
        }
    }

    /// Read the collection for display, treating unreadable storage as empty.
    fn load(&self) -> Vec<RequestRecord> {
        self.read_collection().unwrap_or_else(|e| {
            warn!(error = %e, "Request storage unreadable, treating as empty");
            Vec::new()
        })
    }

    /// All records, most recently updated first.
    pub fn list(&self) -> Vec<RequestRecord> {
        let mut records = self.load();
        // Stable: equal timestamps keep storage order; unparsable ones go last
        records.sort_by(|a, b| b.updated_at_time().cmp(&a.updated_at_time()));
        records
    }

    pub fn get_by_id(&self, id: &str) -> Option<RequestRecord> {
        self.load().into_iter().find(|r| r.id == id)
    }

    /// Insert the record, or replace the one with the same id.
    ///
    /// Fails without writing when the existing collection cannot be read.
    pub fn save(&self, record: &RequestRecord) -> StoreResult<()> {
        if record.id.is_empty() {
            return Err(StoreError::InvalidRecord("record has no id".into()));
        }

        let mut records = self.read_collection()?;
        match records.iter_mut().find(|r| r.id == record.id) {
            Some(existing) => *existing = record.clone(),
            None => records.push(record.clone()),
        }

        let json = serde_json::to_string(&records)?;
        self.storage.set_item(REQUESTS_KEY, &json)?;

        debug!(
            id = %record.id,
            ref_no = %record.ref_no,
            status = record.status.as_str(),
            total = records.len(),
            "Saved request record"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Parameter, RequestStatus};
    use std::cell::Cell;

    /// Memory storage whose reads can be made to fail.
    #[derive(Default)]
    struct FlakyStorage {
        inner: MemoryStorage,
        fail_reads: Cell<bool>,
    }

    impl KeyValueStorage for FlakyStorage {
        fn get_item(&self, key: &str) -> StoreResult<Option<String>> {
            if self.fail_reads.get() {
                return Err(StoreError::Unavailable("database is locked".into()));
            }
            self.inner.get_item(key)
        }

        fn set_item(&self, key: &str, value: &str) -> StoreResult<()> {
            self.inner.set_item(key, value)
        }
    }

    fn make_record(id: &str, updated_at: &str) -> RequestRecord {
        let mut record = RequestRecord {
            id: id.into(),
            ref_no: format!("DRAFT-{id}"),
            created_at: "2026-01-01T00:00:00.000Z".into(),
            updated_at: updated_at.into(),
            ..RequestRecord::default()
        };
        record.client_details.client_name = "Acme".into();
        record.sample_data.parameters.push(Parameter::new());
        record
    }

    #[test]
    fn test_empty_store_lists_nothing() {
        let store = FormStore::new(MemoryStorage::new());
        assert!(store.list().is_empty());
        assert!(store.get_by_id("missing").is_none());
    }

    #[test]
    fn test_save_then_get_roundtrip() {
        let store = FormStore::new(MemoryStorage::new());
        let record = make_record("a", "2026-01-02T00:00:00.000Z");

        store.save(&record).unwrap();
        assert_eq!(store.get_by_id("a"), Some(record));
    }

    #[test]
    fn test_save_replaces_existing() {
        let store = FormStore::new(MemoryStorage::new());
        let mut record = make_record("a", "2026-01-02T00:00:00.000Z");
        store.save(&record).unwrap();

        record.status = RequestStatus::Published;
        record.updated_at = "2026-01-03T00:00:00.000Z".into();
        store.save(&record).unwrap();

        let all = store.list();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].status, RequestStatus::Published);
    }

    #[test]
    fn test_list_sorted_by_updated_desc() {
        let store = FormStore::new(MemoryStorage::new());
        store
            .save(&make_record("old", "2026-01-01T08:00:00.000Z"))
            .unwrap();
        store
            .save(&make_record("new", "2026-03-01T08:00:00.000Z"))
            .unwrap();
        store
            .save(&make_record("mid", "2026-02-01T08:00:00+05:30"))
            .unwrap();
        store.save(&make_record("bad", "not a date")).unwrap();

        let ids: Vec<String> = store.list().into_iter().map(|r| r.id).collect();
        assert_eq!(ids, vec!["new", "mid", "old", "bad"]);
    }

    #[test]
    fn test_corrupt_collection_resets_to_empty() {
        let storage = MemoryStorage::new();
        storage.set_item(REQUESTS_KEY, "{not json").unwrap();
        let store = FormStore::new(&storage);

        assert!(store.list().is_empty());

        // A save repairs the collection
        store
            .save(&make_record("a", "2026-01-02T00:00:00.000Z"))
            .unwrap();
        assert_eq!(store.list().len(), 1);
    }

    #[test]
    fn test_save_without_id_is_rejected() {
        let store = FormStore::new(MemoryStorage::new());
        let record = make_record("", "2026-01-02T00:00:00.000Z");
        assert!(matches!(
            store.save(&record),
            Err(StoreError::InvalidRecord(_))
        ));
    }

    #[test]
    fn test_database_backed_store() {
        let db = crate::db::Database::open_in_memory().unwrap();
        let store = FormStore::new(&db);
        let record = make_record("a", "2026-01-02T00:00:00.000Z");

        store.save(&record).unwrap();
        assert_eq!(store.get_by_id("a"), Some(record));
    }

    #[test]
    fn test_failed_read_does_not_overwrite_collection() {
        let storage = FlakyStorage::default();
        let store = FormStore::new(&storage);
        for id in ["a", "b", "c"] {
            store
                .save(&make_record(id, "2026-01-02T00:00:00.000Z"))
                .unwrap();
        }

        storage.fail_reads.set(true);
        assert!(store.list().is_empty());
        assert!(matches!(
            store.save(&make_record("d", "2026-01-03T00:00:00.000Z")),
            Err(StoreError::Unavailable(_))
        ));

        storage.fail_reads.set(false);
        let ids: Vec<String> = store.list().into_iter().map(|r| r.id).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }
}
