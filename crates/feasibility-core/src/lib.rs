//! Feasibility Intake Core Library
//!
//! Local-first intake of laboratory test requests: a client submits a sample
//! with the parameters to test, the lab publishes the request, then decides
//! and locks feasibility per parameter.
//!
//! # Architecture
//!
//! ```text
//!   SQLite master tables ──▶ Lookup Gateway ──▶ pick lists (HTTP / FFI)
//!            │
//!        customers ──▶ Client Aggregator ──▶ roster + contact directory
//!                                                 │
//!                                          ┌──────▼──────┐
//!                                          │ FormSession │  Draft → Published
//!                                          └──────┬──────┘  per-parameter lock
//!                                                 │
//!                                  FormStore (one JSON collection)
//!                                                 │
//!                                      local_storage table
//! ```
//!
//! # Modules
//!
//! - [`db`]: SQLite layer: master tables, seeding, key/value storage
//! - [`models`]: Domain types (RequestRecord, Parameter, ClientRecord, etc.)
//! - [`aggregate`]: Client roster and contact directory
//! - [`store`]: Request collection persistence and dashboard queries
//! - [`workflow`]: Form editing and the publish / lock lifecycle

pub mod aggregate;
pub mod db;
pub mod models;
pub mod store;
pub mod workflow;

// Re-export commonly used types
pub use aggregate::ClientRoster;
pub use db::{Database, DbError, MasterDataSeed, SeedSummary};
pub use models::{
    AggregatedClient, ClientDetails, ClientRecord, Contact, Feasibility, LookupCategory,
    Parameter, ParameterEdit, RequestRecord, RequestStatus, RequestSummary, RequirementKind,
    Requirements, SampleData, UnitDetail,
};
pub use store::{DashboardStats, FormStore, KeyValueStorage, MemoryStorage, RecordQuery, StoreError};
pub use workflow::{FormSession, FormSnapshot, PublishBlocker, WorkflowError};

// UniFFI setup - using proc macros
uniffi::setup_scaffolding!();

use std::sync::{Arc, Mutex};

// =========================================================================
// FFI Error Type
// =========================================================================

#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum FeasibilityError {
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<db::DbError> for FeasibilityError {
    fn from(e: db::DbError) -> Self {
        match e {
            db::DbError::NotFound(what) => FeasibilityError::NotFound(what),
            db::DbError::Json(e) => FeasibilityError::SerializationError(e.to_string()),
            other => FeasibilityError::DatabaseError(other.to_string()),
        }
    }
}

impl From<store::StoreError> for FeasibilityError {
    fn from(e: store::StoreError) -> Self {
        match e {
            store::StoreError::Json(e) => FeasibilityError::SerializationError(e.to_string()),
            store::StoreError::InvalidRecord(msg) => FeasibilityError::InvalidInput(msg),
            other => FeasibilityError::StorageError(other.to_string()),
        }
    }
}

impl From<workflow::WorkflowError> for FeasibilityError {
    fn from(e: workflow::WorkflowError) -> Self {
        use workflow::WorkflowError as W;
        match e {
            W::Store(e) => e.into(),
            W::ParameterNotFound(id) => FeasibilityError::NotFound(format!("parameter {}", id)),
            W::Validation(_) => FeasibilityError::InvalidInput(e.to_string()),
            other => FeasibilityError::InvalidState(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for FeasibilityError {
    fn from(e: serde_json::Error) -> Self {
        FeasibilityError::SerializationError(e.to_string())
    }
}

impl<T> From<std::sync::PoisonError<T>> for FeasibilityError {
    fn from(e: std::sync::PoisonError<T>) -> Self {
        FeasibilityError::DatabaseError(format!("Lock poisoned: {}", e))
    }
}

// =========================================================================
// Factory Functions (exported to FFI)
// =========================================================================

/// Open or create a database at the given path.
#[uniffi::export]
pub fn open_database(path: String) -> Result<Arc<FeasibilityCore>, FeasibilityError> {
    let db = Database::open(&path)?;
    Ok(Arc::new(FeasibilityCore {
        db: Arc::new(Mutex::new(db)),
    }))
}

/// Create an in-memory database (for testing).
#[uniffi::export]
pub fn open_database_in_memory() -> Result<Arc<FeasibilityCore>, FeasibilityError> {
    let db = Database::open_in_memory()?;
    Ok(Arc::new(FeasibilityCore {
        db: Arc::new(Mutex::new(db)),
    }))
}

// =========================================================================
// Main API Object
// =========================================================================

/// Thread-safe database wrapper for FFI.
#[derive(uniffi::Object)]
pub struct FeasibilityCore {
    db: Arc<Mutex<Database>>,
}

#[uniffi::export]
impl FeasibilityCore {
    // =========================================================================
    // Lookup Operations
    // =========================================================================

    /// Every customer unit, in master-data order.
    pub fn list_clients(&self) -> Result<Vec<ClientRecord>, FeasibilityError> {
        let db = self.db.lock()?;
        Ok(db.list_clients()?)
    }

    /// Distinct values of one pick list.
    pub fn list_lookup(&self, category: LookupCategory) -> Result<Vec<String>, FeasibilityError> {
        let db = self.db.lock()?;
        Ok(db.list_lookup(category)?)
    }

    /// Clients grouped by name with their units.
    pub fn client_roster(&self) -> Result<Vec<AggregatedClient>, FeasibilityError> {
        let db = self.db.lock()?;
        let roster = ClientRoster::from_records(&db.list_clients()?);
        Ok(roster.to_aggregated())
    }

    pub fn contact_directory(&self) -> Result<Vec<Contact>, FeasibilityError> {
        let db = self.db.lock()?;
        let roster = ClientRoster::from_records(&db.list_clients()?);
        Ok(roster.contact_directory())
    }

    /// Load master data from a JSON seed document.
    pub fn seed_master_data_json(&self, json: String) -> Result<SeedSummary, FeasibilityError> {
        let seed = MasterDataSeed::from_json(&json)?;
        let mut db = self.db.lock()?;
        Ok(db.seed_master_data(&seed)?)
    }

    // =========================================================================
    // Request Operations
    // =========================================================================

    /// All requests, most recently updated first.
    pub fn list_requests(&self) -> Result<Vec<RequestRecord>, FeasibilityError> {
        let db = self.db.lock()?;
        Ok(FormStore::new(&*db).list())
    }

    pub fn search_requests(&self, query: RecordQuery) -> Result<Vec<RequestSummary>, FeasibilityError> {
        let db = self.db.lock()?;
        Ok(FormStore::new(&*db).search(&query))
    }

    pub fn dashboard_stats(&self) -> Result<DashboardStats, FeasibilityError> {
        let db = self.db.lock()?;
        Ok(FormStore::new(&*db).stats())
    }

    pub fn get_request(&self, id: String) -> Result<Option<RequestRecord>, FeasibilityError> {
        let db = self.db.lock()?;
        Ok(FormStore::new(&*db).get_by_id(&id))
    }

    // =========================================================================
    // Form Operations
    // =========================================================================

    /// Start editing a new, unsaved request.
    pub fn new_form(&self) -> Arc<FormEditor> {
        Arc::new(FormEditor {
            db: Arc::clone(&self.db),
            session: Mutex::new(FormSession::new()),
        })
    }

    /// Edit an existing request.
    pub fn open_form(&self, id: String) -> Result<Arc<FormEditor>, FeasibilityError> {
        let session = {
            let db = self.db.lock()?;
            FormSession::open(&FormStore::new(&*db), &id)
        }
        .ok_or_else(|| FeasibilityError::NotFound(format!("request {}", id)))?;

        Ok(Arc::new(FormEditor {
            db: Arc::clone(&self.db),
            session: Mutex::new(session),
        }))
    }
}

// =========================================================================
// Form Editor Object
// =========================================================================

/// One request being edited. Record actions write through the shared database.
#[derive(uniffi::Object)]
pub struct FormEditor {
    db: Arc<Mutex<Database>>,
    session: Mutex<FormSession>,
}

impl FormEditor {
    fn roster(&self) -> Result<ClientRoster, FeasibilityError> {
        let db = self.db.lock()?;
        Ok(ClientRoster::from_records(&db.list_clients()?))
    }

    /// Run a record action with the session and a database-backed store.
    fn with_store<T>(
        &self,
        action: impl FnOnce(&mut FormSession, &FormStore<&Database>) -> Result<T, WorkflowError>,
    ) -> Result<T, FeasibilityError> {
        let mut session = self.session.lock()?;
        let db = self.db.lock()?;
        Ok(action(&mut *session, &FormStore::new(&*db))?)
    }
}

#[uniffi::export]
impl FormEditor {
    pub fn snapshot(&self) -> Result<FormSnapshot, FeasibilityError> {
        Ok(self.session.lock()?.snapshot())
    }

    // =========================================================================
    // Client & Sample
    // =========================================================================

    pub fn set_client_details(&self, details: ClientDetails) -> Result<(), FeasibilityError> {
        Ok(self.session.lock()?.set_client_details(details)?)
    }

    pub fn select_client(&self, client_name: String) -> Result<(), FeasibilityError> {
        let roster = self.roster()?;
        Ok(self.session.lock()?.select_client(&roster, &client_name)?)
    }

    pub fn select_contact(&self, contact_name: String) -> Result<(), FeasibilityError> {
        let roster = self.roster()?;
        Ok(self.session.lock()?.select_contact(&roster, &contact_name)?)
    }

    pub fn set_sample(&self, sample_name: String, sample_type: String) -> Result<(), FeasibilityError> {
        Ok(self.session.lock()?.set_sample(sample_name, sample_type)?)
    }

    // =========================================================================
    // Parameters
    // =========================================================================

    /// Append an empty parameter, returning its id.
    pub fn add_parameter(&self) -> Result<String, FeasibilityError> {
        Ok(self.session.lock()?.add_parameter()?)
    }

    pub fn update_parameter(&self, parameter_id: String, edit: ParameterEdit) -> Result<(), FeasibilityError> {
        Ok(self.session.lock()?.update_parameter(&parameter_id, edit)?)
    }

    pub fn remove_parameter(&self, parameter_id: String) -> Result<(), FeasibilityError> {
        Ok(self.session.lock()?.remove_parameter(&parameter_id)?)
    }

    pub fn add_requirement(
        &self,
        parameter_id: String,
        kind: RequirementKind,
        value: String,
    ) -> Result<bool, FeasibilityError> {
        Ok(self
            .session
            .lock()?
            .add_requirement(&parameter_id, kind, &value)?)
    }

    pub fn remove_requirement(
        &self,
        parameter_id: String,
        kind: RequirementKind,
        value: String,
    ) -> Result<bool, FeasibilityError> {
        Ok(self
            .session
            .lock()?
            .remove_requirement(&parameter_id, kind, &value)?)
    }

    pub fn set_feasibility(&self, parameter_id: String, feasible: bool) -> Result<(), FeasibilityError> {
        Ok(self.session.lock()?.set_feasibility(&parameter_id, feasible)?)
    }

    pub fn set_remarks(&self, parameter_id: String, remarks: String) -> Result<(), FeasibilityError> {
        Ok(self.session.lock()?.set_remarks(&parameter_id, remarks)?)
    }

    // =========================================================================
    // Record Actions
    // =========================================================================

    /// Lock a decided parameter; the record is saved immediately.
    pub fn lock_parameter(&self, parameter_id: String) -> Result<RequestRecord, FeasibilityError> {
        self.with_store(|session, store| session.lock_parameter(store, &parameter_id))
    }

    pub fn save_draft(&self) -> Result<RequestRecord, FeasibilityError> {
        self.with_store(|session, store| session.save_draft(store))
    }

    pub fn publish(&self) -> Result<RequestRecord, FeasibilityError> {
        self.with_store(|session, store| session.publish(store))
    }

    pub fn save_changes(&self) -> Result<RequestRecord, FeasibilityError> {
        self.with_store(|session, store| session.save_changes(store))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SEED: &str = r#"{
        "clients": [
            {"clientCode": "C001", "clientName": "Acme", "unit": "Plant 1",
             "address": "Plot 4", "contactPersonName": "Bob", "contactPersonPhone": "555"},
            {"clientCode": "C002", "clientName": "Acme", "unit": "Plant 2"}
        ],
        "values": {
            "regulations": ["FSSAI", "EU 2023/915"],
            "labs": ["Chemistry"]
        }
    }"#;

    #[test]
    fn test_core_lookups_after_seed() {
        let core = open_database_in_memory().unwrap();
        let summary = core.seed_master_data_json(SEED.into()).unwrap();
        assert_eq!(summary.clients, 2);

        assert_eq!(
            core.list_lookup(LookupCategory::Regulations).unwrap(),
            vec!["EU 2023/915", "FSSAI"]
        );
        let roster = core.client_roster().unwrap();
        assert_eq!(roster.len(), 1);
        assert_eq!(roster[0].units.len(), 2);
        assert_eq!(core.contact_directory().unwrap()[0].name, "Bob");
    }

    #[test]
    fn test_bad_seed_is_serialization_error() {
        let core = open_database_in_memory().unwrap();
        let err = core.seed_master_data_json("{not json".into()).unwrap_err();
        assert!(matches!(err, FeasibilityError::SerializationError(_)));
    }

    #[test]
    fn test_editor_publish_and_lock() {
        let core = open_database_in_memory().unwrap();
        core.seed_master_data_json(SEED.into()).unwrap();

        let editor = core.new_form();
        editor.select_client("Acme".into()).unwrap();
        editor
            .set_sample("Batch1".into(), "Food".into())
            .unwrap();
        let param_id = editor.add_parameter().unwrap();

        let published = editor.publish().unwrap();
        assert_eq!(published.client_details.address, "Plot 4");
        assert_eq!(core.dashboard_stats().unwrap().published, 1);

        // Locking before a decision is rejected
        let err = editor.lock_parameter(param_id.clone()).unwrap_err();
        assert!(matches!(err, FeasibilityError::InvalidState(_)));

        editor.set_feasibility(param_id.clone(), true).unwrap();
        editor.lock_parameter(param_id.clone()).unwrap();

        let reopened = core.open_form(published.id.clone()).unwrap();
        let snapshot = reopened.snapshot().unwrap();
        assert_eq!(snapshot.ref_no, Some(published.ref_no));
        assert!(snapshot.sample_data.parameters[0].verified_at.is_some());
    }

    #[test]
    fn test_editor_validation_error() {
        let core = open_database_in_memory().unwrap();
        let editor = core.new_form();
        let err = editor.publish().unwrap_err();
        assert!(matches!(err, FeasibilityError::InvalidInput(_)));
        assert!(core.list_requests().unwrap().is_empty());
    }

    #[test]
    fn test_open_missing_form() {
        let core = open_database_in_memory().unwrap();
        assert!(matches!(
            core.open_form("missing".into()),
            Err(FeasibilityError::NotFound(_))
        ));
    }
}
