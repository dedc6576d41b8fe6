//! Form lifecycle: editing a request and moving it Draft → Published, with
//! per-parameter feasibility locks.
//!
//! A [`FormSession`] holds one request in memory. Edits apply to the session
//! only; the record actions (`save_draft`, `publish`, `save_changes`,
//! `lock_parameter`) write the whole record through a [`FormStore`]. Session
//! state changes only after the store write succeeds, so a failed action
//! leaves the session as it was.
//!
//! ```text
//!   new ──save_draft──▶ Draft ──publish──▶ Published ──save_changes──▶ Published
//!                        ▲  │                  │
//!                        └──┘ save_draft       ├─ set_feasibility(p)   Unset/Decided
//!                                              └─ lock_parameter(p)    Decided → Locked
//! ```

use std::fmt;

use chrono::{DateTime, Datelike, Utc};
use thiserror::Error;
use tracing::{info, warn};

use crate::aggregate::ClientRoster;
use crate::models::{
    draft_reference, format_timestamp, published_reference, ClientDetails, Parameter,
    ParameterEdit, RequestRecord, RequestStatus, RequirementKind, Requirements, SampleData,
    TransitionError,
};
use crate::store::{FormStore, KeyValueStorage, StoreError};

/// Why a form cannot be published yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, uniffi::Enum)]
pub enum PublishBlocker {
    MissingClientName,
    MissingSampleName,
    NoParameters,
}

impl fmt::Display for PublishBlocker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PublishBlocker::MissingClientName => write!(f, "client name is required"),
            PublishBlocker::MissingSampleName => write!(f, "sample name is required"),
            PublishBlocker::NoParameters => write!(f, "at least one parameter is required"),
        }
    }
}

fn describe_blockers(blockers: &[PublishBlocker]) -> String {
    blockers
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Workflow errors.
#[derive(Error, Debug)]
pub enum WorkflowError {
    #[error("Parameter not found: {0}")]
    ParameterNotFound(String),

    #[error("Parameter {0} is locked")]
    ParameterLocked(String),

    #[error("Feasibility for parameter {0} has not been decided")]
    FeasibilityUndecided(String),

    #[error("Request is not published")]
    NotPublished,

    #[error("Request is already published")]
    AlreadyPublished,

    #[error("Structural fields of a published request cannot be edited")]
    RecordPublished,

    #[error("Request cannot be published: {}", describe_blockers(.0))]
    Validation(Vec<PublishBlocker>),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

pub type WorkflowResult<T> = Result<T, WorkflowError>;

fn transition_error(parameter_id: &str, err: TransitionError) -> WorkflowError {
    match err {
        TransitionError::Locked => WorkflowError::ParameterLocked(parameter_id.to_string()),
        TransitionError::Undecided => {
            WorkflowError::FeasibilityUndecided(parameter_id.to_string())
        }
    }
}

/// Read-only view of a session, for UI hosts.
#[derive(Debug, Clone, PartialEq, uniffi::Record)]
pub struct FormSnapshot {
    pub id: Option<String>,
    pub ref_no: Option<String>,
    pub status: RequestStatus,
    pub created_at: String,
    pub client_details: ClientDetails,
    pub sample_data: SampleData,
    pub publish_blockers: Vec<PublishBlocker>,
    pub pending_lock_count: u32,
    pub requirements: Requirements,
}

/// An in-memory request being edited.
#[derive(Debug, Clone, PartialEq)]
pub struct FormSession {
    id: Option<String>,
    ref_no: Option<String>,
    status: RequestStatus,
    created_at: String,
    client_details: ClientDetails,
    sample_data: SampleData,
}

impl Default for FormSession {
    fn default() -> Self {
        Self::new()
    }
}

impl FormSession {
    /// Start an empty, unsaved form.
    pub fn new() -> Self {
        Self::new_at(Utc::now())
    }

    pub fn new_at(now: DateTime<Utc>) -> Self {
        Self {
            id: None,
            ref_no: None,
            status: RequestStatus::Draft,
            created_at: format_timestamp(now),
            client_details: ClientDetails::default(),
            sample_data: SampleData::default(),
        }
    }

    /// Hydrate a session from a stored record.
    pub fn from_record(record: RequestRecord) -> Self {
        Self {
            id: Some(record.id),
            ref_no: Some(record.ref_no).filter(|r| !r.is_empty()),
            status: record.status,
            created_at: record.created_at,
            client_details: record.client_details,
            sample_data: record.sample_data,
        }
    }

    /// Load a stored record for editing.
    pub fn open<S: KeyValueStorage>(store: &FormStore<S>, id: &str) -> Option<Self> {
        store.get_by_id(id).map(Self::from_record)
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn ref_no(&self) -> Option<&str> {
        self.ref_no.as_deref()
    }

    pub fn status(&self) -> RequestStatus {
        self.status
    }

    pub fn is_published(&self) -> bool {
        self.status == RequestStatus::Published
    }

    pub fn created_at(&self) -> &str {
        &self.created_at
    }

    pub fn client_details(&self) -> &ClientDetails {
        &self.client_details
    }

    pub fn sample_data(&self) -> &SampleData {
        &self.sample_data
    }

    pub fn parameters(&self) -> &[Parameter] {
        &self.sample_data.parameters
    }

    pub fn parameter(&self, parameter_id: &str) -> Option<&Parameter> {
        self.sample_data
            .parameters
            .iter()
            .find(|p| p.id == parameter_id)
    }

    /// Everything still missing before `publish` is accepted.
    pub fn publish_blockers(&self) -> Vec<PublishBlocker> {
        let mut blockers = Vec::new();
        if self.client_details.client_name.trim().is_empty() {
            blockers.push(PublishBlocker::MissingClientName);
        }
        if self.sample_data.sample_name.trim().is_empty() {
            blockers.push(PublishBlocker::MissingSampleName);
        }
        if self.sample_data.parameters.is_empty() {
            blockers.push(PublishBlocker::NoParameters);
        }
        blockers
    }

    pub fn can_publish(&self) -> bool {
        self.publish_blockers().is_empty()
    }

    /// Decided parameters that have not been locked yet.
    pub fn pending_lock_count(&self) -> usize {
        self.sample_data
            .parameters
            .iter()
            .filter(|p| p.feasibility.is_decided() && !p.is_locked())
            .count()
    }

    pub fn snapshot(&self) -> FormSnapshot {
        let mut requirements = Requirements::default();
        for param in &self.sample_data.parameters {
            requirements.merge(&param.requirements);
        }
        FormSnapshot {
            id: self.id.clone(),
            ref_no: self.ref_no.clone(),
            status: self.status,
            created_at: self.created_at.clone(),
            client_details: self.client_details.clone(),
            sample_data: self.sample_data.clone(),
            publish_blockers: self.publish_blockers(),
            pending_lock_count: self.pending_lock_count() as u32,
            requirements,
        }
    }

    // =========================================================================
    // Client & Sample Edits (draft only)
    // =========================================================================

    fn ensure_draft(&self) -> WorkflowResult<()> {
        if self.is_published() {
            Err(WorkflowError::RecordPublished)
        } else {
            Ok(())
        }
    }

    pub fn set_client_details(&mut self, details: ClientDetails) -> WorkflowResult<()> {
        self.ensure_draft()?;
        self.client_details = details;
        Ok(())
    }

    /// Pick a client. Known clients fill address details from their first
    /// unit; unknown names are taken as typed.
    pub fn select_client(&mut self, roster: &ClientRoster, client_name: &str) -> WorkflowResult<()> {
        self.ensure_draft()?;
        match roster.units(client_name).and_then(|units| units.first()) {
            Some(unit) => self.client_details.apply_unit(client_name.trim(), unit),
            None => self.client_details.client_name = client_name.to_string(),
        }
        Ok(())
    }

    /// Pick a contact person from the selected client's contacts.
    pub fn select_contact(&mut self, roster: &ClientRoster, contact_name: &str) -> WorkflowResult<()> {
        self.ensure_draft()?;
        let known = roster
            .contacts_for(&self.client_details.client_name)
            .into_iter()
            .find(|c| c.name == contact_name.trim());
        match known {
            Some(contact) => {
                self.client_details.contact_person_name = contact.name;
                self.client_details.contact_person_phone = contact.phone;
            }
            None => self.client_details.contact_person_name = contact_name.to_string(),
        }
        Ok(())
    }

    pub fn set_sample(&mut self, sample_name: String, sample_type: String) -> WorkflowResult<()> {
        self.ensure_draft()?;
        self.sample_data.sample_name = sample_name;
        self.sample_data.sample_type = sample_type;
        Ok(())
    }

    // =========================================================================
    // Parameter Edits
    // =========================================================================

    fn parameter_mut(&mut self, parameter_id: &str) -> WorkflowResult<&mut Parameter> {
        self.sample_data
            .parameters
            .iter_mut()
            .find(|p| p.id == parameter_id)
            .ok_or_else(|| WorkflowError::ParameterNotFound(parameter_id.to_string()))
    }

    fn ensure_published(&self) -> WorkflowResult<()> {
        if self.is_published() {
            Ok(())
        } else {
            Err(WorkflowError::NotPublished)
        }
    }

    /// Append an empty parameter to a draft and return its id.
    pub fn add_parameter(&mut self) -> WorkflowResult<String> {
        self.ensure_draft()?;
        let param = Parameter::new();
        let id = param.id.clone();
        self.sample_data.parameters.push(param);
        Ok(id)
    }

    /// Edit an unlocked parameter. The name is fixed once published.
    pub fn update_parameter(&mut self, parameter_id: &str, edit: ParameterEdit) -> WorkflowResult<()> {
        if edit.parameter_name.is_some() && self.is_published() {
            if self.parameter(parameter_id).is_none() {
                return Err(WorkflowError::ParameterNotFound(parameter_id.to_string()));
            }
            return Err(WorkflowError::RecordPublished);
        }
        self.parameter_mut(parameter_id)?
            .apply_edit(edit)
            .map_err(|e| transition_error(parameter_id, e))
    }

    /// Delete an unlocked parameter from a draft.
    pub fn remove_parameter(&mut self, parameter_id: &str) -> WorkflowResult<()> {
        self.ensure_draft()?;
        self.parameter_mut(parameter_id)?
            .ensure_unlocked()
            .map_err(|e| transition_error(parameter_id, e))?;
        self.sample_data.parameters.retain(|p| p.id != parameter_id);
        Ok(())
    }

    pub fn add_requirement(
        &mut self,
        parameter_id: &str,
        kind: RequirementKind,
        value: &str,
    ) -> WorkflowResult<bool> {
        self.parameter_mut(parameter_id)?
            .add_requirement(kind, value)
            .map_err(|e| transition_error(parameter_id, e))
    }

    pub fn remove_requirement(
        &mut self,
        parameter_id: &str,
        kind: RequirementKind,
        value: &str,
    ) -> WorkflowResult<bool> {
        self.parameter_mut(parameter_id)?
            .remove_requirement(kind, value)
            .map_err(|e| transition_error(parameter_id, e))
    }

    // =========================================================================
    // Feasibility (published only)
    // =========================================================================

    /// Record or change the feasibility decision of an unlocked parameter.
    pub fn set_feasibility(&mut self, parameter_id: &str, feasible: bool) -> WorkflowResult<()> {
        self.ensure_published()?;
        self.parameter_mut(parameter_id)?
            .decide(feasible)
            .map_err(|e| transition_error(parameter_id, e))
    }

    pub fn set_remarks(&mut self, parameter_id: &str, remarks: String) -> WorkflowResult<()> {
        self.ensure_published()?;
        self.parameter_mut(parameter_id)?
            .set_remarks(remarks)
            .map_err(|e| transition_error(parameter_id, e))
    }

    // =========================================================================
    // Record Actions
    // =========================================================================

    fn build_record(
        &self,
        id: String,
        ref_no: String,
        status: RequestStatus,
        now: DateTime<Utc>,
    ) -> RequestRecord {
        RequestRecord {
            id,
            ref_no,
            status,
            client_details: self.client_details.clone(),
            sample_data: self.sample_data.clone(),
            created_at: self.created_at.clone(),
            updated_at: format_timestamp(now),
        }
    }

    /// Write the record and adopt its identity on success.
    fn persist<S: KeyValueStorage>(
        &mut self,
        store: &FormStore<S>,
        record: RequestRecord,
    ) -> WorkflowResult<RequestRecord> {
        store.save(&record)?;
        self.id = Some(record.id.clone());
        self.ref_no = Some(record.ref_no.clone());
        self.status = record.status;
        Ok(record)
    }

    pub fn save_draft<S: KeyValueStorage>(&mut self, store: &FormStore<S>) -> WorkflowResult<RequestRecord> {
        self.save_draft_at(store, Utc::now())
    }

    /// Persist as a draft, assigning an id and placeholder reference if needed.
    pub fn save_draft_at<S: KeyValueStorage>(
        &mut self,
        store: &FormStore<S>,
        now: DateTime<Utc>,
    ) -> WorkflowResult<RequestRecord> {
        if self.is_published() {
            warn!(id = ?self.id, "Rejected save_draft on a published request");
            return Err(WorkflowError::AlreadyPublished);
        }

        let id = self
            .id
            .clone()
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        let ref_no = self
            .ref_no
            .clone()
            .unwrap_or_else(|| draft_reference(&id));
        let record = self.build_record(id, ref_no, RequestStatus::Draft, now);
        self.persist(store, record)
    }

    pub fn publish<S: KeyValueStorage>(&mut self, store: &FormStore<S>) -> WorkflowResult<RequestRecord> {
        self.publish_at(store, Utc::now())
    }

    /// Validate and publish. The `REF-` reference is assigned on the first
    /// publish only; publishing again keeps it.
    pub fn publish_at<S: KeyValueStorage>(
        &mut self,
        store: &FormStore<S>,
        now: DateTime<Utc>,
    ) -> WorkflowResult<RequestRecord> {
        let blockers = self.publish_blockers();
        if !blockers.is_empty() {
            warn!(?blockers, "Rejected publish");
            return Err(WorkflowError::Validation(blockers));
        }

        let id = self
            .id
            .clone()
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        let ref_no = match (&self.ref_no, self.status) {
            (Some(existing), RequestStatus::Published) => existing.clone(),
            _ => published_reference(&id, now.year()),
        };
        let record = self.build_record(id, ref_no, RequestStatus::Published, now);
        let record = self.persist(store, record)?;

        info!(id = %record.id, ref_no = %record.ref_no, "Published request");
        Ok(record)
    }

    pub fn save_changes<S: KeyValueStorage>(&mut self, store: &FormStore<S>) -> WorkflowResult<RequestRecord> {
        self.save_changes_at(store, Utc::now())
    }

    /// Persist edits to a published request without touching status or ref.
    pub fn save_changes_at<S: KeyValueStorage>(
        &mut self,
        store: &FormStore<S>,
        now: DateTime<Utc>,
    ) -> WorkflowResult<RequestRecord> {
        self.ensure_published()?;
        let (id, ref_no) = match (&self.id, &self.ref_no) {
            (Some(id), Some(ref_no)) => (id.clone(), ref_no.clone()),
            _ => return Err(WorkflowError::NotPublished),
        };
        let record = self.build_record(id, ref_no, RequestStatus::Published, now);
        self.persist(store, record)
    }

    pub fn lock_parameter<S: KeyValueStorage>(
        &mut self,
        store: &FormStore<S>,
        parameter_id: &str,
    ) -> WorkflowResult<RequestRecord> {
        self.lock_parameter_at(store, parameter_id, Utc::now())
    }

    /// Lock a decided parameter and immediately persist the whole record.
    pub fn lock_parameter_at<S: KeyValueStorage>(
        &mut self,
        store: &FormStore<S>,
        parameter_id: &str,
        now: DateTime<Utc>,
    ) -> WorkflowResult<RequestRecord> {
        self.ensure_published()?;

        let mut next = self.clone();
        if let Err(e) = next
            .parameter_mut(parameter_id)?
            .lock(format_timestamp(now))
        {
            warn!(parameter_id, error = %e, "Rejected parameter lock");
            return Err(transition_error(parameter_id, e));
        }

        let record = next.save_changes_at(store, now)?;
        *self = next;

        info!(id = %record.id, parameter_id, "Locked parameter");
        Ok(record)
    }
}
