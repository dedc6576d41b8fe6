//! Test parameters and their feasibility/lock lifecycle.
//!
//! A parameter moves `Unset -> Decided -> Locked`. Once `verified_at` is set
//! the parameter is terminal: every mutator here returns
//! [`TransitionError::Locked`] and leaves it untouched.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Feasibility decision for a parameter.
///
/// Persisted as `null | true | false` so records written by older clients
/// (which stored an optional boolean) still load.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, uniffi::Enum)]
pub enum Feasibility {
    #[default]
    Unset,
    Feasible,
    NotFeasible,
}

impl Feasibility {
    pub fn from_decision(feasible: bool) -> Self {
        if feasible {
            Feasibility::Feasible
        } else {
            Feasibility::NotFeasible
        }
    }

    pub fn as_bool(self) -> Option<bool> {
        match self {
            Feasibility::Unset => None,
            Feasibility::Feasible => Some(true),
            Feasibility::NotFeasible => Some(false),
        }
    }

    pub fn is_decided(self) -> bool {
        self != Feasibility::Unset
    }
}

impl Serialize for Feasibility {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.as_bool().serialize(serializer)
    }
}

/// `false` always reads as `NotFeasible`, including records from older
/// clients where it meant "not yet toggled".
impl<'de> Deserialize<'de> for Feasibility {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(Option::<bool>::deserialize(deserializer)?
            .map_or(Feasibility::Unset, Feasibility::from_decision))
    }
}

/// Derived lifecycle state of a parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, uniffi::Enum)]
pub enum ParameterState {
    /// No feasibility decision yet
    Unset,
    /// Feasibility decided, still editable
    Decided,
    /// Verified; permanently immutable
    Locked,
}

/// Which requirement list an entry belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, uniffi::Enum)]
#[serde(rename_all = "lowercase")]
pub enum RequirementKind {
    Instrument,
    Chemical,
    Standard,
    Column,
}

/// Resources needed to run a parameter's test.
///
/// Each list keeps insertion order and holds no duplicates.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, uniffi::Record)]
#[serde(default)]
pub struct Requirements {
    pub instruments: Vec<String>,
    pub chemicals: Vec<String>,
    pub standards: Vec<String>,
    pub columns: Vec<String>,
}

impl Requirements {
    pub fn list(&self, kind: RequirementKind) -> &[String] {
        match kind {
            RequirementKind::Instrument => &self.instruments,
            RequirementKind::Chemical => &self.chemicals,
            RequirementKind::Standard => &self.standards,
            RequirementKind::Column => &self.columns,
        }
    }

    fn list_mut(&mut self, kind: RequirementKind) -> &mut Vec<String> {
        match kind {
            RequirementKind::Instrument => &mut self.instruments,
            RequirementKind::Chemical => &mut self.chemicals,
            RequirementKind::Standard => &mut self.standards,
            RequirementKind::Column => &mut self.columns,
        }
    }

    /// Add a value. Returns false for blanks and duplicates.
    pub fn insert(&mut self, kind: RequirementKind, value: &str) -> bool {
        let value = value.trim();
        if value.is_empty() {
            return false;
        }
        let list = self.list_mut(kind);
        if list.iter().any(|existing| existing == value) {
            return false;
        }
        list.push(value.to_string());
        true
    }

    /// Remove a value. Returns false if it was not present.
    pub fn remove(&mut self, kind: RequirementKind, value: &str) -> bool {
        let list = self.list_mut(kind);
        let before = list.len();
        list.retain(|existing| existing != value.trim());
        list.len() != before
    }

    /// Union `other` into `self`, keeping first-seen order.
    pub fn merge(&mut self, other: &Requirements) {
        for kind in [
            RequirementKind::Instrument,
            RequirementKind::Chemical,
            RequirementKind::Standard,
            RequirementKind::Column,
        ] {
            for value in other.list(kind) {
                self.insert(kind, value);
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.instruments.is_empty()
            && self.chemicals.is_empty()
            && self.standards.is_empty()
            && self.columns.is_empty()
    }
}

/// Partial update of a parameter's content fields.
#[derive(Debug, Clone, Default, PartialEq, uniffi::Record)]
pub struct ParameterEdit {
    pub parameter_name: Option<String>,
    pub regulation: Option<String>,
    pub method: Option<String>,
    pub specification: Option<String>,
    pub instrument: Option<String>,
    pub lab: Option<String>,
    pub is_nabl: Option<bool>,
}

/// Rejected parameter transition.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionError {
    #[error("parameter is locked")]
    Locked,

    #[error("feasibility has not been decided")]
    Undecided,
}

/// A single test parameter on a request.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, uniffi::Record)]
#[serde(rename_all = "camelCase", default)]
pub struct Parameter {
    /// Generated at creation; stable for the parameter's lifetime
    pub id: String,
    pub parameter_name: String,
    pub regulation: String,
    pub method: String,
    pub specification: String,
    pub instrument: String,
    #[serde(rename = "isNABL")]
    pub is_nabl: bool,
    pub lab: String,
    #[serde(rename = "isFeasible")]
    pub feasibility: Feasibility,
    /// Lock timestamp (RFC 3339); presence means the parameter is locked
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verified_at: Option<String>,
    pub remarks: String,
    pub requirements: Requirements,
}

impl Parameter {
    /// Create an empty parameter with a fresh id.
    pub fn new() -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            ..Self::default()
        }
    }

    pub fn state(&self) -> ParameterState {
        if self.verified_at.is_some() {
            ParameterState::Locked
        } else if self.feasibility.is_decided() {
            ParameterState::Decided
        } else {
            ParameterState::Unset
        }
    }

    pub fn is_locked(&self) -> bool {
        self.verified_at.is_some()
    }

    pub fn ensure_unlocked(&self) -> Result<(), TransitionError> {
        if self.is_locked() {
            Err(TransitionError::Locked)
        } else {
            Ok(())
        }
    }

    /// Apply content edits. `None` fields are left as they are.
    pub fn apply_edit(&mut self, edit: ParameterEdit) -> Result<(), TransitionError> {
        self.ensure_unlocked()?;
        let ParameterEdit {
            parameter_name,
            regulation,
            method,
            specification,
            instrument,
            lab,
            is_nabl,
        } = edit;

        if let Some(v) = parameter_name {
            self.parameter_name = v;
        }
        if let Some(v) = regulation {
            self.regulation = v;
        }
        if let Some(v) = method {
            self.method = v;
        }
        if let Some(v) = specification {
            self.specification = v;
        }
        if let Some(v) = instrument {
            self.instrument = v;
        }
        if let Some(v) = lab {
            self.lab = v;
        }
        if let Some(v) = is_nabl {
            self.is_nabl = v;
        }
        Ok(())
    }

    /// Record (or flip) the feasibility decision.
    pub fn decide(&mut self, feasible: bool) -> Result<(), TransitionError> {
        self.ensure_unlocked()?;
        self.feasibility = Feasibility::from_decision(feasible);
        Ok(())
    }

    /// Lock the parameter at `verified_at`. Terminal.
    pub fn lock(&mut self, verified_at: String) -> Result<(), TransitionError> {
        self.ensure_unlocked()?;
        if !self.feasibility.is_decided() {
            return Err(TransitionError::Undecided);
        }
        self.verified_at = Some(verified_at);
        Ok(())
    }

    pub fn set_remarks(&mut self, remarks: String) -> Result<(), TransitionError> {
        self.ensure_unlocked()?;
        self.remarks = remarks;
        Ok(())
    }

    pub fn add_requirement(
        &mut self,
        kind: RequirementKind,
        value: &str,
    ) -> Result<bool, TransitionError> {
        self.ensure_unlocked()?;
        Ok(self.requirements.insert(kind, value))
    }

    pub fn remove_requirement(
        &mut self,
        kind: RequirementKind,
        value: &str,
    ) -> Result<bool, TransitionError> {
        self.ensure_unlocked()?;
        Ok(self.requirements.remove(kind, value))
    }
}
