//! Feasibility request records.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use super::client::UnitDetail;
use super::parameter::{Parameter, Requirements};

/// Request lifecycle status. Monotonic: there is no unpublish.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, uniffi::Enum)]
pub enum RequestStatus {
    #[default]
    #[serde(alias = "draft")]
    Draft,
    #[serde(alias = "published")]
    Published,
}

impl RequestStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            RequestStatus::Draft => "Draft",
            RequestStatus::Published => "Published",
        }
    }
}

/// Client block of a request form.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, uniffi::Record)]
#[serde(rename_all = "camelCase", default)]
pub struct ClientDetails {
    pub client_name: String,
    pub address: String,
    pub pin_code: String,
    pub gst_no: String,
    pub contact_person_name: String,
    pub contact_person_phone: String,
}

impl ClientDetails {
    /// Fill the client block from a selected unit.
    ///
    /// Contact fields are only overwritten when the unit carries a contact.
    pub fn apply_unit(&mut self, client_name: &str, unit: &UnitDetail) {
        self.client_name = client_name.to_string();
        self.address = unit.address.clone();
        self.pin_code = unit.pin.clone();
        self.gst_no = unit.gst_no.clone();
        if !unit.contact_person_name.trim().is_empty() {
            self.contact_person_name = unit.contact_person_name.trim().to_string();
            self.contact_person_phone = unit.contact_person_phone.trim().to_string();
        }
    }
}

/// Sample block of a request form.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, uniffi::Record)]
#[serde(rename_all = "camelCase", default)]
pub struct SampleData {
    pub sample_name: String,
    pub sample_type: String,
    pub parameters: Vec<Parameter>,
}

/// A persisted feasibility request.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, uniffi::Record)]
#[serde(default)]
pub struct RequestRecord {
    /// Unique id, assigned at first save
    pub id: String,
    /// `DRAFT-…` while a draft, `REF-NNNN-YYYY` once published
    pub ref_no: String,
    pub status: RequestStatus,
    #[serde(rename = "clientDetails")]
    pub client_details: ClientDetails,
    #[serde(rename = "sampleData")]
    pub sample_data: SampleData,
    /// Creation timestamp (RFC 3339), never changed
    pub created_at: String,
    /// Last save timestamp (RFC 3339)
    pub updated_at: String,
}

impl RequestRecord {
    pub fn is_published(&self) -> bool {
        self.status == RequestStatus::Published
    }

    pub fn parameter(&self, parameter_id: &str) -> Option<&Parameter> {
        self.sample_data
            .parameters
            .iter()
            .find(|p| p.id == parameter_id)
    }

    /// Number of locked parameters.
    pub fn locked_count(&self) -> usize {
        self.sample_data
            .parameters
            .iter()
            .filter(|p| p.is_locked())
            .count()
    }

    /// Parameters with a feasibility decision that are not yet locked.
    pub fn pending_lock_count(&self) -> usize {
        self.sample_data
            .parameters
            .iter()
            .filter(|p| p.feasibility.is_decided() && !p.is_locked())
            .count()
    }

    /// Union of every parameter's requirements, first-seen order.
    pub fn aggregate_requirements(&self) -> Requirements {
        let mut total = Requirements::default();
        for param in &self.sample_data.parameters {
            total.merge(&param.requirements);
        }
        total
    }

    /// Parsed `updated_at`, if well-formed.
    pub fn updated_at_time(&self) -> Option<DateTime<Utc>> {
        parse_timestamp(&self.updated_at)
    }

    /// Dashboard row for this record.
    pub fn summary(&self) -> RequestSummary {
        RequestSummary {
            id: self.id.clone(),
            ref_no: self.ref_no.clone(),
            client_name: self.client_details.client_name.clone(),
            sample_name: self.sample_data.sample_name.clone(),
            sample_type: self.sample_data.sample_type.clone(),
            status: self.status,
            created_at: self.created_at.clone(),
            updated_at: self.updated_at.clone(),
            parameter_count: self.sample_data.parameters.len() as u32,
            locked_count: self.locked_count() as u32,
        }
    }
}

/// Flattened request for list views.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, uniffi::Record)]
#[serde(rename_all = "camelCase")]
pub struct RequestSummary {
    pub id: String,
    pub ref_no: String,
    pub client_name: String,
    pub sample_name: String,
    pub sample_type: String,
    pub status: RequestStatus,
    pub created_at: String,
    pub updated_at: String,
    pub parameter_count: u32,
    pub locked_count: u32,
}

/// Format a timestamp the way records store it.
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Placeholder reference for an unpublished request.
pub fn draft_reference(id: &str) -> String {
    let short: String = id
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .take(8)
        .collect();
    format!("DRAFT-{}", short.to_uppercase())
}

/// Published reference: four digits derived from the id, then the year.
pub fn published_reference(id: &str, year: i32) -> String {
    format!("REF-{:04}-{}", reference_digits(id), year)
}

/// Numeric ids keep their last four digits; anything else is folded into
/// the range 0..10000.
fn reference_digits(id: &str) -> u32 {
    let tail: Vec<char> = id.chars().rev().take(4).collect();
    if tail.len() == 4 && tail.iter().all(char::is_ascii_digit) {
        return tail
            .iter()
            .rev()
            .fold(0, |acc, c| acc * 10 + c.to_digit(10).unwrap_or(0));
    }
    id.bytes()
        .fold(0u32, |acc, b| (acc * 31 + u32::from(b)) % 10_000)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::parameter::RequirementKind;

    #[test]
    fn test_published_reference_format() {
        let id = "0b6f3c1e-4d2a-4f7b-9a51-7c2d9e8f1a23";
        let reference = published_reference(id, 2026);
        assert!(reference.starts_with("REF-"));
        assert!(reference.ends_with("-2026"));
        let digits = &reference[4..8];
        assert!(digits.chars().all(|c| c.is_ascii_digit()));
        assert_eq!(reference, published_reference(id, 2026));
    }

    #[test]
    fn test_numeric_id_keeps_last_four_digits() {
        assert_eq!(published_reference("1712345678901", 2025), "REF-8901-2025");
        assert_eq!(published_reference("0042", 2025), "REF-0042-2025");
    }

    #[test]
    fn test_draft_reference() {
        let reference = draft_reference("0b6f3c1e-4d2a-4f7b-9a51-7c2d9e8f1a23");
        assert_eq!(reference, "DRAFT-0B6F3C1E");
    }

    #[test]
    fn test_status_accepts_legacy_casing() {
        let status: RequestStatus = serde_json::from_str("\"published\"").unwrap();
        assert_eq!(status, RequestStatus::Published);
        let status: RequestStatus = serde_json::from_str("\"Draft\"").unwrap();
        assert_eq!(status, RequestStatus::Draft);
        assert_eq!(
            serde_json::to_string(&RequestStatus::Published).unwrap(),
            "\"Published\""
        );
    }

    #[test]
    fn test_aggregate_requirements_unions_in_order() {
        let mut record = RequestRecord::default();
        let mut a = Parameter::new();
        a.add_requirement(RequirementKind::Instrument, "ICP-MS").unwrap();
        a.add_requirement(RequirementKind::Chemical, "HNO3").unwrap();
        let mut b = Parameter::new();
        b.add_requirement(RequirementKind::Instrument, "HPLC").unwrap();
        b.add_requirement(RequirementKind::Instrument, "ICP-MS").unwrap();
        record.sample_data.parameters = vec![a, b];

        let total = record.aggregate_requirements();
        assert_eq!(total.instruments, vec!["ICP-MS", "HPLC"]);
        assert_eq!(total.chemicals, vec!["HNO3"]);
        assert!(total.columns.is_empty());
    }

    #[test]
    fn test_legacy_record_ignores_denormalized_fields() {
        let json = r#"{
            "id": "1712345678901",
            "ref_no": "REF-8901-2025",
            "client_name": "Acme",
            "sample_name": "Batch1",
            "sample_type": "Water",
            "status": "published",
            "clientDetails": {"clientName": "Acme", "address": "", "pinCode": "", "gstNo": "",
                              "contactPersonName": "", "contactPersonPhone": ""},
            "sampleData": {"sampleName": "Batch1", "sampleType": "Water", "parameters": []},
            "created_at": "2025-03-01T10:00:00.000Z",
            "updated_at": "2025-03-01T11:00:00.000Z"
        }"#;
        let record: RequestRecord = serde_json::from_str(json).unwrap();
        assert!(record.is_published());
        assert_eq!(record.summary().client_name, "Acme");
        assert!(record.updated_at_time().is_some());
    }

    #[test]
    fn test_apply_unit_keeps_contact_when_unit_has_none() {
        let mut details = ClientDetails {
            contact_person_name: "Alice".into(),
            contact_person_phone: "111".into(),
            ..ClientDetails::default()
        };
        let unit = UnitDetail {
            address: "Plot 4".into(),
            pin: "411001".into(),
            gst_no: "27AAAAA0000A1Z5".into(),
            ..UnitDetail::default()
        };
        details.apply_unit("Acme", &unit);
        assert_eq!(details.client_name, "Acme");
        assert_eq!(details.pin_code, "411001");
        assert_eq!(details.contact_person_name, "Alice");
    }
}
