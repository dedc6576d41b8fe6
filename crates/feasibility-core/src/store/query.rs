//! Dashboard views over the stored records.
//!
//! These are derived on every call; nothing here is persisted.

use serde::{Deserialize, Serialize};

use super::{FormStore, KeyValueStorage};
use crate::models::{RequestRecord, RequestStatus, RequestSummary};

/// Search and status filter for the request list.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, uniffi::Record)]
pub struct RecordQuery {
    /// Case-insensitive substring of ref no, client name or sample name
    pub search: Option<String>,
    /// `None` matches every status
    pub status: Option<RequestStatus>,
}

impl RecordQuery {
    pub fn matches(&self, record: &RequestRecord) -> bool {
        if let Some(status) = self.status {
            if record.status != status {
                return false;
            }
        }

        let needle = match self.search.as_deref().map(str::trim) {
            Some(s) if !s.is_empty() => s.to_lowercase(),
            _ => return true,
        };
        [
            &record.ref_no,
            &record.client_details.client_name,
            &record.sample_data.sample_name,
        ]
        .iter()
        .any(|field| field.to_lowercase().contains(&needle))
    }
}

/// Request counts by status.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, uniffi::Record)]
pub struct DashboardStats {
    pub total: u32,
    pub draft: u32,
    pub published: u32,
}

impl DashboardStats {
    pub fn from_records(records: &[RequestRecord]) -> Self {
        records
            .iter()
            .fold(DashboardStats::default(), |mut stats, record| {
                stats.total += 1;
                match record.status {
                    RequestStatus::Draft => stats.draft += 1,
                    RequestStatus::Published => stats.published += 1,
                }
                stats
            })
    }
}

impl<S: KeyValueStorage> FormStore<S> {
    /// Dashboard rows for every record, most recently updated first.
    pub fn summaries(&self) -> Vec<RequestSummary> {
        self.list().iter().map(RequestRecord::summary).collect()
    }

    /// Summaries of matching records, most recently updated first.
    pub fn search(&self, query: &RecordQuery) -> Vec<RequestSummary> {
        self.list()
            .iter()
            .filter(|record| query.matches(record))
            .map(RequestRecord::summary)
            .collect()
    }

    pub fn stats(&self) -> DashboardStats {
        DashboardStats::from_records(&self.load())
    }
}
