//! Lookup categories served from master data.

use serde::{Deserialize, Serialize};

/// A string-valued lookup list.
///
/// Clients are served separately as structured [`ClientRecord`](super::ClientRecord)s.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, uniffi::Enum,
)]
#[serde(rename_all = "kebab-case")]
pub enum LookupCategory {
    SampleTypes,
    Regulations,
    Methods,
    Specifications,
    Instruments,
    Labs,
    Chemicals,
    Columns,
    Standards,
}

impl LookupCategory {
    /// Every string category, in endpoint order.
    pub const ALL: [LookupCategory; 9] = [
        LookupCategory::SampleTypes,
        LookupCategory::Regulations,
        LookupCategory::Methods,
        LookupCategory::Specifications,
        LookupCategory::Instruments,
        LookupCategory::Labs,
        LookupCategory::Chemicals,
        LookupCategory::Columns,
        LookupCategory::Standards,
    ];

    /// URL path segment, also the key used in seed files.
    pub fn slug(self) -> &'static str {
        match self {
            LookupCategory::SampleTypes => "sample-types",
            LookupCategory::Regulations => "regulations",
            LookupCategory::Methods => "methods",
            LookupCategory::Specifications => "specifications",
            LookupCategory::Instruments => "instruments",
            LookupCategory::Labs => "labs",
            LookupCategory::Chemicals => "chemicals",
            LookupCategory::Columns => "columns",
            LookupCategory::Standards => "standards",
        }
    }

    /// Parse a path segment.
    pub fn from_slug(slug: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.slug() == slug)
    }

    /// Human-readable label for error messages.
    pub fn label(self) -> &'static str {
        match self {
            LookupCategory::SampleTypes => "sample types",
            LookupCategory::Regulations => "regulations",
            LookupCategory::Methods => "methods",
            LookupCategory::Specifications => "specifications",
            LookupCategory::Instruments => "instruments",
            LookupCategory::Labs => "labs",
            LookupCategory::Chemicals => "chemicals",
            LookupCategory::Columns => "columns",
            LookupCategory::Standards => "standards",
        }
    }
}
