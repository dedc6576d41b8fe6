//! Client master-data models.

use serde::{Deserialize, Serialize};

/// A client/unit row from the customer master table.
///
/// Many rows may share a `client_name`, one per business unit. Read-only
/// from this system's perspective.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, uniffi::Record)]
#[serde(rename_all = "camelCase")]
pub struct ClientRecord {
    /// Account code in the customer master
    pub client_code: String,
    /// Client display name (shared across units)
    pub client_name: String,
    /// Business unit label
    pub unit: Option<String>,
    pub address: Option<String>,
    pub pin: Option<String>,
    pub city: Option<String>,
    pub contact_person_name: Option<String>,
    pub contact_person_phone: Option<String>,
    pub contact_person_email: Option<String>,
    /// GST registration number
    pub gst_no: Option<String>,
}

impl ClientRecord {
    /// Create a record with only the required fields set.
    pub fn new(client_code: impl Into<String>, client_name: impl Into<String>) -> Self {
        Self {
            client_code: client_code.into(),
            client_name: client_name.into(),
            ..Self::default()
        }
    }

    /// Flatten the optional address/contact fields into a unit detail.
    pub fn unit_detail(&self) -> UnitDetail {
        UnitDetail {
            unit: self.unit.clone().unwrap_or_default(),
            address: self.address.clone().unwrap_or_default(),
            city: self.city.clone().unwrap_or_default(),
            pin: self.pin.clone().unwrap_or_default(),
            gst_no: self.gst_no.clone().unwrap_or_default(),
            contact_person_name: self.contact_person_name.clone().unwrap_or_default(),
            contact_person_phone: self.contact_person_phone.clone().unwrap_or_default(),
        }
    }
}

/// Address and contact details for one unit of a client.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, uniffi::Record)]
#[serde(rename_all = "camelCase")]
pub struct UnitDetail {
    pub unit: String,
    pub address: String,
    pub city: String,
    pub pin: String,
    pub gst_no: String,
    pub contact_person_name: String,
    pub contact_person_phone: String,
}

/// A client together with all of its units, in input order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, uniffi::Record)]
#[serde(rename_all = "camelCase")]
pub struct AggregatedClient {
    pub client_name: String,
    pub units: Vec<UnitDetail>,
}

/// An entry in the contact directory.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, uniffi::Record)]
pub struct Contact {
    pub name: String,
    pub phone: String,
}
