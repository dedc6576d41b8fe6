//! Client aggregation.
//!
//! Turns the flat customer master (one row per client unit) into a roster
//! keyed by client name, and derives the contact directory used by the
//! contact picker. Pure and deterministic: the same input always yields the
//! same roster.

use std::collections::BTreeMap;

use crate::models::{AggregatedClient, ClientRecord, Contact, UnitDetail};

/// Placeholder the master data uses for "no contact".
const CONTACT_PLACEHOLDER: &str = "-";

/// Client name to its units, in input order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClientRoster {
    clients: BTreeMap<String, Vec<UnitDetail>>,
}

impl ClientRoster {
    /// Group records by trimmed client name, skipping blank names.
    ///
    /// Units of the same client are kept as-is, duplicates included.
    pub fn from_records(records: &[ClientRecord]) -> Self {
        let mut clients: BTreeMap<String, Vec<UnitDetail>> = BTreeMap::new();
        for record in records {
            let name = record.client_name.trim();
            if name.is_empty() {
                continue;
            }
            clients
                .entry(name.to_string())
                .or_default()
                .push(record.unit_detail());
        }
        Self { clients }
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }

    /// Client names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.clients.keys().map(String::as_str)
    }

    pub fn units(&self, client_name: &str) -> Option<&[UnitDetail]> {
        self.clients.get(client_name.trim()).map(Vec::as_slice)
    }

    /// Deduplicated contacts across every unit of every client, sorted by name.
    pub fn contact_directory(&self) -> Vec<Contact> {
        collect_contacts(self.clients.values().flatten())
    }

    /// Contact options for a single client.
    pub fn contacts_for(&self, client_name: &str) -> Vec<Contact> {
        self.units(client_name)
            .map(|units| collect_contacts(units.iter()))
            .unwrap_or_default()
    }

    /// Flatten into FFI-friendly records.
    pub fn to_aggregated(&self) -> Vec<AggregatedClient> {
        self.clients
            .iter()
            .map(|(name, units)| AggregatedClient {
                client_name: name.clone(),
                units: units.clone(),
            })
            .collect()
    }
}

/// Key by trimmed name. The first phone wins unless it was empty and a later
/// duplicate has one.
fn collect_contacts<'a>(units: impl Iterator<Item = &'a UnitDetail>) -> Vec<Contact> {
    let mut by_name: BTreeMap<String, String> = BTreeMap::new();
    for unit in units {
        let name = unit.contact_person_name.trim();
        if name.is_empty() || name == CONTACT_PLACEHOLDER {
            continue;
        }
        let phone = unit.contact_person_phone.trim();
        match by_name.get_mut(name) {
            Some(existing) if existing.is_empty() && !phone.is_empty() => {
                *existing = phone.to_string();
            }
            Some(_) => {}
            None => {
                by_name.insert(name.to_string(), phone.to_string());
            }
        }
    }
    by_name
        .into_iter()
        .map(|(name, phone)| Contact { name, phone })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit(client: &str, unit: &str, contact: &str, phone: &str) -> ClientRecord {
        ClientRecord {
            client_code: format!("{client}-{unit}"),
            client_name: client.into(),
            unit: Some(unit.into()),
            contact_person_name: Some(contact.into()),
            contact_person_phone: Some(phone.into()),
            ..ClientRecord::default()
        }
    }

    #[test]
    fn test_units_grouped_by_client() {
        let roster = ClientRoster::from_records(&[
            unit("Acme", "Plant 1", "Bob", "555"),
            unit("Acme", "Plant 2", "Carol", "777"),
        ]);

        assert_eq!(roster.len(), 1);
        let units = roster.units("Acme").unwrap();
        assert_eq!(units.len(), 2);
        assert_eq!(units[0].unit, "Plant 1");
        assert_eq!(units[1].unit, "Plant 2");
    }

    #[test]
    fn test_blank_names_skipped_and_duplicates_kept() {
        let roster = ClientRoster::from_records(&[
            unit("   ", "Plant 1", "Bob", "555"),
            unit(" Acme ", "Plant 1", "Bob", "555"),
            unit("Acme", "Plant 1", "Bob", "555"),
        ]);

        assert_eq!(roster.names().collect::<Vec<_>>(), vec!["Acme"]);
        assert_eq!(roster.units("Acme").unwrap().len(), 2);
    }

    #[test]
    fn test_contacts_collapse_on_trimmed_name() {
        let roster = ClientRoster::from_records(&[
            unit("Acme", "Plant 1", " Bob ", ""),
            unit("Acme", "Plant 2", "Bob", "555"),
        ]);

        assert_eq!(
            roster.contact_directory(),
            vec![Contact {
                name: "Bob".into(),
                phone: "555".into()
            }]
        );
    }

    #[test]
    fn test_first_phone_wins_when_present() {
        let roster = ClientRoster::from_records(&[
            unit("Acme", "Plant 1", "Bob", "111"),
            unit("Beta", "HQ", "Bob", "222"),
        ]);

        assert_eq!(roster.contact_directory()[0].phone, "111");
    }

    #[test]
    fn test_placeholder_contacts_skipped_and_sorted() {
        let roster = ClientRoster::from_records(&[
            unit("Acme", "Plant 1", "Zoe", "1"),
            unit("Acme", "Plant 2", "-", "2"),
            unit("Beta", "HQ", "  ", "3"),
            unit("Beta", "Lab", "Amit", "4"),
        ]);

        let names: Vec<String> = roster
            .contact_directory()
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, vec!["Amit", "Zoe"]);
    }

    #[test]
    fn test_contacts_for_single_client() {
        let roster = ClientRoster::from_records(&[
            unit("Acme", "Plant 1", "Bob", "555"),
            unit("Beta", "HQ", "Carol", "777"),
        ]);

        let contacts = roster.contacts_for("Beta");
        assert_eq!(contacts.len(), 1);
        assert_eq!(contacts[0].name, "Carol");
        assert!(roster.contacts_for("Gamma").is_empty());
    }

    #[test]
    fn test_aggregation_is_idempotent() {
        let records = [
            unit("Acme", "Plant 1", "Bob", "555"),
            unit("Beta", "HQ", "Carol", "777"),
        ];
        assert_eq!(
            ClientRoster::from_records(&records),
            ClientRoster::from_records(&records)
        );
    }
}
