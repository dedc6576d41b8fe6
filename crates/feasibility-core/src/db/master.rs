//! Master-data seeding.
//!
//! Deployments without an upstream ERP database populate the lookup tables
//! from a JSON seed file:
//!
//! ```json
//! {
//!   "clients": [{"clientCode": "C001", "clientName": "Acme", "unit": "Plant 1"}],
//!   "values": {"regulations": ["FSSAI"], "sample-types": ["Water"]}
//! }
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::lookups::{lookup_source, LookupSource};
use super::{Database, DbResult};
use crate::models::{ClientRecord, LookupCategory};

/// Master data to load into an empty (or existing) database.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MasterDataSeed {
    pub clients: Vec<ClientRecord>,
    pub values: BTreeMap<LookupCategory, Vec<String>>,
}

impl MasterDataSeed {
    pub fn from_json(json: &str) -> DbResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> DbResult<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }
}

/// Row counts written by a seed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, uniffi::Record)]
pub struct SeedSummary {
    pub clients: u32,
    pub values: u32,
}

fn insert_value(conn: &Connection, category: LookupCategory, value: &str) -> DbResult<()> {
    let LookupSource {
        table,
        column,
        code_type,
    } = lookup_source(category);
    match code_type {
        Some(code) => conn.execute(
            &format!("INSERT INTO {table} (code_type, {column}) VALUES (?1, ?2)"),
            params![code, value],
        )?,
        None => conn.execute(
            &format!("INSERT INTO {table} ({column}) VALUES (?1)"),
            params![value],
        )?,
    };
    Ok(())
}

fn insert_client_row(conn: &Connection, client: &ClientRecord) -> DbResult<()> {
    conn.execute(
        r#"
        INSERT INTO customers (
            client_code, client_name, unit, address, pin, city,
            contact_person_name, contact_person_phone, contact_person_email, gst_no
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
        "#,
        params![
            client.client_code,
            client.client_name,
            client.unit,
            client.address,
            client.pin,
            client.city,
            client.contact_person_name,
            client.contact_person_phone,
            client.contact_person_email,
            client.gst_no,
        ],
    )?;
    Ok(())
}

impl Database {
    /// Insert a raw value into a lookup master table.
    pub fn insert_lookup_value(&self, category: LookupCategory, value: &str) -> DbResult<()> {
        insert_value(&self.conn, category, value)
    }

    /// Insert a client/unit row into the customer master.
    pub fn insert_client(&self, client: &ClientRecord) -> DbResult<()> {
        insert_client_row(&self.conn, client)
    }

    /// Apply a seed in a single transaction.
    pub fn seed_master_data(&mut self, seed: &MasterDataSeed) -> DbResult<SeedSummary> {
        let tx = self.transaction()?;
        let mut summary = SeedSummary::default();

        for client in &seed.clients {
            insert_client_row(&tx, client)?;
            summary.clients += 1;
        }
        for (category, values) in &seed.values {
            for value in values {
                insert_value(&tx, *category, value)?;
                summary.values += 1;
            }
        }
        tx.commit()?;

        info!(
            clients = summary.clients,
            values = summary.values,
            "Seeded master data"
        );
        Ok(summary)
    }
}
