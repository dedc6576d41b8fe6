//! Read-only lookups over the master-data tables.

use tracing::debug;

use super::{Database, DbResult};
use crate::models::{ClientRecord, LookupCategory};

/// Where a lookup category lives in the master tables.
pub(crate) struct LookupSource {
    pub table: &'static str,
    pub column: &'static str,
    /// Discriminator for rows in the shared `code_master` table
    pub code_type: Option<&'static str>,
}

pub(crate) fn lookup_source(category: LookupCategory) -> LookupSource {
    let named = |table| LookupSource {
        table,
        column: "name",
        code_type: None,
    };
    match category {
        LookupCategory::SampleTypes => LookupSource {
            table: "code_master",
            column: "code_desc",
            code_type: Some("SAMPLE_TYPE"),
        },
        LookupCategory::Labs => LookupSource {
            table: "code_master",
            column: "code_desc",
            code_type: Some("LAB"),
        },
        LookupCategory::Regulations => named("regulations"),
        LookupCategory::Methods => named("test_methods"),
        LookupCategory::Specifications => named("specifications"),
        LookupCategory::Instruments => named("instruments"),
        LookupCategory::Chemicals => named("chemicals"),
        LookupCategory::Columns => named("chromatography_columns"),
        LookupCategory::Standards => named("reference_standards"),
    }
}

/// Distinct, non-blank, non-placeholder values for a category.
fn lookup_query(category: LookupCategory) -> String {
    let LookupSource {
        table,
        column,
        code_type,
    } = lookup_source(category);
    let code_filter = code_type
        .map(|code| format!("code_type = '{code}' AND "))
        .unwrap_or_default();
    format!(
        "SELECT DISTINCT TRIM({column}) AS value FROM {table} \
         WHERE {code_filter}{column} IS NOT NULL AND TRIM({column}) NOT IN ('', '-') \
         ORDER BY value"
    )
}

impl Database {
    /// List the values of a string lookup.
    ///
    /// Fails as a whole on any SQLite error; no partial list is returned.
    pub fn list_lookup(&self, category: LookupCategory) -> DbResult<Vec<String>> {
        let mut stmt = self.conn.prepare(&lookup_query(category))?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
        let values = rows.collect::<Result<Vec<_>, _>>()?;

        debug!(
            category = category.slug(),
            count = values.len(),
            "Loaded lookup values"
        );
        Ok(values)
    }

    /// List the full client roster, one row per client unit.
    pub fn list_clients(&self) -> DbResult<Vec<ClientRecord>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT client_code, client_name, unit, address, pin, city,
                   contact_person_name, contact_person_phone, contact_person_email, gst_no
            FROM customers
            ORDER BY id
            "#,
        )?;

        let rows = stmt.query_map([], |row| {
            Ok(ClientRecord {
                client_code: row.get(0)?,
                client_name: row.get(1)?,
                unit: row.get(2)?,
                address: row.get(3)?,
                pin: row.get(4)?,
                city: row.get(5)?,
                contact_person_name: row.get(6)?,
                contact_person_phone: row.get(7)?,
                contact_person_email: row.get(8)?,
                gst_no: row.get(9)?,
            })
        })?;

        let clients = rows.collect::<Result<Vec<_>, _>>()?;
        debug!(count = clients.len(), "Loaded client roster");
        Ok(clients)
    }
}
