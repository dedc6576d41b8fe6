//! SQLite schema definition.

/// Complete database schema for feasibility intake.
pub const SCHEMA: &str = r#"
-- ============================================================================
-- Customer Master
-- ============================================================================

CREATE TABLE IF NOT EXISTS customers (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    client_code TEXT NOT NULL,
    client_name TEXT NOT NULL,
    unit TEXT,
    address TEXT,
    city TEXT,
    pin TEXT,
    contact_person_name TEXT,
    contact_person_phone TEXT,
    contact_person_email TEXT,
    gst_no TEXT
);

CREATE INDEX IF NOT EXISTS idx_customers_name ON customers(client_name);

-- ============================================================================
-- Lookup Masters
-- ============================================================================

-- Shared code table: SAMPLE_TYPE, LAB
CREATE TABLE IF NOT EXISTS code_master (
    code_type TEXT NOT NULL,
    code_desc TEXT
);

CREATE INDEX IF NOT EXISTS idx_code_master_type ON code_master(code_type);

CREATE TABLE IF NOT EXISTS regulations (
    name TEXT
);

CREATE TABLE IF NOT EXISTS test_methods (
    name TEXT
);

CREATE TABLE IF NOT EXISTS specifications (
    name TEXT
);

CREATE TABLE IF NOT EXISTS instruments (
    name TEXT
);

CREATE TABLE IF NOT EXISTS chemicals (
    name TEXT
);

CREATE TABLE IF NOT EXISTS chromatography_columns (
    name TEXT
);

CREATE TABLE IF NOT EXISTS reference_standards (
    name TEXT
);

-- ============================================================================
-- Local Storage (single-key collections, e.g. the request list)
-- ============================================================================

CREATE TABLE IF NOT EXISTS local_storage (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL,
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);
"#;
