//! Discovery integration tests against a DuckDB copy of the system catalog
//!
//! The fixture recreates the catalog tables the introspection queries read
//! (`SYSCAT.TABLES`, `SYSCAT.TABCONST`, `SYSCAT.KEYCOLUSE`,
//! `SYSCAT.COLIDENTATTRIBUTES`, `SYSIBM.SYSCOLUMNS`) and fills them with a
//! small two-schema database.

use pretty_assertions::assert_eq;
use serde_json::json;
use std::path::{Path, PathBuf};
use tap_sybase::config::DiscoveryConfig;
use tap_sybase::connection::{CollectedWarnings, Connection};
use tap_sybase::database::DuckDbConnection;
use tap_sybase::{Discoverer, Error, ReplicationMethod, TapConfig};
use tempfile::TempDir;

const CATALOG_TABLES: &str = r#"
CREATE SCHEMA SYSCAT;
CREATE SCHEMA SYSIBM;

CREATE TABLE SYSCAT.TABLES (TABSCHEMA VARCHAR, TABNAME VARCHAR, "TYPE" VARCHAR);
CREATE TABLE SYSCAT.TABCONST (TABSCHEMA VARCHAR, TABNAME VARCHAR, CONSTNAME VARCHAR, "TYPE" VARCHAR);
CREATE TABLE SYSCAT.KEYCOLUSE (TABSCHEMA VARCHAR, TABNAME VARCHAR, CONSTNAME VARCHAR, COLNAME VARCHAR, COLSEQ INTEGER);
CREATE TABLE SYSIBM.SYSCOLUMNS (
    TBCREATOR VARCHAR, TBNAME VARCHAR, "NAME" VARCHAR, COLTYPE VARCHAR,
    "NULLS" VARCHAR, "DEFAULT" VARCHAR, COLNO INTEGER
);
"#;

const IDENTITY_TABLE: &str = r#"
CREATE TABLE SYSCAT.COLIDENTATTRIBUTES (
    TABSCHEMA VARCHAR, TABNAME VARCHAR, COLNAME VARCHAR,
    "START" BIGINT, "INCREMENT" BIGINT, "MINVALUE" BIGINT, "MAXVALUE" BIGINT,
    "CYCLE" VARCHAR, "CACHE" INTEGER, "ORDER" VARCHAR
);
"#;

const CATALOG_ROWS: &str = r#"
INSERT INTO SYSCAT.TABLES VALUES
    ('SALES', 'ORDERS', 'T'),
    ('SALES', 'CUSTOMERS', 'T'),
    ('SALES', 'ORDER_TOTALS', 'V'),
    ('HR', 'EMPLOYEES', 'T'),
    ('SYSIBM', 'SYSCOLUMNS', 'T');

INSERT INTO SYSCAT.TABCONST VALUES
    ('SALES', 'ORDERS', 'PK_ORDERS', 'P'),
    ('SALES', 'ORDERS', 'FK_ORDERS_CUSTOMER', 'F'),
    ('HR', 'EMPLOYEES', 'PK_EMPLOYEES', 'P');

INSERT INTO SYSCAT.KEYCOLUSE VALUES
    ('SALES', 'ORDERS', 'PK_ORDERS', 'ORDER_ID', 1),
    ('SALES', 'ORDERS', 'FK_ORDERS_CUSTOMER', 'CUSTOMER_ID', 1),
    ('HR', 'EMPLOYEES', 'PK_EMPLOYEES', 'LAST_NAME', 2),
    ('HR', 'EMPLOYEES', 'PK_EMPLOYEES', 'EMP_NO', 1);

INSERT INTO SYSIBM.SYSCOLUMNS VALUES
    ('SALES', 'ORDERS', 'NOTES', 'long varchar', 'Y', NULL, 5),
    ('SALES', 'ORDERS', 'ORDER_ID', 'integer', 'N', NULL, 1),
    ('SALES', 'ORDERS', 'AMOUNT', 'decimal(10,2)', 'Y', NULL, 3),
    ('SALES', 'ORDERS', 'CUSTOMER_ID', 'integer', 'N', NULL, 2),
    ('SALES', 'ORDERS', 'CREATED_AT', 'timestamp', 'Y', 'current timestamp', 4),
    ('SALES', 'CUSTOMERS', 'CUSTOMER_ID', 'integer', 'N', NULL, 1),
    ('SALES', 'CUSTOMERS', 'NAME', 'varchar(100)', 'Y', NULL, 2),
    ('SALES', 'CUSTOMERS', 'ACTIVE', 'bit', 'N', '1', 3),
    ('SALES', 'ORDER_TOTALS', 'CUSTOMER_ID', 'integer', 'N', NULL, 1),
    ('SALES', 'ORDER_TOTALS', 'TOTAL', 'double', 'Y', NULL, 2),
    ('HR', 'EMPLOYEES', 'EMP_NO', 'integer', 'N', NULL, 1),
    ('HR', 'EMPLOYEES', 'LAST_NAME', 'varchar(40)', 'N', NULL, 2),
    ('HR', 'EMPLOYEES', 'HIRED', 'date', 'Y', NULL, 3),
    ('HR', 'EMPLOYEES', 'PHOTO', 'long binary', 'Y', NULL, 4),
    ('SYSIBM', 'SYSCOLUMNS', 'NAME', 'varchar(128)', 'N', NULL, 1);
"#;

const IDENTITY_ROWS: &str = r#"
INSERT INTO SYSCAT.COLIDENTATTRIBUTES VALUES
    ('SALES', 'ORDERS', 'ORDER_ID', 1, 1, NULL, 1000000, 'N', 20, 'Y');
"#;

/// Write a catalog snapshot file and return its path
fn write_snapshot(dir: &TempDir, with_identity: bool) -> PathBuf {
    let path = dir.path().join("catalog.duckdb");
    let conn = duckdb::Connection::open(&path).unwrap();
    conn.execute_batch(CATALOG_TABLES).unwrap();
    conn.execute_batch(CATALOG_ROWS).unwrap();
    if with_identity {
        conn.execute_batch(IDENTITY_TABLE).unwrap();
        conn.execute_batch(IDENTITY_ROWS).unwrap();
    }
    path
}

fn open_snapshot(path: &Path) -> DuckDbConnection {
    let conn = DuckDbConnection::open(path).unwrap();
    conn.check_connection().unwrap();
    conn
}

/// In-memory fixture, for tests that don't need a file
fn in_memory_catalog() -> DuckDbConnection {
    let conn = DuckDbConnection::open_in_memory().unwrap();
    for sql in [CATALOG_TABLES, IDENTITY_TABLE, CATALOG_ROWS, IDENTITY_ROWS] {
        conn.execute_batch(sql).unwrap();
    }
    conn
}

#[test]
fn test_discover_snapshot_file() {
    let dir = TempDir::new().unwrap();
    let path = write_snapshot(&dir, true);
    let conn = open_snapshot(&path);

    let catalog = Discoverer::new(DiscoveryConfig::default())
        .discover_catalog(&conn)
        .unwrap();

    // Schemas in name order, tables before views, system schemas skipped
    assert_eq!(
        catalog.stream_ids(),
        vec![
            "HR-EMPLOYEES",
            "SALES-CUSTOMERS",
            "SALES-ORDERS",
            "SALES-ORDER_TOTALS"
        ]
    );
}

#[test]
fn test_table_entry() {
    let conn = in_memory_catalog();
    let catalog = Discoverer::new(DiscoveryConfig::default())
        .discover_catalog(&conn)
        .unwrap();

    let orders = catalog.get("SALES-ORDERS").unwrap();
    assert_eq!(orders.stream, "SALES-ORDERS");
    assert_eq!(orders.table_name, "ORDERS");
    assert!(!orders.is_view);
    assert_eq!(orders.replication_method, ReplicationMethod::FullTable);

    // Only the primary key constraint counts, foreign keys are ignored
    assert_eq!(orders.key_properties, Some(vec!["ORDER_ID".to_string()]));

    // Field order follows COLNO, not insertion order
    assert_eq!(
        orders.schema.to_json(),
        json!({
            "type": "object",
            "properties": {
                "ORDER_ID": {"type": "integer"},
                "CUSTOMER_ID": {"type": "integer"},
                "AMOUNT": {"type": ["number", "null"]},
                "CREATED_AT": {"type": ["string", "null"], "format": "date-time"},
                "NOTES": {"type": ["string", "null"]}
            }
        })
    );

    assert_eq!(
        orders.property_metadata("ORDER_ID").unwrap()["inclusion"],
        json!("automatic")
    );
    assert_eq!(
        orders.property_metadata("AMOUNT").unwrap()["inclusion"],
        json!("available")
    );
}

#[test]
fn test_composite_key_in_key_order() {
    let conn = in_memory_catalog();
    let catalog = Discoverer::new(DiscoveryConfig::default())
        .discover_catalog(&conn)
        .unwrap();

    let employees = catalog.get("HR-EMPLOYEES").unwrap();
    assert_eq!(
        employees.key_properties,
        Some(vec!["EMP_NO".to_string(), "LAST_NAME".to_string()])
    );
    assert_eq!(
        employees.schema.to_json()["properties"]["PHOTO"],
        json!({"type": ["string", "null"], "contentEncoding": "base64"})
    );
}

#[test]
fn test_table_without_primary_key() {
    let conn = in_memory_catalog();
    let catalog = Discoverer::new(DiscoveryConfig::default())
        .discover_catalog(&conn)
        .unwrap();

    let customers = catalog.get("SALES-CUSTOMERS").unwrap();
    assert_eq!(customers.key_properties, None);
    assert_eq!(
        customers.stream_metadata().unwrap()["table-key-properties"],
        serde_json::Value::Null
    );
    assert_eq!(
        customers.schema.property_names(),
        vec!["CUSTOMER_ID", "NAME", "ACTIVE"]
    );
}

#[test]
fn test_view_entry() {
    let conn = in_memory_catalog();
    let catalog = Discoverer::new(DiscoveryConfig::default())
        .discover_catalog(&conn)
        .unwrap();

    let totals = catalog.get("SALES-ORDER_TOTALS").unwrap();
    assert!(totals.is_view);
    assert_eq!(totals.key_properties, None);

    let metadata = totals.stream_metadata().unwrap();
    assert_eq!(metadata["is-view"], json!(true));
    assert_eq!(metadata["schema-name"], json!("SALES"));
    assert_eq!(metadata["forced-replication-method"], json!("FULL_TABLE"));
}

#[test]
fn test_identity_column_attributes() {
    let conn = in_memory_catalog();
    let discoverer = Discoverer::new(DiscoveryConfig::default());

    let columns = discoverer.list_columns(&conn, "orders", "sales").unwrap();
    let names: Vec<&str> = columns.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(
        names,
        vec!["ORDER_ID", "CUSTOMER_ID", "AMOUNT", "CREATED_AT", "NOTES"]
    );

    let order_id = &columns[0];
    assert!(order_id.is_autoincrement);
    assert!(!order_id.nullable);
    let sequence = order_id.sequence.as_ref().unwrap();
    assert_eq!(sequence.name, "ORDER_ID");
    assert_eq!(sequence.start.as_deref(), Some("1"));
    assert_eq!(sequence.increment.as_deref(), Some("1"));
    assert_eq!(sequence.min_value, None);
    assert_eq!(sequence.max_value.as_deref(), Some("1000000"));
    assert!(sequence.no_min);
    assert!(!sequence.no_max);
    assert!(!sequence.cycle);
    assert_eq!(sequence.cache_size.as_deref(), Some("20"));
    assert!(sequence.ordered);

    let created_at = &columns[3];
    assert!(!created_at.is_autoincrement);
    assert!(created_at.sequence.is_none());
    assert_eq!(created_at.default_value.as_deref(), Some("current timestamp"));
}

#[test]
fn test_primary_key_lookup_is_scoped_to_schema() {
    let conn = in_memory_catalog();
    let discoverer = Discoverer::new(DiscoveryConfig::default());

    assert_eq!(
        discoverer
            .discover_primary_key(&conn, "employees", Some("hr"))
            .unwrap(),
        vec!["EMP_NO", "LAST_NAME"]
    );
    assert!(discoverer
        .discover_primary_key(&conn, "employees", Some("sales"))
        .unwrap()
        .is_empty());
    assert_eq!(
        discoverer
            .discover_primary_key(&conn, "orders", None)
            .unwrap(),
        vec!["ORDER_ID"]
    );
}

#[test]
fn test_primary_key_without_schema_picks_one_table() {
    let conn = in_memory_catalog();
    conn.execute_batch(
        r#"
        INSERT INTO SYSCAT.TABLES VALUES ('ARCHIVE', 'ORDERS', 'T');
        INSERT INTO SYSCAT.TABCONST VALUES ('ARCHIVE', 'ORDERS', 'PK_ARCHIVED_ORDERS', 'P');
        INSERT INTO SYSCAT.KEYCOLUSE VALUES
            ('ARCHIVE', 'ORDERS', 'PK_ARCHIVED_ORDERS', 'ORDER_CODE', 1);
        "#,
    )
    .unwrap();
    let discoverer = Discoverer::new(DiscoveryConfig::default());

    assert_eq!(
        discoverer
            .discover_primary_key(&conn, "orders", None)
            .unwrap(),
        vec!["ORDER_CODE"]
    );
    assert_eq!(
        discoverer
            .discover_primary_key(&conn, "orders", Some("sales"))
            .unwrap(),
        vec!["ORDER_ID"]
    );
    assert_eq!(
        discoverer
            .discover_primary_key(&conn, "orders", Some("archive"))
            .unwrap(),
        vec!["ORDER_CODE"]
    );
}

#[test]
fn test_system_prefix_is_matched_literally() {
    let conn = in_memory_catalog();
    conn.execute_batch(
        r#"
        INSERT INTO SYSCAT.TABLES VALUES ('S_INTERNAL', 'LOCKS', 'T');
        INSERT INTO SYSIBM.SYSCOLUMNS VALUES ('S_INTERNAL', 'LOCKS', 'ID', 'integer', 'N', NULL, 1);
        "#,
    )
    .unwrap();

    let mut config = DiscoveryConfig::default();
    config.system_schema_prefix = "S_".to_string();
    let catalog = Discoverer::new(config).discover_catalog(&conn).unwrap();

    // 'S_' must not act as a wildcard and hide SALES; SYSIBM is no longer excluded
    let ids = catalog.stream_ids();
    assert!(!ids.contains(&"S_INTERNAL-LOCKS"));
    assert!(ids.contains(&"SALES-ORDERS"));
    assert!(ids.contains(&"SYSIBM-SYSCOLUMNS"));
}

#[test]
fn test_config_settings_reach_discovery() {
    let conn = in_memory_catalog();
    let config = TapConfig::from_json(
        r#"{
            "user": "dba",
            "password": "sql",
            "host": "localhost",
            "filter_dbs": "hr",
            "use_date_datatype": true
        }"#,
    )
    .unwrap();

    let catalog = Discoverer::new(DiscoveryConfig::from(&config))
        .discover_catalog(&conn)
        .unwrap();

    assert_eq!(catalog.stream_ids(), vec!["HR-EMPLOYEES"]);
    assert_eq!(
        catalog.streams[0].schema.to_json()["properties"]["HIRED"],
        json!({"type": ["string", "null"], "format": "date"})
    );
}

#[test]
fn test_custom_delimiter() {
    let conn = in_memory_catalog();
    let config = DiscoveryConfig::default()
        .with_delimiter(".")
        .with_schema_filter(vec!["SALES".to_string()]);

    let catalog = Discoverer::new(config).discover_catalog(&conn).unwrap();
    assert_eq!(
        catalog.stream_ids(),
        vec!["SALES.CUSTOMERS", "SALES.ORDERS", "SALES.ORDER_TOTALS"]
    );
}

#[test]
fn test_missing_catalog_table_aborts_discovery() {
    let dir = TempDir::new().unwrap();
    let path = write_snapshot(&dir, false);
    let conn = open_snapshot(&path);

    let warnings = CollectedWarnings::new();
    let result = Discoverer::new(DiscoveryConfig::default())
        .with_warning_sink(warnings.clone())
        .discover_catalog(&conn);

    assert!(matches!(result, Err(Error::Query { .. })));
    assert!(warnings.is_empty());
}

#[test]
fn test_snapshot_is_read_only() {
    let dir = TempDir::new().unwrap();
    let path = write_snapshot(&dir, true);
    let conn = open_snapshot(&path);

    assert!(conn.execute("DELETE FROM SYSCAT.TABLES").is_err());
    assert_eq!(conn.execute("SELECT * FROM SYSCAT.TABLES").unwrap().len(), 5);
}
