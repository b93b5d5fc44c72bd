//! System catalog introspection queries
//!
//! SQL text for every query discovery issues, and one fixed-shape record
//! per query. Rows are checked against the expected column set as soon as
//! they come back; a missing column fails the whole discovery.

use super::types::{ColumnDescriptor, SequenceInfo};
use crate::connection::{canonical_string, parse_flag, Row};
use crate::error::{Error, Result};
use crate::types::ObjectKind;
use std::collections::BTreeMap;

/// Label of the primary key query in errors and logs
pub const PRIMARY_KEY_QUERY: &str = "primary key lookup";

/// Label of the column query in errors and logs
pub const COLUMNS_QUERY: &str = "column lookup";

/// Label of the schema/table/view enumeration queries
pub const OBJECTS_QUERY: &str = "object enumeration";

/// Prefix of result columns folded into [`SequenceInfo`]
pub const SEQUENCE_PREFIX: &str = "sequence_";

/// `sequence_*` columns selected by [`columns_query`], without the prefix
pub const SEQUENCE_COLUMNS: [&str; 10] = [
    "name",
    "start",
    "increment",
    "minvalue",
    "maxvalue",
    "nominvalue",
    "nomaxvalue",
    "cycle",
    "cache",
    "order",
];

/// Quote a string as a SQL literal
pub fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// `NOT LIKE` condition excluding names that start with `prefix`.
///
/// Wildcards in the prefix match literally.
pub fn not_like_prefix(column: &str, prefix: &str) -> String {
    let escaped = prefix
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!(
        "{column} NOT LIKE {} ESCAPE '\\'",
        quote_literal(&format!("{escaped}%"))
    )
}

/// Schemas owning at least one table or view, system schemas excluded
pub fn schemas_query(system_prefix: &str) -> String {
    format!(
        "SELECT DISTINCT TABSCHEMA AS name
FROM SYSCAT.TABLES
WHERE {}
ORDER BY name",
        not_like_prefix("TABSCHEMA", system_prefix)
    )
}

/// Tables or views of one schema
pub fn objects_query(schema_name: &str, kind: ObjectKind) -> String {
    let type_code = match kind {
        ObjectKind::Table => "T",
        ObjectKind::View => "V",
    };
    format!(
        "SELECT TABNAME AS name
FROM SYSCAT.TABLES
WHERE TABSCHEMA = {}
    AND \"TYPE\" = '{type_code}'
ORDER BY TABNAME",
        quote_literal(schema_name)
    )
}

/// Primary key columns of one table, in key order.
///
/// Without a schema, rows of same-named tables come grouped by schema.
pub fn primary_key_query(
    object_name: &str,
    schema_name: Option<&str>,
    system_prefix: &str,
) -> String {
    let schema_filter = schema_name
        .map(|s| format!("\n    AND tab.TABSCHEMA = {}", quote_literal(&s.to_uppercase())))
        .unwrap_or_default();

    format!(
        "SELECT
    tab.TABSCHEMA AS schema_name,
    con.CONSTNAME AS pk_name,
    kcu.COLNAME AS column_name
FROM SYSCAT.TABLES tab
INNER JOIN SYSCAT.TABCONST con
    ON con.TABSCHEMA = tab.TABSCHEMA
    AND con.TABNAME = tab.TABNAME
    AND con.\"TYPE\" = 'P'
INNER JOIN SYSCAT.KEYCOLUSE kcu
    ON kcu.TABSCHEMA = con.TABSCHEMA
    AND kcu.TABNAME = con.TABNAME
    AND kcu.CONSTNAME = con.CONSTNAME
WHERE tab.\"TYPE\" = 'T'
    AND {prefix}
    AND tab.TABNAME = {name}{schema_filter}
ORDER BY tab.TABSCHEMA, kcu.COLSEQ",
        prefix = not_like_prefix("tab.TABSCHEMA", system_prefix),
        name = quote_literal(&object_name.to_uppercase()),
    )
}

/// Columns of one object with their identity attributes, in column order
pub fn columns_query(object_name: &str, schema_name: &str) -> String {
    format!(
        "SELECT
    s.\"NAME\" AS name,
    s.\"COLTYPE\" AS type_name,
    s.\"NULLS\" AS nullable,
    CAST(s.\"DEFAULT\" AS VARCHAR(254)) AS default_value,
    CASE WHEN c.COLNAME IS NOT NULL THEN 'Y' ELSE 'N' END AS autoincrement,
    c.COLNAME AS sequence_name,
    c.\"START\" AS sequence_start,
    c.\"INCREMENT\" AS sequence_increment,
    c.\"MINVALUE\" AS sequence_minvalue,
    c.\"MAXVALUE\" AS sequence_maxvalue,
    CASE WHEN c.COLNAME IS NOT NULL AND c.\"MINVALUE\" IS NULL THEN 'Y' ELSE 'N' END AS sequence_nominvalue,
    CASE WHEN c.COLNAME IS NOT NULL AND c.\"MAXVALUE\" IS NULL THEN 'Y' ELSE 'N' END AS sequence_nomaxvalue,
    c.\"CYCLE\" AS sequence_cycle,
    c.\"CACHE\" AS sequence_cache,
    c.\"ORDER\" AS sequence_order
FROM SYSIBM.SYSCOLUMNS s
INNER JOIN SYSCAT.TABLES t
    ON t.TABNAME = s.TBNAME
    AND t.TABSCHEMA = s.TBCREATOR
LEFT JOIN SYSCAT.COLIDENTATTRIBUTES c
    ON c.TABSCHEMA = s.TBCREATOR
    AND c.TABNAME = s.TBNAME
    AND c.COLNAME = s.\"NAME\"
WHERE s.TBNAME = {name}
    AND t.TABSCHEMA = {schema}
ORDER BY s.COLNO",
        name = quote_literal(&object_name.to_uppercase()),
        schema = quote_literal(&schema_name.to_uppercase()),
    )
}

/// Canonical string of a required, non-null column
fn required_string(row: &Row, column: &str, query: &str) -> Result<String> {
    canonical_string(row.require(column, query)?)
        .ok_or_else(|| Error::query(query, format!("column '{column}' is NULL")))
}

/// Canonical string of a required, nullable column
fn optional_string(row: &Row, column: &str, query: &str) -> Result<Option<String>> {
    Ok(canonical_string(row.require(column, query)?))
}

// ============================================================================
// Row records
// ============================================================================

/// Row of [`schemas_query`] / [`objects_query`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameRow {
    pub name: String,
}

impl NameRow {
    pub fn from_row(row: &Row) -> Result<Self> {
        Ok(Self {
            name: required_string(row, "name", OBJECTS_QUERY)?,
        })
    }
}

/// Row of [`primary_key_query`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrimaryKeyRow {
    pub schema_name: String,
    pub pk_name: Option<String>,
    pub column_name: String,
}

impl PrimaryKeyRow {
    pub fn from_row(row: &Row) -> Result<Self> {
        Ok(Self {
            schema_name: required_string(row, "schema_name", PRIMARY_KEY_QUERY)?,
            pk_name: optional_string(row, "pk_name", PRIMARY_KEY_QUERY)?,
            column_name: required_string(row, "column_name", PRIMARY_KEY_QUERY)?,
        })
    }
}

/// Row of [`columns_query`], every value in canonical string form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnRow {
    pub name: String,
    pub type_name: String,
    pub nullable: Option<String>,
    pub default_value: Option<String>,
    pub autoincrement: Option<String>,
    /// `sequence_*` columns keyed by the name after the prefix
    pub sequence: BTreeMap<String, Option<String>>,
}

impl ColumnRow {
    pub fn from_row(row: &Row) -> Result<Self> {
        let name = required_string(row, "name", COLUMNS_QUERY)?;
        let type_name = required_string(row, "type_name", COLUMNS_QUERY)?;
        let nullable = optional_string(row, "nullable", COLUMNS_QUERY)?;
        let default_value = optional_string(row, "default_value", COLUMNS_QUERY)?;
        let autoincrement = optional_string(row, "autoincrement", COLUMNS_QUERY)?;

        let sequence = SEQUENCE_COLUMNS
            .iter()
            .map(|key| {
                let column = format!("{SEQUENCE_PREFIX}{key}");
                optional_string(row, &column, COLUMNS_QUERY).map(|v| ((*key).to_string(), v))
            })
            .collect::<Result<BTreeMap<_, _>>>()?;

        Ok(Self {
            name,
            type_name,
            nullable,
            default_value,
            autoincrement,
            sequence,
        })
    }

    /// Sequence attributes, present only when a generator backs the column
    fn sequence_info(&self) -> Option<SequenceInfo> {
        let field = |key: &str| self.sequence.get(key).cloned().flatten();
        let flag = |key: &str| parse_flag(self.sequence.get(key).and_then(Option::as_deref));

        Some(SequenceInfo {
            name: field("name")?,
            start: field("start"),
            increment: field("increment"),
            min_value: field("minvalue"),
            max_value: field("maxvalue"),
            no_min: flag("nominvalue"),
            no_max: flag("nomaxvalue"),
            cycle: flag("cycle"),
            cache_size: field("cache"),
            ordered: flag("order"),
        })
    }

    /// Convert into a column descriptor
    pub fn into_descriptor(self) -> ColumnDescriptor {
        let sequence = self.sequence_info();
        ColumnDescriptor {
            nullable: parse_flag(self.nullable.as_deref()),
            is_autoincrement: parse_flag(self.autoincrement.as_deref()),
            sequence,
            name: self.name,
            declared_type: self.type_name,
            default_value: self.default_value,
        }
    }
}
