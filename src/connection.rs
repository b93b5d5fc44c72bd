//! Connection seam between discovery and a database driver
//!
//! Discovery never opens or closes connections. It borrows something that
//! implements [`Connection`] for the duration of one call, asks a
//! [`SchemaInspector`] which objects exist, and reports recoverable problems
//! to a [`WarningSink`].

use crate::error::{Error, Result};
use indexmap::IndexMap;
use serde_json::Value;
use std::cell::RefCell;
use std::rc::Rc;

// ============================================================================
// Rows
// ============================================================================

/// One result row, addressable by column name.
///
/// Column names are stored lower-cased, so lookups ignore case; drivers
/// disagree on whether aliases come back upper- or lower-case.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    values: IndexMap<String, Value>,
}

impl Row {
    /// Create an empty row
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a column value
    pub fn insert(&mut self, name: impl Into<String>, value: Value) {
        self.values.insert(name.into().to_lowercase(), value);
    }

    /// Builder-style [`Row::insert`]
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, value.into());
        self
    }

    /// Look up a column (case-insensitive)
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(&name.to_lowercase())
    }

    /// Look up a column that the query is expected to return
    pub fn require(&self, name: &str, query: &str) -> Result<&Value> {
        self.get(name)
            .ok_or_else(|| Error::missing_column(name, query))
    }

    /// Columns in result order
    pub fn columns(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of columns
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the row has no columns
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for Row {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        let mut row = Row::new();
        for (name, value) in iter {
            row.insert(name, value);
        }
        row
    }
}

/// String form of a scalar result value; SQL `NULL` has none
pub fn canonical_string(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        other => Some(other.to_string()),
    }
}

/// Interpret a canonical string as a flag (`Y`, `true`, `1`, ...)
pub fn parse_flag(value: Option<&str>) -> bool {
    matches!(
        value.map(|v| v.trim().to_ascii_lowercase()).as_deref(),
        Some("y" | "yes" | "true" | "t" | "1")
    )
}

// ============================================================================
// Collaborator traits
// ============================================================================

/// Executes introspection queries
pub trait Connection {
    /// Run a query and return all rows in result order
    fn execute(&self, query: &str) -> Result<Vec<Row>>;
}

impl<C: Connection + ?Sized> Connection for &C {
    fn execute(&self, query: &str) -> Result<Vec<Row>> {
        (**self).execute(query)
    }
}

/// Enumerates the objects of a database
pub trait SchemaInspector {
    /// All schema names
    fn list_schemas(&self) -> Result<Vec<String>>;

    /// Table names of a schema, in discovery order
    fn list_tables(&self, schema: &str) -> Result<Vec<String>>;

    /// View names of a schema; may fail with [`Error::Unsupported`]
    fn list_views(&self, schema: &str) -> Result<Vec<String>>;
}

/// Receives non-fatal discovery warnings
pub trait WarningSink {
    /// Report a warning
    fn emit_warning(&self, message: &str);
}

/// Logs warnings through `tracing`
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingWarnings;

impl WarningSink for TracingWarnings {
    fn emit_warning(&self, message: &str) {
        tracing::warn!("{message}");
    }
}

/// Keeps warnings in memory. Clones share the same list.
#[derive(Debug, Clone, Default)]
pub struct CollectedWarnings {
    messages: Rc<RefCell<Vec<String>>>,
}

impl CollectedWarnings {
    /// Create an empty collector
    pub fn new() -> Self {
        Self::default()
    }

    /// Warnings received so far
    pub fn messages(&self) -> Vec<String> {
        self.messages.borrow().clone()
    }

    /// Number of warnings received so far
    pub fn len(&self) -> usize {
        self.messages.borrow().len()
    }

    /// Whether no warning was received
    pub fn is_empty(&self) -> bool {
        self.messages.borrow().is_empty()
    }
}

impl WarningSink for CollectedWarnings {
    fn emit_warning(&self, message: &str) {
        tracing::warn!("{message}");
        self.messages.borrow_mut().push(message.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_row_lookup_ignores_case() {
        let row = Row::new().with("COLUMN_NAME", "ORDER_ID").with("pk_name", "PK1");
        assert_eq!(row.get("column_name"), Some(&json!("ORDER_ID")));
        assert_eq!(row.get("PK_NAME"), Some(&json!("PK1")));
        assert_eq!(row.len(), 2);
    }

    #[test]
    fn test_row_require_reports_missing_column() {
        let row = Row::new().with("name", "ID");
        assert!(row.require("name", "columns").is_ok());

        let err = row.require("type_name", "columns").unwrap_err();
        assert!(matches!(
            err,
            Error::MissingColumn { column, query } if column == "type_name" && query == "columns"
        ));
    }

    #[test]
    fn test_row_from_iter_keeps_order() {
        let row: Row = vec![("b", json!(1)), ("a", json!(2))].into_iter().collect();
        let names: Vec<&str> = row.columns().map(|(k, _)| k).collect();
        assert_eq!(names, vec!["b", "a"]);
    }

    #[test]
    fn test_canonical_string() {
        assert_eq!(canonical_string(&Value::Null), None);
        assert_eq!(canonical_string(&json!("x")), Some("x".to_string()));
        assert_eq!(canonical_string(&json!(true)), Some("true".to_string()));
        assert_eq!(canonical_string(&json!(42)), Some("42".to_string()));
        assert_eq!(canonical_string(&json!(1.5)), Some("1.5".to_string()));
    }

    #[test]
    fn test_parse_flag() {
        assert!(parse_flag(Some("Y")));
        assert!(parse_flag(Some("true")));
        assert!(parse_flag(Some(" 1 ")));
        assert!(!parse_flag(Some("N")));
        assert!(!parse_flag(Some("false")));
        assert!(!parse_flag(None));
    }

    #[test]
    fn test_collected_warnings_share_state() {
        let warnings = CollectedWarnings::new();
        let handle = warnings.clone();
        warnings.emit_warning("views unsupported");

        assert_eq!(handle.len(), 1);
        assert_eq!(handle.messages(), vec!["views unsupported".to_string()]);
    }
}
