//! Schema/table/view enumeration over the system catalog

use super::queries::{objects_query, schemas_query, NameRow};
use crate::connection::{Connection, SchemaInspector};
use crate::error::Result;
use crate::types::ObjectKind;

/// [`SchemaInspector`] that reads `SYSCAT.TABLES` through a [`Connection`]
pub struct SystemCatalogInspector<'a> {
    conn: &'a dyn Connection,
    system_prefix: String,
}

impl<'a> SystemCatalogInspector<'a> {
    /// Create an inspector; schemas starting with `system_prefix` are skipped
    pub fn new(conn: &'a dyn Connection, system_prefix: impl Into<String>) -> Self {
        Self {
            conn,
            system_prefix: system_prefix.into(),
        }
    }

    fn names(&self, query: &str) -> Result<Vec<String>> {
        tracing::debug!("Executing query: {}", query);
        self.conn
            .execute(query)?
            .iter()
            .map(|row| NameRow::from_row(row).map(|r| r.name))
            .collect()
    }
}

impl SchemaInspector for SystemCatalogInspector<'_> {
    fn list_schemas(&self) -> Result<Vec<String>> {
        self.names(&schemas_query(&self.system_prefix))
    }

    fn list_tables(&self, schema: &str) -> Result<Vec<String>> {
        self.names(&objects_query(schema, ObjectKind::Table))
    }

    fn list_views(&self, schema: &str) -> Result<Vec<String>> {
        self.names(&objects_query(schema, ObjectKind::View))
    }
}
