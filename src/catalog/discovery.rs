//! Catalog discovery
//!
//! A single sequential pass: for every schema, tables then views; for every
//! object, its columns, its primary key (tables only) and the derived
//! schema. Only "view enumeration unsupported" is recovered from; any other
//! failure aborts the whole discovery.

use super::inspector::SystemCatalogInspector;
use super::queries::{columns_query, primary_key_query, ColumnRow, PrimaryKeyRow};
use super::types::{Catalog, CatalogEntry, ColumnDescriptor, ObjectDescriptor};
use crate::config::DiscoveryConfig;
use crate::connection::{Connection, SchemaInspector, TracingWarnings, WarningSink};
use crate::error::Result;
use crate::schema::{JsonSchema, TypeMapper};
use crate::types::ObjectKind;

/// Build the structural schema of an object.
///
/// Field order is column order; a field is nullable exactly when its
/// column is.
pub fn derive_structural_schema(
    columns: &[ColumnDescriptor],
    mapper: &dyn TypeMapper,
) -> JsonSchema {
    let mut schema = JsonSchema::new();
    for column in columns {
        let mut property = mapper.map_type(&column.declared_type);
        if column.nullable {
            property.make_nullable();
        }
        schema.add_property(&column.name, property);
    }
    schema
}

/// Discovers catalog entries from a Sybase system catalog
pub struct Discoverer {
    config: DiscoveryConfig,
    mapper: Box<dyn TypeMapper>,
    warnings: Box<dyn WarningSink>,
}

impl Discoverer {
    /// Create a discoverer using the config's default type mapper and
    /// logging warnings through `tracing`
    pub fn new(config: DiscoveryConfig) -> Self {
        let mapper = config.type_mapper();
        Self {
            config,
            mapper: Box::new(mapper),
            warnings: Box::new(TracingWarnings),
        }
    }

    /// Replace the type mapper
    #[must_use]
    pub fn with_type_mapper(mut self, mapper: impl TypeMapper + 'static) -> Self {
        self.mapper = Box::new(mapper);
        self
    }

    /// Replace the warning sink
    #[must_use]
    pub fn with_warning_sink(mut self, warnings: impl WarningSink + 'static) -> Self {
        self.warnings = Box::new(warnings);
        self
    }

    /// Discovery settings
    pub fn config(&self) -> &DiscoveryConfig {
        &self.config
    }

    /// Primary key columns of a table, in key order.
    ///
    /// An empty result means no primary key is known. Without a schema,
    /// the key of the first schema (by name) owning such a table is used.
    pub fn discover_primary_key(
        &self,
        conn: &dyn Connection,
        object_name: &str,
        schema_name: Option<&str>,
    ) -> Result<Vec<String>> {
        let query = primary_key_query(object_name, schema_name, &self.config.system_schema_prefix);
        tracing::debug!("Executing query: {}", query);

        let rows = conn
            .execute(&query)?
            .iter()
            .map(PrimaryKeyRow::from_row)
            .collect::<Result<Vec<_>>>()?;

        let Some(owner) = rows.first().map(|pk| pk.schema_name.clone()) else {
            return Ok(Vec::new());
        };
        if rows.iter().any(|pk| pk.schema_name != owner) {
            tracing::debug!(
                "Table {object_name} exists in several schemas; using the key from {owner}"
            );
        }

        Ok(rows
            .into_iter()
            .filter(|pk| pk.schema_name == owner)
            .map(|pk| pk.column_name)
            .collect())
    }

    /// Columns of a table or view, in the source's column order.
    ///
    /// Names are matched upper-cased, the way the catalog stores them.
    pub fn list_columns(
        &self,
        conn: &dyn Connection,
        object_name: &str,
        schema_name: &str,
    ) -> Result<Vec<ColumnDescriptor>> {
        let query = columns_query(object_name, schema_name);
        tracing::debug!("Executing query: {}", query);

        conn.execute(&query)?
            .iter()
            .map(|row| ColumnRow::from_row(row).map(ColumnRow::into_descriptor))
            .collect()
    }

    /// Structural schema using this discoverer's type mapper
    pub fn derive_structural_schema(&self, columns: &[ColumnDescriptor]) -> JsonSchema {
        derive_structural_schema(columns, self.mapper.as_ref())
    }

    /// Columns and primary key of one object
    pub fn describe_object(
        &self,
        conn: &dyn Connection,
        schema_name: &str,
        object_name: &str,
        kind: ObjectKind,
    ) -> Result<ObjectDescriptor> {
        let columns = self.list_columns(conn, object_name, schema_name)?;
        if columns.is_empty() {
            tracing::debug!("No columns found for {schema_name}.{object_name}");
        }

        let primary_key_columns = match kind {
            ObjectKind::Table => self.discover_primary_key(conn, object_name, Some(schema_name))?,
            ObjectKind::View => Vec::new(),
        };

        Ok(ObjectDescriptor {
            schema: schema_name.to_string(),
            name: object_name.to_string(),
            kind,
            columns,
            primary_key_columns,
        })
    }

    /// Discover every table and view, enumerating objects from the system catalog
    pub fn discover_catalog(&self, conn: &dyn Connection) -> Result<Catalog> {
        let inspector = SystemCatalogInspector::new(conn, self.config.system_schema_prefix.clone());
        self.discover_catalog_with(conn, &inspector)
    }

    /// Discover every table and view the inspector reports
    pub fn discover_catalog_with(
        &self,
        conn: &dyn Connection,
        inspector: &dyn SchemaInspector,
    ) -> Result<Catalog> {
        let mut catalog = Catalog::default();

        for schema_name in inspector.list_schemas()? {
            if !self.config.includes_schema(&schema_name) {
                tracing::debug!("Skipping schema {schema_name} (not in filter)");
                continue;
            }

            let tables = inspector.list_tables(&schema_name)?;
            let views = match inspector.list_views(&schema_name) {
                Ok(views) => views,
                Err(e) if e.is_unsupported() => {
                    self.warnings.emit_warning(&format!(
                        "View detection is not supported for schema '{schema_name}'; \
                         only tables will be discovered ({e})"
                    ));
                    Vec::new()
                }
                Err(e) => return Err(e),
            };

            tracing::info!(
                "Discovering schema {schema_name}: {} tables, {} views",
                tables.len(),
                views.len()
            );

            let objects = tables
                .into_iter()
                .map(|t| (t, ObjectKind::Table))
                .chain(views.into_iter().map(|v| (v, ObjectKind::View)));

            for (object_name, kind) in objects {
                let object = self.describe_object(conn, &schema_name, &object_name, kind)?;
                let schema = self.derive_structural_schema(&object.columns);
                catalog
                    .streams
                    .push(CatalogEntry::from_descriptor(&object, schema, &self.config));
            }
        }

        tracing::info!("Discovered {} streams", catalog.len());
        Ok(catalog)
    }
}
