//! Catalog types

use crate::config::DiscoveryConfig;
use crate::schema::JsonSchema;
use crate::types::{JsonObject, ObjectKind, ReplicationMethod};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

// ============================================================================
// Column / Object Descriptors
// ============================================================================

/// Identity/sequence generator backing a column
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequenceInfo {
    pub name: String,
    pub start: Option<String>,
    pub increment: Option<String>,
    pub min_value: Option<String>,
    pub max_value: Option<String>,
    pub no_min: bool,
    pub no_max: bool,
    pub cycle: bool,
    pub cache_size: Option<String>,
    pub ordered: bool,
}

/// A column as reported by the system catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    /// Column name, unique within its object
    pub name: String,
    /// Source type name, e.g. `varchar(40)`
    pub declared_type: String,
    pub nullable: bool,
    /// Raw default expression
    pub default_value: Option<String>,
    pub is_autoincrement: bool,
    /// Present only for identity/sequence-backed columns
    pub sequence: Option<SequenceInfo>,
}

impl ColumnDescriptor {
    /// Plain column without default or generator
    pub fn new(name: impl Into<String>, declared_type: impl Into<String>, nullable: bool) -> Self {
        Self {
            name: name.into(),
            declared_type: declared_type.into(),
            nullable,
            default_value: None,
            is_autoincrement: false,
            sequence: None,
        }
    }
}

/// A discovered table or view
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectDescriptor {
    pub schema: String,
    pub name: String,
    pub kind: ObjectKind,
    /// Columns in the source's natural order
    pub columns: Vec<ColumnDescriptor>,
    /// Primary key columns in key order; empty when none is known
    pub primary_key_columns: Vec<String>,
}

// ============================================================================
// Catalog Entry
// ============================================================================

/// Singer metadata attached to a stream or one of its properties
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetadataEntry {
    /// `[]` for the stream itself, `["properties", NAME]` for a property
    pub breadcrumb: Vec<String>,
    pub metadata: JsonObject,
}

/// One discovered stream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub tap_stream_id: String,
    pub stream: String,
    pub table_name: String,
    /// `None` when the object has no known primary key
    pub key_properties: Option<Vec<String>>,
    pub schema: JsonSchema,
    pub is_view: bool,
    pub replication_method: ReplicationMethod,
    pub metadata: Vec<MetadataEntry>,
    pub database_name: Option<String>,
    pub row_count: Option<u64>,
    pub stream_alias: Option<String>,
    pub replication_key: Option<String>,
}

impl CatalogEntry {
    /// Assemble the entry for a described object and its derived schema
    pub fn from_descriptor(
        object: &ObjectDescriptor,
        schema: JsonSchema,
        config: &DiscoveryConfig,
    ) -> Self {
        let stream_id = config.stream_id(&object.schema, &object.name);
        let key_properties = if object.primary_key_columns.is_empty() {
            None
        } else {
            Some(object.primary_key_columns.clone())
        };
        let metadata = standard_metadata(
            &object.schema,
            &schema,
            object.kind,
            config.replication_method,
            key_properties.as_deref(),
        );

        Self {
            tap_stream_id: stream_id.clone(),
            stream: stream_id,
            table_name: object.name.clone(),
            key_properties,
            schema,
            is_view: object.kind.is_view(),
            replication_method: config.replication_method,
            metadata,
            database_name: None,
            row_count: None,
            stream_alias: None,
            replication_key: None,
        }
    }

    /// Stream-level metadata (breadcrumb `[]`)
    pub fn stream_metadata(&self) -> Option<&JsonObject> {
        self.metadata
            .iter()
            .find(|m| m.breadcrumb.is_empty())
            .map(|m| &m.metadata)
    }

    /// Metadata of one property
    pub fn property_metadata(&self, property: &str) -> Option<&JsonObject> {
        self.metadata
            .iter()
            .find(|m| m.breadcrumb.len() == 2 && m.breadcrumb[1] == property)
            .map(|m| &m.metadata)
    }
}

/// Build the standard stream and property metadata
fn standard_metadata(
    schema_name: &str,
    schema: &JsonSchema,
    kind: ObjectKind,
    replication_method: ReplicationMethod,
    key_properties: Option<&[String]>,
) -> Vec<MetadataEntry> {
    let keys = key_properties.unwrap_or_default();
    let mut entries = Vec::with_capacity(schema.len() + 1);

    let mut root = JsonObject::new();
    root.insert("inclusion".to_string(), json!("available"));
    root.insert("selected-by-default".to_string(), json!(true));
    // Mirrors `key_properties`: null when no primary key is known
    root.insert("table-key-properties".to_string(), json!(key_properties));
    root.insert(
        "forced-replication-method".to_string(),
        json!(replication_method),
    );
    root.insert("valid-replication-keys".to_string(), Value::Null);
    root.insert("schema-name".to_string(), json!(schema_name));
    root.insert("is-view".to_string(), json!(kind.is_view()));
    entries.push(MetadataEntry {
        breadcrumb: Vec::new(),
        metadata: root,
    });

    for name in schema.properties.keys() {
        let inclusion = if keys.contains(name) {
            "automatic"
        } else {
            "available"
        };
        let mut metadata = JsonObject::new();
        metadata.insert("inclusion".to_string(), json!(inclusion));
        metadata.insert("selected-by-default".to_string(), json!(true));
        entries.push(MetadataEntry {
            breadcrumb: vec!["properties".to_string(), name.clone()],
            metadata,
        });
    }

    entries
}

// ============================================================================
// Catalog
// ============================================================================

/// Discovered catalog
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    /// Streams in discovery order
    pub streams: Vec<CatalogEntry>,
}

impl Catalog {
    /// Find a stream by id
    pub fn get(&self, tap_stream_id: &str) -> Option<&CatalogEntry> {
        self.streams
            .iter()
            .find(|s| s.tap_stream_id == tap_stream_id)
    }

    /// Stream ids in discovery order
    pub fn stream_ids(&self) -> Vec<&str> {
        self.streams.iter().map(|s| s.tap_stream_id.as_str()).collect()
    }

    /// Number of streams
    pub fn len(&self) -> usize {
        self.streams.len()
    }

    /// Whether no stream was discovered
    pub fn is_empty(&self) -> bool {
        self.streams.is_empty()
    }

    /// Convert to JSON value
    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}
