//! Tap configuration
//!
//! [`TapConfig`] holds the settings a user supplies (JSON or YAML file, or
//! inline JSON). [`DiscoveryConfig`] holds every default catalog discovery
//! relies on, so nothing in discovery reads a hidden constant.

use crate::error::{Error, Result};
use crate::schema::DefaultTypeMapper;
use crate::types::{OptionStringExt, PropertyType, ReplicationMethod};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::path::Path;
use url::Url;

/// Default port of a Sybase SQL Anywhere / IQ server
pub const DEFAULT_PORT: u16 = 2638;

/// Default character set of the source
pub const DEFAULT_CHARACTERSET: &str = "utf8";

// ============================================================================
// Tap Config
// ============================================================================

/// User-supplied tap settings
#[derive(Clone, Serialize, Deserialize)]
pub struct TapConfig {
    /// User name used to connect
    #[serde(default)]
    pub user: String,

    /// Password of the connecting user
    #[serde(default)]
    pub password: String,

    /// Host name or IP address of the server
    #[serde(default)]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Database to connect to
    #[serde(default)]
    pub database: Option<String>,

    /// Comma-separated schemas to restrict discovery to
    #[serde(default)]
    pub filter_dbs: Option<String>,

    /// Emit dates as `date` and times as `time`
    #[serde(default)]
    pub use_date_datatype: bool,

    /// TDS protocol version passed to the driver
    #[serde(default)]
    pub tds_version: Option<String>,

    /// Character set of the source
    #[serde(default = "default_characterset")]
    pub characterset: String,

    /// Rows fetched per cursor round trip
    #[serde(default = "default_cursor_array_size")]
    pub cursor_array_size: u32,

    /// Emit numerics as `x-singer.decimal` strings
    #[serde(default)]
    pub use_singer_decimal: bool,
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_characterset() -> String {
    DEFAULT_CHARACTERSET.to_string()
}

fn default_cursor_array_size() -> u32 {
    1
}

impl std::fmt::Debug for TapConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TapConfig")
            .field("user", &self.user)
            .field("password", &"****")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("filter_dbs", &self.filter_dbs)
            .field("use_date_datatype", &self.use_date_datatype)
            .field("tds_version", &self.tds_version)
            .field("characterset", &self.characterset)
            .field("cursor_array_size", &self.cursor_array_size)
            .field("use_singer_decimal", &self.use_singer_decimal)
            .finish()
    }
}

impl TapConfig {
    /// Parse a config from a JSON value
    pub fn from_value(value: Value) -> Result<Self> {
        Ok(serde_json::from_value(value)?)
    }

    /// Parse a config from a JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a config file; `.yaml`/`.yml` files are parsed as YAML, anything else as JSON
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::FileNotFound {
                path: path.display().to_string(),
            });
        }
        let content = std::fs::read_to_string(path)?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml" | "yml") => Ok(serde_yaml::from_str(&content)?),
            _ => Self::from_json(&content),
        }
    }

    /// Check required fields and value ranges
    pub fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("user", &self.user),
            ("password", &self.password),
            ("host", &self.host),
        ] {
            if value.trim().is_empty() {
                return Err(Error::missing_field(field));
            }
        }
        if self.port == 0 {
            return Err(Error::invalid_value("port", "must be between 1 and 65535"));
        }
        if self.cursor_array_size == 0 {
            return Err(Error::invalid_value(
                "cursor_array_size",
                "must be at least 1",
            ));
        }
        if self.characterset.trim().is_empty() {
            return Err(Error::invalid_value("characterset", "must not be empty"));
        }
        Ok(())
    }

    /// Schemas named in `filter_dbs` (empty when discovery is unrestricted)
    pub fn schema_filter(&self) -> Vec<String> {
        self.filter_dbs
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect()
    }

    /// Connection URL for the source, password percent-encoded
    pub fn connection_url(&self) -> Result<Url> {
        let mut url = Url::parse(&format!("sybase://{}:{}", self.host.trim(), self.port))
            .map_err(|e| Error::invalid_value("host", e.to_string()))?;

        url.set_username(&self.user)
            .map_err(|()| Error::invalid_value("user", "cannot be encoded in a URL"))?;
        url.set_password(Some(&self.password))
            .map_err(|()| Error::invalid_value("password", "cannot be encoded in a URL"))?;

        if let Some(database) = self.database.clone().none_if_empty() {
            url.set_path(&format!("/{database}"));
        }

        {
            let mut query = url.query_pairs_mut();
            query.append_pair("charset", &self.characterset);
            if let Some(tds_version) = self.tds_version.clone().none_if_empty() {
                query.append_pair("tds_version", &tds_version);
            }
        }

        Ok(url)
    }

    /// Connection URL with the password masked (for logging)
    pub fn masked_connection_url(&self) -> Result<String> {
        let mut url = self.connection_url()?;
        if url.password().is_some() {
            url.set_password(Some("****"))
                .map_err(|()| Error::invalid_value("password", "cannot be encoded in a URL"))?;
        }
        Ok(url.to_string())
    }

    /// Specification of every setting this tap accepts
    pub fn config_spec() -> SpecConfig {
        let mut properties = IndexMap::new();

        properties.insert(
            "user".to_string(),
            PropertyConfig::required(
                PropertyType::String,
                "The user name used to connect to the Sybase database",
            ),
        );
        properties.insert(
            "password".to_string(),
            PropertyConfig::required(
                PropertyType::String,
                "The password for the connecting user to the Sybase database",
            )
            .secret(),
        );
        properties.insert(
            "host".to_string(),
            PropertyConfig::required(
                PropertyType::String,
                "The host name or IP address running the Sybase database",
            ),
        );
        properties.insert(
            "port".to_string(),
            PropertyConfig::optional(
                PropertyType::Integer,
                "The port that the database is running on",
                json!(DEFAULT_PORT),
            ),
        );
        properties.insert(
            "database".to_string(),
            PropertyConfig::optional(
                PropertyType::String,
                "The database to connect to",
                Value::Null,
            ),
        );
        properties.insert(
            "filter_dbs".to_string(),
            PropertyConfig::optional(
                PropertyType::String,
                "Comma-separated schemas to restrict discovery to. Speeds up discovery \
                 on databases with many schemas",
                Value::Null,
            ),
        );
        properties.insert(
            "use_date_datatype".to_string(),
            PropertyConfig::optional(
                PropertyType::Boolean,
                "Emit dates as dates without a time component and times without a UTC \
                 offset. When false, dates are emitted as date-times",
                json!(false),
            ),
        );
        properties.insert(
            "tds_version".to_string(),
            PropertyConfig::optional(
                PropertyType::String,
                "The TDS protocol version used when talking to the server",
                Value::Null,
            ),
        );
        properties.insert(
            "characterset".to_string(),
            PropertyConfig::optional(
                PropertyType::String,
                "The character set of the source, e.g. cp1252 for older databases",
                json!(DEFAULT_CHARACTERSET),
            ),
        );
        properties.insert(
            "cursor_array_size".to_string(),
            PropertyConfig::optional(
                PropertyType::Integer,
                "Number of rows fetched per cursor round trip",
                json!(1),
            ),
        );
        properties.insert(
            "use_singer_decimal".to_string(),
            PropertyConfig::optional(
                PropertyType::Boolean,
                "Emit numeric values as strings with format x-singer.decimal; the scale \
                 and precision are carried in additionalProperties",
                json!(false),
            ),
        );

        SpecConfig { properties }
    }
}

// ============================================================================
// Spec Config
// ============================================================================

/// Configuration specification of the tap
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SpecConfig {
    /// Configuration properties, in declaration order
    #[serde(default)]
    pub properties: IndexMap<String, PropertyConfig>,
}

/// Configuration property definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropertyConfig {
    /// Property type
    #[serde(rename = "type", default)]
    pub property_type: PropertyType,

    /// Property description
    #[serde(default)]
    pub description: Option<String>,

    /// Whether this is a secret (should be masked)
    #[serde(default)]
    pub secret: bool,

    /// Whether this property is required
    #[serde(default)]
    pub required: bool,

    /// Default value
    #[serde(default)]
    pub default: Option<Value>,
}

impl PropertyConfig {
    fn required(property_type: PropertyType, description: &str) -> Self {
        Self {
            property_type,
            description: Some(description.to_string()),
            secret: false,
            required: true,
            default: None,
        }
    }

    fn optional(property_type: PropertyType, description: &str, default: Value) -> Self {
        Self {
            property_type,
            description: Some(description.to_string()),
            secret: false,
            required: false,
            default: Some(default),
        }
    }

    #[must_use]
    fn secret(mut self) -> Self {
        self.secret = true;
        self
    }
}

// ============================================================================
// Discovery Config
// ============================================================================

/// Settings and defaults used by catalog discovery
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveryConfig {
    /// Joins schema and object names into a stream id
    pub stream_delimiter: String,
    /// Replication method assigned to every discovered stream
    pub replication_method: ReplicationMethod,
    /// Schemas starting with this prefix belong to the engine
    pub system_schema_prefix: String,
    /// Schemas to restrict discovery to (empty = all)
    pub schema_filter: Vec<String>,
    /// Passed to the default type mapper
    pub use_date_datatype: bool,
    /// Passed to the default type mapper
    pub use_singer_decimal: bool,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            stream_delimiter: "-".to_string(),
            replication_method: ReplicationMethod::FullTable,
            system_schema_prefix: "SYS".to_string(),
            schema_filter: Vec::new(),
            use_date_datatype: false,
            use_singer_decimal: false,
        }
    }
}

impl From<&TapConfig> for DiscoveryConfig {
    fn from(config: &TapConfig) -> Self {
        Self {
            schema_filter: config.schema_filter(),
            use_date_datatype: config.use_date_datatype,
            use_singer_decimal: config.use_singer_decimal,
            ..Self::default()
        }
    }
}

impl DiscoveryConfig {
    /// Set the stream id delimiter
    #[must_use]
    pub fn with_delimiter(mut self, delimiter: impl Into<String>) -> Self {
        self.stream_delimiter = delimiter.into();
        self
    }

    /// Restrict discovery to the given schemas
    #[must_use]
    pub fn with_schema_filter(mut self, schemas: Vec<String>) -> Self {
        self.schema_filter = schemas;
        self
    }

    /// Whether a schema passes the filter (case-insensitive)
    pub fn includes_schema(&self, schema: &str) -> bool {
        self.schema_filter.is_empty()
            || self
                .schema_filter
                .iter()
                .any(|s| s.eq_ignore_ascii_case(schema))
    }

    /// Stream id for an object
    pub fn stream_id(&self, schema: &str, object: &str) -> String {
        format!("{schema}{}{object}", self.stream_delimiter)
    }

    /// Type mapper honoring the date and decimal flags
    pub fn type_mapper(&self) -> DefaultTypeMapper {
        DefaultTypeMapper::new()
            .with_date_datatype(self.use_date_datatype)
            .with_singer_decimal(self.use_singer_decimal)
    }
}
