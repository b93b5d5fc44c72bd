// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::unused_self)]
#![allow(clippy::struct_excessive_bools)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::needless_pass_by_value)]

//! # tap-sybase
//!
//! Catalog discovery for Sybase-family databases (SQL Anywhere / ASA).
//!
//! Walks the system catalog of a connected database and produces one Singer
//! catalog entry per table and view: stream id, key properties, a JSON
//! schema derived from the declared column types, and standard metadata.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use tap_sybase::{database::DuckDbConnection, DiscoveryConfig, Discoverer, Result};
//!
//! fn main() -> Result<()> {
//!     // Any `Connection` works; a DuckDB snapshot of the catalog tables is built in
//!     let conn = DuckDbConnection::open("catalog.duckdb")?;
//!
//!     let discoverer = Discoverer::new(DiscoveryConfig::default());
//!     let catalog = discoverer.discover_catalog(&conn)?;
//!
//!     println!("{}", serde_json::to_string_pretty(&catalog)?);
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                         Discoverer                          │
//! │  discover_catalog(conn) → Catalog                           │
//! │  schemas → tables + views → columns + primary key → entry   │
//! └─────────────────────────────────────────────────────────────┘
//!                               │
//! ┌───────────────┬─────────────┴───────┬───────────────────────┐
//! │  Connection   │  SchemaInspector    │  TypeMapper           │
//! ├───────────────┼─────────────────────┼───────────────────────┤
//! │ execute(sql)  │ list_schemas        │ declared type →       │
//! │ → rows        │ list_tables/views   │ JSON schema property  │
//! │ (DuckDB, ...) │ (SYSCAT queries)    │ (rule table)          │
//! └───────────────┴─────────────────────┴───────────────────────┘
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types for the tap
pub mod error;

/// Common types and type aliases
pub mod types;

/// JSON schema types and declared-type mapping
pub mod schema;

/// Connection, inspector and warning seams
pub mod connection;

/// Tap configuration and discovery settings
pub mod config;

/// Catalog discovery
pub mod catalog;

/// Catalog snapshots via DuckDB
pub mod database;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, Result};
pub use types::*;

// Re-export commonly used types
pub use catalog::{Catalog, CatalogEntry, Discoverer};
pub use config::{DiscoveryConfig, TapConfig};
pub use connection::{Connection, Row, SchemaInspector, WarningSink};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
