//! Catalog discovery module
//!
//! Walks a Sybase system catalog and turns every table and view into a
//! Singer catalog entry: stream id, key properties, structural schema,
//! metadata and the default replication method.

mod discovery;
mod inspector;
pub mod queries;
mod types;

pub use discovery::{derive_structural_schema, Discoverer};
pub use inspector::SystemCatalogInspector;
pub use types::{
    Catalog, CatalogEntry, ColumnDescriptor, MetadataEntry, ObjectDescriptor, SequenceInfo,
};
