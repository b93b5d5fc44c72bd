//! Structural schema module
//!
//! Describes stream records as ordered JSON schemas and maps the source's
//! declared column types onto them.
//!
//! # Features
//!
//! - **Ordered Properties**: Field order follows the source's column order
//! - **Nullable Detection**: Fields are nullable exactly when the column is
//! - **Pluggable Type Mapping**: Ordered rule table, replaceable per caller

mod mapping;
mod types;

pub use mapping::{
    DefaultTypeMapper, StructuralType, TypeMapper, TypeRule, SINGER_DECIMAL_FORMAT,
};
pub use types::{JsonSchema, JsonType, JsonTypeOrArray, SchemaProperty};
