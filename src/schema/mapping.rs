//! Declared SQL type → structural type mapping
//!
//! Discovery only ever sees the source's type *name* (e.g. `varchar(40)`,
//! `numeric(10,2)`, `INTEGER`). The [`TypeMapper`] trait is the single join
//! point that turns such a name into a schema property. [`DefaultTypeMapper`]
//! is an ordered table of regex rules with a fallback; callers can prepend
//! rules, change the fallback, or replace the mapper entirely (any
//! `Fn(&str) -> SchemaProperty` is a mapper).

use super::types::{JsonType, SchemaProperty};
use crate::error::{Error, Result};
use regex::Regex;
use serde_json::json;
use std::sync::LazyLock;

/// Format used for decimals carried as strings
pub const SINGER_DECIMAL_FORMAT: &str = "x-singer.decimal";

/// Regex for the `(precision[, scale])` suffix of a declared type
static PRECISION_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\(\s*(\d+)\s*(?:,\s*(\d+)\s*)?\)").unwrap());

/// Built-in rules, matched in order against the lower-cased type name
static DEFAULT_RULES: LazyLock<Vec<TypeRule>> = LazyLock::new(|| {
    [
        (
            r"^(unsigned\s+)?(tinyint|smallint|int|integer|bigint)\b",
            StructuralType::Integer,
        ),
        (
            r"^(decimal|dec|numeric|money|smallmoney)\b",
            StructuralType::Decimal,
        ),
        (r"^(float|real|double)\b", StructuralType::Number),
        (r"^(bit|boolean|bool)\b", StructuralType::Boolean),
        (
            r"^(datetime|smalldatetime|bigdatetime|timestamp|datetimeoffset)\b",
            StructuralType::DateTime,
        ),
        (r"^date\b", StructuralType::Date),
        (r"^(time|bigtime)\b", StructuralType::Time),
        (
            r"^(binary|varbinary|image|long\s+binary|blob)\b",
            StructuralType::Binary,
        ),
        (
            r"^(char|nchar|varchar|nvarchar|text|ntext|unichar|univarchar|unitext|long\s+varchar|long\s+nvarchar|clob|sysname|uniqueidentifier|xml)\b",
            StructuralType::String,
        ),
    ]
    .into_iter()
    .map(|(pattern, kind)| TypeRule::new(pattern, kind).unwrap())
    .collect()
});

/// Structural scalar type a declared type maps to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StructuralType {
    Integer,
    /// Exact numerics (decimal/numeric/money)
    Decimal,
    /// Approximate numerics (float/real/double)
    Number,
    Boolean,
    DateTime,
    Date,
    Time,
    Binary,
    String,
}

/// One entry of the mapping table
#[derive(Debug, Clone)]
pub struct TypeRule {
    pattern: Regex,
    kind: StructuralType,
}

impl TypeRule {
    /// Create a rule; `pattern` is matched against the lower-cased type name
    pub fn new(pattern: &str, kind: StructuralType) -> Result<Self> {
        let pattern = Regex::new(pattern)
            .map_err(|e| Error::config(format!("Invalid type rule '{pattern}': {e}")))?;
        Ok(Self { pattern, kind })
    }

    /// Whether this rule applies to the (lower-cased) type name
    pub fn matches(&self, declared_type: &str) -> bool {
        self.pattern.is_match(declared_type)
    }

    /// Structural type produced by this rule
    pub fn kind(&self) -> StructuralType {
        self.kind
    }
}

/// Maps a declared type name to a schema property.
///
/// Implementations must be pure: the same name always yields the same
/// property. Nullability is applied by the caller.
pub trait TypeMapper {
    /// Map a declared type name to a (non-nullable) schema property
    fn map_type(&self, declared_type: &str) -> SchemaProperty;
}

impl<F> TypeMapper for F
where
    F: Fn(&str) -> SchemaProperty,
{
    fn map_type(&self, declared_type: &str) -> SchemaProperty {
        self(declared_type)
    }
}

/// Rule-table type mapper
#[derive(Debug, Clone)]
pub struct DefaultTypeMapper {
    rules: Vec<TypeRule>,
    fallback: StructuralType,
    use_date_datatype: bool,
    use_singer_decimal: bool,
}

impl Default for DefaultTypeMapper {
    fn default() -> Self {
        Self::new()
    }
}

impl DefaultTypeMapper {
    /// Mapper with the built-in rules and a `String` fallback
    pub fn new() -> Self {
        Self {
            rules: DEFAULT_RULES.clone(),
            fallback: StructuralType::String,
            use_date_datatype: false,
            use_singer_decimal: false,
        }
    }

    /// Emit dates as `date` and times as `time` instead of date-times
    #[must_use]
    pub fn with_date_datatype(mut self, enabled: bool) -> Self {
        self.use_date_datatype = enabled;
        self
    }

    /// Emit decimals and floats as `x-singer.decimal` strings
    #[must_use]
    pub fn with_singer_decimal(mut self, enabled: bool) -> Self {
        self.use_singer_decimal = enabled;
        self
    }

    /// Add a rule that takes precedence over all existing rules
    #[must_use]
    pub fn with_rule(mut self, rule: TypeRule) -> Self {
        self.rules.insert(0, rule);
        self
    }

    /// Change the type used when no rule matches
    #[must_use]
    pub fn with_fallback(mut self, fallback: StructuralType) -> Self {
        self.fallback = fallback;
        self
    }

    /// Rules in match order
    pub fn rules(&self) -> &[TypeRule] {
        &self.rules
    }

    /// Classify a declared type name
    pub fn classify(&self, declared_type: &str) -> StructuralType {
        let normalized = declared_type.trim().to_lowercase();
        self.rules
            .iter()
            .find(|rule| rule.matches(&normalized))
            .map_or(self.fallback, TypeRule::kind)
    }

    /// Render a structural type as a schema property
    fn render(&self, kind: StructuralType, declared_type: &str) -> SchemaProperty {
        match kind {
            StructuralType::Integer => SchemaProperty::new(JsonType::Integer),
            StructuralType::Boolean => SchemaProperty::new(JsonType::Boolean),
            StructuralType::Decimal if self.use_singer_decimal => {
                let property =
                    SchemaProperty::new(JsonType::String).with_format(SINGER_DECIMAL_FORMAT);
                match scale_precision(declared_type) {
                    Some(sp) => property.with_additional_properties(json!({ "scale_precision": sp })),
                    None => property,
                }
            }
            StructuralType::Number if self.use_singer_decimal => {
                SchemaProperty::new(JsonType::String).with_format(SINGER_DECIMAL_FORMAT)
            }
            StructuralType::Decimal | StructuralType::Number => {
                SchemaProperty::new(JsonType::Number)
            }
            StructuralType::DateTime => {
                SchemaProperty::new(JsonType::String).with_format("date-time")
            }
            StructuralType::Date if self.use_date_datatype => {
                SchemaProperty::new(JsonType::String).with_format("date")
            }
            StructuralType::Date => SchemaProperty::new(JsonType::String).with_format("date-time"),
            StructuralType::Time if self.use_date_datatype => {
                SchemaProperty::new(JsonType::String).with_format("time")
            }
            StructuralType::Time | StructuralType::String => SchemaProperty::new(JsonType::String),
            StructuralType::Binary => {
                SchemaProperty::new(JsonType::String).with_content_encoding("base64")
            }
        }
    }
}

impl TypeMapper for DefaultTypeMapper {
    fn map_type(&self, declared_type: &str) -> SchemaProperty {
        self.render(self.classify(declared_type), declared_type)
    }
}

/// Extract `(precision,scale)` from a declared type such as `numeric(10,2)`
fn scale_precision(declared_type: &str) -> Option<String> {
    let caps = PRECISION_REGEX.captures(declared_type)?;
    let precision = caps.get(1)?.as_str();
    let scale = caps.get(2).map_or("0", |m| m.as_str());
    Some(format!("({precision},{scale})"))
}
