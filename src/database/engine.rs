//! DuckDB-backed connection
//!
//! Runs the introspection queries against a DuckDB database holding a copy
//! of the source's system catalog tables (`SYSCAT.*`, `SYSIBM.SYSCOLUMNS`).
//! Every DuckDB value is converted to JSON so rows look the same as those of
//! any other [`Connection`].

use crate::connection::{Connection, Row};
use crate::error::{Error, Result};
use duckdb::types::{TimeUnit, Value as DuckValue};
use serde_json::Value;
use std::path::Path;

/// Connection over a DuckDB catalog snapshot
pub struct DuckDbConnection {
    /// DuckDB connection
    conn: duckdb::Connection,
    /// What was opened (for logging)
    location: String,
}

impl DuckDbConnection {
    /// Open a snapshot file read-only
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::FileNotFound {
                path: path.display().to_string(),
            });
        }

        let config = duckdb::Config::default()
            .access_mode(duckdb::AccessMode::ReadOnly)
            .map_err(|e| Error::database(format!("Failed to configure DuckDB: {e}")))?;
        let conn = duckdb::Connection::open_with_flags(path, config)
            .map_err(|e| Error::database(format!("Failed to open {}: {e}", path.display())))?;

        tracing::debug!("Opened catalog snapshot {}", path.display());
        Ok(Self {
            conn,
            location: path.display().to_string(),
        })
    }

    /// Open an empty in-memory database
    pub fn open_in_memory() -> Result<Self> {
        let conn = duckdb::Connection::open_in_memory()
            .map_err(|e| Error::database(format!("Failed to create DuckDB connection: {e}")))?;
        Ok(Self {
            conn,
            location: ":memory:".to_string(),
        })
    }

    /// Run statements that return no rows (fixtures, setup)
    pub fn execute_batch(&self, sql: &str) -> Result<()> {
        self.conn
            .execute_batch(sql)
            .map_err(|e| Error::query(sql, e.to_string()))
    }

    /// Test the connection
    pub fn check_connection(&self) -> Result<()> {
        self.conn
            .execute("SELECT 1", [])
            .map_err(|e| Error::ConnectionCheck {
                message: e.to_string(),
            })?;
        Ok(())
    }

    /// What this connection was opened on
    pub fn location(&self) -> &str {
        &self.location
    }
}

impl Connection for DuckDbConnection {
    fn execute(&self, query: &str) -> Result<Vec<Row>> {
        let mut stmt = self
            .conn
            .prepare(query)
            .map_err(|e| Error::query(query, format!("Failed to prepare query: {e}")))?;

        let mut rows = stmt
            .query([])
            .map_err(|e| Error::query(query, e.to_string()))?;

        let names: Vec<String> = rows
            .as_ref()
            .map(duckdb::Statement::column_names)
            .unwrap_or_default();

        let mut result = Vec::new();
        while let Some(row) = rows
            .next()
            .map_err(|e| Error::query(query, e.to_string()))?
        {
            let mut out = Row::new();
            for (idx, name) in names.iter().enumerate() {
                let value: DuckValue = row
                    .get(idx)
                    .map_err(|e| Error::query(query, format!("column '{name}': {e}")))?;
                out.insert(name.clone(), duckdb_value_to_json(value));
            }
            result.push(out);
        }

        Ok(result)
    }
}

/// Convert DuckDB Value to JSON Value
fn duckdb_value_to_json(value: DuckValue) -> Value {
    match value {
        DuckValue::Null => Value::Null,
        DuckValue::Boolean(b) => Value::Bool(b),
        DuckValue::TinyInt(i) => Value::Number(i.into()),
        DuckValue::SmallInt(i) => Value::Number(i.into()),
        DuckValue::Int(i) => Value::Number(i.into()),
        DuckValue::BigInt(i) => Value::Number(i.into()),
        DuckValue::HugeInt(i) => Value::String(i.to_string()),
        DuckValue::UTinyInt(i) => Value::Number(i.into()),
        DuckValue::USmallInt(i) => Value::Number(i.into()),
        DuckValue::UInt(i) => Value::Number(i.into()),
        DuckValue::UBigInt(i) => Value::Number(i.into()),
        DuckValue::Float(f) => {
            serde_json::Number::from_f64(f64::from(f)).map_or(Value::Null, Value::Number)
        }
        DuckValue::Double(f) => serde_json::Number::from_f64(f).map_or(Value::Null, Value::Number),
        DuckValue::Decimal(d) => Value::String(d.to_string()),
        DuckValue::Text(s) => Value::String(s),
        DuckValue::Blob(b) => Value::String(base64::Engine::encode(
            &base64::engine::general_purpose::STANDARD,
            b,
        )),
        DuckValue::Timestamp(unit, i) => {
            chrono::DateTime::from_timestamp_micros(to_micros(unit, i))
                .map(|dt| Value::String(dt.format("%Y-%m-%dT%H:%M:%S%.6fZ").to_string()))
                .unwrap_or(Value::Number(i.into()))
        }
        DuckValue::Date32(d) => {
            // Days since epoch (719163 is the number of days from 1 CE to 1970-01-01)
            chrono::NaiveDate::from_num_days_from_ce_opt(d + 719_163)
                .map(|date| Value::String(date.format("%Y-%m-%d").to_string()))
                .unwrap_or(Value::Number(d.into()))
        }
        DuckValue::Time64(unit, t) => {
            let micros = to_micros(unit, t);
            let secs = micros.div_euclid(1_000_000);
            Value::String(format!(
                "{:02}:{:02}:{:02}.{:06}",
                secs / 3600,
                (secs % 3600) / 60,
                secs % 60,
                micros.rem_euclid(1_000_000)
            ))
        }
        other => Value::String(format!("{other:?}")),
    }
}

/// Microseconds for a value in the given unit
fn to_micros(unit: TimeUnit, value: i64) -> i64 {
    match unit {
        TimeUnit::Second => value.saturating_mul(1_000_000),
        TimeUnit::Millisecond => value.saturating_mul(1_000),
        TimeUnit::Microsecond => value,
        TimeUnit::Nanosecond => value.div_euclid(1_000),
    }
}
