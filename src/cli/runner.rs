//! CLI runner - executes commands

use crate::catalog::{Catalog, Discoverer};
use crate::cli::commands::{Cli, Commands, OutputFormat};
use crate::config::{DiscoveryConfig, SpecConfig, TapConfig};
use crate::connection::CollectedWarnings;
use crate::database::DuckDbConnection;
use crate::error::{Result, ResultExt};
use crate::types::LogLevel;
use serde_json::{json, Value};
use std::io::Write;
use std::path::Path;

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command, writing messages to stdout
    pub fn run(&self) -> Result<()> {
        let stdout = std::io::stdout();
        self.run_with_output(&mut stdout.lock())
    }

    /// Run the CLI command, writing messages to `out`
    pub fn run_with_output(&self, out: &mut dyn Write) -> Result<()> {
        match &self.cli.command {
            Commands::Spec => self.spec(out),
            Commands::Validate { config_json } => self.validate(out, config_json.as_deref()),
            Commands::Discover {
                snapshot,
                config_json,
            } => self.discover(out, snapshot, config_json.as_deref()),
        }
    }

    /// Load configuration from inline JSON or the config file
    fn load_config(&self, inline: Option<&str>) -> Result<TapConfig> {
        // Inline config takes precedence
        if let Some(json_str) = inline {
            return TapConfig::from_json(json_str).context("Invalid config JSON");
        }

        if let Some(path) = &self.cli.config {
            return TapConfig::from_file(path)
                .with_context(|| format!("Failed to load config {}", path.display()));
        }

        // Default empty config
        TapConfig::from_value(json!({}))
    }

    /// Show the configuration specification
    fn spec(&self, out: &mut dyn Write) -> Result<()> {
        self.output_message(out, &spec_message(&TapConfig::config_spec()))
    }

    /// Validate configuration
    fn validate(&self, out: &mut dyn Write, config_json: Option<&str>) -> Result<()> {
        let config = self.load_config(config_json)?;
        config.validate()?;

        self.output_message(
            out,
            &log_message(
                LogLevel::Info,
                &format!(
                    "Configuration is valid for {}",
                    config.masked_connection_url()?
                ),
            ),
        )
    }

    /// Discover the catalog of a system-catalog snapshot
    fn discover(
        &self,
        out: &mut dyn Write,
        snapshot: &Path,
        config_json: Option<&str>,
    ) -> Result<()> {
        let config = self.load_config(config_json)?;
        let discovery = DiscoveryConfig::from(&config);

        let conn = DuckDbConnection::open(snapshot)?;
        conn.check_connection()?;
        tracing::info!("Discovering catalog from {}", conn.location());

        let warnings = CollectedWarnings::new();
        let discoverer = Discoverer::new(discovery).with_warning_sink(warnings.clone());
        let catalog = discoverer.discover_catalog(&conn)?;

        for msg in discovery_messages(&warnings.messages(), &catalog) {
            self.output_message(out, &msg)?;
        }
        Ok(())
    }

    /// Output a message in the configured format, one per line
    fn output_message(&self, out: &mut dyn Write, msg: &Value) -> Result<()> {
        let line = match self.cli.format {
            OutputFormat::Json => serde_json::to_string(msg)?,
            OutputFormat::Pretty => serde_json::to_string_pretty(msg)?,
        };
        writeln!(out, "{line}")?;
        Ok(())
    }
}

/// Warnings as `LOG` messages, then the `CATALOG` message
fn discovery_messages(warnings: &[String], catalog: &Catalog) -> Vec<Value> {
    warnings
        .iter()
        .map(|warning| log_message(LogLevel::Warn, warning))
        .chain(std::iter::once(json!({
            "type": "CATALOG",
            "catalog": catalog.to_json()
        })))
        .collect()
}

/// Build a `LOG` message
fn log_message(level: LogLevel, message: &str) -> Value {
    json!({
        "type": "LOG",
        "log": {
            "level": level,
            "message": message
        }
    })
}

/// Build a `SPEC` message: properties in declaration order, required names listed
fn spec_message(spec: &SpecConfig) -> Value {
    let required: Vec<&str> = spec
        .properties
        .iter()
        .filter(|(_, p)| p.required)
        .map(|(name, _)| name.as_str())
        .collect();

    json!({
        "type": "SPEC",
        "spec": {
            "connectionSpecification": {
                "type": "object",
                "title": crate::NAME,
                "properties": spec.properties,
                "required": required
            }
        }
    })
}
