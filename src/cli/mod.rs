//! CLI module
//!
//! Command-line interface for the tap.
//!
//! # Commands
//!
//! - `spec` - Print the configuration specification
//! - `validate` - Check a configuration
//! - `discover` - Discover the catalog of a system-catalog snapshot

mod commands;
mod runner;

pub use commands::{Cli, Commands, OutputFormat};
pub use runner::Runner;
