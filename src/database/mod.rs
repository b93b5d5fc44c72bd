//! Database connection support via DuckDB
//!
//! This module provides a [`Connection`](crate::connection::Connection)
//! backed by DuckDB. It opens a local snapshot of a Sybase system catalog
//! so discovery can run without a live server.

mod engine;

pub use engine::DuckDbConnection;
