#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! `DuckDB` storage for the collected risk scores.
//!
//! A single file, `data/weather_risks.duckdb`, holds one row per
//! department and forecast hour. The collector appends to it batch by
//! batch; the server reads it one timestamp at a time.

pub mod paths;
pub mod risks_db;

/// Errors that can occur during database operations.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// `DuckDB` error.
    #[error("DuckDB error: {0}")]
    Duckdb(#[from] duckdb::Error),

    /// Filesystem error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
