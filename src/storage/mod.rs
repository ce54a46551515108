//! Storage module for persisting extracted records
//!
//! This module handles the durable output of a session:
//! - The `ResultSink` contract shared by all destinations
//! - An append-only CSV file (default)
//! - A SQLite database with one transaction per appended batch

mod csv;
mod schema;
mod sqlite;
mod traits;

pub use csv::CsvSink;
pub use sqlite::SqliteSink;
pub use traits::{ResultSink, SinkError, SinkResult};

use crate::config::{OutputConfig, OutputFormat};
use std::path::Path;

/// Opens the sink selected by the output configuration
///
/// # Returns
///
/// * `Ok(Box<dyn ResultSink>)` - Sink ready for appends
/// * `Err(SinkError)` - The output resource could not be created or is incompatible
pub fn open_sink(config: &OutputConfig) -> SinkResult<Box<dyn ResultSink>> {
    let path = Path::new(&config.path);
    let sink: Box<dyn ResultSink> = match config.format {
        OutputFormat::Csv => Box::new(CsvSink::open(path)?),
        OutputFormat::Sqlite => Box::new(SqliteSink::open(path)?),
    };
    Ok(sink)
}
