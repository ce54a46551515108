//! Sink traits and error types
//!
//! This module defines the trait interface for record sinks and
//! associated error types.

use crate::record::Record;
use thiserror::Error;

/// Errors that can occur during sink operations
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Existing output {path} has header '{found}', expected '{expected}'")]
    HeaderMismatch {
        path: String,
        expected: String,
        found: String,
    },

    #[error("Sink lock poisoned by a panicked writer")]
    Poisoned,
}

/// Result type for sink operations
pub type SinkResult<T> = Result<T, SinkError>;

/// Durable, append-only destination for extracted records
///
/// Implementations own their output resource exclusively. Every `append`
/// is atomic with respect to interruption: once it returns, all of its
/// records are durable; if the process dies during the call, at most a prefix
/// of whole records survives. Concurrent callers are serialized.
pub trait ResultSink: Send + Sync {
    /// Appends a batch of records and returns how many were written
    fn append(&self, records: &[Record]) -> SinkResult<usize>;

    /// Flushes and syncs the output at the end of a session
    fn finish(&self) -> SinkResult<()>;

    /// Human-readable description of the destination
    fn describe(&self) -> String;
}
