//! Output module for session reporting
//!
//! This module handles:
//! - The read-only summary of a finished session
//! - Printing that summary to the terminal
//! - Writing an optional markdown report

mod markdown;
mod summary;

pub use markdown::{format_markdown_summary, generate_markdown_summary};
pub use summary::{print_summary, FailedPage, SessionSummary};

use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;
