//! Shelf-Harvest: a resilient catalog scraper
//!
//! This crate extracts catalog records (name, price, availability) from a
//! paginated web catalog. Pages are fetched concurrently behind a bounded
//! admission gate, transient failures are retried with a configurable delay,
//! and every successfully scraped page is appended durably to the output
//! before the session moves on.

pub mod config;
pub mod crawler;
pub mod output;
pub mod record;
pub mod state;
pub mod storage;

use thiserror::Error;

/// Main error type for Shelf-Harvest operations
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Sink error: {0}")]
    Sink(#[from] storage::SinkError),

    #[error("Output error: {0}")]
    Output(#[from] output::OutputError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Invalid state transition for page {page}: {from:?} -> {to:?}")]
    InvalidTransition {
        page: u32,
        from: state::TaskState,
        to: state::TaskState,
    },

    #[error("Attempt limit of {max_attempts} reached for page {page}")]
    AttemptLimit { page: u32, max_attempts: u32 },

    #[error("Concurrency gate closed before the page was admitted")]
    GateClosed,
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Result type alias for Shelf-Harvest operations
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{run_harvest, FetchError, Orchestrator, PageFetcher, RetryPolicy};
pub use output::SessionSummary;
pub use record::{Availability, Price, Record};
pub use state::{PageTask, ScrapeSession, TaskState};
pub use storage::ResultSink;
