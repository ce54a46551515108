//! Crawler module for catalog page fetching and session orchestration
//!
//! This module contains the core scraping pipeline, including:
//! - Single-attempt page fetching and failure classification
//! - HTML extraction of catalog records
//! - Bounded retry with constant or exponential delay
//! - The concurrency gate limiting pages in flight
//! - Overall session orchestration

mod fetcher;
mod gate;
mod orchestrator;
mod parser;
mod retry;

pub use fetcher::{build_http_client, ErrorClass, FetchError, HttpPageFetcher, PageFetcher};
pub use gate::{ConcurrencyGate, GatePermit};
pub use orchestrator::Orchestrator;
pub use parser::{parse_catalog_page, parse_total_pages};
pub use retry::{Backoff, RetryPolicy, TaskOutcome};

use crate::config::{validate, Config};
use crate::output::{generate_markdown_summary, SessionSummary};
use crate::storage::open_sink;
use crate::HarvestError;
use std::path::Path;
use std::sync::Arc;

/// Runs a complete scrape session
///
/// This is the main entry point for a scrape. It will:
/// 1. Validate the configuration and build the HTTP client
/// 2. Determine the page count (configured, detected, or fallback)
/// 3. Open the output sink
/// 4. Scrape every page through the gate and retry policy
/// 5. Flush the sink and write the optional markdown report
///
/// # Arguments
///
/// * `config` - Scrape settings; validated before anything is fetched
/// * `config_hash` - Hash of the configuration file, recorded in the report
///
/// # Returns
///
/// * `Ok(SessionSummary)` - Every page reached a terminal state
/// * `Err(HarvestError)` - Setup failed or the sink stopped accepting records
///
/// # Example
///
/// ```no_run
/// use shelf_harvest::config::Config;
/// use shelf_harvest::crawler::run_harvest;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let summary = run_harvest(&Config::default(), None).await?;
/// println!("{} records", summary.records_written);
/// # Ok(())
/// # }
/// ```
pub async fn run_harvest(
    config: &Config,
    config_hash: Option<&str>,
) -> Result<SessionSummary, HarvestError> {
    validate(config)?;
    let client = build_http_client(&config.user_agent)?;
    let fetcher = Arc::new(HttpPageFetcher::new(
        client,
        config.catalog.clone(),
        config.scraper.page_timeout(),
    ));

    let total_pages = match config.scraper.total_pages {
        Some(pages) => pages,
        None => resolve_total_pages(&fetcher, config.scraper.fallback_total_pages).await,
    };

    let sink = open_sink(&config.output)?;
    tracing::info!("Writing records to {}", sink.describe());

    let orchestrator = Orchestrator::new(
        fetcher,
        RetryPolicy::from_config(&config.scraper),
        config.scraper.max_concurrency,
    );
    let result = orchestrator.run(total_pages, sink.as_ref()).await;
    let finished = sink.finish();
    let summary = result?;
    finished?;

    if let Some(summary_path) = &config.output.summary_path {
        generate_markdown_summary(&summary, config_hash, Path::new(summary_path))?;
        tracing::info!("Summary written to {}", summary_path);
    }

    Ok(summary)
}

/// Detects the page count from the index page, falling back on failure
async fn resolve_total_pages(fetcher: &HttpPageFetcher, fallback: u32) -> u32 {
    match fetcher.detect_total_pages().await {
        Ok(pages) => {
            tracing::info!("Detected {} catalog pages", pages);
            pages
        }
        Err(e) => {
            tracing::warn!(
                "Could not automatically detect total pages: {}. Defaulting to {}.",
                e,
                fallback
            );
            fallback
        }
    }
}
