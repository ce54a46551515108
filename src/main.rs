//! Shelf-Harvest main entry point
//!
//! This is the command-line interface for the Shelf-Harvest catalog scraper.

use anyhow::Context;
use clap::Parser;
use shelf_harvest::config::{self, Config, OutputFormat};
use shelf_harvest::crawler::run_harvest;
use shelf_harvest::output::print_summary;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Shelf-Harvest: a resilient catalog scraper
///
/// Shelf-Harvest scrapes every page of a paginated catalog with a bounded
/// number of concurrent workers, retries transient failures, and appends
/// each page's records to the output as soon as the page completes.
#[derive(Parser, Debug)]
#[command(name = "shelf-harvest")]
#[command(version)]
#[command(about = "A resilient catalog scraper", long_about = None)]
struct Cli {
    /// Path to TOML configuration file (defaults apply when omitted)
    #[arg(value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Show the effective settings without scraping
    #[arg(long)]
    dry_run: bool,

    /// Number of catalog pages (skips detection)
    #[arg(long)]
    total_pages: Option<u32>,

    /// Maximum pages in flight at once
    #[arg(long)]
    max_concurrency: Option<u32>,

    /// Maximum attempts per page
    #[arg(long)]
    max_attempts: Option<u32>,

    /// Delay before a retry, in milliseconds
    #[arg(long)]
    retry_delay_ms: Option<u64>,

    /// Output file path
    #[arg(short, long)]
    output: Option<String>,

    /// Output format
    #[arg(long, value_parser = parse_format)]
    format: Option<OutputFormat>,
}

fn parse_format(value: &str) -> Result<OutputFormat, String> {
    match value.to_ascii_lowercase().as_str() {
        "csv" => Ok(OutputFormat::Csv),
        "sqlite" => Ok(OutputFormat::Sqlite),
        other => Err(format!("unknown format '{}', expected csv or sqlite", other)),
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let (config, config_hash) = load_effective_config(&cli)?;

    if cli.dry_run {
        handle_dry_run(&config);
        return Ok(());
    }

    let summary = run_harvest(&config, config_hash.as_deref())
        .await
        .context("scrape session failed")?;

    if !cli.quiet {
        print_summary(&summary);
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("shelf_harvest=info,warn"),
            1 => EnvFilter::new("shelf_harvest=debug,info"),
            2 => EnvFilter::new("shelf_harvest=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Reads the config file (if any), applies CLI overrides, then validates the result
fn load_effective_config(cli: &Cli) -> anyhow::Result<(Config, Option<String>)> {
    let (mut config, hash) = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = config::read_config_with_hash(path)
                .with_context(|| format!("failed to load {}", path.display()))?;
            tracing::info!("Configuration read (hash: {})", hash);
            (config, Some(hash))
        }
        None => (Config::default(), None),
    };

    if let Some(pages) = cli.total_pages {
        config.scraper.total_pages = Some(pages);
    }
    if let Some(limit) = cli.max_concurrency {
        config.scraper.max_concurrency = limit;
    }
    if let Some(attempts) = cli.max_attempts {
        config.scraper.max_attempts = attempts;
    }
    if let Some(delay) = cli.retry_delay_ms {
        config.scraper.retry_delay_ms = delay;
        config.scraper.max_retry_delay_ms = config.scraper.max_retry_delay_ms.max(delay);
    }
    if let Some(output) = &cli.output {
        config.output.path = output.clone();
    }
    if let Some(format) = cli.format {
        config.output.format = format;
    }

    config::validate(&config).context("invalid settings")?;
    Ok((config, hash))
}

/// Handles the --dry-run mode: shows what would be scraped
fn handle_dry_run(config: &Config) {
    println!("=== Shelf-Harvest Dry Run ===\n");

    println!("Scraper Configuration:");
    match config.scraper.total_pages {
        Some(pages) => println!("  Pages: {}", pages),
        None => println!(
            "  Pages: detected from {} (fallback {})",
            config.catalog.index_url, config.scraper.fallback_total_pages
        ),
    }
    println!("  Max concurrency: {}", config.scraper.max_concurrency);
    println!("  Max attempts: {}", config.scraper.max_attempts);
    println!(
        "  Retry delay: {}ms ({:?})",
        config.scraper.retry_delay_ms, config.scraper.backoff
    );
    println!("  Page timeout: {}ms", config.scraper.page_timeout_ms);

    println!("\nCatalog:");
    println!("  First page: {}", config.catalog.page_url(1));

    println!("\nUser Agent:");
    println!("  {}", config.user_agent.header_value());

    println!("\nOutput:");
    println!("  {:?}: {}", config.output.format, config.output.path);
    if let Some(summary_path) = &config.output.summary_path {
        println!("  Summary: {}", summary_path);
    }

    println!("\n✓ Configuration is valid");
}
