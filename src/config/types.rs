use crate::crawler::Backoff;
use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for Shelf-Harvest
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub scraper: ScraperConfig,
    pub catalog: CatalogConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub output: OutputConfig,
}

/// Fetch, retry and concurrency behaviour
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ScraperConfig {
    /// Number of catalog pages to scrape; detected from the index page when unset
    pub total_pages: Option<u32>,

    /// Page count used when detection fails
    pub fallback_total_pages: u32,

    /// Maximum number of pages in flight at once
    pub max_concurrency: u32,

    /// Maximum attempts per page, first attempt included
    pub max_attempts: u32,

    /// Delay before a retry (milliseconds)
    pub retry_delay_ms: u64,

    /// How the retry delay grows between attempts
    pub backoff: Backoff,

    /// Upper bound for exponential backoff delays (milliseconds)
    pub max_retry_delay_ms: u64,

    /// Timeout of a single page attempt (milliseconds)
    pub page_timeout_ms: u64,
}

impl ScraperConfig {
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    pub fn max_retry_delay(&self) -> Duration {
        Duration::from_millis(self.max_retry_delay_ms)
    }

    pub fn page_timeout(&self) -> Duration {
        Duration::from_millis(self.page_timeout_ms)
    }
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            total_pages: None,
            fallback_total_pages: 50,
            max_concurrency: 5,
            max_attempts: 3,
            retry_delay_ms: 2_000,
            backoff: Backoff::Constant,
            max_retry_delay_ms: 30_000,
            page_timeout_ms: 30_000,
        }
    }
}

/// Where the catalog lives
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct CatalogConfig {
    /// Landing page carrying the `Page 1 of N` pager
    pub index_url: String,

    /// URL of a single catalog page; `{page}` is replaced by the page number
    pub page_url_template: String,
}

impl CatalogConfig {
    /// Substitutes a page number into the page URL template
    pub fn page_url(&self, page: u32) -> String {
        self.page_url_template.replace("{page}", &page.to_string())
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            index_url: "http://books.toscrape.com/".to_string(),
            page_url_template: "http://books.toscrape.com/catalogue/page-{page}.html".to_string(),
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct UserAgentConfig {
    /// Name of the scraper
    pub crawler_name: String,

    /// Version of the scraper
    pub crawler_version: String,

    /// URL with information about the scraper
    pub contact_url: String,

    /// Email address for scraper-related contact
    pub contact_email: String,
}

impl UserAgentConfig {
    /// Format: Name/Version (+ContactURL; ContactEmail)
    pub fn header_value(&self) -> String {
        format!(
            "{}/{} (+{}; {})",
            self.crawler_name, self.crawler_version, self.contact_url, self.contact_email
        )
    }
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: "ShelfHarvest".to_string(),
            crawler_version: env!("CARGO_PKG_VERSION").to_string(),
            contact_url: "https://example.com/shelf-harvest".to_string(),
            contact_email: "ops@example.com".to_string(),
        }
    }
}

/// Output artifact format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Csv,
    Sqlite,
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct OutputConfig {
    /// Path of the records file (CSV) or database (SQLite)
    pub path: String,

    pub format: OutputFormat,

    /// Optional markdown report written after the session
    pub summary_path: Option<String>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: "books_data.csv".to_string(),
            format: OutputFormat::Csv,
            summary_path: None,
        }
    }
}
