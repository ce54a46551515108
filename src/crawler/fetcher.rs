//! Page fetching
//!
//! This module defines the single-attempt page fetch contract and its HTTP
//! implementation:
//! - Building HTTP clients with proper user agent strings
//! - GET requests bounded by a per-attempt timeout
//! - Classification of failures into transient and permanent kinds
//!
//! Retrying lives in [`crate::crawler::RetryPolicy`]; a fetcher performs
//! exactly one attempt per call.

use crate::config::{CatalogConfig, UserAgentConfig};
use crate::crawler::parser::{parse_catalog_page, parse_total_pages};
use crate::record::Record;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Whether a failed attempt is worth repeating
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    Transient,
    Permanent,
}

/// Failure of one page attempt
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("attempt timed out")]
    Timeout,

    #[error("page not found")]
    NotFound,

    #[error("network error: {0}")]
    Network(String),

    /// The page was retrieved but its content did not have the expected structure
    #[error("extraction error: {0}")]
    Extraction(String),

    /// The fetch resource (page context, client, URL) could not be set up or released
    #[error("resource error: {0}")]
    Resource(String),
}

impl FetchError {
    /// Classifies the failure for the retry policy
    ///
    /// | Failure | Class |
    /// |---------|-------|
    /// | Timeout | Transient |
    /// | Network | Transient |
    /// | Resource | Transient |
    /// | NotFound | Permanent |
    /// | Extraction | Permanent |
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::Timeout | Self::Network(_) | Self::Resource(_) => ErrorClass::Transient,
            Self::NotFound | Self::Extraction(_) => ErrorClass::Permanent,
        }
    }

    pub fn is_transient(&self) -> bool {
        self.class() == ErrorClass::Transient
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout
        } else if e.is_connect() {
            Self::Network(format!("connection failed: {}", e))
        } else if e.is_builder() {
            Self::Resource(e.to_string())
        } else {
            Self::Network(e.to_string())
        }
    }
}

/// One retrieval-and-extraction attempt for a catalog page
///
/// Implementations must release whatever they acquire for the attempt on every
/// exit path and must not retry internally.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetches page `page` (1-based) and returns its records in page order
    async fn fetch(&self, page: u32) -> Result<Vec<Record>, FetchError>;
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The user agent configuration
///
/// # Example
///
/// ```no_run
/// use shelf_harvest::config::UserAgentConfig;
/// use shelf_harvest::crawler::build_http_client;
///
/// let client = build_http_client(&UserAgentConfig::default()).unwrap();
/// ```
pub fn build_http_client(config: &UserAgentConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.header_value())
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches catalog pages over HTTP and extracts records from their HTML
pub struct HttpPageFetcher {
    client: Client,
    catalog: CatalogConfig,
    timeout: Duration,
}

impl HttpPageFetcher {
    /// Creates a fetcher
    ///
    /// # Arguments
    ///
    /// * `client` - Shared HTTP client
    /// * `catalog` - Index and page URL settings
    /// * `timeout` - Budget for one attempt, covering request and body download
    pub fn new(client: Client, catalog: CatalogConfig, timeout: Duration) -> Self {
        Self {
            client,
            catalog,
            timeout,
        }
    }

    /// Resolves the URL of a catalog page
    pub fn page_url(&self, page: u32) -> Result<Url, FetchError> {
        let raw = self.catalog.page_url(page);
        Url::parse(&raw).map_err(|e| FetchError::Resource(format!("invalid page URL {}: {}", raw, e)))
    }

    /// Reads the total page count from the catalog's index page
    pub async fn detect_total_pages(&self) -> Result<u32, FetchError> {
        let url = Url::parse(&self.catalog.index_url).map_err(|e| {
            FetchError::Resource(format!("invalid index URL {}: {}", self.catalog.index_url, e))
        })?;
        let body = self.get_body(url).await?;

        parse_total_pages(&body)
            .ok_or_else(|| FetchError::Extraction("pager with page count not found".to_string()))
    }

    /// Downloads a page body within the attempt timeout
    ///
    /// # Response Handling
    ///
    /// | Condition | Result |
    /// |-----------|--------|
    /// | 2xx | Body text |
    /// | 404, 410 | NotFound |
    /// | Other status | Network (retried) |
    /// | Timeout elapsed | Timeout |
    async fn get_body(&self, url: Url) -> Result<String, FetchError> {
        let attempt = async {
            let response = self.client.get(url).send().await?;
            let status = response.status();

            if status == StatusCode::NOT_FOUND || status == StatusCode::GONE {
                return Err(FetchError::NotFound);
            }

            if !status.is_success() {
                return Err(FetchError::Network(format!("HTTP {}", status.as_u16())));
            }

            Ok::<_, FetchError>(response.text().await?)
        };

        match tokio::time::timeout(self.timeout, attempt).await {
            Ok(result) => result,
            Err(_) => Err(FetchError::Timeout),
        }
    }
}

#[async_trait]
impl PageFetcher for HttpPageFetcher {
    async fn fetch(&self, page: u32) -> Result<Vec<Record>, FetchError> {
        let url = self.page_url(page)?;
        tracing::debug!("Fetching page {} from {}", page, url);

        let body = self.get_body(url).await?;
        parse_catalog_page(&body, page).map_err(FetchError::Extraction)
    }
}
