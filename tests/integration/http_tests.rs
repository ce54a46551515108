//! HTTP fetcher and full-session tests against a mock catalog server

use crate::common::{catalog_html, csv_rows, index_html};
use shelf_harvest::config::{CatalogConfig, Config, OutputFormat, UserAgentConfig};
use shelf_harvest::crawler::{build_http_client, HttpPageFetcher};
use shelf_harvest::record::Availability;
use shelf_harvest::storage::SqliteSink;
use shelf_harvest::{run_harvest, FetchError, PageFetcher};
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn catalog_for(server: &MockServer) -> CatalogConfig {
    CatalogConfig {
        index_url: format!("{}/index.html", server.uri()),
        page_url_template: format!("{}/catalogue/page-{{page}}.html", server.uri()),
    }
}

fn fetcher_for(server: &MockServer, timeout: Duration) -> HttpPageFetcher {
    let client = build_http_client(&UserAgentConfig::default()).unwrap();
    HttpPageFetcher::new(client, catalog_for(server), timeout)
}

async fn mount_page(server: &MockServer, route: &str, template: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(template)
        .mount(server)
        .await;
}

fn html(body: String) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .insert_header("content-type", "text/html; charset=utf-8")
        .set_body_string(body)
}

#[tokio::test]
async fn test_fetch_extracts_records() {
    let server = MockServer::start().await;
    mount_page(&server, "/catalogue/page-2.html", html(catalog_html(2, 20))).await;

    let records = fetcher_for(&server, Duration::from_secs(5))
        .fetch(2)
        .await
        .unwrap();

    assert_eq!(records.len(), 20);
    assert_eq!(records[0].name, "Book 2-0");
    assert_eq!(records[0].price.to_string(), "£12.00");
    assert_eq!(records[7].price.to_decimal_string(), "12.07");
    assert!(records
        .iter()
        .all(|r| r.source_page == 2 && r.availability == Availability::InStock));
}

#[tokio::test]
async fn test_missing_page_is_not_found() {
    let server = MockServer::start().await;
    mount_page(&server, "/catalogue/page-9.html", ResponseTemplate::new(404)).await;

    let error = fetcher_for(&server, Duration::from_secs(5))
        .fetch(9)
        .await
        .unwrap_err();

    assert!(matches!(error, FetchError::NotFound));
    assert!(!error.is_transient());
}

#[tokio::test]
async fn test_server_error_is_transient() {
    let server = MockServer::start().await;
    mount_page(&server, "/catalogue/page-1.html", ResponseTemplate::new(503)).await;

    let error = fetcher_for(&server, Duration::from_secs(5))
        .fetch(1)
        .await
        .unwrap_err();

    assert!(matches!(error, FetchError::Network(_)));
    assert!(error.is_transient());
}

#[tokio::test]
async fn test_slow_page_times_out() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/catalogue/page-1.html",
        html(catalog_html(1, 3)).set_delay(Duration::from_millis(800)),
    )
    .await;

    let error = fetcher_for(&server, Duration::from_millis(100))
        .fetch(1)
        .await
        .unwrap_err();

    assert!(matches!(error, FetchError::Timeout));
    assert!(error.is_transient());
}

#[tokio::test]
async fn test_unexpected_layout_is_extraction_error() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/catalogue/page-1.html",
        html("<html><body><p>We are redesigning!</p></body></html>".to_string()),
    )
    .await;

    let error = fetcher_for(&server, Duration::from_secs(5))
        .fetch(1)
        .await
        .unwrap_err();

    assert!(matches!(error, FetchError::Extraction(_)));
    assert!(!error.is_transient());
}

#[tokio::test]
async fn test_detect_total_pages_from_pager() {
    let server = MockServer::start().await;
    mount_page(&server, "/index.html", html(index_html(50))).await;

    let pages = fetcher_for(&server, Duration::from_secs(5))
        .detect_total_pages()
        .await
        .unwrap();

    assert_eq!(pages, 50);
}

fn session_config(server: &MockServer, dir: &TempDir) -> Config {
    let mut config = Config::default();
    config.catalog = catalog_for(server);
    config.scraper.max_concurrency = 2;
    config.scraper.max_attempts = 3;
    config.scraper.retry_delay_ms = 5;
    config.scraper.page_timeout_ms = 5_000;
    config.output.path = dir.path().join("books.csv").display().to_string();
    config
}

#[tokio::test]
async fn test_full_session_with_detection_retry_and_report() {
    let server = MockServer::start().await;
    mount_page(&server, "/index.html", html(index_html(3))).await;
    mount_page(&server, "/catalogue/page-1.html", html(catalog_html(1, 4))).await;

    // First request for page 2 fails, the retry succeeds
    Mock::given(method("GET"))
        .and(path("/catalogue/page-2.html"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    mount_page(&server, "/catalogue/page-2.html", html(catalog_html(2, 4))).await;

    Mock::given(method("GET"))
        .and(path("/catalogue/page-3.html"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let mut config = session_config(&server, &dir);
    let report = dir.path().join("summary.md");
    config.output.summary_path = Some(report.display().to_string());

    let summary = run_harvest(&config, Some("abc123")).await.unwrap();

    assert_eq!(summary.total_pages, 3);
    assert_eq!(summary.succeeded, 2);
    assert_eq!(summary.failed_page_numbers(), vec![3]);
    assert_eq!(summary.records_written, 8);

    let rows = csv_rows(dir.path().join("books.csv").as_path());
    assert_eq!(rows.len(), 8);
    assert_eq!(rows.iter().filter(|r| r[3] == "2").count(), 4);

    let markdown = std::fs::read_to_string(&report).unwrap();
    assert!(markdown.contains("# Shelf-Harvest Scrape Summary"));
    assert!(markdown.contains("abc123"));
}

#[tokio::test]
async fn test_configured_page_count_skips_detection() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/index.html"))
        .respond_with(html(index_html(50)))
        .expect(0)
        .mount(&server)
        .await;
    mount_page(&server, "/catalogue/page-1.html", html(catalog_html(1, 2))).await;

    let dir = TempDir::new().unwrap();
    let mut config = session_config(&server, &dir);
    config.scraper.total_pages = Some(1);

    let summary = run_harvest(&config, None).await.unwrap();

    assert_eq!(summary.total_pages, 1);
    assert_eq!(summary.records_written, 2);
}

#[tokio::test]
async fn test_failed_detection_uses_fallback_count() {
    let server = MockServer::start().await;
    mount_page(&server, "/index.html", ResponseTemplate::new(500)).await;
    for page in 1..=2 {
        mount_page(
            &server,
            &format!("/catalogue/page-{}.html", page),
            html(catalog_html(page, 3)),
        )
        .await;
    }

    let dir = TempDir::new().unwrap();
    let mut config = session_config(&server, &dir);
    config.scraper.fallback_total_pages = 2;

    let summary = run_harvest(&config, None).await.unwrap();

    assert_eq!(summary.total_pages, 2);
    assert_eq!(summary.succeeded, 2);
    assert_eq!(summary.records_written, 6);
}

#[tokio::test]
async fn test_session_into_sqlite() {
    let server = MockServer::start().await;
    for page in 1..=2 {
        mount_page(
            &server,
            &format!("/catalogue/page-{}.html", page),
            html(catalog_html(page, 5)),
        )
        .await;
    }

    let dir = TempDir::new().unwrap();
    let mut config = session_config(&server, &dir);
    config.scraper.total_pages = Some(2);
    config.output.format = OutputFormat::Sqlite;
    config.output.path = dir.path().join("books.db").display().to_string();

    let summary = run_harvest(&config, None).await.unwrap();
    assert_eq!(summary.records_written, 10);

    let sink = SqliteSink::open(dir.path().join("books.db").as_path()).unwrap();
    assert_eq!(sink.count_records().unwrap(), 10);
    let page_two = sink.records_for_page(2).unwrap();
    assert_eq!(page_two.len(), 5);
    assert_eq!(page_two[0].price.to_string(), "£12.00");
}
