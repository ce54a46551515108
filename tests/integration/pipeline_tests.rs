//! Session tests against an in-process catalog

use crate::common::{csv_rows, CatalogFetcher};
use shelf_harvest::storage::CsvSink;
use shelf_harvest::{FetchError, Orchestrator, RetryPolicy};
use std::collections::HashSet;
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

fn policy(max_attempts: u32) -> RetryPolicy {
    RetryPolicy::new(max_attempts, Duration::from_millis(10))
}

#[tokio::test(start_paused = true)]
async fn test_every_page_lands_in_output() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("books.csv");
    let fetcher = Arc::new(CatalogFetcher::new(20).with_delay(Duration::from_millis(30)));
    let sink = CsvSink::open(&path).unwrap();

    let summary = Orchestrator::new(fetcher.clone(), policy(3), 5)
        .run(10, &sink)
        .await
        .unwrap();

    assert_eq!(summary.succeeded, 10);
    assert_eq!(summary.failed, 0);
    assert_eq!(summary.records_written, 200);
    assert!(summary.is_complete_success());

    let rows = csv_rows(&path);
    assert_eq!(rows.len(), 200);
    for page in 1..=10u32 {
        let count = rows.iter().filter(|r| r[3] == page.to_string()).count();
        assert_eq!(count, 20, "page {} row count", page);
        assert_eq!(fetcher.calls_for(page), 1);
    }

    let unique: HashSet<&Vec<String>> = rows.iter().collect();
    assert_eq!(unique.len(), rows.len(), "duplicate rows written");
}

#[tokio::test(start_paused = true)]
async fn test_page_that_always_times_out_is_isolated() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("books.csv");
    let fetcher = Arc::new(
        CatalogFetcher::new(20)
            .with_delay(Duration::from_millis(5))
            .failing(4, FetchError::Timeout),
    );
    let sink = CsvSink::open(&path).unwrap();

    let summary = Orchestrator::new(fetcher.clone(), policy(3), 5)
        .run(10, &sink)
        .await
        .unwrap();

    assert_eq!(summary.succeeded, 9);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.failed_page_numbers(), vec![4]);
    assert_eq!(summary.failed_pages[0].attempts, 3);
    assert_eq!(fetcher.calls_for(4), 3);

    let rows = csv_rows(&path);
    assert_eq!(rows.len(), 180);
    assert!(rows.iter().all(|r| r[3] != "4"));
}

#[tokio::test(start_paused = true)]
async fn test_missing_page_is_not_retried() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("books.csv");
    let fetcher = Arc::new(CatalogFetcher::new(5).failing(2, FetchError::NotFound));
    let sink = CsvSink::open(&path).unwrap();

    let summary = Orchestrator::new(fetcher.clone(), policy(3), 5)
        .run(4, &sink)
        .await
        .unwrap();

    assert_eq!(fetcher.calls_for(2), 1);
    assert_eq!(summary.failed_pages[0].page, 2);
    assert_eq!(summary.failed_pages[0].attempts, 1);
    assert_eq!(summary.succeeded, 3);
    assert_eq!(csv_rows(&path).len(), 15);
}

#[tokio::test(start_paused = true)]
async fn test_extraction_failure_is_not_retried() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("books.csv");
    let fetcher = Arc::new(
        CatalogFetcher::new(5).failing(3, FetchError::Extraction("layout changed".to_string())),
    );
    let sink = CsvSink::open(&path).unwrap();

    let summary = Orchestrator::new(fetcher.clone(), policy(4), 2)
        .run(3, &sink)
        .await
        .unwrap();

    assert_eq!(fetcher.calls_for(3), 1);
    assert_eq!(summary.failed_page_numbers(), vec![3]);
    assert!(summary.failed_pages[0].reason.contains("layout changed"));
}

#[tokio::test(start_paused = true)]
async fn test_single_worker_runs_pages_one_at_a_time() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("books.csv");
    let delay = Duration::from_millis(50);
    let fetcher = Arc::new(CatalogFetcher::new(2).with_delay(delay));
    let sink = CsvSink::open(&path).unwrap();

    let started = tokio::time::Instant::now();
    let summary = Orchestrator::new(fetcher.clone(), policy(3), 1)
        .run(4, &sink)
        .await
        .unwrap();

    assert!(started.elapsed() >= delay * 4);
    assert_eq!(summary.peak_concurrency, 1);
    assert_eq!(fetcher.max_active(), 1);

    let mut windows = fetcher.windows();
    windows.sort_by_key(|(_, start, _)| *start);
    for pair in windows.windows(2) {
        let (_, _, previous_end) = pair[0];
        let (page, next_start, _) = pair[1];
        assert!(next_start >= previous_end, "page {} overlapped", page);
    }
}

#[tokio::test(start_paused = true)]
async fn test_in_flight_pages_never_exceed_limit() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("books.csv");
    let fetcher = Arc::new(
        CatalogFetcher::new(1)
            .with_delay(Duration::from_millis(20))
            .failing(7, FetchError::Network("connection reset".to_string())),
    );
    let sink = CsvSink::open(&path).unwrap();
    let summary = Orchestrator::new(fetcher.clone(), policy(2), 3)
        .run(25, &sink)
        .await
        .unwrap();

    assert_eq!(summary.succeeded + summary.failed, 25);
    assert!(fetcher.max_active() <= 3);
    assert!(summary.peak_concurrency <= 3);
    assert_eq!(fetcher.max_active(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_rerun_appends_without_touching_earlier_rows() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("books.csv");

    let first = Arc::new(CatalogFetcher::new(3));
    let sink = CsvSink::open(&path).unwrap();
    Orchestrator::new(first, policy(3), 2)
        .run(3, &sink)
        .await
        .unwrap();
    drop(sink);
    let after_first = std::fs::read_to_string(&path).unwrap();

    let second = Arc::new(CatalogFetcher::new(3));
    let sink = CsvSink::open(&path).unwrap();
    let summary = Orchestrator::new(second, policy(3), 2)
        .run(2, &sink)
        .await
        .unwrap();
    drop(sink);
    let after_second = std::fs::read_to_string(&path).unwrap();

    assert_eq!(summary.records_written, 6);
    assert!(after_second.starts_with(&after_first));
    assert_eq!(csv_rows(&path).len(), 15);
    assert_eq!(after_second.matches("name,price").count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_restart_after_torn_append_keeps_complete_rows() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("books.csv");

    let sink = CsvSink::open(&path).unwrap();
    Orchestrator::new(Arc::new(CatalogFetcher::new(2)), policy(3), 2)
        .run(2, &sink)
        .await
        .unwrap();
    drop(sink);
    let intact = std::fs::read_to_string(&path).unwrap();

    // Simulate a crash in the middle of writing a row
    let mut file = std::fs::OpenOptions::new()
        .append(true)
        .open(&path)
        .unwrap();
    file.write_all(b"Book 9-0,10.").unwrap();
    drop(file);

    let sink = CsvSink::open(&path).unwrap();
    drop(sink);
    assert_eq!(std::fs::read_to_string(&path).unwrap(), intact);
    assert_eq!(csv_rows(&path).len(), 4);
}
