//! Aggregate run state for one scrape session

use crate::output::{FailedPage, SessionSummary};
use crate::state::PageTask;
use chrono::{DateTime, Utc};

/// Counts and failure log of a running session
///
/// Created with a fixed page range and concurrency limit, mutated only by the
/// orchestrator as tasks resolve, and consumed by [`ScrapeSession::finalize`].
#[derive(Debug)]
pub struct ScrapeSession {
    total_pages: u32,
    max_concurrency: u32,
    succeeded: u32,
    failed: u32,
    records_written: u64,
    failed_pages: Vec<FailedPage>,
    started_at: DateTime<Utc>,
}

impl ScrapeSession {
    pub fn new(total_pages: u32, max_concurrency: u32) -> Self {
        Self {
            total_pages,
            max_concurrency,
            succeeded: 0,
            failed: 0,
            records_written: 0,
            failed_pages: Vec::new(),
            started_at: Utc::now(),
        }
    }

    pub fn succeeded(&self) -> u32 {
        self.succeeded
    }

    pub fn failed(&self) -> u32 {
        self.failed
    }

    pub fn records_written(&self) -> u64 {
        self.records_written
    }

    /// Number of pages that have reached a terminal state
    pub fn resolved(&self) -> u32 {
        self.succeeded + self.failed
    }

    pub fn is_complete(&self) -> bool {
        self.resolved() >= self.total_pages
    }

    pub fn record_success(&mut self, records_written: usize) {
        self.succeeded += 1;
        self.records_written += records_written as u64;
    }

    pub fn record_failure(&mut self, task: &PageTask) {
        let reason = task
            .last_error()
            .map(|e| e.to_string())
            .unwrap_or_else(|| format!("ended in state {}", task.state()));
        self.record_failed_page(task.page(), task.attempts(), reason);
    }

    /// Accounts a page whose task never reported an outcome (e.g. it panicked)
    pub fn record_failed_page(&mut self, page: u32, attempts: u32, reason: String) {
        self.failed += 1;
        self.failed_pages.push(FailedPage {
            page,
            attempts,
            reason,
        });
    }

    /// Freezes the session into its read-only summary
    pub fn finalize(mut self, peak_concurrency: usize) -> SessionSummary {
        self.failed_pages.sort_by_key(|f| f.page);
        let finished_at = Utc::now();

        SessionSummary {
            started_at: self.started_at,
            finished_at,
            total_pages: self.total_pages,
            max_concurrency: self.max_concurrency,
            peak_concurrency,
            succeeded: self.succeeded,
            failed: self.failed,
            records_written: self.records_written,
            failed_pages: self.failed_pages,
        }
    }
}
