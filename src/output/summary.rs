//! Session summary produced when every page task has resolved

use chrono::{DateTime, Utc};
use std::time::Duration;

/// A page that ended in ExhaustedFailure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedPage {
    pub page: u32,

    /// Attempts made before giving up (0 if the task never reported back)
    pub attempts: u32,

    /// The final error
    pub reason: String,
}

/// Read-only result of a finished session
#[derive(Debug, Clone)]
pub struct SessionSummary {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub total_pages: u32,
    pub max_concurrency: u32,
    /// Most page tasks that held a slot at the same time
    pub peak_concurrency: usize,
    pub succeeded: u32,
    pub failed: u32,
    pub records_written: u64,
    /// Failed pages sorted by page number
    pub failed_pages: Vec<FailedPage>,
}

impl SessionSummary {
    pub fn duration(&self) -> Duration {
        (self.finished_at - self.started_at)
            .to_std()
            .unwrap_or_default()
    }

    /// Returns the page success rate as a percentage
    pub fn success_rate(&self) -> f64 {
        if self.total_pages == 0 {
            return 0.0;
        }
        (self.succeeded as f64 / self.total_pages as f64) * 100.0
    }

    pub fn failed_page_numbers(&self) -> Vec<u32> {
        self.failed_pages.iter().map(|f| f.page).collect()
    }

    pub fn is_complete_success(&self) -> bool {
        self.failed == 0 && self.succeeded == self.total_pages
    }
}

/// Prints the summary to stdout in a formatted manner
pub fn print_summary(summary: &SessionSummary) {
    println!("=== Scrape Summary ===\n");

    println!("Overview:");
    println!("  Pages: {}", summary.total_pages);
    println!("  Succeeded: {}", summary.succeeded);
    println!("  Failed: {}", summary.failed);
    println!("  Records written: {}", summary.records_written);
    println!(
        "  Concurrency: {} peak / {} limit",
        summary.peak_concurrency, summary.max_concurrency
    );
    println!("  Duration: {:.1}s", summary.duration().as_secs_f64());
    println!();

    if !summary.failed_pages.is_empty() {
        println!("Failed Pages ({}):", summary.failed_pages.len());
        for failed in &summary.failed_pages {
            println!(
                "  - page {} after {} attempt(s): {}",
                failed.page, failed.attempts, failed.reason
            );
        }
        println!();
    }

    println!(
        "Success Rate: {:.1}% ({} / {} pages)",
        summary.success_rate(),
        summary.succeeded,
        summary.total_pages
    );
}
