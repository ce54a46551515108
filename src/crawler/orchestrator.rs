//! Session orchestration
//!
//! The orchestrator creates one task per catalog page, runs each through the
//! concurrency gate and retry policy, and accounts every terminal outcome:
//! - Succeeded → records appended to the sink, succeeded count incremented
//! - ExhaustedFailure → failed count incremented, page listed in the summary
//!
//! All appends happen on the orchestrator's own loop, so the sink has a single
//! writer regardless of how many pages complete at once. Every run gets a fresh
//! concurrency gate, so sessions on the same orchestrator are independent.

use crate::crawler::gate::ConcurrencyGate;
use crate::crawler::retry::{RetryPolicy, TaskOutcome};
use crate::crawler::PageFetcher;
use crate::output::SessionSummary;
use crate::state::{PageTask, ScrapeSession};
use crate::storage::ResultSink;
use crate::HarvestError;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Instant;
use tokio::task::JoinSet;

/// Runs scrape sessions against a page fetcher
pub struct Orchestrator {
    fetcher: Arc<dyn PageFetcher>,
    policy: RetryPolicy,
    max_concurrency: usize,
}

impl Orchestrator {
    /// Creates an orchestrator
    ///
    /// # Arguments
    ///
    /// * `fetcher` - Single-attempt page fetcher
    /// * `policy` - Retry behaviour applied to each page
    /// * `max_concurrency` - Most pages in flight at once
    pub fn new(fetcher: Arc<dyn PageFetcher>, policy: RetryPolicy, max_concurrency: u32) -> Self {
        Self {
            fetcher,
            policy,
            max_concurrency: (max_concurrency as usize).max(1),
        }
    }

    /// Scrapes pages `1..=total_pages` and appends their records to `sink`
    ///
    /// Returns once every page has reached a terminal state. Page failures are
    /// counted, never propagated.
    ///
    /// # Returns
    ///
    /// * `Ok(SessionSummary)` - Every page resolved
    /// * `Err(HarvestError)` - The sink rejected an append; the session's gate is
    ///   closed and remaining tasks are aborted
    pub async fn run(
        &self,
        total_pages: u32,
        sink: &dyn ResultSink,
    ) -> Result<SessionSummary, HarvestError> {
        let gate = ConcurrencyGate::new(self.max_concurrency);
        tracing::info!(
            "Starting scrape for {} pages with {} concurrent workers",
            total_pages,
            gate.limit()
        );

        let start_time = Instant::now();
        let mut session = ScrapeSession::new(total_pages, gate.limit() as u32);
        let mut unresolved: BTreeSet<u32> = (1..=total_pages).collect();
        let mut tasks = JoinSet::new();

        for page in 1..=total_pages {
            let gate = gate.clone();
            let fetcher = Arc::clone(&self.fetcher);
            let policy = self.policy.clone();

            tasks.spawn(async move {
                let mut task = PageTask::new(page, policy.max_attempts());
                let Some(permit) = gate.admit().await else {
                    return (task, Err(HarvestError::GateClosed));
                };
                let outcome = policy.execute(fetcher.as_ref(), &mut task).await;
                drop(permit);
                (task, outcome)
            });
        }

        while let Some(joined) = tasks.join_next().await {
            let (task, outcome) = match joined {
                Ok(result) => result,
                Err(e) => {
                    tracing::error!("Page task did not complete: {}", e);
                    continue;
                }
            };
            unresolved.remove(&task.page());

            match outcome {
                Ok(TaskOutcome::Succeeded(records)) => {
                    let written = sink.append(&records).map_err(|e| {
                        gate.close();
                        tracing::error!(
                            "Failed to save {} records from page {} to {}: {}",
                            records.len(),
                            task.page(),
                            sink.describe(),
                            e
                        );
                        e
                    })?;
                    session.record_success(written);
                }
                Ok(TaskOutcome::Exhausted(_)) => session.record_failure(&task),
                Err(e) => {
                    tracing::error!("Page {} task error: {}", task.page(), e);
                    session.record_failed_page(task.page(), task.attempts(), e.to_string());
                }
            }

            let resolved = session.resolved();
            if resolved % 10 == 0 {
                let elapsed = start_time.elapsed();
                tracing::info!(
                    "Progress: {}/{} pages resolved, {} records, {:.2} pages/sec",
                    resolved,
                    total_pages,
                    session.records_written(),
                    resolved as f64 / elapsed.as_secs_f64().max(f64::EPSILON)
                );
            }
        }

        for page in unresolved {
            session.record_failed_page(page, 0, "task aborted before reporting".to_string());
        }

        debug_assert!(session.is_complete());
        debug_assert_eq!(gate.in_flight(), 0);
        let summary = session.finalize(gate.peak());

        tracing::info!(
            "Scraping completed: {} succeeded, {} failed, {} records in {:?}",
            summary.succeeded,
            summary.failed,
            summary.records_written,
            start_time.elapsed()
        );

        Ok(summary)
    }
}
