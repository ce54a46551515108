//! Bounded retry around a single page fetcher
//!
//! # Retry Logic
//!
//! | Failure | Action |
//! |---------|--------|
//! | NotFound | Immediate → ExhaustedFailure |
//! | Extraction | Immediate → ExhaustedFailure |
//! | Timeout | Retry until `max_attempts`, then ExhaustedFailure |
//! | Network | Retry until `max_attempts`, then ExhaustedFailure |
//! | Resource | Retry until `max_attempts`, then ExhaustedFailure |

use crate::config::ScraperConfig;
use crate::crawler::{FetchError, PageFetcher};
use crate::record::Record;
use crate::state::PageTask;
use crate::HarvestError;
use serde::Deserialize;
use std::time::Duration;

/// How the delay between attempts evolves
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backoff {
    /// The same delay before every retry
    #[default]
    Constant,

    /// The delay doubles after every failed attempt, up to the configured cap
    Exponential,
}

/// Terminal result of a page task
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutcome {
    /// Records of the attempt that succeeded
    Succeeded(Vec<Record>),

    /// The error that ended the task
    Exhausted(FetchError),
}

/// Retry configuration applied to every page task
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_attempts: u32,
    retry_delay: Duration,
    max_delay: Duration,
    backoff: Backoff,
}

impl RetryPolicy {
    /// Creates a policy with a constant delay between attempts
    pub fn new(max_attempts: u32, retry_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            retry_delay,
            max_delay: retry_delay,
            backoff: Backoff::Constant,
        }
    }

    /// Switches the delay strategy; `max_delay` caps exponential growth
    pub fn with_backoff(mut self, backoff: Backoff, max_delay: Duration) -> Self {
        self.backoff = backoff;
        self.max_delay = max_delay.max(self.retry_delay);
        self
    }

    pub fn from_config(config: &ScraperConfig) -> Self {
        Self::new(config.max_attempts, config.retry_delay())
            .with_backoff(config.backoff, config.max_retry_delay())
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Delay to wait after failed attempt number `attempt` (1-based)
    pub fn delay_for(&self, attempt: u32) -> Duration {
        match self.backoff {
            Backoff::Constant => self.retry_delay,
            Backoff::Exponential => {
                let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
                self.retry_delay.saturating_mul(factor).min(self.max_delay)
            }
        }
    }

    /// Returns true if `task` should make another attempt after `error`
    pub fn should_retry(&self, task: &PageTask, error: &FetchError) -> bool {
        error.is_transient() && task.attempts() < self.max_attempts.min(task.max_attempts())
    }

    /// Drives `task` to a terminal state
    ///
    /// Attempts run strictly one after another. The retry delay is an async
    /// sleep, so other tasks keep making progress while this one waits.
    ///
    /// # Returns
    ///
    /// * `Ok(TaskOutcome)` - Exactly one terminal outcome for the task
    /// * `Err(HarvestError)` - The task was handed over in a non-pending state
    pub async fn execute(
        &self,
        fetcher: &dyn PageFetcher,
        task: &mut PageTask,
    ) -> Result<TaskOutcome, HarvestError> {
        loop {
            let attempt = task.begin_attempt()?;
            tracing::info!(
                "Scraping page {} (attempt {}/{})",
                task.page(),
                attempt,
                task.max_attempts()
            );

            let error = match fetcher.fetch(task.page()).await {
                Ok(records) => {
                    task.succeed()?;
                    tracing::info!("Page {}: found {} records", task.page(), records.len());
                    return Ok(TaskOutcome::Succeeded(records));
                }
                Err(error) => error,
            };

            if self.should_retry(task, &error) {
                let delay = self.delay_for(attempt);
                tracing::warn!(
                    "Error scraping page {}, attempt {}: {}; retrying in {:?}",
                    task.page(),
                    attempt,
                    error,
                    delay
                );
                task.schedule_retry(error)?;
                tokio::time::sleep(delay).await;
                task.resume()?;
                continue;
            }

            if error.is_transient() {
                tracing::error!(
                    "Failed to scrape page {} after {} attempts: {}",
                    task.page(),
                    attempt,
                    error
                );
            } else {
                tracing::warn!("Page {} failed permanently: {}", task.page(), error);
            }
            task.exhaust(error.clone())?;
            return Ok(TaskOutcome::Exhausted(error));
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_secs(2))
    }
}
