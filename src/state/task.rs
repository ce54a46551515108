//! Per-page unit of work

use crate::crawler::FetchError;
use crate::state::TaskState;
use crate::HarvestError;

/// Work for one catalog page, carrying its own attempt and retry state
#[derive(Debug, Clone)]
pub struct PageTask {
    page: u32,
    attempts: u32,
    max_attempts: u32,
    state: TaskState,
    last_error: Option<FetchError>,
}

impl PageTask {
    pub fn new(page: u32, max_attempts: u32) -> Self {
        Self {
            page,
            attempts: 0,
            max_attempts,
            state: TaskState::Pending,
            last_error: None,
        }
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn state(&self) -> TaskState {
        self.state
    }

    pub fn last_error(&self) -> Option<&FetchError> {
        self.last_error.as_ref()
    }

    /// Returns true if another attempt would stay within the limit
    pub fn has_attempts_left(&self) -> bool {
        self.attempts < self.max_attempts
    }

    /// Marks the task in flight and returns the 1-based attempt number
    pub fn begin_attempt(&mut self) -> Result<u32, HarvestError> {
        if !self.has_attempts_left() {
            return Err(HarvestError::AttemptLimit {
                page: self.page,
                max_attempts: self.max_attempts,
            });
        }
        self.transition(TaskState::InFlight)?;
        self.attempts += 1;
        Ok(self.attempts)
    }

    pub fn succeed(&mut self) -> Result<(), HarvestError> {
        self.transition(TaskState::Succeeded)?;
        self.last_error = None;
        Ok(())
    }

    /// Records a transient failure; the task waits for its next attempt
    pub fn schedule_retry(&mut self, error: FetchError) -> Result<(), HarvestError> {
        self.transition(TaskState::RetryScheduled)?;
        self.last_error = Some(error);
        Ok(())
    }

    /// Returns a retry-scheduled task to the pending state once its delay has passed
    pub fn resume(&mut self) -> Result<(), HarvestError> {
        self.transition(TaskState::Pending)
    }

    pub fn exhaust(&mut self, error: FetchError) -> Result<(), HarvestError> {
        self.transition(TaskState::ExhaustedFailure)?;
        self.last_error = Some(error);
        Ok(())
    }

    fn transition(&mut self, next: TaskState) -> Result<(), HarvestError> {
        if !self.state.can_transition_to(next) {
            return Err(HarvestError::InvalidTransition {
                page: self.page,
                from: self.state,
                to: next,
            });
        }
        self.state = next;
        Ok(())
    }
}
