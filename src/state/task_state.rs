//! Page task state definitions
//!
//! A page task moves `Pending → InFlight → {Succeeded | RetryScheduled → Pending | ExhaustedFailure}`.
use std::fmt;

/// Represents the current state of a page task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskState {
    // ===== Active States =====
    /// Waiting for an attempt
    Pending,

    /// An attempt is running
    InFlight,

    /// The last attempt failed transiently; a retry is waiting out its delay
    RetryScheduled,

    // ===== Terminal States =====
    /// An attempt produced records
    Succeeded,

    /// The page failed permanently or ran out of attempts
    ExhaustedFailure,
}

impl TaskState {
    /// Returns true if no further attempts will be made
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::ExhaustedFailure)
    }

    /// Returns true if moving from `self` to `next` is a legal transition
    pub fn can_transition_to(&self, next: TaskState) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::InFlight)
                | (Self::InFlight, Self::Succeeded)
                | (Self::InFlight, Self::RetryScheduled)
                | (Self::InFlight, Self::ExhaustedFailure)
                | (Self::RetryScheduled, Self::Pending)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InFlight => "in_flight",
            Self::RetryScheduled => "retry_scheduled",
            Self::Succeeded => "succeeded",
            Self::ExhaustedFailure => "exhausted_failure",
        }
    }

    /// Returns all possible task states
    pub fn all_states() -> [Self; 5] {
        [
            Self::Pending,
            Self::InFlight,
            Self::RetryScheduled,
            Self::Succeeded,
            Self::ExhaustedFailure,
        ]
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
