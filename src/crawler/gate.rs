//! Admission gate bounding the number of page tasks in flight
//!
//! A task acquires one slot before its first attempt and holds it across all
//! of its retries. The slot is an RAII permit, so it is returned on every exit
//! path: success, failure, panic, or abort of the owning task.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

#[derive(Debug, Default)]
struct GateCounters {
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

/// Counting admission gate shared by all page tasks of a session
#[derive(Debug, Clone)]
pub struct ConcurrencyGate {
    semaphore: Arc<Semaphore>,
    limit: usize,
    counters: Arc<GateCounters>,
}

/// A held slot; dropping it releases the slot
#[derive(Debug)]
pub struct GatePermit {
    _permit: OwnedSemaphorePermit,
    counters: Arc<GateCounters>,
}

impl ConcurrencyGate {
    /// Creates a gate admitting at most `limit` holders (at least one)
    pub fn new(limit: usize) -> Self {
        let limit = limit.max(1);
        Self {
            semaphore: Arc::new(Semaphore::new(limit)),
            limit,
            counters: Arc::new(GateCounters::default()),
        }
    }

    /// Waits for a free slot
    ///
    /// Returns None only if the gate has been closed.
    pub async fn admit(&self) -> Option<GatePermit> {
        let permit = Arc::clone(&self.semaphore).acquire_owned().await.ok()?;

        let now = self.counters.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.counters.peak.fetch_max(now, Ordering::SeqCst);

        Some(GatePermit {
            _permit: permit,
            counters: Arc::clone(&self.counters),
        })
    }

    /// Stops admitting; tasks still waiting in [`ConcurrencyGate::admit`] get None
    pub fn close(&self) {
        self.semaphore.close();
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Number of slots currently held
    pub fn in_flight(&self) -> usize {
        self.counters.in_flight.load(Ordering::SeqCst)
    }

    /// Highest number of slots held at the same time so far
    pub fn peak(&self) -> usize {
        self.counters.peak.load(Ordering::SeqCst)
    }
}

impl Drop for GatePermit {
    fn drop(&mut self) {
        self.counters.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}
