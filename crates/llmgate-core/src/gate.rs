//! Admission gate: a fixed-capacity counting permit pool.
//!
//! Backed by [`tokio::sync::Semaphore`]. Waiters are queued in arrival order
//! and a freed permit always goes to the oldest waiter. A waiter whose
//! `acquire` future is dropped leaves the queue without consuming a permit.

use tokio::sync::{Semaphore, SemaphorePermit, TryAcquireError};

use llmgate_types::error::GateError;

/// Limits the number of simultaneous permit holders to `capacity`.
#[derive(Debug)]
pub struct AdmissionGate {
    semaphore: Semaphore,
    capacity: usize,
}

/// A held unit of gate capacity.
///
/// Move-only: releasing consumes it, so a permit cannot be released twice.
/// Dropping it on any path (error, unwind, cancellation) returns the permit.
#[derive(Debug)]
#[must_use = "dropping a permit releases it immediately"]
pub struct GatePermit<'a> {
    _permit: SemaphorePermit<'a>,
}

impl AdmissionGate {
    /// Create a gate allowing at most `capacity` concurrent holders.
    pub fn new(capacity: usize) -> Result<Self, GateError> {
        if capacity == 0 {
            return Err(GateError::ZeroCapacity);
        }
        Ok(Self {
            semaphore: Semaphore::new(capacity),
            capacity,
        })
    }

    /// Wait until a permit is free and take it.
    ///
    /// Only the calling task is suspended. Cancel-safe: dropping the returned
    /// future before it resolves removes the caller from the wait queue.
    pub async fn acquire(&self) -> GatePermit<'_> {
        let permit = self
            .semaphore
            .acquire()
            .await
            .expect("admission gate semaphore is never closed");
        tracing::trace!(available = self.available(), "gate permit acquired");
        GatePermit { _permit: permit }
    }

    /// Take a permit only if one is free right now.
    pub fn try_acquire(&self) -> Option<GatePermit<'_>> {
        match self.semaphore.try_acquire() {
            Ok(permit) => Some(GatePermit { _permit: permit }),
            Err(TryAcquireError::NoPermits) | Err(TryAcquireError::Closed) => None,
        }
    }

    /// Return a permit to the pool, waking the oldest waiter if any.
    pub fn release(&self, permit: GatePermit<'_>) {
        drop(permit);
        tracing::trace!(available = self.available(), "gate permit released");
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Permits not currently held. Advisory under concurrency.
    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }

    /// Permits currently held. Advisory under concurrency.
    pub fn in_flight(&self) -> usize {
        self.capacity - self.available()
    }
}
