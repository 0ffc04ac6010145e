//! Optional process-wide admission control (spec §4.G, §9 open question
//! (a)'s sibling: the per-request quota checks bound one organization's
//! spend, but say nothing about how many model calls run concurrently
//! across the whole process). A deployment that wants a hard ceiling on
//! in-flight calls — independent of any one request's [`CellBudget`] —
//! can gate dispatch through an [`AdmissionQueue`]; nothing else in this
//! crate requires one.

use tokio::sync::{Semaphore, SemaphorePermit, TryAcquireError};

/// A counting semaphore bounding total concurrent model dispatches.
///
/// Holding a permit is the caller's signal that a call is in flight;
/// dropping it (or the returned [`AdmissionPermit`]) returns the slot.
pub struct AdmissionQueue {
    semaphore: Semaphore,
    capacity: usize,
}

impl AdmissionQueue {
    /// Build a queue admitting at most `capacity` concurrent calls.
    pub fn new(capacity: usize) -> Self {
        Self { semaphore: Semaphore::new(capacity), capacity }
    }

    /// Wait for a free slot.
    pub async fn admit(&self) -> AdmissionPermit<'_> {
        let permit = self.semaphore.acquire().await.expect("admission semaphore is never closed");
        AdmissionPermit { _permit: permit }
    }

    /// Take a slot only if one is free right now, without waiting.
    pub fn try_admit(&self) -> Result<AdmissionPermit<'_>, TryAcquireError> {
        self.semaphore.try_acquire().map(|permit| AdmissionPermit { _permit: permit })
    }

    /// The configured ceiling.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Slots currently free.
    pub fn available_permits(&self) -> usize {
        self.semaphore.available_permits()
    }
}

/// A held admission slot, released on drop.
pub struct AdmissionPermit<'a> {
    _permit: SemaphorePermit<'a>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn admits_up_to_capacity_then_blocks() {
        let queue = AdmissionQueue::new(2);
        let _a = queue.admit().await;
        let _b = queue.admit().await;
        assert!(queue.try_admit().is_err());
        assert_eq!(queue.available_permits(), 0);
    }

    #[tokio::test]
    async fn releasing_a_permit_frees_a_slot() {
        let queue = AdmissionQueue::new(1);
        let permit = queue.admit().await;
        assert!(queue.try_admit().is_err());
        drop(permit);
        assert!(queue.try_admit().is_ok());
    }

    #[tokio::test]
    async fn capacity_reports_the_configured_ceiling() {
        let queue = AdmissionQueue::new(4);
        assert_eq!(queue.capacity(), 4);
        assert_eq!(queue.available_permits(), 4);
    }
}
