//! Runtime permit pool.

use crate::definition::BulkheadDefinition;
use crate::events::BulkheadEvent;
use faultguard_core::EventListeners;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Permit pool and waiting queue for one registered bulkhead.
///
/// Permits and waiting slots are released by drop, so every exit path of a
/// guarded call (success, failure, cancellation) gives its capacity back.
#[derive(Debug)]
pub struct Bulkhead {
    definition: Arc<BulkheadDefinition>,
    permits: Arc<Semaphore>,
    waiting: AtomicUsize,
    listeners: Arc<EventListeners<BulkheadEvent>>,
}

/// Outcome of an admission decision.
pub(crate) enum Admission {
    /// A permit was free.
    Ready(OwnedSemaphorePermit),
    /// The call holds a waiting slot until a permit frees up.
    Queued(WaitingSlot),
}

/// A reserved place in the waiting queue.
pub(crate) struct WaitingSlot {
    bulkhead: Arc<Bulkhead>,
}

impl Drop for WaitingSlot {
    fn drop(&mut self) {
        self.bulkhead.waiting.fetch_sub(1, Ordering::SeqCst);
    }
}

impl Admission {
    /// Waits (if queued) for a permit.
    ///
    /// Returns `None` only if the permit pool was closed.
    pub(crate) async fn into_permit(self) -> Option<OwnedSemaphorePermit> {
        match self {
            Admission::Ready(permit) => Some(permit),
            Admission::Queued(slot) => {
                let bulkhead = Arc::clone(&slot.bulkhead);
                let permit = Arc::clone(&bulkhead.permits).acquire_owned().await.ok()?;
                drop(slot);
                bulkhead.permitted();
                Some(permit)
            }
        }
    }
}

impl Bulkhead {
    pub(crate) fn new(
        definition: BulkheadDefinition,
        listeners: Arc<EventListeners<BulkheadEvent>>,
    ) -> Self {
        let permits = Arc::new(Semaphore::new(definition.max_concurrent_executions()));
        Self {
            definition: Arc::new(definition),
            permits,
            waiting: AtomicUsize::new(0),
            listeners,
        }
    }

    /// The definition this pool enforces.
    pub fn definition(&self) -> &Arc<BulkheadDefinition> {
        &self.definition
    }

    /// Registry name.
    pub fn name(&self) -> &str {
        self.definition.name()
    }

    /// Permits not currently held.
    pub fn available_permits(&self) -> usize {
        self.permits.available_permits()
    }

    /// Executions currently holding a permit.
    pub fn concurrent_executions(&self) -> usize {
        self.definition
            .max_concurrent_executions()
            .saturating_sub(self.permits.available_permits())
    }

    /// Executions currently waiting for a permit.
    pub fn waiting_executions(&self) -> usize {
        self.waiting.load(Ordering::SeqCst)
    }

    /// Decides admission without waiting: a free permit, a waiting slot, or
    /// rejection (`None`).
    pub(crate) fn try_admit(self: &Arc<Self>) -> Option<Admission> {
        if let Ok(permit) = Arc::clone(&self.permits).try_acquire_owned() {
            self.permitted();
            return Some(Admission::Ready(permit));
        }

        let max_waiting = self.definition.max_waiting_executions();
        let reserved = self
            .waiting
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |waiting| {
                (waiting < max_waiting).then_some(waiting + 1)
            });

        match reserved {
            Ok(before) => {
                self.listeners.emit(&BulkheadEvent::CallQueued {
                    bulkhead: self.name().to_string(),
                    timestamp: Instant::now(),
                    waiting_calls: before + 1,
                });
                Some(Admission::Queued(WaitingSlot {
                    bulkhead: Arc::clone(self),
                }))
            }
            Err(_) => {
                self.listeners.emit(&BulkheadEvent::CallRejected {
                    bulkhead: self.name().to_string(),
                    timestamp: Instant::now(),
                    max_concurrent_calls: self.definition.max_concurrent_executions(),
                    max_waiting_calls: max_waiting,
                });
                None
            }
        }
    }

    fn permitted(&self) {
        self.listeners.emit(&BulkheadEvent::CallPermitted {
            bulkhead: self.name().to_string(),
            timestamp: Instant::now(),
            concurrent_calls: self.concurrent_executions(),
        });
    }

    pub(crate) fn listeners(&self) -> &EventListeners<BulkheadEvent> {
        &self.listeners
    }
}
