//! Bulkhead events.

use faultguard_core::events::PolicyEvent;
use std::time::{Duration, Instant};

/// Events emitted by a bulkhead.
///
/// `operation()` reports the bulkhead name.
#[derive(Debug, Clone)]
pub enum BulkheadEvent {
    /// A call obtained a permit.
    CallPermitted {
        bulkhead: String,
        timestamp: Instant,
        concurrent_calls: usize,
    },
    /// No permit was free; the call joined the waiting queue.
    CallQueued {
        bulkhead: String,
        timestamp: Instant,
        waiting_calls: usize,
    },
    /// Permits and waiting queue were both full.
    CallRejected {
        bulkhead: String,
        timestamp: Instant,
        max_concurrent_calls: usize,
        max_waiting_calls: usize,
    },
    /// An admitted call succeeded.
    CallFinished {
        bulkhead: String,
        timestamp: Instant,
        duration: Duration,
    },
    /// An admitted call failed.
    CallFailed {
        bulkhead: String,
        timestamp: Instant,
        duration: Duration,
    },
}

impl PolicyEvent for BulkheadEvent {
    fn event_type(&self) -> &'static str {
        match self {
            BulkheadEvent::CallPermitted { .. } => "call_permitted",
            BulkheadEvent::CallQueued { .. } => "call_queued",
            BulkheadEvent::CallRejected { .. } => "call_rejected",
            BulkheadEvent::CallFinished { .. } => "call_finished",
            BulkheadEvent::CallFailed { .. } => "call_failed",
        }
    }

    fn timestamp(&self) -> Instant {
        match self {
            BulkheadEvent::CallPermitted { timestamp, .. }
            | BulkheadEvent::CallQueued { timestamp, .. }
            | BulkheadEvent::CallRejected { timestamp, .. }
            | BulkheadEvent::CallFinished { timestamp, .. }
            | BulkheadEvent::CallFailed { timestamp, .. } => *timestamp,
        }
    }

    fn operation(&self) -> &str {
        match self {
            BulkheadEvent::CallPermitted { bulkhead, .. }
            | BulkheadEvent::CallQueued { bulkhead, .. }
            | BulkheadEvent::CallRejected { bulkhead, .. }
            | BulkheadEvent::CallFinished { bulkhead, .. }
            | BulkheadEvent::CallFailed { bulkhead, .. } => bulkhead,
        }
    }
}
