use faultguard_core::events::PolicyEvent;
use std::time::{Duration, Instant};

/// Events emitted by retry plans.
#[derive(Debug, Clone)]
pub enum RetryEvent {
    /// A retry is about to be made after `delay`.
    Retry {
        operation: String,
        timestamp: Instant,
        /// 1 for the first retry.
        attempt: usize,
        delay: Duration,
    },
    /// The call succeeded, on the first attempt or after retries.
    Success {
        operation: String,
        timestamp: Instant,
        attempts: usize,
    },
    /// Every allowed retry failed.
    Exhausted {
        operation: String,
        timestamp: Instant,
        attempts: usize,
    },
    /// The failure was not retryable.
    Aborted {
        operation: String,
        timestamp: Instant,
        attempts: usize,
    },
    /// The max duration elapsed before the retries ran out.
    DeadlineExceeded {
        operation: String,
        timestamp: Instant,
        attempts: usize,
        elapsed: Duration,
    },
}

impl PolicyEvent for RetryEvent {
    fn event_type(&self) -> &'static str {
        match self {
            RetryEvent::Retry { .. } => "retry",
            RetryEvent::Success { .. } => "success",
            RetryEvent::Exhausted { .. } => "exhausted",
            RetryEvent::Aborted { .. } => "aborted",
            RetryEvent::DeadlineExceeded { .. } => "deadline_exceeded",
        }
    }

    fn timestamp(&self) -> Instant {
        match self {
            RetryEvent::Retry { timestamp, .. }
            | RetryEvent::Success { timestamp, .. }
            | RetryEvent::Exhausted { timestamp, .. }
            | RetryEvent::Aborted { timestamp, .. }
            | RetryEvent::DeadlineExceeded { timestamp, .. } => *timestamp,
        }
    }

    fn operation(&self) -> &str {
        match self {
            RetryEvent::Retry { operation, .. }
            | RetryEvent::Success { operation, .. }
            | RetryEvent::Exhausted { operation, .. }
            | RetryEvent::Aborted { operation, .. }
            | RetryEvent::DeadlineExceeded { operation, .. } => operation,
        }
    }
}
