use faultguard_core::events::PolicyEvent;
use std::time::{Duration, Instant};

/// Events emitted by timeout plans.
#[derive(Debug, Clone)]
pub enum TimeoutEvent {
    /// The call succeeded in time.
    Success {
        operation: String,
        timestamp: Instant,
        duration: Duration,
    },
    /// The call failed in time.
    Error {
        operation: String,
        timestamp: Instant,
        duration: Duration,
    },
    /// The deadline passed first.
    Timeout {
        operation: String,
        timestamp: Instant,
        timeout: Duration,
    },
}

impl PolicyEvent for TimeoutEvent {
    fn event_type(&self) -> &'static str {
        match self {
            TimeoutEvent::Success { .. } => "success",
            TimeoutEvent::Error { .. } => "error",
            TimeoutEvent::Timeout { .. } => "timeout",
        }
    }

    fn timestamp(&self) -> Instant {
        match self {
            TimeoutEvent::Success { timestamp, .. }
            | TimeoutEvent::Error { timestamp, .. }
            | TimeoutEvent::Timeout { timestamp, .. } => *timestamp,
        }
    }

    fn operation(&self) -> &str {
        match self {
            TimeoutEvent::Success { operation, .. }
            | TimeoutEvent::Error { operation, .. }
            | TimeoutEvent::Timeout { operation, .. } => operation,
        }
    }
}
