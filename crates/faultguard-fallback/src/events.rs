//! Events emitted by fallback plans.

use faultguard_core::events::PolicyEvent;
use std::time::Instant;

/// Events emitted by fallback plans.
#[derive(Debug, Clone)]
pub enum FallbackEvent {
    /// The wrapped plan succeeded; no fallback was needed.
    Success {
        /// Guarded operation.
        operation: String,
        /// When the event occurred.
        timestamp: Instant,
    },

    /// The fallback produced the result.
    Applied {
        /// Guarded operation.
        operation: String,
        /// When the event occurred.
        timestamp: Instant,
        /// The strategy that was applied.
        strategy: &'static str,
    },

    /// The fallback handler itself failed.
    Failed {
        /// Guarded operation.
        operation: String,
        /// When the event occurred.
        timestamp: Instant,
    },

    /// The failure was not handled by the fallback and propagated as-is.
    Skipped {
        /// Guarded operation.
        operation: String,
        /// When the event occurred.
        timestamp: Instant,
    },
}

impl PolicyEvent for FallbackEvent {
    fn event_type(&self) -> &'static str {
        match self {
            FallbackEvent::Success { .. } => "success",
            FallbackEvent::Applied { .. } => "applied",
            FallbackEvent::Failed { .. } => "failed",
            FallbackEvent::Skipped { .. } => "skipped",
        }
    }

    fn timestamp(&self) -> Instant {
        match self {
            FallbackEvent::Success { timestamp, .. }
            | FallbackEvent::Applied { timestamp, .. }
            | FallbackEvent::Failed { timestamp, .. }
            | FallbackEvent::Skipped { timestamp, .. } => *timestamp,
        }
    }

    fn operation(&self) -> &str {
        match self {
            FallbackEvent::Success { operation, .. }
            | FallbackEvent::Applied { operation, .. }
            | FallbackEvent::Failed { operation, .. }
            | FallbackEvent::Skipped { operation, .. } => operation,
        }
    }
}
