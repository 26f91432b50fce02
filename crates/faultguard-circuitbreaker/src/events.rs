use crate::circuit::CircuitState;
use faultguard_core::events::PolicyEvent;
use std::time::Instant;

/// Events emitted by circuit breakers.
#[derive(Debug, Clone)]
pub enum CircuitBreakerEvent {
    /// The circuit moved between states.
    StateTransition {
        operation: String,
        timestamp: Instant,
        from_state: CircuitState,
        to_state: CircuitState,
    },
    /// A call was let through.
    CallPermitted {
        operation: String,
        timestamp: Instant,
        state: CircuitState,
    },
    /// A call was rejected because the circuit is open.
    CallRejected {
        operation: String,
        timestamp: Instant,
    },
    /// An outcome was recorded as a success.
    SuccessRecorded {
        operation: String,
        timestamp: Instant,
        state: CircuitState,
    },
    /// An outcome was recorded as a failure.
    FailureRecorded {
        operation: String,
        timestamp: Instant,
        state: CircuitState,
    },
}

impl PolicyEvent for CircuitBreakerEvent {
    fn event_type(&self) -> &'static str {
        match self {
            CircuitBreakerEvent::StateTransition { .. } => "state_transition",
            CircuitBreakerEvent::CallPermitted { .. } => "call_permitted",
            CircuitBreakerEvent::CallRejected { .. } => "call_rejected",
            CircuitBreakerEvent::SuccessRecorded { .. } => "success_recorded",
            CircuitBreakerEvent::FailureRecorded { .. } => "failure_recorded",
        }
    }

    fn timestamp(&self) -> Instant {
        match self {
            CircuitBreakerEvent::StateTransition { timestamp, .. }
            | CircuitBreakerEvent::CallPermitted { timestamp, .. }
            | CircuitBreakerEvent::CallRejected { timestamp, .. }
            | CircuitBreakerEvent::SuccessRecorded { timestamp, .. }
            | CircuitBreakerEvent::FailureRecorded { timestamp, .. } => *timestamp,
        }
    }

    fn operation(&self) -> &str {
        match self {
            CircuitBreakerEvent::StateTransition { operation, .. }
            | CircuitBreakerEvent::CallPermitted { operation, .. }
            | CircuitBreakerEvent::CallRejected { operation, .. }
            | CircuitBreakerEvent::SuccessRecorded { operation, .. }
            | CircuitBreakerEvent::FailureRecorded { operation, .. } => operation,
        }
    }
}
