use crate::events::CircuitBreakerEvent;
use crate::model::CircuitBreakerModel;
use faultguard_core::{EventListeners, OperationId};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// Represents the state of the circuit breaker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum CircuitState {
    /// The circuit is closed and calls are allowed.
    Closed = 0,
    /// The circuit is open and calls are rejected.
    Open = 1,
    /// The circuit is half-open and trial calls are allowed.
    HalfOpen = 2,
}

impl CircuitState {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => CircuitState::Open,
            2 => CircuitState::HalfOpen,
            _ => CircuitState::Closed,
        }
    }
}

/// Snapshot of a circuit's rolling window.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct CircuitMetrics {
    /// Current state.
    pub state: CircuitState,
    /// Outcomes currently in the rolling window.
    pub window_calls: usize,
    /// Failures currently in the rolling window.
    pub failure_count: usize,
    /// `failure_count / window_calls`, or 0.0 for an empty window.
    pub failure_rate: f64,
    /// Consecutive successes recorded while half-open.
    pub consecutive_successes: usize,
    /// Time since the last state transition.
    pub time_since_state_change: Duration,
}

struct Circuit {
    state: CircuitState,
    last_state_change: Instant,
    /// Most recent outcome last; `true` marks a failure.
    window: VecDeque<bool>,
    failures: usize,
    consecutive_successes: usize,
}

impl Circuit {
    fn new(capacity: usize) -> Self {
        Self {
            state: CircuitState::Closed,
            last_state_change: Instant::now(),
            window: VecDeque::with_capacity(capacity),
            failures: 0,
            consecutive_successes: 0,
        }
    }
}

/// Shared circuit state for one operation.
///
/// Every call to the operation goes through the same `CircuitBreaker`, so
/// outcomes from all callers land in one rolling window of the last
/// `request_volume_threshold` calls.
///
/// - **Closed**: calls pass. Once the window is full and the failure share
///   reaches `failure_ratio`, the circuit opens.
/// - **Open**: calls are rejected until `delay` has elapsed; the next call
///   after that moves the circuit to half-open.
/// - **HalfOpen**: calls pass. `success_threshold` consecutive successes
///   close the circuit; any failure reopens it.
pub struct CircuitBreaker {
    operation: OperationId,
    model: Arc<CircuitBreakerModel>,
    state_atomic: AtomicU8,
    circuit: Mutex<Circuit>,
    listeners: Arc<EventListeners<CircuitBreakerEvent>>,
}

impl std::fmt::Debug for CircuitBreaker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CircuitBreaker")
            .field("operation", &self.operation)
            .field("state", &self.state())
            .field("model", &self.model)
            .finish()
    }
}

impl CircuitBreaker {
    /// Creates a closed circuit for `operation`.
    pub fn new(
        operation: OperationId,
        model: Arc<CircuitBreakerModel>,
        listeners: Arc<EventListeners<CircuitBreakerEvent>>,
    ) -> Self {
        let circuit = Circuit::new(model.request_volume_threshold().min(1024));
        Self {
            operation,
            model,
            state_atomic: AtomicU8::new(CircuitState::Closed as u8),
            circuit: Mutex::new(circuit),
            listeners,
        }
    }

    /// The guarded operation.
    pub fn operation(&self) -> &OperationId {
        &self.operation
    }

    /// The policy this circuit enforces.
    pub fn model(&self) -> &Arc<CircuitBreakerModel> {
        &self.model
    }

    /// Current state, read without taking the lock.
    ///
    /// An open circuit whose delay has elapsed still reports
    /// [`CircuitState::Open`] until the next call arrives.
    pub fn state(&self) -> CircuitState {
        CircuitState::from_u8(self.state_atomic.load(Ordering::Acquire))
    }

    /// Returns a consistent snapshot of the rolling window.
    pub fn metrics(&self) -> CircuitMetrics {
        let circuit = self.circuit.lock();
        let window_calls = circuit.window.len();
        let failure_rate = if window_calls > 0 {
            circuit.failures as f64 / window_calls as f64
        } else {
            0.0
        };
        CircuitMetrics {
            state: circuit.state,
            window_calls,
            failure_count: circuit.failures,
            failure_rate,
            consecutive_successes: circuit.consecutive_successes,
            time_since_state_change: circuit.last_state_change.elapsed(),
        }
    }

    /// Decides whether a call may proceed, moving an expired open circuit to
    /// half-open.
    pub fn try_acquire(&self) -> bool {
        let mut circuit = self.circuit.lock();
        if circuit.state == CircuitState::Open {
            if circuit.last_state_change.elapsed() < self.model.delay() {
                self.listeners.emit(&CircuitBreakerEvent::CallRejected {
                    operation: self.operation.to_string(),
                    timestamp: std::time::Instant::now(),
                });
                return false;
            }
            self.transition_to(&mut circuit, CircuitState::HalfOpen);
        }

        self.listeners.emit(&CircuitBreakerEvent::CallPermitted {
            operation: self.operation.to_string(),
            timestamp: std::time::Instant::now(),
            state: circuit.state,
        });
        true
    }

    /// Records a successful outcome.
    pub fn record_success(&self) {
        let mut circuit = self.circuit.lock();
        self.listeners.emit(&CircuitBreakerEvent::SuccessRecorded {
            operation: self.operation.to_string(),
            timestamp: std::time::Instant::now(),
            state: circuit.state,
        });

        match circuit.state {
            CircuitState::Closed => self.push_outcome(&mut circuit, false),
            CircuitState::HalfOpen => {
                circuit.consecutive_successes += 1;
                if circuit.consecutive_successes >= self.model.success_threshold() {
                    self.transition_to(&mut circuit, CircuitState::Closed);
                }
            }
            // A call admitted before the circuit opened.
            CircuitState::Open => {}
        }
    }

    /// Records a failed outcome.
    pub fn record_failure(&self) {
        let mut circuit = self.circuit.lock();
        self.listeners.emit(&CircuitBreakerEvent::FailureRecorded {
            operation: self.operation.to_string(),
            timestamp: std::time::Instant::now(),
            state: circuit.state,
        });

        match circuit.state {
            CircuitState::Closed => self.push_outcome(&mut circuit, true),
            CircuitState::HalfOpen => self.transition_to(&mut circuit, CircuitState::Open),
            CircuitState::Open => {}
        }
    }

    /// Opens the circuit regardless of the window.
    pub fn force_open(&self) {
        let mut circuit = self.circuit.lock();
        self.transition_to(&mut circuit, CircuitState::Open);
    }

    /// Closes the circuit and clears the window.
    pub fn reset(&self) {
        let mut circuit = self.circuit.lock();
        self.transition_to(&mut circuit, CircuitState::Closed);
        circuit.window.clear();
        circuit.failures = 0;
    }

    fn push_outcome(&self, circuit: &mut Circuit, failed: bool) {
        circuit.window.push_back(failed);
        if failed {
            circuit.failures += 1;
        }
        if circuit.window.len() > self.model.request_volume_threshold()
            && circuit.window.pop_front() == Some(true)
        {
            circuit.failures -= 1;
        }

        if circuit.window.len() == self.model.request_volume_threshold() {
            let rate = circuit.failures as f64 / circuit.window.len() as f64;
            if rate >= self.model.failure_ratio() {
                #[cfg(feature = "tracing")]
                tracing::debug!(
                    operation = %self.operation,
                    failure_rate = rate,
                    threshold = self.model.failure_ratio(),
                    "Failure ratio reached"
                );

                self.transition_to(circuit, CircuitState::Open);
            }
        }
    }

    fn transition_to(&self, circuit: &mut Circuit, state: CircuitState) {
        if circuit.state == state {
            return;
        }

        let from_state = circuit.state;
        self.listeners.emit(&CircuitBreakerEvent::StateTransition {
            operation: self.operation.to_string(),
            timestamp: std::time::Instant::now(),
            from_state,
            to_state: state,
        });

        #[cfg(feature = "tracing")]
        tracing::info!(
            operation = %self.operation,
            from = ?from_state,
            to = ?state,
            "Circuit state transition"
        );

        circuit.state = state;
        circuit.last_state_change = Instant::now();
        circuit.window.clear();
        circuit.failures = 0;
        circuit.consecutive_successes = 0;
        self.state_atomic.store(state as u8, Ordering::Release);
    }
}
