//! Error taxonomy.
//!
//! Two families of errors exist:
//!
//! - [`DefinitionError`]: policy metadata violates an invariant. Raised when
//!   a model is built, before any guarded call runs, and never retried.
//! - [`FaultToleranceError`]: what a caller of a guarded operation sees. It
//!   is either the operation's own failure ([`FaultToleranceError::Operation`])
//!   or a failure naming the policy boundary that was hit.
//!
//! # Pattern Matching
//!
//! ```rust
//! use faultguard_core::FaultToleranceError;
//!
//! # #[derive(Debug)]
//! # struct AppError;
//! fn report(error: &FaultToleranceError<AppError>) -> &'static str {
//!     match error {
//!         FaultToleranceError::Operation(_) => "operation failed",
//!         FaultToleranceError::RetryExhausted { .. } => "gave up after retrying",
//!         FaultToleranceError::Aborted { .. } => "failure was not retryable",
//!         FaultToleranceError::DeadlineExceeded { .. } => "ran out of time retrying",
//!         FaultToleranceError::BulkheadFull { .. } => "too many concurrent calls",
//!         FaultToleranceError::CircuitOpen { .. } => "circuit is open",
//!         FaultToleranceError::Timeout { .. } => "call timed out",
//!         FaultToleranceError::Interrupted => "queued work was cancelled",
//!         FaultToleranceError::Definition(_) => "invalid policy metadata",
//!     }
//! }
//! ```

use crate::identity::OperationId;
use crate::kind::{Classify, FailureKind};
use std::fmt;
use std::time::Duration;

/// Policy metadata violates an invariant.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DefinitionError {
    /// A numeric field was negative.
    #[error("{policy}: {field} can't be negative")]
    Negative {
        /// Policy the field belongs to.
        policy: &'static str,
        /// Offending field.
        field: &'static str,
    },

    /// A duration does not fit in the supported range.
    #[error("{policy}: {field} is out of the representable duration range")]
    Overflow {
        /// Policy the field belongs to.
        policy: &'static str,
        /// Offending field.
        field: &'static str,
    },

    /// A retry delay is longer than the retry max duration.
    #[error("retry: delay ({delay:?}) can't be greater than max duration ({max_duration:?})")]
    DelayExceedsMaxDuration {
        /// Configured delay.
        delay: Duration,
        /// Configured max duration.
        max_duration: Duration,
    },

    /// A field is outside its allowed range.
    #[error("{policy}: {field} {reason}")]
    OutOfRange {
        /// Policy the field belongs to.
        policy: &'static str,
        /// Offending field.
        field: &'static str,
        /// What the field must satisfy.
        reason: &'static str,
    },

    /// A bulkhead with this name is already registered.
    #[error("bulkhead '{name}' is already registered")]
    DuplicateBulkhead {
        /// Bulkhead name.
        name: String,
    },

    /// A fallback policy is declared but no handler was registered.
    #[error("no fallback handler registered for {operation}")]
    MissingFallbackHandler {
        /// Operation declaring the fallback.
        operation: OperationId,
    },

    /// The identity is already bound to a plan or handler of another type.
    #[error("{operation} is already bound to a different result or error type")]
    PlanTypeMismatch {
        /// Colliding operation.
        operation: OperationId,
    },

    /// Adds the operation identity to a definition error.
    #[error("invalid fault tolerance definition for {operation}: {source}")]
    InOperation {
        /// Operation whose metadata is invalid.
        operation: OperationId,
        /// Underlying problem.
        #[source]
        source: Box<DefinitionError>,
    },
}

impl DefinitionError {
    /// Checks that a signed metadata count is not negative.
    pub fn non_negative(value: i64, policy: &'static str, field: &'static str) -> Result<u64, Self> {
        u64::try_from(value).map_err(|_| DefinitionError::Negative { policy, field })
    }

    /// Attaches the operation identity, unless one is already attached.
    pub fn in_operation(self, operation: &OperationId) -> Self {
        match self {
            DefinitionError::InOperation { .. } => self,
            other => DefinitionError::InOperation {
                operation: operation.clone(),
                source: Box::new(other),
            },
        }
    }

    /// Returns the error without its operation context.
    pub fn root(&self) -> &DefinitionError {
        match self {
            DefinitionError::InOperation { source, .. } => source.root(),
            other => other,
        }
    }
}

/// Error returned by a guarded operation.
///
/// `E` is the operation's own error type. Retry outcomes wrap the last
/// failure in `source`, so callers can tell which policy boundary was hit
/// and still reach the underlying failure through
/// [`operation_error`](Self::operation_error).
#[derive(Debug, Clone)]
pub enum FaultToleranceError<E> {
    /// The underlying operation failed.
    Operation(E),

    /// Retrying stopped because the failure was not retryable.
    Aborted {
        /// Attempts made, including the initial one.
        attempts: usize,
        /// The failure that stopped the loop.
        source: Box<FaultToleranceError<E>>,
    },

    /// Every allowed retry failed.
    RetryExhausted {
        /// Attempts made, including the initial one.
        attempts: usize,
        /// The last failure.
        source: Box<FaultToleranceError<E>>,
    },

    /// The retry max duration elapsed.
    DeadlineExceeded {
        /// Attempts made, including the initial one.
        attempts: usize,
        /// Time spent since the logical call started.
        elapsed: Duration,
        /// The last failure.
        source: Box<FaultToleranceError<E>>,
    },

    /// A bulkhead rejected the call.
    BulkheadFull {
        /// Bulkhead name.
        bulkhead: String,
        /// Maximum concurrent executions.
        max_concurrent: usize,
        /// Maximum queued executions.
        max_waiting: usize,
    },

    /// A circuit breaker rejected the call.
    CircuitOpen {
        /// Guarded operation.
        operation: OperationId,
    },

    /// The call did not complete in time.
    Timeout {
        /// The configured timeout.
        timeout: Duration,
    },

    /// Queued asynchronous work was cancelled before completing.
    Interrupted,

    /// Policy metadata for the operation was invalid.
    Definition(DefinitionError),
}

impl<E> FaultToleranceError<E> {
    /// Returns `true` if this is the operation's own failure.
    pub fn is_operation(&self) -> bool {
        matches!(self, FaultToleranceError::Operation(_))
    }

    /// Returns `true` if retrying was aborted.
    pub fn is_aborted(&self) -> bool {
        matches!(self, FaultToleranceError::Aborted { .. })
    }

    /// Returns `true` if retries were exhausted.
    pub fn is_retry_exhausted(&self) -> bool {
        matches!(self, FaultToleranceError::RetryExhausted { .. })
    }

    /// Returns `true` if the retry deadline passed.
    pub fn is_deadline_exceeded(&self) -> bool {
        matches!(self, FaultToleranceError::DeadlineExceeded { .. })
    }

    /// Returns `true` if a bulkhead rejected the call.
    pub fn is_bulkhead_full(&self) -> bool {
        matches!(self, FaultToleranceError::BulkheadFull { .. })
    }

    /// Returns `true` if a circuit breaker rejected the call.
    pub fn is_circuit_open(&self) -> bool {
        matches!(self, FaultToleranceError::CircuitOpen { .. })
    }

    /// Returns `true` if the call timed out.
    pub fn is_timeout(&self) -> bool {
        matches!(self, FaultToleranceError::Timeout { .. })
    }

    /// Returns `true` if the metadata was invalid.
    pub fn is_definition(&self) -> bool {
        matches!(self, FaultToleranceError::Definition(_))
    }

    /// Number of attempts recorded by a retry outcome.
    pub fn attempts(&self) -> Option<usize> {
        match self {
            FaultToleranceError::Aborted { attempts, .. }
            | FaultToleranceError::RetryExhausted { attempts, .. }
            | FaultToleranceError::DeadlineExceeded { attempts, .. } => Some(*attempts),
            _ => None,
        }
    }

    /// The failure wrapped by a retry outcome.
    pub fn wrapped(&self) -> Option<&FaultToleranceError<E>> {
        match self {
            FaultToleranceError::Aborted { source, .. }
            | FaultToleranceError::RetryExhausted { source, .. }
            | FaultToleranceError::DeadlineExceeded { source, .. } => Some(source),
            _ => None,
        }
    }

    /// The innermost failure, after unwrapping retry outcomes.
    pub fn root(&self) -> &FaultToleranceError<E> {
        match self.wrapped() {
            Some(inner) => inner.root(),
            None => self,
        }
    }

    /// The operation's own failure, if one is at the root.
    pub fn operation_error(&self) -> Option<&E> {
        match self.root() {
            FaultToleranceError::Operation(e) => Some(e),
            _ => None,
        }
    }

    /// Consumes the error, returning the operation's own failure if one is at the root.
    pub fn into_operation_error(self) -> Option<E> {
        match self {
            FaultToleranceError::Operation(e) => Some(e),
            FaultToleranceError::Aborted { source, .. }
            | FaultToleranceError::RetryExhausted { source, .. }
            | FaultToleranceError::DeadlineExceeded { source, .. } => source.into_operation_error(),
            _ => None,
        }
    }

    /// Maps the operation error type, preserving the policy structure.
    ///
    /// ```
    /// use faultguard_core::FaultToleranceError;
    ///
    /// let err: FaultToleranceError<String> = FaultToleranceError::Operation("boom".to_string());
    /// let mapped = err.map_operation(|s| s.len());
    /// assert_eq!(mapped.operation_error(), Some(&4));
    /// ```
    pub fn map_operation<F, U>(self, f: F) -> FaultToleranceError<U>
    where
        F: FnOnce(E) -> U,
    {
        match self {
            FaultToleranceError::Operation(e) => FaultToleranceError::Operation(f(e)),
            FaultToleranceError::Aborted { attempts, source } => FaultToleranceError::Aborted {
                attempts,
                source: Box::new(source.map_operation(f)),
            },
            FaultToleranceError::RetryExhausted { attempts, source } => {
                FaultToleranceError::RetryExhausted {
                    attempts,
                    source: Box::new(source.map_operation(f)),
                }
            }
            FaultToleranceError::DeadlineExceeded {
                attempts,
                elapsed,
                source,
            } => FaultToleranceError::DeadlineExceeded {
                attempts,
                elapsed,
                source: Box::new(source.map_operation(f)),
            },
            FaultToleranceError::BulkheadFull {
                bulkhead,
                max_concurrent,
                max_waiting,
            } => FaultToleranceError::BulkheadFull {
                bulkhead,
                max_concurrent,
                max_waiting,
            },
            FaultToleranceError::CircuitOpen { operation } => {
                FaultToleranceError::CircuitOpen { operation }
            }
            FaultToleranceError::Timeout { timeout } => FaultToleranceError::Timeout { timeout },
            FaultToleranceError::Interrupted => FaultToleranceError::Interrupted,
            FaultToleranceError::Definition(e) => FaultToleranceError::Definition(e),
        }
    }
}

impl<E> From<DefinitionError> for FaultToleranceError<E> {
    fn from(err: DefinitionError) -> Self {
        FaultToleranceError::Definition(err)
    }
}

impl<E: fmt::Display> fmt::Display for FaultToleranceError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FaultToleranceError::Operation(e) => write!(f, "operation failed: {}", e),
            FaultToleranceError::Aborted { attempts, source } => {
                write!(f, "retry aborted after {} attempt(s): {}", attempts, source)
            }
            FaultToleranceError::RetryExhausted { attempts, source } => {
                write!(f, "retries exhausted after {} attempt(s): {}", attempts, source)
            }
            FaultToleranceError::DeadlineExceeded {
                attempts,
                elapsed,
                source,
            } => write!(
                f,
                "retry deadline exceeded after {} attempt(s) in {:?}: {}",
                attempts, elapsed, source
            ),
            FaultToleranceError::BulkheadFull {
                bulkhead,
                max_concurrent,
                max_waiting,
            } => write!(
                f,
                "bulkhead '{}' is full ({} running, {} waiting)",
                bulkhead, max_concurrent, max_waiting
            ),
            FaultToleranceError::CircuitOpen { operation } => {
                write!(f, "circuit breaker for {} is open", operation)
            }
            FaultToleranceError::Timeout { timeout } => {
                write!(f, "timed out after {:?}", timeout)
            }
            FaultToleranceError::Interrupted => write!(f, "queued execution was interrupted"),
            FaultToleranceError::Definition(e) => write!(f, "{}", e),
        }
    }
}

impl<E> std::error::Error for FaultToleranceError<E>
where
    E: std::error::Error + 'static,
{
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FaultToleranceError::Operation(e) => Some(e),
            FaultToleranceError::Aborted { source, .. }
            | FaultToleranceError::RetryExhausted { source, .. }
            | FaultToleranceError::DeadlineExceeded { source, .. } => Some(source.as_ref()),
            FaultToleranceError::Definition(e) => Some(e),
            _ => None,
        }
    }
}

impl<E: Classify> Classify for FaultToleranceError<E> {
    fn kind(&self) -> FailureKind {
        match self {
            FaultToleranceError::Operation(e) => e.kind(),
            FaultToleranceError::Aborted { .. } => FailureKind::RETRY_ABORTED,
            FaultToleranceError::RetryExhausted { .. } => FailureKind::RETRY_EXHAUSTED,
            FaultToleranceError::DeadlineExceeded { .. } => FailureKind::DEADLINE_EXCEEDED,
            FaultToleranceError::BulkheadFull { .. } => FailureKind::BULKHEAD_FULL,
            FaultToleranceError::CircuitOpen { .. } => FailureKind::CIRCUIT_OPEN,
            FaultToleranceError::Timeout { .. } => FailureKind::TIMEOUT,
            FaultToleranceError::Interrupted => FailureKind::INTERRUPTED,
            FaultToleranceError::Definition(_) => FailureKind::DEFINITION,
        }
    }

    fn cause_kind(&self) -> Option<FailureKind> {
        match self {
            FaultToleranceError::Operation(e) => e.cause_kind(),
            FaultToleranceError::Aborted { source, .. }
            | FaultToleranceError::RetryExhausted { source, .. }
            | FaultToleranceError::DeadlineExceeded { source, .. } => Some(source.kind()),
            _ => None,
        }
    }
}
