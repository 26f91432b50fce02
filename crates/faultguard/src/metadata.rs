//! The declarative policy bundle attached to an operation.

use crate::bulkhead::BulkheadMetadata;
use crate::circuitbreaker::CircuitBreakerMetadata;
use crate::fallback::FallbackMetadata;
use crate::retry::RetryMetadata;
use crate::timelimiter::TimeoutMetadata;

/// Fault tolerance policies declared for one operation.
///
/// Every policy is optional. A policy that is present but disabled is
/// treated as absent when plans are built.
///
/// ```
/// use faultguard::{OperationMetadata, RetryMetadata, TimeoutMetadata};
///
/// let class_level = OperationMetadata::new()
///     .with_retry(RetryMetadata::new().with_max_retries(5))
///     .with_timeout(TimeoutMetadata::new());
/// let operation = OperationMetadata::new()
///     .with_retry(RetryMetadata::new().with_max_retries(1))
///     .inherit(&class_level);
///
/// assert_eq!(operation.retry.as_ref().unwrap().max_retries, 1);
/// assert!(operation.timeout.is_some());
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct OperationMetadata {
    pub retry: Option<RetryMetadata>,
    pub circuit_breaker: Option<CircuitBreakerMetadata>,
    pub timeout: Option<TimeoutMetadata>,
    pub bulkhead: Option<BulkheadMetadata>,
    pub fallback: Option<FallbackMetadata>,
}

impl OperationMetadata {
    /// Creates metadata declaring no policy.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_retry(mut self, retry: RetryMetadata) -> Self {
        self.retry = Some(retry);
        self
    }

    pub fn with_circuit_breaker(mut self, circuit_breaker: CircuitBreakerMetadata) -> Self {
        self.circuit_breaker = Some(circuit_breaker);
        self
    }

    pub fn with_timeout(mut self, timeout: TimeoutMetadata) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_bulkhead(mut self, bulkhead: BulkheadMetadata) -> Self {
        self.bulkhead = Some(bulkhead);
        self
    }

    pub fn with_fallback(mut self, fallback: FallbackMetadata) -> Self {
        self.fallback = Some(fallback);
        self
    }

    /// Returns true if at least one enabled policy is declared.
    pub fn is_guarded(&self) -> bool {
        self.retry().is_some()
            || self.circuit_breaker().is_some()
            || self.timeout().is_some()
            || self.bulkhead().is_some()
            || self.fallback().is_some()
    }

    /// Fills every policy missing here from the declaring type's metadata.
    ///
    /// A policy declared on the operation wins over the type-level one,
    /// even when the operation-level one is disabled.
    pub fn inherit(&self, class_level: &OperationMetadata) -> OperationMetadata {
        OperationMetadata {
            retry: self.retry.clone().or_else(|| class_level.retry.clone()),
            circuit_breaker: self
                .circuit_breaker
                .clone()
                .or_else(|| class_level.circuit_breaker.clone()),
            timeout: self.timeout.clone().or_else(|| class_level.timeout.clone()),
            bulkhead: self.bulkhead.clone().or_else(|| class_level.bulkhead.clone()),
            fallback: self.fallback.clone().or_else(|| class_level.fallback.clone()),
        }
    }

    /// The retry policy, if declared and enabled.
    pub fn retry(&self) -> Option<&RetryMetadata> {
        self.retry.as_ref().filter(|m| m.enabled)
    }

    /// The circuit breaker policy, if declared and enabled.
    pub fn circuit_breaker(&self) -> Option<&CircuitBreakerMetadata> {
        self.circuit_breaker.as_ref().filter(|m| m.enabled)
    }

    /// The timeout policy, if declared and enabled.
    pub fn timeout(&self) -> Option<&TimeoutMetadata> {
        self.timeout.as_ref().filter(|m| m.enabled)
    }

    /// The bulkhead policy, if declared and enabled.
    pub fn bulkhead(&self) -> Option<&BulkheadMetadata> {
        self.bulkhead.as_ref().filter(|m| m.enabled)
    }

    /// The fallback policy, if declared and enabled.
    pub fn fallback(&self) -> Option<&FallbackMetadata> {
        self.fallback.as_ref().filter(|m| m.enabled)
    }
}
