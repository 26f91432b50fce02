//! Declarative fault tolerance for async Rust.
//!
//! `faultguard` runs guarded operations under the policies declared for
//! them: retry, circuit breaker, timeout, bulkhead and fallback. Policies are
//! described as plain metadata ([`OperationMetadata`]); the
//! [`ExecutionManager`] turns each operation's metadata into a composed
//! execution plan on first use and caches it.
//!
//! # Policies
//!
//! - **Retry** ([`retry`]): re-run failed calls with a fixed delay plus
//!   jitter, bounded by a retry count and a time budget
//! - **Circuit Breaker** ([`circuitbreaker`]): stop calling an operation whose
//!   recent calls mostly failed
//! - **Timeout** ([`timelimiter`]): bound how long one attempt may take
//! - **Bulkhead** ([`bulkhead`]): bound how many calls run at once
//! - **Fallback** ([`fallback`]): substitute a result for handled failures
//!
//! Plans nest outermost first as
//! `Fallback -> Retry -> CircuitBreaker -> Timeout -> Bulkhead -> call`.
//!
//! # Example
//!
//! ```
//! use faultguard::{
//!     BulkheadMetadata, CircuitBreakerMetadata, ExecutionManager, OperationMetadata,
//!     RetryMetadata, TimeoutMetadata,
//! };
//! use faultguard_core::{invocation, operation_id, DurationUnit};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let manager = ExecutionManager::builder().build();
//! let operation = operation_id!(load_profile);
//! let metadata = OperationMetadata::new()
//!     .with_retry(RetryMetadata::new().with_max_retries(2).with_jitter(10, DurationUnit::Millis))
//!     .with_circuit_breaker(CircuitBreakerMetadata::new())
//!     .with_timeout(TimeoutMetadata::new().with_value(250, DurationUnit::Millis))
//!     .with_bulkhead(BulkheadMetadata::new().with_value(8));
//!
//! manager.validate(&operation, &metadata).unwrap();
//!
//! let profile = manager
//!     .execute(&operation, &metadata, invocation(|| async {
//!         Ok::<_, std::io::Error>("profile")
//!     }))
//!     .await
//!     .unwrap();
//! assert_eq!(profile, "profile");
//! # }
//! ```
//!
//! # Feature Flags
//!
//! - `tracing`: structured logging in every policy crate
//! - `serde`: deserialize [`OperationMetadata`] and every policy's metadata

pub use faultguard_bulkhead as bulkhead;
pub use faultguard_circuitbreaker as circuitbreaker;
pub use faultguard_core as core;
pub use faultguard_fallback as fallback;
pub use faultguard_retry as retry;
pub use faultguard_timelimiter as timelimiter;

pub use bulkhead::BulkheadMetadata;
pub use circuitbreaker::CircuitBreakerMetadata;
pub use faultguard_core::{DefinitionError, FaultToleranceError, OperationId};
pub use fallback::{FallbackMetadata, FallbackStrategy};
pub use retry::RetryMetadata;
pub use timelimiter::TimeoutMetadata;

pub use factory::ExecutionPlanFactory;
pub use layer::{FaultTolerant, FaultToleranceLayer};
pub use manager::{ExecutionManager, ExecutionManagerBuilder};
pub use metadata::OperationMetadata;

mod factory;
mod layer;
mod manager;
mod metadata;
