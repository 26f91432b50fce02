//! Core infrastructure for faultguard.
//!
//! This crate provides the pieces every policy crate builds on:
//! - [`OperationId`], the cache key shared by every manager and the plan cache
//! - [`FailureKind`], [`Classify`] and [`FailureSet`] for `retryOn`/`abortOn` style matching
//! - [`FaultToleranceError`] and [`DefinitionError`], the error taxonomy
//! - [`ExecutionPlan`], the contract every policy layer implements
//! - the event system used for observability

pub mod error;
pub mod events;
pub mod identity;
pub mod kind;
pub mod plan;
pub mod unit;

pub use error::{DefinitionError, FaultToleranceError};
pub use events::{EventListener, EventListeners, FnListener, PolicyEvent};
pub use identity::OperationId;
pub use kind::{Classify, FailureKind, FailureSet};
pub use plan::{invocation, ExecutionPlan, Invocation, PlanFuture, Proceed, SharedPlan};
pub use unit::DurationUnit;
