//! Engine tests: composed plans, plan caching and the tower adapter.
//!
//! Test organization:
//! - composition.rs: policy nesting order and interplay
//! - circuit.rs: circuit breaker behavior through the engine
//! - definitions.rs: validation and cache failure modes
//! - service.rs: guarding tower services

mod composition;
mod definitions;
mod service;
mod support;
