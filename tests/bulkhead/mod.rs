//! Bulkhead policy tests.
//!
//! Test organization:
//! - admission.rs: permits, waiting queue and rejection
//! - asynchronous.rs: spawned execution mode
//! - registry.rs: named registration and validation
