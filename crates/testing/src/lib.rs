//! # provisioner-testing
//!
//! Testing utilities for the provisioning saga: in-memory implementations
//! of every step contract with deterministic outputs, an ordered
//! invocation log, per-operation failure injection, and hang gates for
//! cancellation tests.

pub mod in_memory;
pub mod invocation_log;

pub use in_memory::{FailurePlan, InMemoryProviders};
pub use invocation_log::InvocationLog;
