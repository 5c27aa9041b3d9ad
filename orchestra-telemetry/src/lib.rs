//! Observability plumbing shared by every crate in the orchestration core:
//! `tracing` subscriber initialization and the `HealthSnapshot` type
//! returned by `BaseAgent::heartbeat` and read by `orchestra-registry`'s
//! health map.

#![warn(missing_docs, clippy::pedantic)]

pub mod health;
pub mod tracing_support;

pub use health::HealthSnapshot;
pub use tracing_support::init_tracing;
