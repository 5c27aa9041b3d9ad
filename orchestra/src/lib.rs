//! Multi-agent task orchestration core facade.
//!
//! Depend on this crate via `cargo add orchestra`. It bundles the
//! per-component crates behind feature flags so a downstream binary can
//! pull in only the pieces it needs — e.g. a standalone agent process
//! wants `agent` and `comm` without the decomposer or orchestrator.

#![warn(missing_docs, clippy::pedantic)]

/// Shared identifiers, capabilities, and agent status (always present).
pub use orchestra_primitives as primitives;

/// The publish/subscribe Message Bus (enabled by the `bus` feature).
#[cfg(feature = "bus")]
pub use orchestra_bus as bus;

/// The Base Agent contract, task/result types, and reference agent
/// (enabled by the `agent` feature).
#[cfg(feature = "agent")]
pub use orchestra_agent as agent;

/// The Agent Registry (enabled by the `registry` feature).
#[cfg(feature = "registry")]
pub use orchestra_registry as registry;

/// Request/response delegation and broadcast over the message bus
/// (enabled by the `comm` feature).
#[cfg(feature = "comm")]
pub use orchestra_comm as comm;

/// The task-handler registry used to wire concrete task logic into an
/// agent (enabled by the `handlers` feature).
#[cfg(feature = "handlers")]
pub use orchestra_handlers as handlers;

/// The Task Decomposer and its named strategies (enabled by the
/// `decomposer` feature).
#[cfg(feature = "decomposer")]
pub use orchestra_decomposer as decomposer;

/// The end-to-end Orchestrator (enabled by the `orchestrator` feature).
#[cfg(feature = "orchestrator")]
pub use orchestra_orchestrator as orchestrator;

/// Typed configuration (enabled by the `config` feature).
#[cfg(feature = "config")]
pub use orchestra_config as config;

/// Health snapshots and tracing setup (enabled by the `telemetry`
/// feature).
#[cfg(feature = "telemetry")]
pub use orchestra_telemetry as telemetry;
