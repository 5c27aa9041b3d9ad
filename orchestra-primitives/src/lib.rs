//! Core shared types for the orchestration core: identifiers, the closed
//! capability enumeration, and the error type every other crate builds on.

#![warn(missing_docs, clippy::pedantic)]

mod capability;
mod error;
mod ids;
mod status;

/// The closed capability enumeration, capability sets, and the data-driven
/// task-type implication table.
pub use capability::{
    implied_capabilities, require_known, satisfies_task_type, Capability, CapabilitySet,
};
/// Error type and result alias shared across the orchestration core.
pub use error::{Error, Result};
/// Identifiers for agents, tasks, and subtasks.
pub use ids::{AgentId, SubtaskId, TaskId};
/// The agent status state machine.
pub use status::AgentStatus;
