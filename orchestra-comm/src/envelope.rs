//! The message envelope transported over the bus between communicating
//! agents (spec §3 "Message envelope"), and the response wrapper
//! correlating a delivered [`TaskResult`] back to its pending request.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use orchestra_primitives::{AgentId, TaskId};

/// A delegated task request, carried on `tasks.{target}` (spec §3).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MessageEnvelope {
    /// Correlates this request with its eventual response.
    pub message_id: String,
    /// Identifier assigned to the delegated task.
    pub task_id: TaskId,
    /// Operation name, fed to the receiver's handler registry.
    pub task_type: String,
    /// Task parameters.
    pub parameters: Value,
    /// Priority carried through unchanged to the receiver.
    pub priority: u8,
    /// Topic the receiver should publish its response to.
    pub reply_topic: String,
    /// Identifier of the requesting agent.
    pub sender_id: AgentId,
    /// Milliseconds since the Unix epoch when the envelope was built.
    pub timestamp_millis: i64,
}

/// The response counterpart, carried on the envelope's `reply_topic`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    /// Matches the originating [`MessageEnvelope::message_id`].
    pub message_id: String,
    /// The delegated task's outcome.
    pub result: orchestra_agent::TaskResult,
}
