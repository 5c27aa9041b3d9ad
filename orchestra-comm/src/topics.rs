//! Topic naming conventions (spec §4.4): `tasks.{agent_id}` for inbound
//! task requests, `tasks.{agent_id}.result` for responses addressed
//! back to the requester, and `agents.event` for the broadcast
//! lifecycle/event channel.

use orchestra_primitives::AgentId;

/// The inbound task-request topic for `agent_id`.
#[must_use]
pub fn tasks_topic(agent_id: AgentId) -> String {
    format!("tasks.{agent_id}")
}

/// The result topic a requester listens on for responses to its own
/// delegations.
#[must_use]
pub fn result_topic(agent_id: AgentId) -> String {
    format!("tasks.{agent_id}.result")
}

/// The process-wide broadcast lifecycle/event channel.
#[must_use]
pub fn agents_event_topic() -> &'static str {
    "agents.event"
}
