//! The Base Agent contract (spec §4.2): the trait every worker plugged
//! into the orchestration core must satisfy.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use orchestra_primitives::{satisfies_task_type, AgentId, AgentStatus, CapabilitySet};
use orchestra_telemetry::HealthSnapshot;

use crate::metrics::AgentMetricsSnapshot;
use crate::task::{Requirements, Task, TaskResult};

/// Errors an agent can raise outside the normal `TaskResult` failure
/// channel: bootstrap failure during [`BaseAgent::initialize`].
#[derive(Debug, Error)]
pub enum AgentError {
    /// Bootstrap validation (resources, dependencies, self-test) failed.
    #[error("agent {agent_id} failed to initialize: {reason}")]
    InitializationFailed {
        /// Agent that failed to come up.
        agent_id: AgentId,
        /// Human-readable cause.
        reason: String,
    },
}

/// The contract every worker agent implements (spec §4.2).
///
/// Implementations are expected to serialize their own concurrency: the
/// orchestration core never calls [`BaseAgent::execute_task`] again on the
/// same logical identity before a prior call returns (spec §4.2's "never
/// runs more than one task at a time on a single logical identity"
/// invariant) and [`BaseAgent::status`] is expected to reflect
/// `Working` for the duration of that call.
#[async_trait]
pub trait BaseAgent: Send + Sync {
    /// Stable identifier for this agent.
    fn id(&self) -> AgentId;

    /// Free-form type tag (e.g. `"text-worker"`), used for the
    /// registry's by-type index; distinct from `task_type`.
    fn agent_type(&self) -> &str;

    /// Declared capability set.
    fn capabilities(&self) -> &CapabilitySet;

    /// Current lifecycle status.
    fn status(&self) -> AgentStatus;

    /// When this agent was constructed (spec §3 Agent "creation timestamp").
    fn created_at(&self) -> DateTime<Utc>;

    /// When this agent last started executing a task, if ever (spec §3
    /// Agent "last-active timestamp").
    fn last_active_at(&self) -> Option<DateTime<Utc>>;

    /// Performs bootstrap validation, moving
    /// `Initializing -> Validating -> {Idle | Error}`.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::InitializationFailed`] when bootstrap fails;
    /// implementations must also move their own status to
    /// [`AgentStatus::Error`] in that case.
    async fn initialize(&self) -> Result<(), AgentError>;

    /// Executes one task. Implementations must move to
    /// [`AgentStatus::Working`] before starting and restore
    /// [`AgentStatus::Idle`] (or [`AgentStatus::Error`]) on completion,
    /// update the running counters, and copy `task.task_id` into the
    /// returned [`TaskResult`].
    async fn execute_task(&self, task: Task) -> TaskResult;

    /// Returns `true` iff this agent's declared capabilities satisfy
    /// what `task_type` implies, combined with any explicit
    /// `requirements`.
    ///
    /// The default implementation checks two independent conditions,
    /// both of which must hold: a non-empty intersection between the
    /// declared capabilities and the implied set from the shared,
    /// data-driven task-type table (`orchestra_primitives::implied_capabilities`),
    /// and, when `requirements.capabilities` is non-empty, that the
    /// declared capabilities are a *superset* of it (every explicitly
    /// required capability must be declared, not merely one of them).
    /// The status floor in `requirements.requires_idle` is checked
    /// first and short-circuits both.
    fn can_handle(&self, task_type: &str, requirements: &Requirements) -> bool {
        if !self.status().accepts_work() {
            return false;
        }
        if requirements.requires_idle && self.status() != AgentStatus::Idle {
            return false;
        }
        if !requirements.capabilities.is_empty() {
            let declared = self.capabilities();
            let declares_all_required = requirements
                .capabilities
                .iter()
                .all(|needed| declared.contains(needed));
            if !declares_all_required {
                return false;
            }
        }
        satisfies_task_type(self.capabilities(), task_type)
    }

    /// Returns a health snapshot: current status, success rate, and
    /// average task duration.
    fn heartbeat(&self) -> HealthSnapshot;

    /// Returns the raw running counters backing [`BaseAgent::heartbeat`].
    fn metrics(&self) -> AgentMetricsSnapshot;
}
