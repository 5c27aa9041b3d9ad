//! The unit of work a `BaseAgent` executes, and the result shape every
//! execution path (direct, delegated, or decomposed) converges on.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use orchestra_primitives::{Capability, TaskId};

/// A JSON object used for task inputs, outputs, and configuration maps.
/// Spec §3 calls these "input map" / "configuration map"; we represent
/// them with `serde_json::Map` rather than a typed struct because the
/// core is generic over whatever payload shape a concrete agent expects.
pub type ParamMap = Map<String, Value>;

/// Default task priority (spec §3, "optional priority... default 5").
pub const DEFAULT_PRIORITY: u8 = 5;
/// Default per-task timeout in seconds (spec §3 / §6).
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 300;
/// Default retry budget (spec §3 / §6).
pub const DEFAULT_RETRIES: u32 = 3;

/// A task submitted to the orchestrator, or a subtask forwarded to an
/// agent for direct execution.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Task {
    /// Unique identifier, assigned by the caller or generated.
    pub task_id: TaskId,
    /// The operation name. Spec §9 standardizes on `task_type`, reading
    /// `operation` as a synonym when `task_type` is absent; the `serde`
    /// alias below gives inbound task maps that fallback for free.
    #[serde(alias = "operation")]
    pub task_type: String,
    /// Task input, keyed by field name.
    #[serde(default)]
    pub input: ParamMap,
    /// Priority in `1..=10`; higher runs preferentially where a caller
    /// imposes ordering beyond generation order. Defaults to `5`.
    #[serde(default = "default_priority")]
    pub priority: u8,
    /// Deadline in seconds for this task. Defaults to `300`.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
    /// Maximum retry attempts for this task. Defaults to `3`.
    #[serde(default = "default_retries")]
    pub max_retries: u32,
}

const fn default_priority() -> u8 {
    DEFAULT_PRIORITY
}

const fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT_SECONDS
}

const fn default_retries() -> u32 {
    DEFAULT_RETRIES
}

impl Task {
    /// Builds a task with an explicit identifier and the given
    /// `task_type`/input, taking every other field at its default.
    #[must_use]
    pub fn new(task_id: TaskId, task_type: impl Into<String>, input: ParamMap) -> Self {
        Self {
            task_id,
            task_type: task_type.into(),
            input,
            priority: DEFAULT_PRIORITY,
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
            max_retries: DEFAULT_RETRIES,
        }
    }

    /// Returns a sensible priority, clamped to `1..=10`.
    #[must_use]
    pub fn clamped_priority(&self) -> u8 {
        self.priority.clamp(1, 10)
    }
}

/// The disposition of a completed execution attempt.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// The task ran to completion successfully.
    Completed,
    /// The task ran and failed, or could not be started.
    Failed,
    /// A deadline elapsed before a result arrived (delegation or subtask
    /// retry boundary; spec §4.4 step 6 / §4.6.4 step 4).
    Timeout,
}

impl TaskStatus {
    /// Returns `true` for [`TaskStatus::Completed`].
    #[must_use]
    pub const fn is_success(self) -> bool {
        matches!(self, Self::Completed)
    }
}

/// Result of executing a [`Task`], in the shape every consumer of the
/// core (`BaseAgent::execute_task`, `delegate_task`, subtask retry,
/// aggregation) reads: `task_id`, `status`, and either `result` or
/// `error`, plus whatever agent-specific fields the implementation adds.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TaskResult {
    /// Identifier copied from the originating task's `task_id`.
    pub task_id: TaskId,
    /// Completion disposition.
    pub status: TaskStatus,
    /// Present when `status == Completed`.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub result: Option<Value>,
    /// Present when `status != Completed`.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub error: Option<String>,
    /// Wall-clock execution time, when the caller measured one.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub execution_time_seconds: Option<f64>,
    /// Agent-specific fields beyond the required shape.
    #[serde(flatten)]
    pub extra: ParamMap,
}

impl TaskResult {
    /// Builds a successful result.
    #[must_use]
    pub fn completed(task_id: TaskId, result: Value, execution_time_seconds: f64) -> Self {
        Self {
            task_id,
            status: TaskStatus::Completed,
            result: Some(result),
            error: None,
            execution_time_seconds: Some(execution_time_seconds),
            extra: ParamMap::new(),
        }
    }

    /// Builds a failed result.
    #[must_use]
    pub fn failed(task_id: TaskId, error: impl Into<String>, execution_time_seconds: f64) -> Self {
        Self {
            task_id,
            status: TaskStatus::Failed,
            result: None,
            error: Some(error.into()),
            execution_time_seconds: Some(execution_time_seconds),
            extra: ParamMap::new(),
        }
    }

    /// Builds a timed-out result, per the shape `delegate_task` returns
    /// on expiry (spec §4.4 step 6): `{status: timeout, error: "timeout"}`.
    #[must_use]
    pub fn timeout(task_id: TaskId) -> Self {
        Self {
            task_id,
            status: TaskStatus::Timeout,
            result: None,
            error: Some("timeout".to_string()),
            execution_time_seconds: None,
            extra: ParamMap::new(),
        }
    }

    /// Returns `true` when [`Self::status`] is [`TaskStatus::Completed`].
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status.is_success()
    }
}

/// The requirement side of `can_handle`'s second argument (spec §3,
/// "requirement map (e.g., required capabilities, status floor)").
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Requirements {
    /// Capabilities the candidate must declare *all* of, in addition to
    /// whatever the task type already implies (see
    /// `BaseAgent::can_handle`'s default implementation). Empty means no
    /// additional constraint.
    #[serde(default)]
    pub capabilities: BTreeSet<Capability>,
    /// When `true`, the candidate must be exactly `Idle`, not merely
    /// `Working` (the status floor spec §3 gestures at).
    #[serde(default)]
    pub requires_idle: bool,
}

impl Requirements {
    /// Requirements with no additional constraints.
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    /// Requirements demanding the given additional capabilities.
    #[must_use]
    pub fn with_capabilities(capabilities: impl IntoIterator<Item = Capability>) -> Self {
        Self {
            capabilities: capabilities.into_iter().collect(),
            requires_idle: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_defaults_match_spec() {
        let task = Task::new(TaskId::new("t-1").unwrap(), "text_analysis", ParamMap::new());
        assert_eq!(task.priority, 5);
        assert_eq!(task.timeout_seconds, 300);
        assert_eq!(task.max_retries, 3);
    }

    #[test]
    fn completed_result_carries_execution_time() {
        let result = TaskResult::completed(TaskId::new("t-1").unwrap(), Value::Bool(true), 1.5);
        assert!(result.is_success());
        assert_eq!(result.execution_time_seconds, Some(1.5));
    }

    #[test]
    fn timeout_result_matches_documented_shape() {
        let result = TaskResult::timeout(TaskId::new("t-1").unwrap());
        assert_eq!(result.status, TaskStatus::Timeout);
        assert_eq!(result.error.as_deref(), Some("timeout"));
    }
}
