//! The unit a decomposition strategy emits (spec §3 "Subtask").

use std::collections::BTreeSet;

use orchestra_agent::{ParamMap, Requirements, DEFAULT_PRIORITY};
use orchestra_primitives::SubtaskId;

/// One node of a task's decomposition: a task type to schedule, its
/// input, what it requires of a candidate agent, and which sibling
/// subtasks must complete first.
#[derive(Clone, Debug)]
pub struct Subtask {
    /// Unique within its parent task's decomposition.
    pub subtask_id: SubtaskId,
    /// Task type, fed to agent selection and (if a nested strategy
    /// exists) further decomposition.
    pub task_type: String,
    /// Subtask input, possibly containing unresolved `{{...}}`
    /// placeholders (spec §4.6.3).
    pub input: ParamMap,
    /// Capability/status requirements beyond what `task_type` implies.
    pub requirements: Requirements,
    /// Identifiers of sibling subtasks that must complete first.
    pub dependencies: BTreeSet<SubtaskId>,
    /// Scheduling priority, `1..=10`.
    pub priority: u8,
    /// Author's estimate of wall-clock duration, if known. Advisory
    /// only; the orchestrator does not currently consult it.
    pub estimated_duration_seconds: Option<f64>,
}

impl Subtask {
    /// Builds a subtask with no dependencies and every other field at
    /// its default.
    #[must_use]
    pub fn new(subtask_id: impl Into<String>, task_type: impl Into<String>, input: ParamMap) -> Self {
        Self {
            subtask_id: SubtaskId::new(subtask_id.into()).expect("strategy-assigned subtask id is non-empty"),
            task_type: task_type.into(),
            input,
            requirements: Requirements::none(),
            dependencies: BTreeSet::new(),
            priority: DEFAULT_PRIORITY,
            estimated_duration_seconds: None,
        }
    }

    /// Returns `self` with `dependencies` replacing the current set.
    #[must_use]
    pub fn depends_on<I>(mut self, dependencies: I) -> Self
    where
        I: IntoIterator<Item = SubtaskId>,
    {
        self.dependencies = dependencies.into_iter().collect();
        self
    }

    /// Returns `self` with `requirements` replacing the current value.
    #[must_use]
    pub fn requiring(mut self, requirements: Requirements) -> Self {
        self.requirements = requirements;
        self
    }
}
