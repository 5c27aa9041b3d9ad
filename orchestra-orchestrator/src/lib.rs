//! The Orchestrator (spec §4.6): the end-to-end driver tying the
//! decomposer, registry, and per-subtask retry logic together into one
//! `execute_task` entry point.
//!
//! Mirrors the concurrency shape of `agent-kernel::scheduler::TaskScheduler`
//! in the teacher crate this workspace grew from: a `Semaphore`-backed
//! cap on in-flight work, acquired per unit of work rather than held
//! for the whole batch, so generations can be pipelined up to the
//! configured limit instead of lock-stepping one generation at a time.

#![warn(missing_docs, clippy::pedantic)]

mod aggregate;
mod builtins;
mod history;
mod placeholder;
mod retry;

pub use aggregate::{aggregate, OrchestrationResult, OrchestrationStatus};
pub use history::{TaskHistory, TaskHistoryEntry, HISTORY_CAPACITY};

use std::collections::HashMap;
use std::sync::Arc;

use futures::future::join_all;
use tokio::sync::Semaphore;
use tracing::{info, instrument, warn};

use orchestra_agent::{BaseAgent, ParamMap};
use orchestra_config::OrchestratorConfig;
use orchestra_decomposer::{Decomposer, Subtask};
use orchestra_primitives::{SubtaskId, TaskId};
use orchestra_registry::AgentRegistry;

/// Errors [`Orchestrator::execute_task`] can return before a parent
/// task reaches the aggregation stage (spec §4.6.6's "Decomposition
/// failure" and "Task-level timeout").
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The decomposer's strategy rejected the task's input shape.
    #[error("decomposition failed: {0}")]
    Decomposition(#[from] orchestra_decomposer::Error),

    /// The parent task's overall deadline elapsed before every
    /// generation finished (spec §4.6.6 "Task-level timeout": the
    /// orchestrator stops waiting and returns partial results).
    #[error("task exceeded its {timeout_seconds}s deadline")]
    TaskTimedOut {
        /// Configured deadline that elapsed.
        timeout_seconds: u64,
    },
}

/// A specialized [`Result`] for orchestrator operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Ties together decomposition, generation-wise scheduling, agent
/// selection, per-subtask retry, and result aggregation (spec §4.6
/// "State": a reference to the registry, the decomposer, and the
/// configuration, plus the task history this crate supplements).
pub struct Orchestrator {
    registry: Arc<AgentRegistry>,
    decomposer: Arc<Decomposer>,
    config: OrchestratorConfig,
    history: TaskHistory,
    concurrency: Arc<Semaphore>,
}

impl Orchestrator {
    /// Builds an orchestrator over `registry`/`decomposer` configured
    /// by `config`, including its concurrency cap
    /// (`config.max_parallel_tasks`).
    #[must_use]
    pub fn new(registry: Arc<AgentRegistry>, decomposer: Arc<Decomposer>, config: OrchestratorConfig) -> Self {
        let concurrency = Arc::new(Semaphore::new(config.max_parallel_tasks));
        Self {
            registry,
            decomposer,
            config,
            history: TaskHistory::new(),
            concurrency,
        }
    }

    /// Returns the underlying agent registry.
    #[must_use]
    pub fn registry(&self) -> &Arc<AgentRegistry> {
        &self.registry
    }

    /// Returns the underlying decomposer, e.g. to register additional
    /// strategies before traffic starts.
    #[must_use]
    pub fn decomposer(&self) -> &Arc<Decomposer> {
        &self.decomposer
    }

    /// Returns the retained task history.
    #[must_use]
    pub fn history(&self) -> &TaskHistory {
        &self.history
    }

    /// Executes `task_type`/`input` as a parent task identified by
    /// `task_id` (spec §4.6.1-§4.6.6): built-in operations short-circuit
    /// decomposition entirely; everything else is decomposed, scheduled
    /// generation by generation under the configured parent deadline,
    /// and aggregated into one [`OrchestrationResult`], which is also
    /// recorded into [`Self::history`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::Decomposition`] when the decomposer's strategy
    /// rejects `input`, and [`Error::TaskTimedOut`] when
    /// `config.task_timeout_seconds` elapses before every generation
    /// completes (any subtasks that had already finished are still
    /// recorded into history as a [`OrchestrationStatus::Partial`] or
    /// [`OrchestrationStatus::Failed`] result, not lost).
    #[instrument(skip(self, input), fields(%task_id, task_type))]
    pub async fn execute_task(&self, task_id: TaskId, task_type: &str, input: ParamMap) -> Result<OrchestrationResult> {
        if builtins::is_builtin(task_type) {
            return Ok(self.run_builtin(task_id, task_type, &input));
        }

        let outcome = self.decomposer.decompose(task_type, &input)?;
        let mut warnings = outcome.warnings;
        let grouped = orchestra_decomposer::generations(&outcome.graph);
        if !grouped.unresolved.is_empty() {
            warnings.push(format!(
                "{} subtask(s) left unscheduled after generation grouping: residual cycle?",
                grouped.unresolved.len()
            ));
        }

        let subtasks_by_id: HashMap<SubtaskId, &Subtask> =
            outcome.subtasks.iter().map(|subtask| (subtask.subtask_id.clone(), subtask)).collect();

        let run = self.run_generations(task_id.clone(), &grouped.generations, &subtasks_by_id, warnings.clone());

        let result = match tokio::time::timeout(self.config.task_timeout(), run).await {
            Ok(result) => result,
            Err(_) => {
                warn!(timeout_seconds = self.config.task_timeout_seconds, "parent task deadline elapsed");
                return Err(Error::TaskTimedOut {
                    timeout_seconds: self.config.task_timeout_seconds,
                });
            }
        };

        self.history.record(result.clone());
        info!(status = ?result.status, successful = result.successful, failed = result.failed, "task finished");
        Ok(result)
    }

    async fn run_generations(
        &self,
        task_id: TaskId,
        generations: &[Vec<SubtaskId>],
        subtasks_by_id: &HashMap<SubtaskId, &Subtask>,
        warnings: Vec<String>,
    ) -> OrchestrationResult {
        let mut results: HashMap<SubtaskId, orchestra_agent::TaskResult> = HashMap::new();

        for generation in generations {
            let futures = generation.iter().filter_map(|subtask_id| {
                let subtask = *subtasks_by_id.get(subtask_id)?;
                Some(self.run_subtask(subtask, &results))
            });
            let outcomes = join_all(futures).await;
            for (subtask_id, result) in outcomes {
                results.insert(subtask_id, result);
            }
        }

        aggregate(task_id, results, warnings)
    }

    async fn run_subtask(
        &self,
        subtask: &Subtask,
        results: &HashMap<SubtaskId, orchestra_agent::TaskResult>,
    ) -> (SubtaskId, orchestra_agent::TaskResult) {
        let permit = Arc::clone(&self.concurrency).acquire_owned().await.expect("semaphore never closed");
        let input = placeholder::resolve_inputs(&subtask.input, results);

        let candidate = self.registry.get_agent_for_task(&subtask.task_type, &subtask.requirements);
        let result = match candidate {
            Some(agent) => retry::run_with_retry(&agent, &subtask.subtask_id, &subtask.task_type, input, &self.config).await,
            None => {
                warn!(subtask_id = %subtask.subtask_id, task_type = %subtask.task_type, "no agent available for subtask");
                retry::no_agent_available(&subtask.subtask_id)
            }
        };

        drop(permit);
        (subtask.subtask_id.clone(), result)
    }

    fn run_builtin(&self, task_id: TaskId, task_type: &str, input: &ParamMap) -> OrchestrationResult {
        match builtins::dispatch(task_type, input, &self.registry, &self.decomposer) {
            Ok(value) => {
                let subtask_id = SubtaskId::new(task_type.to_string()).unwrap_or_else(|_| SubtaskId::generate());
                let mut results = HashMap::new();
                results.insert(subtask_id, orchestra_agent::TaskResult::completed(task_id.clone(), value, 0.0));
                let result = aggregate(task_id, results, Vec::new());
                self.history.record(result.clone());
                result
            }
            Err(message) => {
                let subtask_id = SubtaskId::new(task_type.to_string()).unwrap_or_else(|_| SubtaskId::generate());
                let mut results = HashMap::new();
                results.insert(subtask_id, orchestra_agent::TaskResult::failed(task_id.clone(), message, 0.0));
                let result = aggregate(task_id, results, Vec::new());
                self.history.record(result.clone());
                result
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use orchestra_agent::ReferenceAgent;
    use orchestra_primitives::{AgentId, Capability};
    use serde_json::Value;

    fn orchestrator_with(registry: AgentRegistry) -> Orchestrator {
        let mut config = OrchestratorConfig::default();
        config.delegation_timeout_seconds = 2.0;
        config.retry_backoff_base_seconds = 0.001;
        Orchestrator::new(Arc::new(registry), Arc::new(Decomposer::new()), config)
    }

    fn register_capable(registry: &AgentRegistry, agent_type: &str, capability: Capability) -> Arc<dyn BaseAgent> {
        let agent: Arc<dyn BaseAgent> = Arc::new(ReferenceAgent::new(AgentId::random(), agent_type, [capability].into()));
        registry.register(&agent);
        agent
    }

    #[tokio::test]
    async fn pass_through_task_with_no_capable_agent_fails_immediately() {
        let registry = AgentRegistry::default();
        let orchestrator = orchestrator_with(registry);
        let result = orchestrator
            .execute_task(TaskId::new("t-1").unwrap(), "text_analysis", ParamMap::new())
            .await
            .unwrap();
        assert_eq!(result.status, OrchestrationStatus::Failed);
    }

    #[tokio::test]
    async fn data_pipeline_runs_every_generation_to_completion() {
        let registry = AgentRegistry::default();
        let agent = register_capable(&registry, "pipeline-worker", Capability::DataProcessing);
        agent.initialize().await.unwrap();

        let orchestrator = orchestrator_with(registry);
        let mut input = ParamMap::new();
        input.insert("data_source".into(), Value::String("db".into()));
        let result = orchestrator
            .execute_task(TaskId::new("t-2").unwrap(), "data_pipeline", input)
            .await
            .unwrap();

        assert_eq!(result.total_subtasks, 4);
        assert_eq!(result.status, OrchestrationStatus::Completed);
        assert_eq!(orchestrator.history().for_task(&result.task_id).len(), 1);
    }

    #[tokio::test]
    async fn get_agent_status_builtin_bypasses_decomposition() {
        let registry = AgentRegistry::default();
        let agent = register_capable(&registry, "worker", Capability::Analysis);
        agent.initialize().await.unwrap();

        let orchestrator = orchestrator_with(registry);
        let mut input = ParamMap::new();
        input.insert("agent_id".into(), Value::String(agent.id().to_string()));
        let result = orchestrator
            .execute_task(TaskId::new("t-3").unwrap(), "get_agent_status", input)
            .await
            .unwrap();
        assert_eq!(result.status, OrchestrationStatus::Completed);
    }
}
