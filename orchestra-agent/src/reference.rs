//! An in-memory [`BaseAgent`] implementation used by this crate's own
//! tests and by `orchestra-orchestrator`'s integration tests. Not meant
//! for production payload logic (spec §1: "any specific agent's payload
//! logic ... NLP/code/data/compression engines" is out of scope for the
//! core) — only to exercise the contract end to end.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;

use orchestra_primitives::{AgentId, AgentStatus, CapabilitySet};
use orchestra_telemetry::HealthSnapshot;

use crate::agent::{AgentError, BaseAgent};
use crate::metrics::{AgentMetrics, AgentMetricsSnapshot};
use crate::status_cell::StatusCell;
use crate::task::{Task, TaskResult};

/// A function computing an outcome from a task's input, returning the
/// `result` payload on success or an error message on failure.
pub type ReferenceHandler = Arc<dyn Fn(&Task) -> Result<Value, String> + Send + Sync>;

/// A minimal, fully in-memory agent: echoes its input back as the
/// result unless given a different handler, and optionally sleeps
/// before completing (to exercise timeout paths in tests).
pub struct ReferenceAgent {
    id: AgentId,
    agent_type: String,
    capabilities: CapabilitySet,
    status: StatusCell,
    metrics: AgentMetrics,
    delay: Duration,
    handler: ReferenceHandler,
    created_at: DateTime<Utc>,
    last_active: Mutex<Option<DateTime<Utc>>>,
}

impl ReferenceAgent {
    /// Builds a reference agent that echoes its input as the result.
    #[must_use]
    pub fn new(id: AgentId, agent_type: impl Into<String>, capabilities: CapabilitySet) -> Self {
        Self {
            id,
            agent_type: agent_type.into(),
            capabilities,
            status: StatusCell::new(id),
            metrics: AgentMetrics::new(),
            delay: Duration::ZERO,
            handler: Arc::new(|task: &Task| Ok(Value::Object(task.input.clone()))),
            created_at: Utc::now(),
            last_active: Mutex::new(None),
        }
    }

    /// Overrides the outcome-producing handler.
    #[must_use]
    pub fn with_handler(mut self, handler: ReferenceHandler) -> Self {
        self.handler = handler;
        self
    }

    /// Makes the agent always fail with the given message.
    #[must_use]
    pub fn always_failing(self, reason: impl Into<String> + Send + Sync + Clone + 'static) -> Self {
        self.with_handler(Arc::new(move |_task: &Task| Err(reason.clone().into())))
    }

    /// Adds a fixed delay before every execution completes, to exercise
    /// deadline/timeout behavior in tests.
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

#[async_trait]
impl BaseAgent for ReferenceAgent {
    fn id(&self) -> AgentId {
        self.id
    }

    fn agent_type(&self) -> &str {
        &self.agent_type
    }

    fn capabilities(&self) -> &CapabilitySet {
        &self.capabilities
    }

    fn status(&self) -> AgentStatus {
        self.status.get()
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn last_active_at(&self) -> Option<DateTime<Utc>> {
        *self.last_active.lock().expect("last-active lock poisoned")
    }

    async fn initialize(&self) -> Result<(), AgentError> {
        self.status
            .transition(AgentStatus::Validating)
            .map_err(|err| AgentError::InitializationFailed {
                agent_id: self.id,
                reason: err.to_string(),
            })?;
        self.status
            .transition(AgentStatus::Idle)
            .map_err(|err| AgentError::InitializationFailed {
                agent_id: self.id,
                reason: err.to_string(),
            })?;
        Ok(())
    }

    async fn execute_task(&self, task: Task) -> TaskResult {
        let _ = self.status.transition(AgentStatus::Working);
        *self.last_active.lock().expect("last-active lock poisoned") = Some(Utc::now());

        if self.delay > Duration::ZERO {
            tokio::time::sleep(self.delay).await;
        }

        let start = Instant::now();
        let outcome = (self.handler)(&task);
        let elapsed = start.elapsed().as_secs_f64();

        self.metrics.record(outcome.is_ok(), elapsed);
        let _ = self.status.transition(AgentStatus::Idle);

        match outcome {
            Ok(value) => TaskResult::completed(task.task_id, value, elapsed),
            Err(error) => TaskResult::failed(task.task_id, error, elapsed),
        }
    }

    fn heartbeat(&self) -> HealthSnapshot {
        self.metrics.health(self.status())
    }

    fn metrics(&self) -> AgentMetricsSnapshot {
        self.metrics.snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::{ParamMap, Requirements};
    use orchestra_primitives::{Capability, TaskId};

    fn capabilities() -> CapabilitySet {
        [Capability::Analysis].into()
    }

    #[tokio::test]
    async fn initialize_then_execute_round_trip() {
        let agent = ReferenceAgent::new(AgentId::random(), "analysis-worker", capabilities());
        agent.initialize().await.unwrap();
        assert_eq!(agent.status(), AgentStatus::Idle);

        let mut input = ParamMap::new();
        input.insert("text".into(), Value::String("hello".into()));
        let task = Task::new(TaskId::new("t-1").unwrap(), "text_analysis", input.clone());

        let result = agent.execute_task(task).await;
        assert!(result.is_success());
        assert_eq!(result.result, Some(Value::Object(input)));
        assert_eq!(agent.status(), AgentStatus::Idle);
        assert_eq!(agent.metrics().attempts, 1);
    }

    #[tokio::test]
    async fn always_failing_agent_reports_failure() {
        let agent =
            ReferenceAgent::new(AgentId::random(), "flaky-worker", capabilities()).always_failing("boom");
        agent.initialize().await.unwrap();

        let task = Task::new(TaskId::new("t-2").unwrap(), "text_analysis", ParamMap::new());
        let result = agent.execute_task(task).await;
        assert!(!result.is_success());
        assert_eq!(result.error.as_deref(), Some("boom"));
    }

    #[tokio::test]
    async fn can_handle_respects_capability_implication() {
        let agent = ReferenceAgent::new(AgentId::random(), "analysis-worker", capabilities());
        agent.initialize().await.unwrap();
        assert!(agent.can_handle("text_analysis", &Requirements::none()));
        assert!(!agent.can_handle("compression", &Requirements::none()));
    }

    #[tokio::test]
    async fn can_handle_requires_every_explicit_capability() {
        let agent = ReferenceAgent::new(AgentId::random(), "analysis-worker", capabilities());
        agent.initialize().await.unwrap();

        // Declares `Analysis` only: a requirement set the agent fully
        // covers passes...
        let covered = Requirements::with_capabilities([Capability::Analysis]);
        assert!(agent.can_handle("text_analysis", &covered));

        // ...but requiring an additional capability it never declared
        // fails, even though a single shared capability would satisfy a
        // non-empty-intersection check.
        let uncovered =
            Requirements::with_capabilities([Capability::Analysis, Capability::Learning]);
        assert!(!agent.can_handle("text_analysis", &uncovered));
    }
}
