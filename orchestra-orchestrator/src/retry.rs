//! Per-subtask execution with timeout and exponential-backoff retry
//! (spec §4.6.4), with uniform jitter added on top of the fixed
//! `base * 2^(attempt - 1)` term (spec §9's documented implementation
//! choice).

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tracing::warn;

use orchestra_agent::{BaseAgent, ParamMap, Task, TaskResult};
use orchestra_config::OrchestratorConfig;
use orchestra_primitives::{SubtaskId, TaskId};

/// Runs `subtask_id`/`task_type` against `agent`, retrying on failure
/// or timeout up to `config.max_retries` attempts with jittered
/// exponential backoff between attempts. On exhaustion, returns the
/// shape spec §4.6.4 step 5 documents: `{status: failed, error: <last
/// error>, subtask_id: <id>}`.
pub async fn run_with_retry(
    agent: &Arc<dyn BaseAgent>,
    subtask_id: &SubtaskId,
    task_type: &str,
    input: ParamMap,
    config: &OrchestratorConfig,
) -> TaskResult {
    let task_id = subtask_task_id(subtask_id);
    let mut attempt: u32 = 0;

    loop {
        attempt += 1;
        let task = Task::new(task_id.clone(), task_type.to_string(), input.clone());
        let attempt_result = match tokio::time::timeout(config.delegation_timeout(), agent.execute_task(task)).await
        {
            Ok(result) => result,
            Err(_) => TaskResult::timeout(task_id.clone()),
        };

        if attempt_result.is_success() {
            return attempt_result;
        }

        if attempt >= config.max_retries {
            let mut failed = TaskResult::failed(
                task_id.clone(),
                attempt_result.error.unwrap_or_else(|| "unknown error".to_string()),
                attempt_result.execution_time_seconds.unwrap_or(0.0),
            );
            failed
                .extra
                .insert("subtask_id".to_string(), Value::String(subtask_id.to_string()));
            return failed;
        }

        let backoff = backoff_for(config, attempt);
        warn!(
            subtask_id = %subtask_id,
            attempt,
            backoff_ms = backoff.as_millis() as u64,
            error = attempt_result.error.as_deref().unwrap_or("timeout"),
            "retrying subtask after failure"
        );
        tokio::time::sleep(backoff).await;
    }
}

/// Builds the immediate, non-retried failure for a subtask no
/// registered agent could serve (spec §4.6.4: "If agent selection
/// returns none ... the subtask fails immediately ... no retry").
#[must_use]
pub fn no_agent_available(subtask_id: &SubtaskId) -> TaskResult {
    let mut failed = TaskResult::failed(subtask_task_id(subtask_id), "no agent available", 0.0);
    failed
        .extra
        .insert("subtask_id".to_string(), Value::String(subtask_id.to_string()));
    failed
}

fn subtask_task_id(subtask_id: &SubtaskId) -> TaskId {
    TaskId::new(subtask_id.as_str().to_string()).unwrap_or_else(|_| TaskId::generate())
}

fn backoff_for(config: &OrchestratorConfig, attempt: u32) -> Duration {
    let exponent = i32::try_from(attempt.saturating_sub(1)).unwrap_or(i32::MAX);
    let base = config.retry_backoff_base_seconds * 2f64.powi(exponent);
    let jitter = fastrand::f64() * config.retry_backoff_base_seconds;
    Duration::from_secs_f64((base + jitter).max(0.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use orchestra_agent::ReferenceAgent;
    use orchestra_primitives::{AgentId, Capability};
    use std::sync::atomic::{AtomicU32, Ordering};

    fn config_for_tests() -> OrchestratorConfig {
        OrchestratorConfig {
            max_parallel_tasks: 10,
            task_timeout_seconds: 5,
            delegation_timeout_seconds: 1.0,
            max_retries: 3,
            retry_backoff_base_seconds: 0.001,
            selection_weights: orchestra_config::SelectionWeights::default(),
        }
    }

    #[tokio::test]
    async fn succeeds_on_first_attempt_without_retrying() {
        let agent: Arc<dyn BaseAgent> =
            Arc::new(ReferenceAgent::new(AgentId::random(), "worker", [Capability::Execution].into()));
        agent.initialize().await.unwrap();

        let result = run_with_retry(
            &agent,
            &SubtaskId::new("step").unwrap(),
            "noop",
            ParamMap::new(),
            &config_for_tests(),
        )
        .await;
        assert!(result.is_success());
    }

    #[tokio::test]
    async fn retries_until_success_within_budget() {
        let attempts = Arc::new(AtomicU32::new(0));
        let attempts_clone = Arc::clone(&attempts);
        let agent: Arc<dyn BaseAgent> = Arc::new(
            ReferenceAgent::new(AgentId::random(), "flaky", [Capability::Execution].into()).with_handler(Arc::new(
                move |_task| {
                    let count = attempts_clone.fetch_add(1, Ordering::SeqCst) + 1;
                    if count < 3 {
                        Err("not yet".to_string())
                    } else {
                        Ok(serde_json::Value::Bool(true))
                    }
                },
            )),
        );
        agent.initialize().await.unwrap();

        let result = run_with_retry(
            &agent,
            &SubtaskId::new("step").unwrap(),
            "noop",
            ParamMap::new(),
            &config_for_tests(),
        )
        .await;
        assert!(result.is_success());
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn exhausting_retries_reports_failed_with_subtask_id() {
        let agent: Arc<dyn BaseAgent> = Arc::new(
            ReferenceAgent::new(AgentId::random(), "always-fails", [Capability::Execution].into())
                .always_failing("boom"),
        );
        agent.initialize().await.unwrap();

        let result = run_with_retry(
            &agent,
            &SubtaskId::new("step").unwrap(),
            "noop",
            ParamMap::new(),
            &config_for_tests(),
        )
        .await;
        assert!(!result.is_success());
        assert_eq!(result.error.as_deref(), Some("boom"));
        assert_eq!(
            result.extra.get("subtask_id"),
            Some(&Value::String("step".to_string()))
        );
    }

    #[test]
    fn no_agent_available_skips_retry_entirely() {
        let result = no_agent_available(&SubtaskId::new("step").unwrap());
        assert_eq!(result.error.as_deref(), Some("no agent available"));
    }
}
