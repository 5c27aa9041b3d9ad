//! Result aggregation (spec §4.6.5): partitions per-subtask results
//! into successful/failed, computes duration statistics, derives the
//! final status, and shallow-merges every successful result's payload
//! into one aggregated value.

use std::collections::HashMap;

use serde_json::Value;

use orchestra_agent::TaskResult;
use orchestra_primitives::{SubtaskId, TaskId};

/// The final disposition of a parent task (spec §4.6.5 "Final status").
#[derive(Clone, Copy, Debug, Eq, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrchestrationStatus {
    /// Every subtask succeeded.
    Completed,
    /// At least one success and at least one failure.
    Partial,
    /// No subtask succeeded (including the zero-subtask case).
    Failed,
}

/// The aggregated outcome of a parent task's orchestration, returned by
/// [`crate::Orchestrator::execute_task`] (spec §4.6.5's result shape).
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct OrchestrationResult {
    /// Identifier of the parent task this result belongs to.
    pub task_id: TaskId,
    /// Final disposition.
    pub status: OrchestrationStatus,
    /// Number of subtasks the decomposition produced.
    pub total_subtasks: usize,
    /// Subtasks whose result was `completed`.
    pub successful: usize,
    /// Subtasks whose result was not `completed`.
    pub failed: usize,
    /// `successful / total_subtasks`, `0.0` when there were none.
    pub success_rate: f64,
    /// Sum of `execution_time_seconds` across subtasks that reported one.
    pub total_duration_seconds: f64,
    /// Mean of `execution_time_seconds` across subtasks that reported one.
    pub avg_duration_seconds: f64,
    /// Every subtask's full result, keyed by subtask identifier.
    pub results: HashMap<SubtaskId, TaskResult>,
    /// The shallow-merged payload of every successful subtask's
    /// `result`; a single success's `result` verbatim when there was
    /// exactly one.
    pub aggregated_result: Value,
    /// Human-readable messages: per-failed-subtask errors plus any
    /// decomposition/orchestration-level warnings.
    pub errors: Vec<String>,
}

/// Aggregates `results` (plus any `extra_errors` accumulated outside
/// the per-subtask results, e.g. decomposition warnings or a parent
/// timeout notice) into the final [`OrchestrationResult`].
#[must_use]
pub fn aggregate(
    task_id: TaskId,
    results: HashMap<SubtaskId, TaskResult>,
    mut extra_errors: Vec<String>,
) -> OrchestrationResult {
    let total = results.len();
    let mut successful = 0usize;
    let mut failed = 0usize;
    let mut total_duration = 0.0;
    let mut duration_samples = 0u32;
    let mut successes: Vec<(&SubtaskId, &TaskResult)> = Vec::new();

    let mut ordered: Vec<&SubtaskId> = results.keys().collect();
    ordered.sort();

    for id in ordered {
        let result = &results[id];
        if let Some(duration) = result.execution_time_seconds {
            total_duration += duration;
            duration_samples += 1;
        }
        if result.is_success() {
            successful += 1;
            successes.push((id, result));
        } else {
            failed += 1;
            let message = result.error.clone().unwrap_or_else(|| "unknown error".to_string());
            extra_errors.push(format!("{id}: {message}"));
        }
    }

    let status = if total == 0 || successful == 0 {
        OrchestrationStatus::Failed
    } else if failed == 0 {
        OrchestrationStatus::Completed
    } else {
        OrchestrationStatus::Partial
    };

    let aggregated_result = merge_successes(&successes);

    OrchestrationResult {
        task_id,
        status,
        total_subtasks: total,
        successful,
        failed,
        success_rate: if total == 0 { 0.0 } else { successful as f64 / total as f64 },
        total_duration_seconds: total_duration,
        avg_duration_seconds: if duration_samples == 0 {
            0.0
        } else {
            total_duration / f64::from(duration_samples)
        },
        results,
        aggregated_result,
        errors: extra_errors,
    }
}

/// Single-success tasks produce that success's `result` verbatim (spec
/// §4.6.5). With more than one success, shallow-merges every
/// object-shaped `result` left to right in subtask-identifier order, so
/// later successes override earlier ones on key conflict; non-object
/// successful results are skipped from the merge (they have no keys to
/// contribute) but still count toward `successful`.
fn merge_successes(successes: &[(&SubtaskId, &TaskResult)]) -> Value {
    if let [(_, only)] = successes {
        return only.result.clone().unwrap_or(Value::Null);
    }

    let mut merged = serde_json::Map::new();
    for (_, result) in successes {
        if let Some(Value::Object(fields)) = &result.result {
            for (key, value) in fields {
                merged.insert(key.clone(), value.clone());
            }
        }
    }
    Value::Object(merged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn completed(id: &str, result: Value) -> (SubtaskId, TaskResult) {
        (
            SubtaskId::new(id).unwrap(),
            TaskResult::completed(TaskId::new(id).unwrap(), result, 1.0),
        )
    }

    fn failed(id: &str, error: &str) -> (SubtaskId, TaskResult) {
        (SubtaskId::new(id).unwrap(), TaskResult::failed(TaskId::new(id).unwrap(), error, 0.5))
    }

    #[test]
    fn all_success_yields_completed_and_merges_fields() {
        let mut results = HashMap::new();
        results.extend([completed("a", json!({"x": 1})), completed("b", json!({"y": 2}))]);
        let outcome = aggregate(TaskId::new("parent").unwrap(), results, Vec::new());
        assert_eq!(outcome.status, OrchestrationStatus::Completed);
        assert_eq!(outcome.successful, 2);
        assert_eq!(outcome.failed, 0);
        assert!((outcome.success_rate - 1.0).abs() < f64::EPSILON);
        assert_eq!(outcome.aggregated_result, json!({"x": 1, "y": 2}));
        assert!(outcome.errors.is_empty());
    }

    #[test]
    fn single_success_is_passed_through_verbatim() {
        let mut results = HashMap::new();
        results.extend([completed("only", json!("hello"))]);
        let outcome = aggregate(TaskId::new("parent").unwrap(), results, Vec::new());
        assert_eq!(outcome.aggregated_result, json!("hello"));
    }

    #[test]
    fn mixed_outcomes_yield_partial_with_collected_errors() {
        let mut results = HashMap::new();
        results.extend([completed("extract", json!({"rows": 1})), failed("transform", "boom")]);
        let outcome = aggregate(TaskId::new("parent").unwrap(), results, Vec::new());
        assert_eq!(outcome.status, OrchestrationStatus::Partial);
        assert_eq!(outcome.successful, 1);
        assert_eq!(outcome.failed, 1);
        assert_eq!(outcome.errors, vec!["transform: boom".to_string()]);
    }

    #[test]
    fn all_failures_yield_failed_status() {
        let mut results = HashMap::new();
        results.extend([failed("a", "x"), failed("b", "y")]);
        let outcome = aggregate(TaskId::new("parent").unwrap(), results, Vec::new());
        assert_eq!(outcome.status, OrchestrationStatus::Failed);
        assert!((outcome.success_rate).abs() < f64::EPSILON);
    }

    #[test]
    fn empty_results_is_failed() {
        let outcome = aggregate(TaskId::new("parent").unwrap(), HashMap::new(), vec!["decomposition failed".into()]);
        assert_eq!(outcome.status, OrchestrationStatus::Failed);
        assert_eq!(outcome.total_subtasks, 0);
        assert_eq!(outcome.errors, vec!["decomposition failed".to_string()]);
    }

    #[test]
    fn duration_average_only_counts_reporting_subtasks() {
        let mut results = HashMap::new();
        results.extend([completed("a", json!({})), completed("b", json!({}))]);
        let outcome = aggregate(TaskId::new("parent").unwrap(), results, Vec::new());
        assert!((outcome.total_duration_seconds - 2.0).abs() < f64::EPSILON);
        assert!((outcome.avg_duration_seconds - 1.0).abs() < f64::EPSILON);
    }
}
