//! Built-in operations that bypass decomposition entirely
//! (`SPEC_FULL.md`'s supplemented introspection surface, spec §4.6.1's
//! "operation" vocabulary extended with a couple of operator-facing
//! queries). `Orchestrator::execute_task` checks `task_type` against
//! these before handing the task to the decomposer.

use serde_json::{json, Value};

use orchestra_agent::ParamMap;
use orchestra_primitives::AgentId;

use orchestra_decomposer::Decomposer;
use orchestra_registry::AgentRegistry;

/// `task_type`s handled directly by [`dispatch`] rather than by
/// decomposition.
pub const BUILTIN_TASK_TYPES: &[&str] = &["get_agent_status", "list_strategies"];

/// Returns `true` if `task_type` names a built-in operation.
#[must_use]
pub fn is_builtin(task_type: &str) -> bool {
    BUILTIN_TASK_TYPES.contains(&task_type)
}

/// Runs the built-in named by `task_type`. Callers must check
/// [`is_builtin`] first; this returns an error payload for anything
/// else, mirroring how an unknown subtask strategy reports failure.
#[must_use]
pub fn dispatch(task_type: &str, input: &ParamMap, registry: &AgentRegistry, decomposer: &Decomposer) -> Result<Value, String> {
    match task_type {
        "get_agent_status" => get_agent_status(input, registry),
        "list_strategies" => Ok(list_strategies(decomposer)),
        other => Err(format!("unknown built-in operation `{other}`")),
    }
}

/// Reports the live status and metrics of one registered agent (spec
/// §4.3's health map, surfaced as an orchestrator-level query).
///
/// Expects `input.agent_id` to be a valid [`AgentId`] string. Returns
/// `Err` when the field is missing/malformed or the agent is not
/// currently registered (including one whose owner has dropped it).
fn get_agent_status(input: &ParamMap, registry: &AgentRegistry) -> Result<Value, String> {
    let agent_id = input
        .get("agent_id")
        .and_then(Value::as_str)
        .ok_or_else(|| "get_agent_status requires a string `agent_id` field".to_string())?;
    let agent_id: AgentId = agent_id
        .parse()
        .map_err(|_| format!("`{agent_id}` is not a valid agent id"))?;

    let agent = registry
        .get(agent_id)
        .ok_or_else(|| format!("no agent registered under `{agent_id}`"))?;

    let metrics = agent.metrics();
    Ok(json!({
        "agent_id": agent_id.to_string(),
        "agent_type": agent.agent_type(),
        "status": agent.status().to_string(),
        "capabilities": agent.capabilities(),
        "metrics": {
            "attempts": metrics.attempts,
            "successes": metrics.successes,
            "failures": metrics.failures,
            "success_rate": metrics.success_rate(),
        },
    }))
}

/// Lists every decomposition strategy currently registered (spec
/// §4.5's strategy registry, surfaced read-only).
fn list_strategies(decomposer: &Decomposer) -> Value {
    json!({ "strategies": decomposer.strategy_names() })
}
