//! Dependency input resolution (spec §4.6.3): walks a subtask's input
//! for whole-value `{{<subtask_id>(.result)?(.<path>)*}}` placeholders
//! and substitutes the referenced prior subtask's result.
//!
//! A small, purpose-built parser per spec §9 ("match `{{...}}` exactly,
//! split on `.`, ignore a leading `result` segment, walk the resolved
//! map by key. Do not import a templating library.").

use std::collections::HashMap;

use serde_json::Value;
use tracing::warn;

use orchestra_agent::{ParamMap, TaskResult};
use orchestra_primitives::SubtaskId;

/// Resolves every placeholder reachable from `input` against
/// `results`, the subtask results collected so far. Unresolvable
/// placeholders are left as the original literal string (spec §4.6.3
/// step 5), with a warning logged for each.
#[must_use]
pub fn resolve_inputs(input: &ParamMap, results: &HashMap<SubtaskId, TaskResult>) -> ParamMap {
    input
        .iter()
        .map(|(key, value)| (key.clone(), resolve_value(value, results)))
        .collect()
}

fn resolve_value(value: &Value, results: &HashMap<SubtaskId, TaskResult>) -> Value {
    match value {
        Value::String(text) => resolve_placeholder(text, results).unwrap_or_else(|| {
            if is_placeholder_shaped(text) {
                warn!(placeholder = %text, "unresolved dependency placeholder left as literal string");
            }
            value.clone()
        }),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(key, value)| (key.clone(), resolve_value(value, results)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.iter().map(|item| resolve_value(item, results)).collect()),
        other => other.clone(),
    }
}

fn is_placeholder_shaped(text: &str) -> bool {
    text.starts_with("{{") && text.ends_with("}}")
}

/// Attempts to resolve one whole-value placeholder string. Returns
/// `None` for anything that isn't a well-formed, resolvable
/// placeholder: not placeholder-shaped, unknown subtask id, that
/// subtask has no successful result yet, or a path segment that does
/// not walk through the resolved value.
fn resolve_placeholder(text: &str, results: &HashMap<SubtaskId, TaskResult>) -> Option<Value> {
    let inner = text.strip_prefix("{{")?.strip_suffix("}}")?;
    let mut segments = inner.split('.');
    let subtask_id = SubtaskId::new(segments.next()?.to_string()).ok()?;

    let mut path: Vec<&str> = segments.collect();
    if path.first() == Some(&"result") {
        path.remove(0);
    }

    let task_result = results.get(&subtask_id)?;
    let mut current = task_result.result.as_ref()?;
    for segment in path {
        current = current.as_object()?.get(segment)?;
    }
    Some(current.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use orchestra_primitives::TaskId;
    use serde_json::json;

    fn completed(id: &str, result: Value) -> (SubtaskId, TaskResult) {
        (
            SubtaskId::new(id).unwrap(),
            TaskResult::completed(TaskId::new(id).unwrap(), result, 0.1),
        )
    }

    #[test]
    fn no_placeholders_round_trips_unchanged() {
        let mut input = ParamMap::new();
        input.insert("content".into(), Value::String("abc".into()));
        let results = HashMap::new();
        assert_eq!(resolve_inputs(&input, &results), input);
    }

    #[test]
    fn whole_result_placeholder_resolves() {
        let mut results = HashMap::new();
        let (id, result) = completed("analyze_content", json!({"score": 0.9}));
        results.insert(id, result);

        let mut input = ParamMap::new();
        input.insert("content_analysis".into(), Value::String("{{analyze_content.result}}".into()));
        let resolved = resolve_inputs(&input, &results);
        assert_eq!(resolved["content_analysis"], json!({"score": 0.9}));
    }

    #[test]
    fn leading_result_segment_is_optional() {
        let mut results = HashMap::new();
        let (id, result) = completed("extract", json!({"rows": 3}));
        results.insert(id, result);

        let mut input = ParamMap::new();
        input.insert("a".into(), Value::String("{{extract.result.rows}}".into()));
        input.insert("b".into(), Value::String("{{extract.rows}}".into()));
        let resolved = resolve_inputs(&input, &results);
        assert_eq!(resolved["a"], json!(3));
        assert_eq!(resolved["b"], json!(3));
    }

    #[test]
    fn unresolvable_placeholder_is_left_literal() {
        let results = HashMap::new();
        let mut input = ParamMap::new();
        input.insert("x".into(), Value::String("{{missing.result}}".into()));
        let resolved = resolve_inputs(&input, &results);
        assert_eq!(resolved["x"], Value::String("{{missing.result}}".into()));
    }

    #[test]
    fn failed_subtask_result_is_unresolvable() {
        let mut results = HashMap::new();
        results.insert(
            SubtaskId::new("transform").unwrap(),
            TaskResult::failed(TaskId::new("transform").unwrap(), "boom", 0.0),
        );
        let mut input = ParamMap::new();
        input.insert("data".into(), Value::String("{{transform.result}}".into()));
        let resolved = resolve_inputs(&input, &results);
        assert_eq!(resolved["data"], Value::String("{{transform.result}}".into()));
    }

    #[test]
    fn placeholders_resolve_inside_nested_arrays_and_objects() {
        let mut results = HashMap::new();
        let (id, result) = completed("research_0", json!("topic summary"));
        results.insert(id, result);

        let mut input = ParamMap::new();
        input.insert(
            "research_results".into(),
            Value::Array(vec![Value::String("{{research_0.result}}".into())]),
        );
        let resolved = resolve_inputs(&input, &results);
        assert_eq!(resolved["research_results"], json!(["topic summary"]));
    }
}
