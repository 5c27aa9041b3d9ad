//! Named decomposition strategies (spec §4.5 "Named strategies (minimum
//! set)"): pure functions from a task's input map to the list of
//! subtasks that realize it, referencing each other's eventual results
//! through the `{{subtask_id.path}}` placeholder syntax resolved later
//! by the orchestrator (spec §4.6.3).

use serde_json::Value;

use orchestra_agent::ParamMap;
use orchestra_primitives::SubtaskId;

use crate::error::Error;
use crate::subtask::Subtask;

/// A pure decomposition strategy: `(task_input) -> List<Subtask>` (spec
/// §6 "Strategy plug-in contract"). A blanket implementation covers any
/// matching `Fn`, so the built-in strategies below are registered as
/// plain functions.
pub trait Strategy: Send + Sync {
    /// Expands `input` into this strategy's subtask list.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] when `input` does not have the
    /// shape this strategy requires.
    fn decompose(&self, input: &ParamMap) -> crate::Result<Vec<Subtask>>;
}

impl<F> Strategy for F
where
    F: Fn(&ParamMap) -> crate::Result<Vec<Subtask>> + Send + Sync,
{
    fn decompose(&self, input: &ParamMap) -> crate::Result<Vec<Subtask>> {
        (self)(input)
    }
}

fn sid(value: &str) -> SubtaskId {
    SubtaskId::new(value).expect("literal subtask id is non-empty")
}

fn placeholder(subtask_id: &str, path: &str) -> String {
    format!("{{{{{subtask_id}.{path}}}}}")
}

/// `analyze_content` and `analyze_structure` (no dependencies),
/// `select_algorithm` (depends on both), `compress` (depends on
/// `select_algorithm`).
pub fn compression_analysis(input: &ParamMap) -> crate::Result<Vec<Subtask>> {
    let content = input.get("content").cloned();

    let mut analyze_content_input = ParamMap::new();
    let mut analyze_structure_input = ParamMap::new();
    let mut compress_input = ParamMap::new();
    if let Some(content) = content {
        analyze_content_input.insert("content".into(), content.clone());
        analyze_structure_input.insert("content".into(), content.clone());
        compress_input.insert("content".into(), content);
    }

    let mut select_algorithm_input = ParamMap::new();
    select_algorithm_input.insert(
        "content_analysis".into(),
        Value::String(placeholder("analyze_content", "result")),
    );
    select_algorithm_input.insert(
        "structure_analysis".into(),
        Value::String(placeholder("analyze_structure", "result")),
    );
    compress_input.insert(
        "algorithm".into(),
        Value::String(placeholder("select_algorithm", "result")),
    );

    Ok(vec![
        Subtask::new("analyze_content", "analyze_content", analyze_content_input),
        Subtask::new("analyze_structure", "analyze_structure", analyze_structure_input),
        Subtask::new("select_algorithm", "select_algorithm", select_algorithm_input)
            .depends_on([sid("analyze_content"), sid("analyze_structure")]),
        Subtask::new("compress", "compress", compress_input).depends_on([sid("select_algorithm")]),
    ])
}

/// `analyze_code` and `check_patterns` (parallel), `generate_review`
/// (depends on both).
pub fn code_review(input: &ParamMap) -> crate::Result<Vec<Subtask>> {
    let code = input.get("code").cloned();

    let mut analyze_code_input = ParamMap::new();
    let mut check_patterns_input = ParamMap::new();
    if let Some(code) = code {
        analyze_code_input.insert("code".into(), code.clone());
        check_patterns_input.insert("code".into(), code);
    }

    let mut generate_review_input = ParamMap::new();
    generate_review_input.insert(
        "code_analysis".into(),
        Value::String(placeholder("analyze_code", "result")),
    );
    generate_review_input.insert(
        "pattern_findings".into(),
        Value::String(placeholder("check_patterns", "result")),
    );

    Ok(vec![
        Subtask::new("analyze_code", "analyze_code", analyze_code_input),
        Subtask::new("check_patterns", "check_patterns", check_patterns_input),
        Subtask::new("generate_review", "generate_review", generate_review_input)
            .depends_on([sid("analyze_code"), sid("check_patterns")]),
    ])
}

/// Strictly sequential `extract` -> `transform` -> `load` -> `validate`.
pub fn data_pipeline(input: &ParamMap) -> crate::Result<Vec<Subtask>> {
    let extract_input = input.clone();

    let mut transform_input = ParamMap::new();
    transform_input.insert("data".into(), Value::String(placeholder("extract", "result")));

    let mut load_input = ParamMap::new();
    load_input.insert("data".into(), Value::String(placeholder("transform", "result")));

    let mut validate_input = ParamMap::new();
    validate_input.insert("data".into(), Value::String(placeholder("load", "result")));

    Ok(vec![
        Subtask::new("extract", "extract", extract_input),
        Subtask::new("transform", "transform", transform_input).depends_on([sid("extract")]),
        Subtask::new("load", "load", load_input).depends_on([sid("transform")]),
        Subtask::new("validate", "validate", validate_input).depends_on([sid("load")]),
    ])
}

/// Parallel research fan-out (one subtask per entry in the `topics`
/// input array) followed by a `synthesize` subtask depending on all of
/// them.
pub fn research_synthesis(input: &ParamMap) -> crate::Result<Vec<Subtask>> {
    let topics = match input.get("topics").and_then(Value::as_array) {
        Some(topics) if !topics.is_empty() => topics.clone(),
        _ => {
            return Err(Error::InvalidInput {
                strategy: "research_synthesis".to_string(),
                reason: "expected a non-empty `topics` array".to_string(),
            });
        }
    };

    let mut subtasks = Vec::with_capacity(topics.len() + 1);
    let mut research_ids = Vec::with_capacity(topics.len());
    for (index, topic) in topics.into_iter().enumerate() {
        let id = format!("research_{index}");
        let mut research_input = ParamMap::new();
        research_input.insert("topic".into(), topic);
        subtasks.push(Subtask::new(id.clone(), "research", research_input));
        research_ids.push(id);
    }

    let mut synthesize_input = ParamMap::new();
    let placeholders: Vec<Value> = research_ids
        .iter()
        .map(|id| Value::String(placeholder(id, "result")))
        .collect();
    synthesize_input.insert("research_results".into(), Value::Array(placeholders));

    subtasks.push(
        Subtask::new("synthesize", "synthesize", synthesize_input)
            .depends_on(research_ids.iter().map(|id| sid(id))),
    );
    Ok(subtasks)
}

/// Generic sequential chain given an explicit `steps` array in the
/// input: each entry is `{task_type, input}`; each step's resolved
/// input gains a `previous_result` placeholder pointing at its
/// predecessor once one exists.
pub fn multi_step(input: &ParamMap) -> crate::Result<Vec<Subtask>> {
    let steps = match input.get("steps").and_then(Value::as_array) {
        Some(steps) if !steps.is_empty() => steps.clone(),
        _ => {
            return Err(Error::InvalidInput {
                strategy: "multi_step".to_string(),
                reason: "expected a non-empty `steps` array".to_string(),
            });
        }
    };

    let mut subtasks = Vec::with_capacity(steps.len());
    let mut previous_id: Option<String> = None;

    for (index, step) in steps.into_iter().enumerate() {
        let step_object = step.as_object().cloned().unwrap_or_default();
        let task_type = step_object
            .get("task_type")
            .and_then(Value::as_str)
            .unwrap_or("multi_step")
            .to_string();
        let mut step_input = step_object
            .get("input")
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default();

        if let Some(previous) = &previous_id {
            step_input.insert("previous_result".into(), Value::String(placeholder(previous, "result")));
        }

        let id = format!("step_{index}");
        let mut step_subtask = Subtask::new(id.clone(), task_type, step_input);
        if let Some(previous) = &previous_id {
            step_subtask = step_subtask.depends_on([sid(previous)]);
        }
        subtasks.push(step_subtask);
        previous_id = Some(id);
    }

    Ok(subtasks)
}
