//! The Task Decomposer (spec §4.5): a pure function from `(task_type,
//! task_input)` to `(subtasks, dependency_graph)`, backed by a registry
//! of named strategies and an input-hash memo.

#![warn(missing_docs, clippy::pedantic)]

mod error;
mod graph;
mod strategies;
mod subtask;

pub use error::{Error, Result};
pub use graph::{build_graph, generations, DependencyGraph, GenerationOutcome, GraphBuildOutcome};
pub use strategies::{code_review, compression_analysis, data_pipeline, multi_step, research_synthesis, Strategy};
pub use subtask::Subtask;

use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, Mutex, RwLock};

use tracing::warn;

use orchestra_agent::ParamMap;

/// The decomposer's output for one `(task_type, task_input)` pair: the
/// subtask list, its validated and repaired dependency graph, and any
/// warnings produced while building it.
#[derive(Clone, Debug, Default)]
pub struct DecompositionOutput {
    /// The strategy's subtasks (or the single pass-through subtask).
    pub subtasks: Vec<Subtask>,
    /// The validated, acyclic dependency graph over those subtasks.
    pub graph: DependencyGraph,
    /// Warnings accumulated during validation and cycle repair.
    pub warnings: Vec<String>,
}

/// A registry of named decomposition strategies plus a small
/// `(task_type, input hash)` memo (spec §4.5 "State").
pub struct Decomposer {
    strategies: RwLock<HashMap<String, Arc<dyn Strategy>>>,
    memo: Mutex<HashMap<(String, u64), DecompositionOutput>>,
}

impl Default for Decomposer {
    fn default() -> Self {
        Self::new()
    }
}

impl Decomposer {
    /// Builds a decomposer preloaded with the named minimum-set
    /// strategies (spec §4.5): `compression_analysis`, `code_review`,
    /// `data_pipeline`, `research_synthesis`, `multi_step`.
    #[must_use]
    pub fn new() -> Self {
        let decomposer = Self {
            strategies: RwLock::new(HashMap::new()),
            memo: Mutex::new(HashMap::new()),
        };
        decomposer.register_strategy("compression_analysis", compression_analysis as fn(&ParamMap) -> crate::Result<Vec<Subtask>>);
        decomposer.register_strategy("code_review", code_review as fn(&ParamMap) -> crate::Result<Vec<Subtask>>);
        decomposer.register_strategy("data_pipeline", data_pipeline as fn(&ParamMap) -> crate::Result<Vec<Subtask>>);
        decomposer.register_strategy("research_synthesis", research_synthesis as fn(&ParamMap) -> crate::Result<Vec<Subtask>>);
        decomposer.register_strategy("multi_step", multi_step as fn(&ParamMap) -> crate::Result<Vec<Subtask>>);
        decomposer
    }

    /// Registers (or replaces) the strategy used for `task_type`.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn register_strategy<S>(&self, task_type: impl Into<String>, strategy: S)
    where
        S: Strategy + 'static,
    {
        let task_type = task_type.into();
        self.strategies
            .write()
            .expect("strategy registry lock poisoned")
            .insert(task_type, Arc::new(strategy));
    }

    /// Returns `true` if a strategy is registered for `task_type`.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn has_strategy(&self, task_type: &str) -> bool {
        self.strategies.read().expect("strategy registry lock poisoned").contains_key(task_type)
    }

    /// Lists every registered strategy name, sorted (the introspection
    /// operation `SPEC_FULL.md` calls `list_strategies`).
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn strategy_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .strategies
            .read()
            .expect("strategy registry lock poisoned")
            .keys()
            .cloned()
            .collect();
        names.sort();
        names
    }

    /// Decomposes `task_input` for `task_type`: consults the memo,
    /// otherwise runs the registered strategy (or, absent one, emits
    /// the single pass-through subtask per spec §4.5), builds and
    /// repairs its dependency graph, and caches the result.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] when a registered strategy
    /// rejects the shape of `task_input` (spec §4.6.6 "Decomposition
    /// failure").
    ///
    /// # Panics
    ///
    /// Panics if an internal lock is poisoned.
    pub fn decompose(&self, task_type: &str, input: &ParamMap) -> crate::Result<DecompositionOutput> {
        let memo_key = (task_type.to_string(), hash_input(input));
        if let Some(cached) = self.memo.lock().expect("decomposer memo lock poisoned").get(&memo_key) {
            return Ok(cached.clone());
        }

        let strategy = self
            .strategies
            .read()
            .expect("strategy registry lock poisoned")
            .get(task_type)
            .cloned();

        let subtasks = match strategy {
            Some(strategy) => strategy.decompose(input)?,
            None => vec![Subtask::new(task_type.to_string(), task_type.to_string(), input.clone())],
        };

        let built = build_graph(&subtasks);
        for warning in &built.warnings {
            warn!(task_type, %warning, "decomposition warning");
        }

        let output = DecompositionOutput {
            subtasks,
            graph: built.graph,
            warnings: built.warnings,
        };

        self.memo
            .lock()
            .expect("decomposer memo lock poisoned")
            .insert(memo_key, output.clone());
        Ok(output)
    }
}

fn hash_input(input: &ParamMap) -> u64 {
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    serde_json::to_string(input).unwrap_or_default().hash(&mut hasher);
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    #[test]
    fn unmatched_task_type_is_a_pass_through() {
        let decomposer = Decomposer::new();
        let mut input = ParamMap::new();
        input.insert("text".into(), Value::String("hello".into()));
        let output = decomposer.decompose("text_analysis", &input).unwrap();
        assert_eq!(output.subtasks.len(), 1);
        assert_eq!(output.subtasks[0].input, input);
    }

    #[test]
    fn data_pipeline_strategy_is_preregistered() {
        let decomposer = Decomposer::new();
        assert!(decomposer.has_strategy("data_pipeline"));
        let mut input = ParamMap::new();
        input.insert("data_source".into(), Value::String("db".into()));
        let output = decomposer.decompose("data_pipeline", &input).unwrap();
        assert_eq!(output.subtasks.len(), 4);
        assert!(output.warnings.is_empty());
    }

    #[test]
    fn decompose_is_memoized_for_identical_input() {
        let decomposer = Decomposer::new();
        let mut input = ParamMap::new();
        input.insert("content".into(), Value::String("payload".into()));
        let first = decomposer.decompose("compression_analysis", &input).unwrap();
        let second = decomposer.decompose("compression_analysis", &input).unwrap();
        assert_eq!(first.subtasks.len(), second.subtasks.len());
    }

    #[test]
    fn strategy_names_are_sorted_and_include_the_built_ins() {
        let decomposer = Decomposer::new();
        let names = decomposer.strategy_names();
        assert!(names.contains(&"data_pipeline".to_string()));
        let mut sorted = names.clone();
        sorted.sort();
        assert_eq!(names, sorted);
    }

    #[test]
    fn research_synthesis_strategy_error_propagates_as_decomposition_failure() {
        let decomposer = Decomposer::new();
        let err = decomposer.decompose("research_synthesis", &ParamMap::new()).unwrap_err();
        assert!(matches!(err, Error::InvalidInput { .. }));
    }
}
