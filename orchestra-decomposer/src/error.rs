//! Errors raised while decomposing a task.

use thiserror::Error;

/// Result alias used throughout the decomposer.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors a decomposition strategy can raise. Per spec §4.6.6
/// ("Decomposition failure: strategy raises, graph unrepairable"), any
/// of these abort decomposition only — the parent task is then reported
/// failed by the orchestrator without any subtask having executed.
#[derive(Debug, Error)]
pub enum Error {
    /// A named strategy rejected the shape of its `task_input`.
    #[error("strategy `{strategy}` rejected its input: {reason}")]
    InvalidInput {
        /// Name of the strategy that raised.
        strategy: String,
        /// Human-readable reason.
        reason: String,
    },
}
