//! The health snapshot returned by an agent's heartbeat and recorded by
//! the registry's health map.

use serde::{Deserialize, Serialize};

use orchestra_primitives::AgentStatus;

/// A point-in-time summary of an agent's health, as returned by
/// `BaseAgent::heartbeat` (spec §4.2) and tracked per-agent by the
/// registry (spec §4.3 "health map keyed by identifier").
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct HealthSnapshot {
    /// Current lifecycle status.
    pub status: AgentStatus,
    /// `successes / attempts`, or `0.5` when `attempts == 0` (matches the
    /// registry's selection-score convention for an untested agent).
    pub success_rate: f64,
    /// Mean task duration in seconds across all completed attempts, or
    /// `0.0` when none have completed yet.
    pub avg_duration_seconds: f64,
    /// Total attempts recorded so far.
    pub attempts: u64,
}

impl HealthSnapshot {
    /// Builds a snapshot from raw counters, applying the `0.5`
    /// no-attempts convention for `success_rate`.
    #[must_use]
    pub fn from_counters(
        status: AgentStatus,
        attempts: u64,
        successes: u64,
        total_duration_seconds: f64,
    ) -> Self {
        let success_rate = if attempts == 0 {
            0.5
        } else {
            successes as f64 / attempts as f64
        };
        let avg_duration_seconds = if attempts == 0 {
            0.0
        } else {
            total_duration_seconds / attempts as f64
        };
        Self {
            status,
            success_rate,
            avg_duration_seconds,
            attempts,
        }
    }
}
