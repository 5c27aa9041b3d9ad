//! Running per-agent counters (spec §3: "tasks attempted, successes,
//! failures, total duration"), mutated only by the owning agent's own
//! execution path (spec §5).

use std::sync::Mutex;

use orchestra_telemetry::HealthSnapshot;

use orchestra_primitives::AgentStatus;

/// An immutable point-in-time read of [`AgentMetrics`].
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct AgentMetricsSnapshot {
    /// Attempts started, successful or not.
    pub attempts: u64,
    /// Attempts that completed successfully.
    pub successes: u64,
    /// Attempts that failed.
    pub failures: u64,
    /// Sum of execution durations in seconds, across all attempts.
    pub total_duration_seconds: f64,
}

impl AgentMetricsSnapshot {
    /// `successes / attempts`, or `0.5` when there have been no attempts
    /// yet (the registry's selection-score convention, spec §4.3).
    #[must_use]
    pub fn success_rate(&self) -> f64 {
        if self.attempts == 0 {
            0.5
        } else {
            self.successes as f64 / self.attempts as f64
        }
    }

    /// Mean duration across completed attempts, or `0.0` with none.
    #[must_use]
    pub fn avg_duration_seconds(&self) -> f64 {
        if self.attempts == 0 {
            0.0
        } else {
            self.total_duration_seconds / self.attempts as f64
        }
    }
}

/// Thread-safe accumulator for an agent's running counters.
#[derive(Debug, Default)]
pub struct AgentMetrics {
    inner: Mutex<AgentMetricsSnapshot>,
}

impl AgentMetrics {
    /// Creates a fresh, zeroed accumulator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one completed attempt.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned by a prior panicking
    /// holder.
    pub fn record(&self, succeeded: bool, duration_seconds: f64) {
        let mut snapshot = self.inner.lock().expect("agent metrics lock poisoned");
        snapshot.attempts += 1;
        if succeeded {
            snapshot.successes += 1;
        } else {
            snapshot.failures += 1;
        }
        snapshot.total_duration_seconds += duration_seconds;
    }

    /// Returns the current snapshot.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn snapshot(&self) -> AgentMetricsSnapshot {
        *self.inner.lock().expect("agent metrics lock poisoned")
    }

    /// Builds a [`HealthSnapshot`] combining these counters with the
    /// agent's current status.
    #[must_use]
    pub fn health(&self, status: AgentStatus) -> HealthSnapshot {
        let snapshot = self.snapshot();
        HealthSnapshot::from_counters(
            status,
            snapshot.attempts,
            snapshot.successes,
            snapshot.total_duration_seconds,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_metrics_default_to_half_success_rate() {
        let metrics = AgentMetrics::new();
        assert!((metrics.snapshot().success_rate() - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn recording_updates_rate_and_average() {
        let metrics = AgentMetrics::new();
        metrics.record(true, 1.0);
        metrics.record(false, 3.0);
        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.attempts, 2);
        assert!((snapshot.success_rate() - 0.5).abs() < f64::EPSILON);
        assert!((snapshot.avg_duration_seconds() - 2.0).abs() < f64::EPSILON);
    }
}
