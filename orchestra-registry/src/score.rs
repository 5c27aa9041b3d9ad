//! The weighted selection score combining an agent's success rate,
//! speed, and current load (spec §4.3).

use orchestra_agent::AgentMetricsSnapshot;
use orchestra_config::SelectionWeights;

/// Computes the selection score for a single agent's metrics, given the
/// configured weights.
///
/// `success_rate` and `load_score` are already normalized to `[0, 1]`;
/// `speed_score` is `1 / (1 + avg_duration)`, which approaches `1` for
/// instantaneous agents and `0` as average duration grows unbounded, so
/// the weighted sum itself stays within `[0, 1]` whenever the weights
/// sum to `1.0` (enforced by [`SelectionWeights::is_normalized`]).
#[must_use]
pub fn selection_score(metrics: &AgentMetricsSnapshot, weights: &SelectionWeights) -> f64 {
    let success_rate = metrics.success_rate();
    let speed_score = 1.0 / (1.0 + metrics.avg_duration_seconds());
    let load_score = 1.0 / (1.0 + metrics.attempts as f64 / 100.0);
    weights.success * success_rate + weights.speed * speed_score + weights.load * load_score
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn untested_agent_scores_on_the_half_success_convention() {
        let metrics = AgentMetricsSnapshot::default();
        let weights = SelectionWeights::default();
        let score = selection_score(&metrics, &weights);
        // success=0.5, speed=1.0 (avg duration 0), load=1.0 (no attempts)
        let expected = 0.5 * 0.5 + 0.3 * 1.0 + 0.2 * 1.0;
        assert!((score - expected).abs() < 1e-9);
    }

    #[test]
    fn higher_load_lowers_the_load_component() {
        let weights = SelectionWeights::default();
        let light = AgentMetricsSnapshot {
            attempts: 1,
            successes: 1,
            failures: 0,
            total_duration_seconds: 1.0,
        };
        let heavy = AgentMetricsSnapshot {
            attempts: 200,
            successes: 200,
            failures: 0,
            total_duration_seconds: 200.0,
        };
        assert!(selection_score(&light, &weights) > selection_score(&heavy, &weights));
    }
}
