//! Per-peer collaboration bookkeeping (spec §3 "Agent relationship"):
//! total/successful interaction counts, the last interaction time, and
//! a derived trust score.

use chrono::{DateTime, Utc};

/// A per-peer record of collaboration history, updated after each
/// completed delegation (spec §4.4 "Relationship accounting").
#[derive(Clone, Copy, Debug)]
pub struct AgentRelationship {
    total_interactions: u64,
    successful_interactions: u64,
    last_interaction_at: Option<DateTime<Utc>>,
}

impl Default for AgentRelationship {
    fn default() -> Self {
        Self {
            total_interactions: 0,
            successful_interactions: 0,
            last_interaction_at: None,
        }
    }
}

impl AgentRelationship {
    /// Total interactions recorded with this peer.
    #[must_use]
    pub const fn total_interactions(&self) -> u64 {
        self.total_interactions
    }

    /// Interactions that completed successfully.
    #[must_use]
    pub const fn successful_interactions(&self) -> u64 {
        self.successful_interactions
    }

    /// When the last interaction with this peer occurred.
    #[must_use]
    pub const fn last_interaction_at(&self) -> Option<DateTime<Utc>> {
        self.last_interaction_at
    }

    /// `successful / total`, bounded to `[0, 1]`; `0.0` with no
    /// interactions yet (spec §8 "Trust score for any peer is in [0, 1]
    /// and equals successful/total whenever total >= 1").
    #[must_use]
    pub fn trust(&self) -> f64 {
        if self.total_interactions == 0 {
            0.0
        } else {
            self.successful_interactions as f64 / self.total_interactions as f64
        }
    }

    /// Records one completed interaction with this peer.
    pub fn record(&mut self, succeeded: bool) {
        self.total_interactions += 1;
        if succeeded {
            self.successful_interactions += 1;
        }
        self.last_interaction_at = Some(Utc::now());
    }
}
