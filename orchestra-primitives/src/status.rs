//! The agent status state machine (spec §3 "Agent status").
//!
//! `AgentStatus` lives in `orchestra-primitives`, rather than alongside the
//! `BaseAgent` trait in `orchestra-agent`, because both the agent itself and
//! `orchestra-registry`'s candidate filtering (idle preferred over working)
//! need to read and compare it without creating a dependency cycle between
//! those two crates.

use std::fmt::{self, Display, Formatter};

use serde::{Deserialize, Serialize};

/// The state an agent occupies over its lifetime.
///
/// Transitions: `Initializing -> Validating -> {Idle | Error}`;
/// `Idle <-> Working`; any state may move to `Error`, `Degraded`, or
/// `Shutdown`. Only `Idle` and `Working` accept new work.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentStatus {
    /// Constructed but bootstrap has not yet run.
    Initializing,
    /// Bootstrap validation (resources, dependencies, self-test) in progress.
    Validating,
    /// Idle and available to accept work.
    Idle,
    /// Currently executing a task.
    Working,
    /// Bootstrap or task execution failed unrecoverably.
    Error,
    /// Operational but impaired; selection should avoid it when healthier
    /// candidates exist.
    Degraded,
    /// Terminated; no further work should be scheduled.
    Shutdown,
}

impl AgentStatus {
    /// Returns `true` for the two states from which an agent may accept a
    /// task (`Idle` and `Working`).
    #[must_use]
    pub const fn accepts_work(self) -> bool {
        matches!(self, Self::Idle | Self::Working)
    }

    /// Returns `true` whether the given transition is permitted by the
    /// state machine described in spec §3.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        match (self, next) {
            (Self::Initializing, Self::Validating)
            | (Self::Validating, Self::Idle | Self::Error)
            | (Self::Idle, Self::Working)
            | (Self::Working, Self::Idle) => true,
            (_, Self::Error | Self::Degraded | Self::Shutdown) => true,
            _ => false,
        }
    }
}

impl Display for AgentStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let token = match self {
            Self::Initializing => "initializing",
            Self::Validating => "validating",
            Self::Idle => "idle",
            Self::Working => "working",
            Self::Error => "error",
            Self::Degraded => "degraded",
            Self::Shutdown => "shutdown",
        };
        f.write_str(token)
    }
}
