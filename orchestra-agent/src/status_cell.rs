//! Interior-mutable holder for an agent's current [`AgentStatus`],
//! enforcing the transition table from spec §3. Grounded on the
//! teacher's lifecycle state machine, narrowed to the status set this
//! core uses.

use std::sync::Mutex;

use orchestra_primitives::AgentId;
use orchestra_primitives::AgentStatus;
use thiserror::Error;
use tracing::debug;

/// Thread-safe status cell enforcing legal transitions.
#[derive(Debug)]
pub struct StatusCell {
    agent_id: AgentId,
    state: Mutex<AgentStatus>,
}

impl StatusCell {
    /// Creates a cell starting in [`AgentStatus::Initializing`].
    #[must_use]
    pub fn new(agent_id: AgentId) -> Self {
        Self {
            agent_id,
            state: Mutex::new(AgentStatus::Initializing),
        }
    }

    /// Returns the current status.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn get(&self) -> AgentStatus {
        *self.state.lock().expect("status cell poisoned")
    }

    /// Attempts to move to `next`, per [`AgentStatus::can_transition_to`].
    ///
    /// # Errors
    ///
    /// Returns [`StatusError::InvalidTransition`] when the transition is
    /// not permitted from the current state.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn transition(&self, next: AgentStatus) -> Result<AgentStatus, StatusError> {
        let mut state = self.state.lock().expect("status cell poisoned");
        if !state.can_transition_to(next) {
            return Err(StatusError::InvalidTransition {
                agent_id: self.agent_id,
                from: *state,
                to: next,
            });
        }
        if *state != next {
            debug!(agent_id = %self.agent_id, from = %state, to = %next, "agent status transition");
            *state = next;
        }
        Ok(*state)
    }
}

/// Errors raised by [`StatusCell::transition`].
#[derive(Debug, Error)]
pub enum StatusError {
    /// The requested transition is not permitted by the state machine.
    #[error("agent {agent_id} cannot move from {from} to {to}")]
    InvalidTransition {
        /// Agent whose transition was rejected.
        agent_id: AgentId,
        /// State prior to the attempted transition.
        from: AgentStatus,
        /// Rejected target state.
        to: AgentStatus,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bootstrap_then_idle_then_working() {
        let cell = StatusCell::new(AgentId::random());
        assert_eq!(cell.get(), AgentStatus::Initializing);
        cell.transition(AgentStatus::Validating).unwrap();
        cell.transition(AgentStatus::Idle).unwrap();
        cell.transition(AgentStatus::Working).unwrap();
        cell.transition(AgentStatus::Idle).unwrap();
    }

    #[test]
    fn skipping_validating_is_rejected() {
        let cell = StatusCell::new(AgentId::random());
        let err = cell
            .transition(AgentStatus::Idle)
            .expect_err("initializing cannot jump straight to idle");
        assert!(matches!(err, StatusError::InvalidTransition { .. }));
    }

    #[test]
    fn any_state_can_move_to_shutdown() {
        let cell = StatusCell::new(AgentId::random());
        cell.transition(AgentStatus::Shutdown).unwrap();
        assert_eq!(cell.get(), AgentStatus::Shutdown);
    }
}
