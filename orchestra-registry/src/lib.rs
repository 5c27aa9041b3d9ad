//! The Agent Registry (spec §4.3): thread-safe registration, multi-index
//! lookup by identifier/type/capability, and weighted scoring for
//! selection.
//!
//! The registry never extends an agent's lifetime: it stores
//! [`std::sync::Weak`] handles, so an agent that has otherwise been
//! dropped by its owner disappears from selection the next time the
//! registry is touched, without requiring an explicit `unregister` call
//! (though callers should still call it on clean shutdown, per spec
//! §3's ownership note).

#![warn(missing_docs, clippy::pedantic)]

mod error;
mod score;

pub use error::{Error, Result};
pub use score::selection_score;

use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex, Weak};
use std::time::Instant;

use tracing::{debug, warn};

use orchestra_agent::{BaseAgent, Requirements};
use orchestra_config::SelectionWeights;
use orchestra_primitives::{AgentId, AgentStatus, Capability};

/// Per-agent registration bookkeeping, separate from the agent's own
/// running counters (spec §4.3 "a health map keyed by identifier").
#[derive(Clone, Copy, Debug)]
pub struct HealthRecord {
    /// When this agent was (most recently) registered.
    pub registered_at: Instant,
    /// When this agent was last returned by [`AgentRegistry::get_agent_for_task`].
    pub last_selected_at: Option<Instant>,
}

impl HealthRecord {
    fn new() -> Self {
        Self {
            registered_at: Instant::now(),
            last_selected_at: None,
        }
    }
}

struct Indices {
    primary: HashMap<AgentId, Weak<dyn BaseAgent>>,
    by_type: HashMap<String, BTreeSet<AgentId>>,
    by_capability: HashMap<Capability, BTreeSet<AgentId>>,
    health: HashMap<AgentId, HealthRecord>,
}

impl Indices {
    fn new() -> Self {
        Self {
            primary: HashMap::new(),
            by_type: HashMap::new(),
            by_capability: HashMap::new(),
            health: HashMap::new(),
        }
    }

    /// Removes `id` from every index. Called both for explicit
    /// unregistration and for lazily pruning a handle whose owner has
    /// already dropped it.
    fn remove(&mut self, id: AgentId) {
        self.primary.remove(&id);
        self.health.remove(&id);
        self.by_type.retain(|_, ids| {
            ids.remove(&id);
            !ids.is_empty()
        });
        self.by_capability.retain(|_, ids| {
            ids.remove(&id);
            !ids.is_empty()
        });
    }
}

/// Thread-safe index of live agents, with weighted selection among the
/// candidates capable of a given task.
pub struct AgentRegistry {
    indices: Mutex<Indices>,
    weights: SelectionWeights,
}

impl Default for AgentRegistry {
    fn default() -> Self {
        Self::new(SelectionWeights::default())
    }
}

impl AgentRegistry {
    /// Creates an empty registry using the given selection weights.
    #[must_use]
    pub fn new(weights: SelectionWeights) -> Self {
        Self {
            indices: Mutex::new(Indices::new()),
            weights,
        }
    }

    /// Registers `agent` into the primary, type, and capability indices.
    ///
    /// Re-registering an identifier already present updates the handle
    /// in place and emits a warning, per spec §4.3.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn register(&self, agent: &Arc<dyn BaseAgent>) {
        let id = agent.id();
        let agent_type = agent.agent_type().to_string();
        let capabilities = agent.capabilities().clone();

        let mut indices = self.indices.lock().expect("agent registry lock poisoned");
        if indices.primary.contains_key(&id) {
            warn!(agent_id = %id, "re-registering already-registered agent");
            indices.remove(id);
        }

        indices.primary.insert(id, Arc::downgrade(agent));
        indices.by_type.entry(agent_type).or_default().insert(id);
        for capability in capabilities {
            indices.by_capability.entry(capability).or_default().insert(id);
        }
        indices.health.insert(id, HealthRecord::new());
        debug!(agent_id = %id, "agent registered");
    }

    /// Removes `id` from every index and from health tracking. Silent
    /// (returns `false`) if the identifier was not registered.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn unregister(&self, id: AgentId) -> bool {
        let mut indices = self.indices.lock().expect("agent registry lock poisoned");
        let present = indices.primary.contains_key(&id);
        if present {
            indices.remove(id);
            debug!(agent_id = %id, "agent unregistered");
        }
        present
    }

    /// Returns the [`HealthRecord`] tracked for `id`, if registered.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn health(&self, id: AgentId) -> Option<HealthRecord> {
        let indices = self.indices.lock().expect("agent registry lock poisoned");
        indices.health.get(&id).copied()
    }

    /// Returns the agent registered under `id`, pruning it from every
    /// index first if its owner has already dropped the only strong
    /// reference.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn get(&self, id: AgentId) -> Option<Arc<dyn BaseAgent>> {
        let mut indices = self.indices.lock().expect("agent registry lock poisoned");
        match indices.primary.get(&id).cloned() {
            Some(weak) => match weak.upgrade() {
                Some(agent) => Some(agent),
                None => {
                    indices.remove(id);
                    None
                }
            },
            None => None,
        }
    }

    /// Returns the identifiers of every agent registered under `agent_type`.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn agents_by_type(&self, agent_type: &str) -> Vec<AgentId> {
        let indices = self.indices.lock().expect("agent registry lock poisoned");
        indices
            .by_type
            .get(agent_type)
            .map(|ids| ids.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Returns the identifiers of every agent declaring `capability`.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn agents_by_capability(&self, capability: &Capability) -> Vec<AgentId> {
        let indices = self.indices.lock().expect("agent registry lock poisoned");
        indices
            .by_capability
            .get(capability)
            .map(|ids| ids.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Returns the number of agents currently registered.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn len(&self) -> usize {
        let indices = self.indices.lock().expect("agent registry lock poisoned");
        indices.primary.len()
    }

    /// Returns `true` when no agents are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Selects the best candidate for `task_type`/`requirements`, per
    /// spec §4.3:
    ///
    /// 1. Retain agents whose `can_handle` is true.
    /// 2. Prefer `Idle` candidates; fall back to `Working` only if no
    ///    `Idle` candidate exists.
    /// 3. Among that pool, return the highest [`selection_score`], with
    ///    ties broken by the lexicographically smallest agent identifier.
    ///
    /// Returns `None` when no registered agent can handle the task.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn get_agent_for_task(
        &self,
        task_type: &str,
        requirements: &Requirements,
    ) -> Option<Arc<dyn BaseAgent>> {
        let mut indices = self.indices.lock().expect("agent registry lock poisoned");

        let mut dead = Vec::new();
        let mut idle_candidates = Vec::new();
        let mut working_candidates = Vec::new();

        for (id, weak) in &indices.primary {
            match weak.upgrade() {
                None => dead.push(*id),
                Some(agent) => {
                    if agent.can_handle(task_type, requirements) {
                        match agent.status() {
                            AgentStatus::Idle => idle_candidates.push(agent),
                            AgentStatus::Working => working_candidates.push(agent),
                            _ => {}
                        }
                    }
                }
            }
        }

        for id in dead {
            debug!(agent_id = %id, "pruning dropped agent from registry");
            indices.remove(id);
        }

        let pool = if idle_candidates.is_empty() {
            working_candidates
        } else {
            idle_candidates
        };

        let best = pool.into_iter().max_by(|a, b| self.compare(a, b));

        if let Some(agent) = &best {
            if let Some(record) = indices.health.get_mut(&agent.id()) {
                record.last_selected_at = Some(Instant::now());
            }
        }

        best
    }

    fn compare(&self, a: &Arc<dyn BaseAgent>, b: &Arc<dyn BaseAgent>) -> Ordering {
        let score_a = selection_score(&a.metrics(), &self.weights);
        let score_b = selection_score(&b.metrics(), &self.weights);
        match score_a.partial_cmp(&score_b).unwrap_or(Ordering::Equal) {
            Ordering::Equal => {
                // Deterministic tiebreak: the smaller identifier wins, so
                // `max_by` (which keeps the *last* equal element) needs the
                // comparison inverted relative to plain identifier order.
                b.id().to_string().cmp(&a.id().to_string())
            }
            ordering => ordering,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use orchestra_agent::ReferenceAgent;
    use orchestra_primitives::Capability;
    use std::time::Duration;

    fn analysis_agent(agent_type: &str) -> Arc<dyn BaseAgent> {
        let capabilities = [Capability::Analysis].into();
        Arc::new(ReferenceAgent::new(AgentId::random(), agent_type, capabilities))
    }

    #[tokio::test]
    async fn register_then_select_returns_capable_agent() {
        let registry = AgentRegistry::default();
        let agent = analysis_agent("analysis-worker");
        agent.initialize().await.unwrap();
        registry.register(&agent);

        let selected = registry
            .get_agent_for_task("text_analysis", &Requirements::none())
            .expect("a capable agent should be found");
        assert_eq!(selected.id(), agent.id());
    }

    #[tokio::test]
    async fn incapable_task_type_returns_none() {
        let registry = AgentRegistry::default();
        let agent = analysis_agent("analysis-worker");
        agent.initialize().await.unwrap();
        registry.register(&agent);

        assert!(registry
            .get_agent_for_task("compression", &Requirements::none())
            .is_none());
    }

    #[tokio::test]
    async fn idle_is_preferred_over_working() {
        let registry = AgentRegistry::default();

        let idle = analysis_agent("idle-worker");
        idle.initialize().await.unwrap();
        registry.register(&idle);

        let busy = Arc::new(
            ReferenceAgent::new(AgentId::random(), "busy-worker", [Capability::Analysis].into())
                .with_delay(Duration::from_millis(50)),
        );
        busy.initialize().await.unwrap();
        registry.register(&(busy.clone() as Arc<dyn BaseAgent>));

        // Drive the busy agent into Working without waiting for it to finish.
        let busy_clone = Arc::clone(&busy);
        let handle = tokio::spawn(async move {
            use orchestra_agent::{ParamMap, Task};
            use orchestra_primitives::TaskId;
            busy_clone
                .execute_task(Task::new(TaskId::new("t-1").unwrap(), "text_analysis", ParamMap::new()))
                .await
        });
        tokio::time::sleep(Duration::from_millis(10)).await;

        let selected = registry
            .get_agent_for_task("text_analysis", &Requirements::none())
            .expect("some candidate");
        assert_eq!(selected.id(), idle.id());

        handle.await.unwrap();
    }

    #[tokio::test]
    async fn get_returns_the_registered_agent() {
        let registry = AgentRegistry::default();
        let agent = analysis_agent("analysis-worker");
        agent.initialize().await.unwrap();
        registry.register(&agent);

        assert_eq!(registry.get(agent.id()).expect("registered").id(), agent.id());
        assert!(registry.get(AgentId::random()).is_none());
    }

    #[tokio::test]
    async fn unregister_removes_from_every_index() {
        let registry = AgentRegistry::default();
        let agent = analysis_agent("analysis-worker");
        agent.initialize().await.unwrap();
        registry.register(&agent);
        assert_eq!(registry.len(), 1);

        assert!(registry.unregister(agent.id()));
        assert_eq!(registry.len(), 0);
        assert!(registry
            .get_agent_for_task("text_analysis", &Requirements::none())
            .is_none());
        assert!(registry.agents_by_type("analysis-worker").is_empty());
    }

    #[tokio::test]
    async fn dropping_the_owning_arc_prunes_the_weak_handle() {
        let registry = AgentRegistry::default();
        {
            let agent = analysis_agent("ephemeral-worker");
            agent.initialize().await.unwrap();
            registry.register(&agent);
        }
        // The only strong reference has now gone out of scope.
        assert!(registry
            .get_agent_for_task("text_analysis", &Requirements::none())
            .is_none());
        assert_eq!(registry.len(), 0, "dead weak handle should be pruned on access");
    }

    #[test]
    fn higher_score_wins_and_ties_break_by_identifier() {
        let registry = AgentRegistry::default();
        let low_id = AgentId::from_uuid(uuid::Uuid::nil());
        let high_id = AgentId::random();
        let a: Arc<dyn BaseAgent> =
            Arc::new(ReferenceAgent::new(low_id, "a", [Capability::Analysis].into()));
        let b: Arc<dyn BaseAgent> =
            Arc::new(ReferenceAgent::new(high_id, "b", [Capability::Analysis].into()));
        // Equal, untested metrics: tie broken by identifier, smallest wins.
        assert_eq!(registry.compare(&a, &b), Ordering::Greater);
    }
}
