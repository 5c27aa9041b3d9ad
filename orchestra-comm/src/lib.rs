//! The Communication Layer (spec §4.4): correlated request/response and
//! broadcast delegation built atop the message bus, plus per-peer
//! relationship bookkeeping.
//!
//! Each [`CommunicationLayer`] instance owns one agent's inbound task
//! listener (`tasks.{self}`) and response listener
//! (`tasks.{self}.result`); `delegate_task` publishes onto the
//! target's inbound topic and awaits a single-shot completion slot
//! keyed by a generated message id, exactly as spec §4.4 step 3–6
//! describes.

#![warn(missing_docs, clippy::pedantic)]

mod envelope;
mod error;
mod relationship;
mod topics;

pub use envelope::{MessageEnvelope, ResponseEnvelope};
pub use error::{Error, Result};
pub use relationship::AgentRelationship;
pub use topics::{agents_event_topic, result_topic, tasks_topic};

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::Value;
use tokio::sync::oneshot;
use tracing::warn;
use uuid::Uuid;

use orchestra_agent::{Task, TaskResult, DEFAULT_PRIORITY};
use orchestra_bus::{MessageBus, SubscriptionId};
use orchestra_handlers::HandlerRegistry;
use orchestra_primitives::{AgentId, TaskId};

type PendingMap = Arc<Mutex<HashMap<String, oneshot::Sender<TaskResult>>>>;
type RelationshipMap = Arc<Mutex<HashMap<AgentId, AgentRelationship>>>;

/// The outcome of a [`CommunicationLayer::broadcast`] call (spec §4.4
/// "aggregated results... include a summary of total/succeeded/failed").
#[derive(Clone, Debug)]
pub struct BroadcastOutcome {
    /// Per-target results.
    pub results: HashMap<AgentId, TaskResult>,
    /// Number of targets the broadcast was issued to.
    pub total_requests: usize,
    /// Targets whose delegation completed successfully.
    pub succeeded: usize,
    /// Targets whose delegation failed or timed out.
    pub failed: usize,
}

/// One agent's view of the communication layer: its inbound/response
/// listeners, in-flight delegations, and peer relationships.
pub struct CommunicationLayer {
    bus: MessageBus,
    agent_id: AgentId,
    pending: PendingMap,
    relationships: RelationshipMap,
    subscriptions: Vec<(String, SubscriptionId)>,
}

impl CommunicationLayer {
    /// Builds a communication layer for `agent_id`, subscribing its
    /// inbound task listener (dispatching through `handlers`) and its
    /// response listener on `bus`.
    #[must_use]
    pub fn new(bus: MessageBus, agent_id: AgentId, handlers: HandlerRegistry) -> Self {
        let pending: PendingMap = Arc::new(Mutex::new(HashMap::new()));
        let relationships: RelationshipMap = Arc::new(Mutex::new(HashMap::new()));
        let mut subscriptions = Vec::new();

        let inbound_topic = tasks_topic(agent_id);
        let inbound_bus = bus.clone();
        let inbound_id = bus.subscribe(inbound_topic.clone(), move |message: Value| {
            let handlers = handlers.clone();
            let bus = inbound_bus.clone();
            async move { handle_inbound(&handlers, &bus, message).await }
        });
        subscriptions.push((inbound_topic, inbound_id));

        let result_topic_name = result_topic(agent_id);
        let result_pending = Arc::clone(&pending);
        let result_id = bus.subscribe(result_topic_name.clone(), move |message: Value| {
            let pending = Arc::clone(&result_pending);
            async move { handle_response(&pending, message) }
        });
        subscriptions.push((result_topic_name, result_id));

        Self {
            bus,
            agent_id,
            pending,
            relationships,
            subscriptions,
        }
    }

    /// This layer's own agent identifier.
    #[must_use]
    pub const fn agent_id(&self) -> AgentId {
        self.agent_id
    }

    /// Delegates one task to `target` and awaits its response.
    ///
    /// Builds a [`MessageEnvelope`], registers a single-shot completion
    /// slot keyed by a fresh message id, and publishes non-blocking onto
    /// `tasks.{target}` (spec §4.4 steps 1–4). On timeout, the pending
    /// entry is discarded and a `{status: timeout, error: "timeout"}`
    /// result is returned (step 6); on arrival, the response listener
    /// resolves the slot. Either way, the per-peer relationship with
    /// `target` is updated before returning.
    pub async fn delegate_task(
        &self,
        target: AgentId,
        task_type: impl Into<String>,
        parameters: Value,
        priority: u8,
        timeout: Duration,
    ) -> TaskResult {
        let message_id = Uuid::new_v4().to_string();
        let task_id = TaskId::new(message_id.clone()).expect("uuid string is non-empty");
        let envelope = MessageEnvelope {
            message_id: message_id.clone(),
            task_id: task_id.clone(),
            task_type: task_type.into(),
            parameters,
            priority,
            reply_topic: result_topic(self.agent_id),
            sender_id: self.agent_id,
            timestamp_millis: chrono::Utc::now().timestamp_millis(),
        };

        let (tx, rx) = oneshot::channel();
        self.pending.lock().expect("pending map poisoned").insert(message_id.clone(), tx);

        let payload = match serde_json::to_value(&envelope) {
            Ok(value) => value,
            Err(err) => {
                self.pending.lock().expect("pending map poisoned").remove(&message_id);
                return TaskResult::failed(task_id, format!("failed to encode envelope: {err}"), 0.0);
            }
        };

        if let Err(err) = self.bus.publish(&tasks_topic(target), payload, false).await {
            self.pending.lock().expect("pending map poisoned").remove(&message_id);
            self.record_relationship(target, false);
            return TaskResult::failed(task_id, err.to_string(), 0.0);
        }

        let outcome = match tokio::time::timeout(timeout, rx).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => {
                self.pending.lock().expect("pending map poisoned").remove(&message_id);
                TaskResult::failed(task_id, "response channel closed before reply", 0.0)
            }
            Err(_) => {
                self.pending.lock().expect("pending map poisoned").remove(&message_id);
                TaskResult::timeout(task_id)
            }
        };

        self.record_relationship(target, outcome.is_success());
        outcome
    }

    /// Issues `delegate_task` concurrently to every entry in `targets`,
    /// aggregating per-target results (spec §4.4 "broadcast").
    pub async fn broadcast(
        &self,
        task_type: &str,
        parameters: Value,
        targets: &[AgentId],
        timeout: Duration,
    ) -> BroadcastOutcome {
        let calls = targets.iter().map(|&target| {
            let parameters = parameters.clone();
            let task_type = task_type.to_string();
            async move {
                let result = self
                    .delegate_task(target, task_type, parameters, DEFAULT_PRIORITY, timeout)
                    .await;
                (target, result)
            }
        });

        let outcomes = futures::future::join_all(calls).await;

        let mut results = HashMap::with_capacity(outcomes.len());
        let mut succeeded = 0usize;
        let mut failed = 0usize;
        for (target, result) in outcomes {
            if result.is_success() {
                succeeded += 1;
            } else {
                failed += 1;
            }
            results.insert(target, result);
        }

        BroadcastOutcome {
            total_requests: targets.len(),
            succeeded,
            failed,
            results,
        }
    }

    /// Returns the relationship record tracked for `peer`, if any
    /// interaction has occurred.
    #[must_use]
    pub fn relationship(&self, peer: AgentId) -> Option<AgentRelationship> {
        self.relationships.lock().expect("relationship map poisoned").get(&peer).copied()
    }

    fn record_relationship(&self, peer: AgentId, succeeded: bool) {
        let mut relationships = self.relationships.lock().expect("relationship map poisoned");
        relationships.entry(peer).or_default().record(succeeded);
    }
}

impl Drop for CommunicationLayer {
    fn drop(&mut self) {
        for (topic, id) in &self.subscriptions {
            self.bus.unsubscribe(topic, *id);
        }
    }
}

/// Handles one inbound task request: dispatches to the locally
/// registered handler and publishes the response on the envelope's
/// reply topic (spec §4.4 "inbound task handler").
async fn handle_inbound(
    handlers: &HandlerRegistry,
    bus: &MessageBus,
    message: Value,
) -> orchestra_bus::Result<()> {
    let envelope: MessageEnvelope = serde_json::from_value(message)
        .map_err(|err| orchestra_bus::Error::Rejected(err.to_string()))?;

    let task = Task::new(envelope.task_id.clone(), envelope.task_type.clone(), value_to_param_map(envelope.parameters.clone()));

    let result = match handlers.dispatch(task).await {
        Ok(result) => result,
        Err(err) => TaskResult::failed(envelope.task_id.clone(), err.to_string(), 0.0),
    };

    let response = ResponseEnvelope {
        message_id: envelope.message_id,
        result,
    };
    let payload = serde_json::to_value(&response)
        .map_err(|err| orchestra_bus::Error::Rejected(err.to_string()))?;
    bus.publish(&envelope.reply_topic, payload, false).await
}

/// Handles one response: resolves the pending completion slot matching
/// its message id, or logs and discards an unknown one (spec §4.4
/// "response handler").
fn handle_response(pending: &PendingMap, message: Value) -> orchestra_bus::Result<()> {
    let response: ResponseEnvelope = serde_json::from_value(message)
        .map_err(|err| orchestra_bus::Error::Rejected(err.to_string()))?;

    let sender = pending
        .lock()
        .expect("pending map poisoned")
        .remove(&response.message_id);

    match sender {
        Some(tx) => {
            let _ = tx.send(response.result);
        }
        None => {
            warn!(message_id = %response.message_id, "response for unknown or expired pending request");
        }
    }
    Ok(())
}

fn value_to_param_map(value: Value) -> orchestra_agent::ParamMap {
    match value {
        Value::Object(map) => map,
        Value::Null => orchestra_agent::ParamMap::new(),
        other => {
            let mut map = orchestra_agent::ParamMap::new();
            map.insert("value".to_string(), other);
            map
        }
    }
}
