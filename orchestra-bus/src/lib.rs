//! In-process topic pub/sub used to decouple publishers from subscribers.
//!
//! Handlers are registered per topic and invoked with a snapshot of the
//! topic's handler list taken at publish time: subscriptions added while a
//! publish is in flight never observe that publish.

mod error;
mod handler;

pub use error::{Error, Result};
pub use handler::{BoxedHandler, Handler};

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use serde_json::Value;
use tracing::{debug, warn};

/// Opaque handle returned by [`MessageBus::subscribe`], used to identify a
/// specific registration for [`MessageBus::unsubscribe`].
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct SubscriptionId(u64);

struct Subscription {
    id: SubscriptionId,
    handler: BoxedHandler,
}

/// An in-process, topic-keyed publish/subscribe bus.
///
/// Cloning a `MessageBus` yields a handle to the same underlying topic map;
/// it is cheap and intended to be shared across tasks.
#[derive(Clone, Default)]
pub struct MessageBus {
    topics: Arc<RwLock<HashMap<String, Vec<Subscription>>>>,
    next_id: Arc<AtomicU64>,
}

impl MessageBus {
    /// Creates an empty bus.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handler` under `topic`. Duplicate registrations for the
    /// same topic are permitted; each subscriber receives the message once
    /// per publish.
    pub fn subscribe(&self, topic: impl Into<String>, handler: impl Handler + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let topic = topic.into();
        let mut topics = self.topics.write().expect("message bus lock poisoned");
        topics
            .entry(topic.clone())
            .or_default()
            .push(Subscription {
                id,
                handler: std::sync::Arc::new(handler),
            });
        debug!(topic = %topic, subscription = id.0, "handler subscribed");
        id
    }

    /// Removes the subscription identified by `id` from `topic`, if present.
    /// Silently does nothing when no such subscription exists.
    pub fn unsubscribe(&self, topic: &str, id: SubscriptionId) {
        let mut topics = self.topics.write().expect("message bus lock poisoned");
        if let Some(handlers) = topics.get_mut(topic) {
            if let Some(pos) = handlers.iter().position(|s| s.id == id) {
                handlers.remove(pos);
                debug!(topic, subscription = id.0, "handler unsubscribed");
            }
        }
    }

    /// Publishes `message` to every handler currently subscribed to `topic`.
    ///
    /// When `blocking` is `true`, the future resolves only once every
    /// handler has run; handler errors are collected and returned as an
    /// aggregate [`Error::HandlerFailures`] without preventing the other
    /// handlers from running. When `blocking` is `false`, each handler is
    /// dispatched on its own `tokio` task and this call returns immediately
    /// with an empty success.
    ///
    /// Publishing to a topic with no subscribers is a no-op.
    pub async fn publish(&self, topic: &str, message: Value, blocking: bool) -> Result<()> {
        let snapshot: Vec<BoxedHandler> = {
            let topics = self.topics.read().expect("message bus lock poisoned");
            match topics.get(topic) {
                Some(handlers) => handlers.iter().map(|s| s.handler.clone()).collect(),
                None => Vec::new(),
            }
        };

        if snapshot.is_empty() {
            return Ok(());
        }

        if blocking {
            let mut failures = Vec::new();
            for handler in snapshot {
                if let Err(err) = handler.handle(message.clone()).await {
                    warn!(topic, error = %err, "handler failed");
                    failures.push(err.to_string());
                }
            }
            if failures.is_empty() {
                Ok(())
            } else {
                Err(Error::HandlerFailures(failures))
            }
        } else {
            for handler in snapshot {
                let message = message.clone();
                let topic = topic.to_string();
                tokio::spawn(async move {
                    if let Err(err) = handler.handle(message).await {
                        warn!(topic = %topic, error = %err, "handler failed");
                    }
                });
            }
            Ok(())
        }
    }

    /// Returns the number of handlers currently subscribed to `topic`.
    #[must_use]
    pub fn subscriber_count(&self, topic: &str) -> usize {
        let topics = self.topics.read().expect("message bus lock poisoned");
        topics.get(topic).map_or(0, Vec::len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Mutex;

    #[tokio::test]
    async fn publish_with_no_subscribers_is_noop() {
        let bus = MessageBus::new();
        bus.publish("nobody", Value::Null, true).await.expect("ok");
    }

    #[tokio::test]
    async fn blocking_publish_invokes_all_handlers_in_order() {
        let bus = MessageBus::new();
        let seen: Arc<Mutex<Vec<i64>>> = Arc::new(Mutex::new(Vec::new()));

        for _ in 0..3 {
            let seen = Arc::clone(&seen);
            bus.subscribe("numbers", move |value: Value| {
                let seen = Arc::clone(&seen);
                async move {
                    seen.lock().expect("lock").push(value.as_i64().unwrap_or_default());
                    Ok(())
                }
            });
        }

        bus.publish("numbers", Value::from(7), true).await.expect("ok");
        assert_eq!(seen.lock().expect("lock").len(), 3);
    }

    #[tokio::test]
    async fn one_failing_handler_does_not_block_others() {
        let bus = MessageBus::new();
        let hits = Arc::new(AtomicUsize::new(0));

        bus.subscribe("mixed", |_value: Value| async { Err(Error::Rejected("boom".into())) });
        let hits_clone = Arc::clone(&hits);
        bus.subscribe("mixed", move |_value: Value| {
            let hits = Arc::clone(&hits_clone);
            async move {
                hits.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        });

        let result = bus.publish("mixed", Value::Null, true).await;
        assert!(matches!(result, Err(Error::HandlerFailures(failures)) if failures.len() == 1));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn unsubscribe_removes_only_matching_handler() {
        let bus = MessageBus::new();
        let hits = Arc::new(AtomicUsize::new(0));

        let hits_a = Arc::clone(&hits);
        let id_a = bus.subscribe("topic", move |_value: Value| {
            let hits = Arc::clone(&hits_a);
            async move {
                hits.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        });
        let hits_b = Arc::clone(&hits);
        bus.subscribe("topic", move |_value: Value| {
            let hits = Arc::clone(&hits_b);
            async move {
                hits.fetch_add(10, Ordering::SeqCst);
                Ok(())
            }
        });

        bus.unsubscribe("topic", id_a);
        bus.publish("topic", Value::Null, true).await.expect("ok");
        assert_eq!(hits.load(Ordering::SeqCst), 10);
    }

    #[tokio::test]
    async fn subscriptions_added_after_publish_begins_are_not_observed() {
        let bus = MessageBus::new();
        let hits = Arc::new(AtomicUsize::new(0));

        bus.subscribe("late", |_value: Value| async {
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
            Ok(())
        });

        let publish_bus = bus.clone();
        let publish_task = tokio::spawn(async move {
            publish_bus.publish("late", Value::Null, true).await
        });

        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        let hits_clone = Arc::clone(&hits);
        bus.subscribe("late", move |_value: Value| {
            let hits = Arc::clone(&hits_clone);
            async move {
                hits.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        });

        publish_task.await.expect("join").expect("publish ok");
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }
}
