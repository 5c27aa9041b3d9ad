//! Runtime registry mapping a task type to the local handler that
//! executes it.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;

use orchestra_agent::{Task, TaskResult};

/// Result alias for handler registry operations.
pub type HandlerResult<T> = Result<T, HandlerError>;

/// The contract a locally-installed task-type handler implements.
///
/// A blanket implementation covers any `Fn(Task) -> Future<Output =
/// TaskResult>`, so closures can be registered directly without an
/// explicit trait impl.
#[async_trait]
pub trait TaskHandler: Send + Sync {
    /// Executes the handler against one task, producing its result.
    async fn handle(&self, task: Task) -> TaskResult;
}

#[async_trait]
impl<F, Fut> TaskHandler for F
where
    F: Fn(Task) -> Fut + Send + Sync,
    Fut: Future<Output = TaskResult> + Send + 'static,
{
    async fn handle(&self, task: Task) -> TaskResult {
        (self)(task).await
    }
}

/// A name-keyed registry of locally installed task handlers, consulted
/// by the communication layer's inbound task listener (spec §4.4's
/// inbound task handler: "dispatches by `task_type` to a locally
/// registered handler").
#[derive(Clone, Default)]
pub struct HandlerRegistry {
    inner: Arc<RwLock<HashMap<String, Arc<dyn TaskHandler>>>>,
}

impl HandlerRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handler` for `task_type`.
    ///
    /// # Errors
    ///
    /// Returns [`HandlerError::Duplicate`] if a handler is already
    /// registered for this task type.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn register<H>(&self, task_type: impl Into<String>, handler: H) -> HandlerResult<()>
    where
        H: TaskHandler + 'static,
    {
        let task_type = task_type.into();
        let mut inner = self.inner.write().expect("handler registry lock poisoned");
        if inner.contains_key(&task_type) {
            return Err(HandlerError::Duplicate { task_type });
        }
        debug!(task_type, "task handler registered");
        inner.insert(task_type, Arc::new(handler));
        Ok(())
    }

    /// Returns the handler registered for `task_type`, if any.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn get(&self, task_type: &str) -> Option<Arc<dyn TaskHandler>> {
        let inner = self.inner.read().expect("handler registry lock poisoned");
        inner.get(task_type).cloned()
    }

    /// Removes the handler registered for `task_type`, if any.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn unregister(&self, task_type: &str) {
        let mut inner = self.inner.write().expect("handler registry lock poisoned");
        inner.remove(task_type);
    }

    /// Dispatches `task` to the handler registered for its `task_type`.
    ///
    /// # Errors
    ///
    /// Returns [`HandlerError::NotFound`] when no handler is registered
    /// for the task's type.
    pub async fn dispatch(&self, task: Task) -> HandlerResult<TaskResult> {
        let handler = self
            .get(&task.task_type)
            .ok_or_else(|| HandlerError::NotFound {
                task_type: task.task_type.clone(),
            })?;
        Ok(handler.handle(task).await)
    }

    /// Lists every task type with a registered handler.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn registered_types(&self) -> Vec<String> {
        let inner = self.inner.read().expect("handler registry lock poisoned");
        inner.keys().cloned().collect()
    }
}

/// Errors produced by [`HandlerRegistry`] operations.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// A handler was already registered for this task type.
    #[error("a handler is already registered for task type `{task_type}`")]
    Duplicate {
        /// The task type that collided.
        task_type: String,
    },

    /// No handler is registered for the requested task type.
    #[error("no handler registered for task type `{task_type}`")]
    NotFound {
        /// The task type that had no handler.
        task_type: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use orchestra_primitives::TaskId;
    use serde_json::Value;

    fn echo_task(task_type: &str) -> Task {
        Task::new(TaskId::new("t-1").unwrap(), task_type, orchestra_agent::ParamMap::new())
    }

    #[tokio::test]
    async fn dispatch_invokes_the_registered_handler() {
        let registry = HandlerRegistry::new();
        registry
            .register("ping", |task: Task| async move {
                TaskResult::completed(task.task_id, Value::String("pong".into()), 0.0)
            })
            .unwrap();

        let result = registry.dispatch(echo_task("ping")).await.unwrap();
        assert!(result.is_success());
        assert_eq!(result.result, Some(Value::String("pong".into())));
    }

    #[tokio::test]
    async fn dispatch_with_no_handler_errors() {
        let registry = HandlerRegistry::new();
        let err = registry.dispatch(echo_task("unhandled")).await.unwrap_err();
        assert!(matches!(err, HandlerError::NotFound { .. }));
    }

    #[tokio::test]
    async fn duplicate_registration_is_rejected() {
        let registry = HandlerRegistry::new();
        registry
            .register("ping", |task: Task| async move {
                TaskResult::completed(task.task_id, Value::Null, 0.0)
            })
            .unwrap();
        let err = registry
            .register("ping", |task: Task| async move {
                TaskResult::completed(task.task_id, Value::Null, 0.0)
            })
            .unwrap_err();
        assert!(matches!(err, HandlerError::Duplicate { .. }));
    }

    #[tokio::test]
    async fn unregister_removes_the_handler() {
        let registry = HandlerRegistry::new();
        registry
            .register("ping", |task: Task| async move {
                TaskResult::completed(task.task_id, Value::Null, 0.0)
            })
            .unwrap();
        registry.unregister("ping");
        assert!(registry.get("ping").is_none());
    }
}
