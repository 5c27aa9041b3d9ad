//! The async handler contract subscribers implement.

use std::future::Future;
use std::pin::Pin;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;

/// An asynchronous callable invoked with a published message.
///
/// A blanket implementation covers any `Fn(Value) -> Future<Output =
/// Result<()>>`, so closures can be passed directly to
/// [`crate::MessageBus::subscribe`] without an explicit trait impl.
#[async_trait]
pub trait Handler: Send + Sync {
    /// Handles a single published message.
    async fn handle(&self, message: Value) -> Result<()>;
}

#[async_trait]
impl<F, Fut> Handler for F
where
    F: Fn(Value) -> Fut + Send + Sync,
    Fut: Future<Output = Result<()>> + Send + 'static,
{
    async fn handle(&self, message: Value) -> Result<()> {
        (self)(message).await
    }
}

/// A reference-counted, type-erased [`Handler`].
///
/// The bus stores handlers behind [`std::sync::Arc`] rather than
/// [`Box`] so that a publish snapshot can share ownership with the
/// registered handler instead of needing it to be [`Clone`].
pub type BoxedHandler = std::sync::Arc<dyn Handler>;

/// Convenience alias for a pinned, boxed future — used by call sites that
/// need to name the handler future's type explicitly.
pub type HandlerFuture<'a> = Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>>;
