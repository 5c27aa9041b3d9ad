//! Errors produced by the message bus and its handlers.

use thiserror::Error;

/// Result alias used throughout the message bus.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors the message bus itself can raise, and the error type a handler
/// returns to report a processing failure.
#[derive(Debug, Error)]
pub enum Error {
    /// One or more handlers failed during a blocking publish. Failures are
    /// collected so that a single bad handler never prevents the others
    /// from running.
    #[error("{} handler(s) failed: {}", .0.len(), .0.join("; "))]
    HandlerFailures(Vec<String>),

    /// A handler rejected the message it was given.
    #[error("handler rejected message: {0}")]
    Rejected(String),
}
