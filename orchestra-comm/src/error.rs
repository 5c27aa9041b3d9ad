//! Errors raised by the communication layer.

use thiserror::Error;

/// Result alias used throughout the communication layer.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors the communication layer can raise. Delegation failures
/// (timeouts, handler errors) are reported as failed [`orchestra_agent::TaskResult`]s
/// rather than through this type, per spec §4.4/§7 — this type covers
/// the cases that prevent a delegation from being attempted at all.
#[derive(Debug, Error)]
pub enum Error {
    /// The message bus rejected the publish itself (as opposed to a
    /// handler failing, which the bus already isolates).
    #[error("message bus error: {0}")]
    Bus(#[from] orchestra_bus::Error),

    /// The envelope could not be serialized to JSON.
    #[error("failed to encode message envelope: {0}")]
    Encode(#[from] serde_json::Error),
}
