//! Errors raised by the agent registry.

use thiserror::Error;

/// Result alias used throughout the registry.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors the registry can raise. Registration itself never fails (a
/// re-registration updates in place, per spec §4.3); this type exists
/// for operations that can meaningfully fail.
#[derive(Debug, Error)]
pub enum Error {
    /// The identifier named in the operation is not currently registered.
    #[error("agent {0} is not registered")]
    NotRegistered(orchestra_primitives::AgentId),
}
