//! Shared error definitions for the orchestration core.

use thiserror::Error;
use uuid::Error as UuidError;

/// Result alias used throughout the orchestration core.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while manipulating core primitive types.
#[derive(Debug, Error)]
pub enum Error {
    /// The provided identifier could not be parsed as a UUID.
    #[error("invalid identifier: {source}")]
    InvalidId {
        /// Source parsing error from the UUID library.
        #[from]
        source: UuidError,
    },

    /// A capability token did not match any known variant.
    #[error("unknown capability `{0}`")]
    UnknownCapability(String),

    /// A task, subtask, or agent identifier string was empty.
    #[error("identifier cannot be empty")]
    EmptyIdentifier,
}
