//! Locally-registered task-type handlers (spec §4.4: "a map of locally
//! registered task-type handlers") that an agent's inbound task
//! listener dispatches to.
//!
//! Grounded on the teacher's `agent-tools` tool registry, generalized
//! from tool-name/JSON invocation to task-type/[`Task`] dispatch: the
//! same name-keyed, type-erased-callable shape, narrowed to the one
//! consumer this core has for it (`orchestra-comm`'s inbound handler).

#![warn(missing_docs, clippy::pedantic)]

mod registry;

pub use registry::{HandlerError, HandlerRegistry, HandlerResult, TaskHandler};
