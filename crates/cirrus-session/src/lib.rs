//! Session engine for Cirrus.
//!
//! A [`SessionContext`] runs shell commands through the cloud layer and keeps
//! an append-only history of what was run. It can project the current fleet
//! and that history into a [`ContextSnapshot`], which a [`QueryDispatcher`]
//! sends to a model together with a free-text question.

pub mod context;
pub mod dispatch;
pub mod error;
pub mod session;
pub mod snapshot;

pub use context::{FAILED_TO_SEND, SessionContext};
pub use dispatch::{ModelAccess, QUERY_ERROR_PREFIX, QueryDispatcher, QueryOptions};
pub use error::{Result, SessionError};
pub use session::Session;
pub use snapshot::{
    ContextSnapshot, Environment, SCHEMA_VERSION, SessionInfo, SnapshotInstance,
};
