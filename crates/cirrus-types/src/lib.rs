//! Shared types for Cirrus.
//!
//! These are the records that flow between the cloud layer, the session
//! engine and the CLI: instances and their reachability, command results,
//! history entries and the filters used to query the fleet.

pub mod command;
pub mod error;
pub mod filter;
pub mod instance;

pub use command::{CommandRecord, CommandResult, InvocationStatus, MAX_RECORDED_OUTPUT_CHARS};
pub use error::{Error, Result};
pub use filter::{InstanceFilter, parse_tag};
pub use instance::{Instance, NOT_AVAILABLE, ReachabilityStatus, UNNAMED};
