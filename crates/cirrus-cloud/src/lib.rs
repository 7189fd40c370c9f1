//! Cloud provider access for Cirrus.
//!
//! The provider is modeled as four narrow traits in [`provider`]:
//! - [`ComputeInventory`]: describe running instances and offered types
//! - [`ExecRegistry`]: is an instance registered with the remote-execution agent
//! - [`RemoteExecutor`]: send a shell command, wait for it, fetch its output
//! - [`AuditTrail`]: API event history and log search
//!
//! [`AwsCli`] implements all four by invoking the `aws` command-line client.
//! On top of them sit the components callers use:
//! - [`InstanceDirectory`]: filtered instance listing with reachability
//! - [`CommandRunner`]: submit/await for shell commands
//! - [`AuditLog`]: event lookup and log search over time windows
//!
//! With the `testing` feature, [`MockCloud`] provides a scriptable in-memory
//! provider.

pub mod audit;
pub mod aws_cli;
pub mod directory;
pub mod error;
pub mod inventory;
#[cfg(any(test, feature = "testing"))]
pub mod mock;
pub mod provider;
pub mod runner;

pub use audit::{AuditLog, EventQuery, TimeWindow};
pub use aws_cli::AwsCli;
pub use directory::{InstanceDirectory, build_filters};
pub use error::{CloudError, Result};
#[cfg(any(test, feature = "testing"))]
pub use mock::MockCloud;
pub use provider::{
    AuditEvent, AuditTrail, ComputeInventory, EventPage, EventResource, ExecRegistry, Filter,
    InstanceDescription, InvocationOutput, LogEvent, LogFilterRequest, LogStream, LookupRequest,
    RemoteExecutor, SendCommandRequest,
};
pub use runner::{CommandRunner, RUN_SHELL_DOCUMENT, SubmitOutcome, default_comment};
