//! The session engine: run commands, keep history, build snapshots.

use chrono::{DateTime, Local};
use cirrus_cloud::{CommandRunner, InstanceDirectory, SubmitOutcome};
use cirrus_types::{CommandRecord, CommandResult, Instance, InstanceFilter};
use uuid::Uuid;

use crate::error::Result;
use crate::session::Session;
use crate::snapshot::{ContextSnapshot, Environment, SCHEMA_VERSION, SessionInfo, SnapshotInstance};

/// Error text returned when a command could not be submitted.
pub const FAILED_TO_SEND: &str = "Failed to send command";

/// Owns one [`Session`] and the cloud components it acts through.
///
/// All methods take `&self`; the context can be shared behind an `Arc`.
pub struct SessionContext {
    session: Session,
    directory: InstanceDirectory,
    runner: CommandRunner,
    region: Option<String>,
}

impl SessionContext {
    pub fn new(directory: InstanceDirectory, runner: CommandRunner) -> Self {
        Self {
            session: Session::new(),
            directory,
            runner,
            region: None,
        }
    }

    /// Region reported in snapshots.
    pub fn with_region(mut self, region: Option<String>) -> Self {
        self.region = region;
        self
    }

    pub fn session_id(&self) -> Uuid {
        self.session.id()
    }

    pub fn started_at(&self) -> DateTime<Local> {
        self.session.started_at()
    }

    pub fn region(&self) -> Option<&str> {
        self.region.as_deref()
    }

    /// Copy of the command history in append order.
    pub fn history(&self) -> Vec<CommandRecord> {
        self.session.history()
    }

    pub fn directory(&self) -> &InstanceDirectory {
        &self.directory
    }

    /// List instances through the session's directory.
    pub async fn list_instances(&self, filter: &InstanceFilter) -> Result<Vec<Instance>> {
        Ok(self.directory.list_instances(filter).await?)
    }

    /// Run `command` on one instance and wait for it to finish.
    ///
    /// A command that could not be sent returns a `Failed` result and is not
    /// recorded. Every command that was sent is recorded exactly once,
    /// whatever its final status. The returned result is never truncated.
    pub async fn run_command_on_instance(&self, instance_id: &str, command: &str) -> CommandResult {
        let timestamp = Local::now();
        let targets = [instance_id.to_string()];

        let command_id = match self.runner.submit(&targets, command, None).await {
            SubmitOutcome::Sent { command_id } => command_id,
            SubmitOutcome::Failed { reason } => {
                tracing::warn!(instance_id, %reason, "Command not sent");
                return CommandResult::failed(FAILED_TO_SEND);
            }
        };

        let result = self.runner.await_result(&command_id, instance_id, true).await;
        tracing::info!(
            instance_id,
            command_id = %command_id,
            status = %result.status.as_str(),
            "Command finished"
        );

        self.session.record(CommandRecord::from_result(
            timestamp,
            instance_id,
            command,
            command_id,
            &result,
        ));
        result
    }

    /// Snapshot the instances matching `filter` and, optionally, the history.
    ///
    /// History is attached only when requested and non-empty. Inventory
    /// failures propagate.
    pub async fn build_snapshot(
        &self,
        filter: &InstanceFilter,
        include_history: bool,
    ) -> Result<ContextSnapshot> {
        let instances = self.directory.list_instances(filter).await?;

        let command_history = if include_history {
            Some(self.session.history()).filter(|h| !h.is_empty())
        } else {
            None
        };

        Ok(ContextSnapshot {
            schema_version: SCHEMA_VERSION.to_string(),
            session: SessionInfo {
                id: self.session.id().to_string(),
                start_time: self.session.started_at(),
            },
            environment: Environment {
                region: self.region.clone(),
                instances: instances.iter().map(SnapshotInstance::from).collect(),
            },
            command_history,
        })
    }
}
