//! Remote shell command submission and result retrieval.

use std::sync::Arc;

use chrono::{DateTime, Local};
use cirrus_types::{CommandResult, InvocationStatus};

use crate::provider::{RemoteExecutor, SendCommandRequest};

/// Document that runs a list of shell commands on Linux instances.
pub const RUN_SHELL_DOCUMENT: &str = "AWS-RunShellScript";

/// Comment attached to commands when the caller gives none.
pub fn default_comment(now: DateTime<Local>) -> String {
    format!(
        "Command executed via cirrus at {}",
        now.format("%Y-%m-%d %H:%M:%S")
    )
}

/// Outcome of a command submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The provider accepted the command.
    Sent { command_id: String },
    /// The command was not sent.
    Failed { reason: String },
}

impl SubmitOutcome {
    /// The command id, if the command was sent.
    pub fn command_id(&self) -> Option<&str> {
        match self {
            SubmitOutcome::Sent { command_id } => Some(command_id),
            SubmitOutcome::Failed { .. } => None,
        }
    }
}

/// Submits shell commands and collects their results.
#[derive(Clone)]
pub struct CommandRunner {
    executor: Arc<dyn RemoteExecutor>,
}

impl CommandRunner {
    pub fn new(executor: Arc<dyn RemoteExecutor>) -> Self {
        Self { executor }
    }

    /// Send `command` to every instance in `instance_ids`.
    ///
    /// Never fails: provider errors are logged and returned as
    /// [`SubmitOutcome::Failed`]. An empty target list is rejected without
    /// contacting the provider.
    pub async fn submit(
        &self,
        instance_ids: &[String],
        command: &str,
        comment: Option<&str>,
    ) -> SubmitOutcome {
        if instance_ids.is_empty() {
            return SubmitOutcome::Failed {
                reason: "no target instances".to_string(),
            };
        }

        let request = SendCommandRequest {
            instance_ids: instance_ids.to_vec(),
            document_name: RUN_SHELL_DOCUMENT.to_string(),
            commands: vec![command.to_string()],
            comment: comment
                .filter(|c| !c.is_empty())
                .map(str::to_string)
                .unwrap_or_else(|| default_comment(Local::now())),
        };

        match self.executor.send_command(&request).await {
            Ok(command_id) => {
                tracing::debug!(%command_id, targets = instance_ids.len(), "Command sent");
                SubmitOutcome::Sent { command_id }
            }
            Err(e) => {
                tracing::error!(error = %e, "Error running command");
                SubmitOutcome::Failed {
                    reason: e.to_string(),
                }
            }
        }
    }

    /// Fetch the result of `command_id` on `instance_id`.
    ///
    /// With `wait`, first blocks in the provider's completion waiter. A waiter
    /// failure is logged and the fetch still runs; the fetched status is
    /// authoritative. Any fetch failure yields a `Failed` result carrying the
    /// error message.
    pub async fn await_result(
        &self,
        command_id: &str,
        instance_id: &str,
        wait: bool,
    ) -> CommandResult {
        if wait
            && let Err(e) = self
                .executor
                .wait_until_executed(command_id, instance_id)
                .await
        {
            tracing::warn!(command_id, instance_id, error = %e, "Waiter ended without success");
        }

        match self.executor.get_invocation(command_id, instance_id).await {
            Ok(output) => CommandResult::new(
                InvocationStatus::parse(&output.status),
                output.stdout,
                output.stderr,
            ),
            Err(e) => {
                tracing::error!(command_id, instance_id, error = %e, "Error getting command output");
                CommandResult::failed(e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::mock::MockCloud;

    fn ids(ids: &[&str]) -> Vec<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_default_comment_format() {
        let at = Local.with_ymd_and_hms(2024, 5, 17, 9, 3, 7).unwrap();
        assert_eq!(
            default_comment(at),
            "Command executed via cirrus at 2024-05-17 09:03:07"
        );
    }

    #[tokio::test]
    async fn test_submit_sends_shell_document() {
        let cloud = Arc::new(MockCloud::new());
        let runner = CommandRunner::new(cloud.clone());

        let outcome = runner.submit(&ids(&["i-1", "i-2"]), "uptime", None).await;
        assert_eq!(outcome.command_id(), Some("cmd-1"));

        let sent = cloud.sent_commands();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].document_name, RUN_SHELL_DOCUMENT);
        assert_eq!(sent[0].commands, vec!["uptime"]);
        assert_eq!(sent[0].instance_ids, ids(&["i-1", "i-2"]));
        assert!(sent[0].comment.starts_with("Command executed via cirrus at "));
    }

    #[tokio::test]
    async fn test_submit_keeps_explicit_comment() {
        let cloud = Arc::new(MockCloud::new());
        let runner = CommandRunner::new(cloud.clone());
        runner.submit(&ids(&["i-1"]), "df -h", Some("disk check")).await;
        assert_eq!(cloud.sent_commands()[0].comment, "disk check");
    }

    #[tokio::test]
    async fn test_submit_failure_is_outcome() {
        let cloud = Arc::new(MockCloud::new().with_send_error("InvalidInstanceId"));
        let runner = CommandRunner::new(cloud.clone());
        let outcome = runner.submit(&ids(&["i-1"]), "uptime", None).await;
        match outcome {
            SubmitOutcome::Failed { reason } => assert!(reason.contains("InvalidInstanceId")),
            other => panic!("expected failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_submit_empty_targets_never_calls_provider() {
        let cloud = Arc::new(MockCloud::new());
        let runner = CommandRunner::new(cloud.clone());
        let outcome = runner.submit(&[], "uptime", None).await;
        assert!(matches!(outcome, SubmitOutcome::Failed { .. }));
        assert!(cloud.sent_commands().is_empty());
    }

    #[tokio::test]
    async fn test_await_result_waits_then_fetches() {
        let cloud = Arc::new(MockCloud::new().with_invocation("Success", "hello\n", ""));
        let runner = CommandRunner::new(cloud.clone());

        let result = runner.await_result("cmd-9", "i-1", true).await;
        assert_eq!(
            result,
            CommandResult::new(InvocationStatus::Success, "hello\n", "")
        );
        assert_eq!(cloud.waits(), vec![("cmd-9".to_string(), "i-1".to_string())]);
    }

    #[tokio::test]
    async fn test_await_result_without_wait_skips_waiter() {
        let cloud = Arc::new(MockCloud::new().with_invocation("InProgress", "", ""));
        let runner = CommandRunner::new(cloud.clone());
        let result = runner.await_result("cmd-9", "i-1", false).await;
        assert_eq!(result.status, InvocationStatus::InProgress);
        assert!(cloud.waits().is_empty());
    }

    #[tokio::test]
    async fn test_waiter_failure_still_fetches() {
        let cloud = Arc::new(
            MockCloud::new()
                .with_wait_error("Waiter CommandExecuted failed: terminal failure")
                .with_invocation("Failed", "", "exit status 1"),
        );
        let runner = CommandRunner::new(cloud.clone());
        let result = runner.await_result("cmd-9", "i-1", true).await;
        assert_eq!(result.status, InvocationStatus::Failed);
        assert_eq!(result.error, "exit status 1");
    }

    #[tokio::test]
    async fn test_fetch_failure_is_failed_result() {
        let cloud = Arc::new(MockCloud::new().with_fetch_error("InvocationDoesNotExist"));
        let runner = CommandRunner::new(cloud.clone());
        let result = runner.await_result("cmd-9", "i-1", false).await;
        assert_eq!(result.status, InvocationStatus::Failed);
        assert!(result.output.is_empty());
        assert!(result.error.contains("InvocationDoesNotExist"));
    }
}
