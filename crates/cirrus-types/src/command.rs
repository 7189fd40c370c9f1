//! Command invocation results and session history records.

use std::fmt;

use chrono::{DateTime, Local};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Longest output, in characters, kept in a history record.
pub const MAX_RECORDED_OUTPUT_CHARS: usize = 1000;

// ─────────────────────────────────────────────────────────────────────────────
// Invocation Status
// ─────────────────────────────────────────────────────────────────────────────

/// Status of a command invocation on one instance, as reported by the
/// remote-execution agent.
///
/// Serialized as the agent's own status string so that records read the same
/// as the provider's console.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum InvocationStatus {
    Pending,
    InProgress,
    Delayed,
    Success,
    Cancelled,
    TimedOut,
    Failed,
    Cancelling,
    /// A status string this version does not know about.
    Other(String),
}

impl InvocationStatus {
    /// Parse a provider status string. Unknown strings are kept verbatim.
    pub fn parse(value: &str) -> Self {
        match value {
            "Pending" => InvocationStatus::Pending,
            "InProgress" => InvocationStatus::InProgress,
            "Delayed" => InvocationStatus::Delayed,
            "Success" => InvocationStatus::Success,
            "Cancelled" => InvocationStatus::Cancelled,
            "TimedOut" => InvocationStatus::TimedOut,
            "Failed" => InvocationStatus::Failed,
            "Cancelling" => InvocationStatus::Cancelling,
            other => InvocationStatus::Other(other.to_string()),
        }
    }

    /// The provider's string for this status.
    pub fn as_str(&self) -> &str {
        match self {
            InvocationStatus::Pending => "Pending",
            InvocationStatus::InProgress => "InProgress",
            InvocationStatus::Delayed => "Delayed",
            InvocationStatus::Success => "Success",
            InvocationStatus::Cancelled => "Cancelled",
            InvocationStatus::TimedOut => "TimedOut",
            InvocationStatus::Failed => "Failed",
            InvocationStatus::Cancelling => "Cancelling",
            InvocationStatus::Other(s) => s,
        }
    }

    /// Returns true for `Success`.
    pub fn is_success(&self) -> bool {
        matches!(self, InvocationStatus::Success)
    }
}

impl fmt::Display for InvocationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for InvocationStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for InvocationStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        Ok(InvocationStatus::parse(&value))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Command Result
// ─────────────────────────────────────────────────────────────────────────────

/// Live result of running a command on one instance.
///
/// Output and error streams are returned in full; only history records are
/// truncated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandResult {
    pub status: InvocationStatus,
    pub output: String,
    pub error: String,
}

impl CommandResult {
    /// Create a result from a fetched invocation.
    pub fn new(
        status: InvocationStatus,
        output: impl Into<String>,
        error: impl Into<String>,
    ) -> Self {
        Self {
            status,
            output: output.into(),
            error: error.into(),
        }
    }

    /// Create a `Failed` result carrying only an error message.
    pub fn failed(error: impl Into<String>) -> Self {
        Self::new(InvocationStatus::Failed, String::new(), error)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Command Record
// ─────────────────────────────────────────────────────────────────────────────

/// One entry in a session's command history. Never modified after append.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandRecord {
    /// When the command was run.
    pub timestamp: DateTime<Local>,
    pub instance_id: String,
    pub command: String,
    pub status: InvocationStatus,
    /// Captured stdout, at most [`MAX_RECORDED_OUTPUT_CHARS`] characters.
    pub output: String,
    /// Invocation id assigned by the remote-execution agent.
    pub command_id: String,
}

impl CommandRecord {
    /// Build a record from a live result, truncating its output.
    pub fn from_result(
        timestamp: DateTime<Local>,
        instance_id: impl Into<String>,
        command: impl Into<String>,
        command_id: impl Into<String>,
        result: &CommandResult,
    ) -> Self {
        Self {
            timestamp,
            instance_id: instance_id.into(),
            command: command.into(),
            status: result.status.clone(),
            output: truncate_chars(&result.output, MAX_RECORDED_OUTPUT_CHARS),
            command_id: command_id.into(),
        }
    }
}

/// Keep the first `max` characters of `s`.
fn truncate_chars(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((byte_idx, _)) => s[..byte_idx].to_string(),
        None => s.to_string(),
    }
}
