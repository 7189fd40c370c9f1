//! Provider traits and the raw records they exchange.
//!
//! Each trait covers one provider service. Implementations return provider
//! data as-is; interpretation (reachability, result sentinels, time windows)
//! lives in the components built on top.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;

// ─────────────────────────────────────────────────────────────────────────────
// Compute Inventory
// ─────────────────────────────────────────────────────────────────────────────

/// One inventory filter. Values are OR-combined; filters are AND-combined.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Filter {
    pub name: String,
    pub values: Vec<String>,
}

impl Filter {
    /// Create a filter with the given values.
    pub fn new<I, S>(name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    /// Create a filter with a single value.
    pub fn single(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(name, [value.into()])
    }
}

/// An instance as described by the inventory.
#[derive(Debug, Clone, PartialEq)]
pub struct InstanceDescription {
    pub instance_id: String,
    pub instance_type: String,
    pub state: String,
    pub private_ip: Option<String>,
    pub public_ip: Option<String>,
    pub launch_time: Option<DateTime<Utc>>,
    pub platform: Option<String>,
    pub tags: BTreeMap<String, String>,
}

impl InstanceDescription {
    /// A running instance with no addresses or tags.
    pub fn new(instance_id: impl Into<String>, instance_type: impl Into<String>) -> Self {
        Self {
            instance_id: instance_id.into(),
            instance_type: instance_type.into(),
            state: "running".to_string(),
            private_ip: None,
            public_ip: None,
            launch_time: None,
            platform: None,
            tags: BTreeMap::new(),
        }
    }

    pub fn with_state(mut self, state: impl Into<String>) -> Self {
        self.state = state.into();
        self
    }

    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    pub fn with_private_ip(mut self, ip: impl Into<String>) -> Self {
        self.private_ip = Some(ip.into());
        self
    }

    pub fn with_platform(mut self, platform: impl Into<String>) -> Self {
        self.platform = Some(platform.into());
        self
    }

    /// Value of the `Name` tag.
    pub fn name_tag(&self) -> Option<&str> {
        self.tags.get("Name").map(String::as_str)
    }
}

/// Describes instances and instance types.
#[async_trait]
pub trait ComputeInventory: Send + Sync {
    /// Describe instances matching every filter, in provider order.
    async fn describe_instances(&self, filters: &[Filter]) -> Result<Vec<InstanceDescription>>;

    /// All instance types offered in the region.
    async fn describe_instance_types(&self) -> Result<Vec<String>>;
}

// ─────────────────────────────────────────────────────────────────────────────
// Remote Execution
// ─────────────────────────────────────────────────────────────────────────────

/// The remote-execution agent's registry of managed instances.
#[async_trait]
pub trait ExecRegistry: Send + Sync {
    /// Returns true if the agent has registered the instance.
    async fn is_registered(&self, instance_id: &str) -> Result<bool>;
}

/// A command to send to one or more instances.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendCommandRequest {
    pub instance_ids: Vec<String>,
    pub document_name: String,
    pub commands: Vec<String>,
    pub comment: String,
}

/// Status and captured streams of one invocation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct InvocationOutput {
    /// Provider status string, e.g. `Success`.
    pub status: String,
    pub stdout: String,
    pub stderr: String,
}

/// Sends shell commands through the remote-execution agent.
#[async_trait]
pub trait RemoteExecutor: Send + Sync {
    /// Send a command. Returns the provider-assigned command id.
    async fn send_command(&self, request: &SendCommandRequest) -> Result<String>;

    /// Block until the invocation on `instance_id` reaches a terminal state.
    ///
    /// Backoff and timeout belong to the provider's waiter.
    async fn wait_until_executed(&self, command_id: &str, instance_id: &str) -> Result<()>;

    /// Fetch the invocation's current status and output.
    async fn get_invocation(&self, command_id: &str, instance_id: &str)
    -> Result<InvocationOutput>;
}

// ─────────────────────────────────────────────────────────────────────────────
// Audit Trail
// ─────────────────────────────────────────────────────────────────────────────

/// An event-history lookup by a single attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupRequest {
    pub attribute_key: String,
    pub attribute_value: String,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    pub max_results: u32,
}

/// A resource referenced by an audit event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventResource {
    pub resource_type: Option<String>,
    pub resource_name: Option<String>,
}

/// One API event from the audit trail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEvent {
    pub event_id: Option<String>,
    pub event_name: Option<String>,
    pub event_time: Option<DateTime<Utc>>,
    pub username: Option<String>,
    pub resources: Vec<EventResource>,
}

/// A page of audit events.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EventPage {
    pub events: Vec<AuditEvent>,
    /// Token for the next page, if any.
    pub next_token: Option<String>,
}

/// A log stream and the time of its most recent event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogStream {
    pub name: String,
    /// Epoch milliseconds.
    pub last_event_timestamp: Option<i64>,
}

/// A log event matched by a filter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEvent {
    pub stream: Option<String>,
    /// Epoch milliseconds.
    pub timestamp: i64,
    pub message: String,
}

/// A filtered log search over one log group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogFilterRequest {
    pub group: String,
    pub pattern: String,
    pub start_ms: i64,
    pub end_ms: i64,
    /// Restrict to these streams; empty means all streams.
    pub stream_names: Vec<String>,
}

/// API event history and log search.
#[async_trait]
pub trait AuditTrail: Send + Sync {
    /// Look up API events by one attribute.
    async fn lookup_events(&self, request: &LookupRequest) -> Result<EventPage>;

    /// Streams in a log group, most recently active first.
    ///
    /// A missing group is reported as [`CloudError::NotFound`](crate::CloudError::NotFound).
    async fn list_log_streams(&self, group: &str) -> Result<Vec<LogStream>>;

    /// Events in a log group matching a filter pattern.
    async fn filter_log_events(&self, request: &LogFilterRequest) -> Result<Vec<LogEvent>>;
}
