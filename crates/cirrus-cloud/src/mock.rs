//! Scriptable in-memory provider for tests.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::error::{CloudError, Result};
use crate::provider::{
    AuditEvent, AuditTrail, ComputeInventory, EventPage, ExecRegistry, Filter,
    InstanceDescription, InvocationOutput, LogEvent, LogFilterRequest, LogStream, LookupRequest,
    RemoteExecutor, SendCommandRequest,
};

/// An in-memory provider implementing every provider trait.
///
/// Instances are matched against inventory filters the way the provider
/// does (state, type, exact tag, `Name` prefix with a trailing `*`). Every
/// call is recorded for later inspection.
#[derive(Default)]
pub struct MockCloud {
    instances: Vec<InstanceDescription>,
    instance_types: Vec<String>,
    inventory_error: Option<String>,
    registered: HashSet<String>,
    registry_failures: HashSet<String>,
    send_error: Option<String>,
    wait_error: Option<String>,
    fetch_error: Option<String>,
    invocation: InvocationOutput,
    events: Vec<AuditEvent>,
    log_streams: HashMap<String, Vec<LogStream>>,
    log_events: HashMap<String, Vec<LogEvent>>,
    missing_groups: HashSet<String>,
    failing_groups: HashSet<String>,

    next_command: AtomicUsize,
    filter_log: Mutex<Vec<Vec<Filter>>>,
    registry_log: Mutex<Vec<String>>,
    send_log: Mutex<Vec<SendCommandRequest>>,
    wait_log: Mutex<Vec<(String, String)>>,
    lookup_log: Mutex<Vec<LookupRequest>>,
    log_filter_log: Mutex<Vec<LogFilterRequest>>,
}

impl MockCloud {
    /// An empty provider whose invocations succeed with no output.
    pub fn new() -> Self {
        Self {
            invocation: InvocationOutput {
                status: "Success".to_string(),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    pub fn with_instance(mut self, instance: InstanceDescription) -> Self {
        self.instances.push(instance);
        self
    }

    pub fn with_instance_types<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.instance_types = types.into_iter().map(Into::into).collect();
        self
    }

    /// Fail every inventory call.
    pub fn with_inventory_error(mut self, message: impl Into<String>) -> Self {
        self.inventory_error = Some(message.into());
        self
    }

    /// Report `instance_id` as registered with the agent.
    pub fn with_registered(mut self, instance_id: impl Into<String>) -> Self {
        self.registered.insert(instance_id.into());
        self
    }

    /// Fail registry lookups for `instance_id`.
    pub fn with_registry_failure(mut self, instance_id: impl Into<String>) -> Self {
        self.registry_failures.insert(instance_id.into());
        self
    }

    pub fn with_send_error(mut self, message: impl Into<String>) -> Self {
        self.send_error = Some(message.into());
        self
    }

    pub fn with_wait_error(mut self, message: impl Into<String>) -> Self {
        self.wait_error = Some(message.into());
        self
    }

    pub fn with_fetch_error(mut self, message: impl Into<String>) -> Self {
        self.fetch_error = Some(message.into());
        self
    }

    /// The invocation every fetch returns.
    pub fn with_invocation(
        mut self,
        status: impl Into<String>,
        stdout: impl Into<String>,
        stderr: impl Into<String>,
    ) -> Self {
        self.invocation = InvocationOutput {
            status: status.into(),
            stdout: stdout.into(),
            stderr: stderr.into(),
        };
        self
    }

    pub fn with_events(mut self, events: Vec<AuditEvent>) -> Self {
        self.events = events;
        self
    }

    pub fn with_log_streams(mut self, group: impl Into<String>, streams: Vec<LogStream>) -> Self {
        self.log_streams.insert(group.into(), streams);
        self
    }

    pub fn with_log_events(mut self, group: impl Into<String>, events: Vec<LogEvent>) -> Self {
        self.log_events.insert(group.into(), events);
        self
    }

    /// Report `group` as nonexistent.
    pub fn with_missing_log_group(mut self, group: impl Into<String>) -> Self {
        self.missing_groups.insert(group.into());
        self
    }

    /// Fail every call touching `group`.
    pub fn with_failing_log_group(mut self, group: impl Into<String>) -> Self {
        self.failing_groups.insert(group.into());
        self
    }

    /// Filters of the most recent inventory call.
    pub fn last_filters(&self) -> Vec<Filter> {
        self.filter_log
            .lock()
            .unwrap()
            .last()
            .cloned()
            .unwrap_or_default()
    }

    /// Instance ids passed to the registry, in call order.
    pub fn registry_calls(&self) -> Vec<String> {
        self.registry_log.lock().unwrap().clone()
    }

    /// Commands sent, in call order.
    pub fn sent_commands(&self) -> Vec<SendCommandRequest> {
        self.send_log.lock().unwrap().clone()
    }

    /// `(command_id, instance_id)` pairs the waiter was called with.
    pub fn waits(&self) -> Vec<(String, String)> {
        self.wait_log.lock().unwrap().clone()
    }

    pub fn lookups(&self) -> Vec<LookupRequest> {
        self.lookup_log.lock().unwrap().clone()
    }

    pub fn log_filters(&self) -> Vec<LogFilterRequest> {
        self.log_filter_log.lock().unwrap().clone()
    }

    fn group_error(&self, group: &str) -> Option<CloudError> {
        if self.missing_groups.contains(group) {
            return Some(CloudError::NotFound(format!(
                "ResourceNotFoundException: log group {group} does not exist"
            )));
        }
        if self.failing_groups.contains(group) {
            return Some(CloudError::remote("logs", format!("{group} unavailable")));
        }
        None
    }
}

fn matches_filter(instance: &InstanceDescription, filter: &Filter) -> bool {
    let value = match filter.name.as_str() {
        "instance-state-name" => Some(instance.state.as_str()),
        "instance-type" => Some(instance.instance_type.as_str()),
        name => match name.strip_prefix("tag:") {
            Some(key) => instance.tags.get(key).map(String::as_str),
            None => return true,
        },
    };
    let Some(value) = value else {
        return false;
    };
    filter.values.iter().any(|wanted| match wanted.strip_suffix('*') {
        Some(prefix) => value.starts_with(prefix),
        None => value == wanted,
    })
}

#[async_trait]
impl ComputeInventory for MockCloud {
    async fn describe_instances(&self, filters: &[Filter]) -> Result<Vec<InstanceDescription>> {
        self.filter_log.lock().unwrap().push(filters.to_vec());
        if let Some(ref message) = self.inventory_error {
            return Err(CloudError::remote("ec2 describe-instances", message.clone()));
        }
        Ok(self
            .instances
            .iter()
            .filter(|i| filters.iter().all(|f| matches_filter(i, f)))
            .cloned()
            .collect())
    }

    async fn describe_instance_types(&self) -> Result<Vec<String>> {
        if let Some(ref message) = self.inventory_error {
            return Err(CloudError::remote(
                "ec2 describe-instance-types",
                message.clone(),
            ));
        }
        Ok(self.instance_types.clone())
    }
}

#[async_trait]
impl ExecRegistry for MockCloud {
    async fn is_registered(&self, instance_id: &str) -> Result<bool> {
        self.registry_log
            .lock()
            .unwrap()
            .push(instance_id.to_string());
        if self.registry_failures.contains(instance_id) {
            return Err(CloudError::remote(
                "ssm describe-instance-information",
                "ThrottlingException",
            ));
        }
        Ok(self.registered.contains(instance_id))
    }
}

#[async_trait]
impl RemoteExecutor for MockCloud {
    async fn send_command(&self, request: &SendCommandRequest) -> Result<String> {
        self.send_log.lock().unwrap().push(request.clone());
        if let Some(ref message) = self.send_error {
            return Err(CloudError::remote("ssm send-command", message.clone()));
        }
        let n = self.next_command.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(format!("cmd-{n}"))
    }

    async fn wait_until_executed(&self, command_id: &str, instance_id: &str) -> Result<()> {
        self.wait_log
            .lock()
            .unwrap()
            .push((command_id.to_string(), instance_id.to_string()));
        match self.wait_error {
            Some(ref message) => Err(CloudError::remote("ssm wait", message.clone())),
            None => Ok(()),
        }
    }

    async fn get_invocation(
        &self,
        _command_id: &str,
        _instance_id: &str,
    ) -> Result<InvocationOutput> {
        match self.fetch_error {
            Some(ref message) => Err(CloudError::remote(
                "ssm get-command-invocation",
                message.clone(),
            )),
            None => Ok(self.invocation.clone()),
        }
    }
}

#[async_trait]
impl AuditTrail for MockCloud {
    async fn lookup_events(&self, request: &LookupRequest) -> Result<EventPage> {
        self.lookup_log.lock().unwrap().push(request.clone());
        Ok(EventPage {
            events: self
                .events
                .iter()
                .take(request.max_results as usize)
                .cloned()
                .collect(),
            next_token: None,
        })
    }

    async fn list_log_streams(&self, group: &str) -> Result<Vec<LogStream>> {
        if let Some(e) = self.group_error(group) {
            return Err(e);
        }
        Ok(self.log_streams.get(group).cloned().unwrap_or_default())
    }

    async fn filter_log_events(&self, request: &LogFilterRequest) -> Result<Vec<LogEvent>> {
        self.log_filter_log.lock().unwrap().push(request.clone());
        if let Some(e) = self.group_error(&request.group) {
            return Err(e);
        }
        Ok(self.log_events.get(&request.group).cloned().unwrap_or_default())
    }
}
