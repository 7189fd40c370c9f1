//! Provider access through the `aws` command-line client.
//!
//! Every call runs `aws <service> <operation> ... --output json` with the
//! configured region and profile, and parses stdout. Structured parameters
//! are passed as JSON arguments so values never need shell quoting.

use std::process::Stdio;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tokio::process::Command;

use crate::error::{CloudError, Result};
use crate::provider::{
    AuditEvent, AuditTrail, ComputeInventory, EventPage, EventResource, ExecRegistry, Filter,
    InstanceDescription, InvocationOutput, LogEvent, LogFilterRequest, LogStream, LookupRequest,
    RemoteExecutor, SendCommandRequest,
};

/// Default client executable.
pub const DEFAULT_PROGRAM: &str = "aws";

/// Marker the client prints for missing resources.
const NOT_FOUND_MARKER: &str = "ResourceNotFoundException";

/// Provider client backed by the `aws` executable.
#[derive(Debug, Clone)]
pub struct AwsCli {
    program: String,
    region: Option<String>,
    profile: Option<String>,
}

impl Default for AwsCli {
    fn default() -> Self {
        Self::new()
    }
}

impl AwsCli {
    /// Use `aws` from `PATH` with the client's own region and profile resolution.
    pub fn new() -> Self {
        Self {
            program: DEFAULT_PROGRAM.to_string(),
            region: None,
            profile: None,
        }
    }

    /// Use a specific client executable.
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    /// Pin every call to a region.
    pub fn with_region(mut self, region: Option<String>) -> Self {
        self.region = region;
        self
    }

    /// Use a named credentials profile.
    pub fn with_profile(mut self, profile: Option<String>) -> Self {
        self.profile = profile;
        self
    }

    /// The pinned region, if any.
    pub fn region(&self) -> Option<&str> {
        self.region.as_deref()
    }

    /// Run an operation and return its raw stdout.
    async fn run(&self, service: &str, operation: &str, args: &[String]) -> Result<String> {
        let mut cmd = Command::new(&self.program);
        cmd.arg(service).arg(operation).args(args);
        cmd.arg("--output").arg("json");
        if let Some(ref region) = self.region {
            cmd.arg("--region").arg(region);
        }
        if let Some(ref profile) = self.profile {
            cmd.arg("--profile").arg(profile);
        }
        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());

        tracing::debug!(service, operation, "Calling provider");

        let output = cmd.output().await.map_err(|e| CloudError::Spawn {
            program: self.program.clone(),
            source: e,
        })?;

        if output.status.success() {
            return Ok(String::from_utf8_lossy(&output.stdout).into_owned());
        }

        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        let message = if stderr.is_empty() {
            format!("exited with status {}", output.status)
        } else {
            stderr
        };
        if message.contains(NOT_FOUND_MARKER) {
            return Err(CloudError::NotFound(message));
        }
        Err(CloudError::remote(format!("{service} {operation}"), message))
    }

    /// Run an operation and parse its JSON output.
    async fn call<T: DeserializeOwned>(
        &self,
        service: &str,
        operation: &str,
        args: &[String],
    ) -> Result<T> {
        let stdout = self.run(service, operation, args).await?;
        serde_json::from_str(&stdout).map_err(|e| CloudError::Parse {
            operation: format!("{service} {operation}"),
            source: e,
        })
    }
}

fn to_json_arg(value: &Value) -> String {
    value.to_string()
}

/// Parse a provider timestamp: RFC 3339 text or epoch seconds.
pub(crate) fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|t| t.with_timezone(&Utc)),
        Value::Number(n) => {
            let secs = n.as_f64()?;
            Utc.timestamp_millis_opt((secs * 1000.0) as i64).single()
        }
        _ => None,
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Response shapes
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct DescribeInstancesResponse {
    #[serde(default)]
    reservations: Vec<Reservation>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Reservation {
    #[serde(default)]
    instances: Vec<RawInstance>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawInstance {
    instance_id: String,
    instance_type: String,
    state: Option<RawState>,
    private_ip_address: Option<String>,
    public_ip_address: Option<String>,
    #[serde(default)]
    launch_time: Value,
    platform_details: Option<String>,
    #[serde(default)]
    tags: Vec<RawTag>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawState {
    name: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawTag {
    key: String,
    #[serde(default)]
    value: String,
}

impl From<RawInstance> for InstanceDescription {
    fn from(raw: RawInstance) -> Self {
        Self {
            instance_id: raw.instance_id,
            instance_type: raw.instance_type,
            state: raw.state.map(|s| s.name).unwrap_or_default(),
            private_ip: raw.private_ip_address,
            public_ip: raw.public_ip_address,
            launch_time: parse_timestamp(&raw.launch_time),
            platform: raw.platform_details,
            tags: raw.tags.into_iter().map(|t| (t.key, t.value)).collect(),
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct DescribeInstanceTypesResponse {
    #[serde(default)]
    instance_types: Vec<RawInstanceType>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawInstanceType {
    instance_type: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct InstanceInformationResponse {
    #[serde(default)]
    instance_information_list: Vec<Value>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct SendCommandResponse {
    command: SentCommand,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct SentCommand {
    command_id: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct CommandInvocationResponse {
    status: String,
    #[serde(default)]
    standard_output_content: String,
    #[serde(default)]
    standard_error_content: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct LookupEventsResponse {
    #[serde(default)]
    events: Vec<RawEvent>,
    next_token: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawEvent {
    event_id: Option<String>,
    event_name: Option<String>,
    #[serde(default)]
    event_time: Value,
    username: Option<String>,
    #[serde(default)]
    resources: Vec<RawResource>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawResource {
    resource_type: Option<String>,
    resource_name: Option<String>,
}

impl From<RawEvent> for AuditEvent {
    fn from(raw: RawEvent) -> Self {
        Self {
            event_id: raw.event_id,
            event_name: raw.event_name,
            event_time: parse_timestamp(&raw.event_time),
            username: raw.username,
            resources: raw
                .resources
                .into_iter()
                .map(|r| EventResource {
                    resource_type: r.resource_type,
                    resource_name: r.resource_name,
                })
                .collect(),
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct DescribeLogStreamsResponse {
    #[serde(default)]
    log_streams: Vec<RawLogStream>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawLogStream {
    log_stream_name: String,
    last_event_timestamp: Option<i64>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct FilterLogEventsResponse {
    #[serde(default)]
    events: Vec<RawLogEvent>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawLogEvent {
    log_stream_name: Option<String>,
    #[serde(default)]
    timestamp: i64,
    #[serde(default)]
    message: String,
}

// ─────────────────────────────────────────────────────────────────────────────
// Trait implementations
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait]
impl ComputeInventory for AwsCli {
    async fn describe_instances(&self, filters: &[Filter]) -> Result<Vec<InstanceDescription>> {
        let mut args = Vec::new();
        if !filters.is_empty() {
            let filters = serde_json::to_value(filters).map_err(|e| CloudError::Parse {
                operation: "ec2 describe-instances".to_string(),
                source: e,
            })?;
            args.push("--filters".to_string());
            args.push(to_json_arg(&filters));
        }

        let response: DescribeInstancesResponse =
            self.call("ec2", "describe-instances", &args).await?;
        Ok(response
            .reservations
            .into_iter()
            .flat_map(|r| r.instances)
            .map(InstanceDescription::from)
            .collect())
    }

    async fn describe_instance_types(&self) -> Result<Vec<String>> {
        let response: DescribeInstanceTypesResponse =
            self.call("ec2", "describe-instance-types", &[]).await?;
        Ok(response
            .instance_types
            .into_iter()
            .map(|t| t.instance_type)
            .collect())
    }
}

#[async_trait]
impl ExecRegistry for AwsCli {
    async fn is_registered(&self, instance_id: &str) -> Result<bool> {
        let filters = json!([{ "Key": "InstanceIds", "Values": [instance_id] }]);
        let args = vec!["--filters".to_string(), to_json_arg(&filters)];
        let response: InstanceInformationResponse = self
            .call("ssm", "describe-instance-information", &args)
            .await?;
        Ok(!response.instance_information_list.is_empty())
    }
}

#[async_trait]
impl RemoteExecutor for AwsCli {
    async fn send_command(&self, request: &SendCommandRequest) -> Result<String> {
        let mut args = vec!["--instance-ids".to_string()];
        args.extend(request.instance_ids.iter().cloned());
        args.push("--document-name".to_string());
        args.push(request.document_name.clone());
        args.push("--parameters".to_string());
        args.push(to_json_arg(&json!({ "commands": request.commands })));
        args.push("--comment".to_string());
        args.push(request.comment.clone());

        let response: SendCommandResponse = self.call("ssm", "send-command", &args).await?;
        Ok(response.command.command_id)
    }

    async fn wait_until_executed(&self, command_id: &str, instance_id: &str) -> Result<()> {
        let args = vec![
            "command-executed".to_string(),
            "--command-id".to_string(),
            command_id.to_string(),
            "--instance-id".to_string(),
            instance_id.to_string(),
        ];
        self.run("ssm", "wait", &args).await.map(|_| ())
    }

    async fn get_invocation(
        &self,
        command_id: &str,
        instance_id: &str,
    ) -> Result<InvocationOutput> {
        let args = vec![
            "--command-id".to_string(),
            command_id.to_string(),
            "--instance-id".to_string(),
            instance_id.to_string(),
        ];
        let response: CommandInvocationResponse =
            self.call("ssm", "get-command-invocation", &args).await?;
        Ok(InvocationOutput {
            status: response.status,
            stdout: response.standard_output_content,
            stderr: response.standard_error_content,
        })
    }
}

#[async_trait]
impl AuditTrail for AwsCli {
    async fn lookup_events(&self, request: &LookupRequest) -> Result<EventPage> {
        let attributes = json!([{
            "AttributeKey": request.attribute_key,
            "AttributeValue": request.attribute_value,
        }]);
        let mut args = vec![
            "--lookup-attributes".to_string(),
            to_json_arg(&attributes),
            "--max-items".to_string(),
            request.max_results.to_string(),
        ];
        if let Some(start) = request.start {
            args.push("--start-time".to_string());
            args.push(start.to_rfc3339());
        }
        if let Some(end) = request.end {
            args.push("--end-time".to_string());
            args.push(end.to_rfc3339());
        }

        let response: LookupEventsResponse =
            self.call("cloudtrail", "lookup-events", &args).await?;
        Ok(EventPage {
            events: response.events.into_iter().map(AuditEvent::from).collect(),
            next_token: response.next_token,
        })
    }

    async fn list_log_streams(&self, group: &str) -> Result<Vec<LogStream>> {
        let args = vec![
            "--log-group-name".to_string(),
            group.to_string(),
            "--order-by".to_string(),
            "LastEventTime".to_string(),
            "--descending".to_string(),
        ];
        let response: DescribeLogStreamsResponse =
            self.call("logs", "describe-log-streams", &args).await?;
        Ok(response
            .log_streams
            .into_iter()
            .map(|s| LogStream {
                name: s.log_stream_name,
                last_event_timestamp: s.last_event_timestamp,
            })
            .collect())
    }

    async fn filter_log_events(&self, request: &LogFilterRequest) -> Result<Vec<LogEvent>> {
        let mut args = vec![
            "--log-group-name".to_string(),
            request.group.clone(),
            "--start-time".to_string(),
            request.start_ms.to_string(),
            "--end-time".to_string(),
            request.end_ms.to_string(),
            "--filter-pattern".to_string(),
            request.pattern.clone(),
        ];
        if !request.stream_names.is_empty() {
            args.push("--log-stream-names".to_string());
            args.extend(request.stream_names.iter().cloned());
        }

        let response: FilterLogEventsResponse =
            self.call("logs", "filter-log-events", &args).await?;
        Ok(response
            .events
            .into_iter()
            .map(|e| LogEvent {
                stream: e.log_stream_name,
                timestamp: e.timestamp,
                message: e.message,
            })
            .collect())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
