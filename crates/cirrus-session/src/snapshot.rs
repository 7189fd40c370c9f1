//! The context snapshot handed to the model.

use std::collections::BTreeMap;

use chrono::{DateTime, Local};
use cirrus_types::{CommandRecord, Instance, ReachabilityStatus};
use serde::{Deserialize, Serialize};

/// Version tag carried by every snapshot.
pub const SCHEMA_VERSION: &str = "v1";

/// Read-only projection of a session and the fleet at one point in time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextSnapshot {
    pub schema_version: String,
    pub session: SessionInfo,
    pub environment: Environment,
    /// Absent when history was not requested or is empty.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command_history: Option<Vec<CommandRecord>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionInfo {
    pub id: String,
    pub start_time: DateTime<Local>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Environment {
    pub region: Option<String>,
    pub instances: Vec<SnapshotInstance>,
}

/// The subset of an [`Instance`] a model needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotInstance {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub instance_type: String,
    pub private_ip: String,
    pub platform: String,
    pub reachability: ReachabilityStatus,
    pub tags: BTreeMap<String, String>,
}

impl From<&Instance> for SnapshotInstance {
    fn from(instance: &Instance) -> Self {
        Self {
            id: instance.id.clone(),
            name: instance.name.clone(),
            instance_type: instance.instance_type.clone(),
            private_ip: instance.private_ip_display().to_string(),
            platform: instance.platform.clone(),
            reachability: instance.reachability,
            tags: instance.tags.clone(),
        }
    }
}

impl ContextSnapshot {
    /// Compact JSON encoding, as sent to the model.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Indented JSON encoding, for display.
    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
