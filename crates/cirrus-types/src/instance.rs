//! Compute instances and their remote-execution reachability.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Display name used when an instance carries no `Name` tag.
pub const UNNAMED: &str = "Unnamed";

/// Placeholder for absent addresses and platform labels.
pub const NOT_AVAILABLE: &str = "N/A";

// ─────────────────────────────────────────────────────────────────────────────
// Reachability
// ─────────────────────────────────────────────────────────────────────────────

/// Whether the remote-execution agent can reach an instance.
///
/// Derived on every directory query by asking the agent's registry about the
/// instance. `Unknown` means the registry lookup itself failed, which is
/// different from the instance being absent from the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReachabilityStatus {
    Available,
    #[serde(rename = "Not Available")]
    NotAvailable,
    Unknown,
}

impl ReachabilityStatus {
    /// Human-readable label, matching the serialized form.
    pub fn as_str(&self) -> &'static str {
        match self {
            ReachabilityStatus::Available => "Available",
            ReachabilityStatus::NotAvailable => "Not Available",
            ReachabilityStatus::Unknown => "Unknown",
        }
    }

    /// Returns true only for `Available`.
    pub fn is_available(&self) -> bool {
        matches!(self, ReachabilityStatus::Available)
    }
}

impl fmt::Display for ReachabilityStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Instance
// ─────────────────────────────────────────────────────────────────────────────

/// A running compute instance as returned by a directory query.
///
/// Instances are rebuilt from scratch on every query and carry no identity
/// beyond the result they came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instance {
    /// Provider-assigned identifier.
    pub id: String,
    /// Value of the `Name` tag, or [`UNNAMED`].
    pub name: String,
    /// Instance type, e.g. `t3.small`.
    pub instance_type: String,
    /// Lifecycle state name, e.g. `running`.
    pub state: String,
    /// Private IPv4 address.
    pub private_ip: Option<String>,
    /// Public IPv4 address.
    pub public_ip: Option<String>,
    /// Remote-execution reachability at query time.
    pub reachability: ReachabilityStatus,
    /// When the instance was launched.
    pub launch_time: Option<DateTime<Utc>>,
    /// Platform label, or [`NOT_AVAILABLE`].
    pub platform: String,
    /// All tags on the instance.
    pub tags: BTreeMap<String, String>,
}

impl Instance {
    /// Private address for display, `N/A` when absent.
    pub fn private_ip_display(&self) -> &str {
        self.private_ip.as_deref().unwrap_or(NOT_AVAILABLE)
    }

    /// Public address for display, `N/A` when absent.
    pub fn public_ip_display(&self) -> &str {
        self.public_ip.as_deref().unwrap_or(NOT_AVAILABLE)
    }

    /// Launch time as RFC 3339, `N/A` when absent.
    pub fn launch_time_display(&self) -> String {
        self.launch_time
            .map(|t| t.to_rfc3339())
            .unwrap_or_else(|| NOT_AVAILABLE.to_string())
    }
}
