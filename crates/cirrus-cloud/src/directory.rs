//! Running-instance directory with remote-execution reachability.

use std::sync::Arc;

use cirrus_types::{Instance, InstanceFilter, NOT_AVAILABLE, ReachabilityStatus, UNNAMED};

use crate::error::Result;
use crate::provider::{ComputeInventory, ExecRegistry, Filter, InstanceDescription};

/// Filter restricting every query to running instances.
pub(crate) fn running_filter() -> Filter {
    Filter::single("instance-state-name", "running")
}

/// Translate an [`InstanceFilter`] into provider filters.
///
/// The running-state filter is always appended.
pub fn build_filters(filter: &InstanceFilter) -> Vec<Filter> {
    let mut filters = Vec::new();

    if !filter.instance_types.is_empty() {
        filters.push(Filter::new("instance-type", filter.instance_types.clone()));
    }

    if let Some(ref prefix) = filter.name_prefix {
        filters.push(Filter::single("tag:Name", format!("{prefix}*")));
    }

    for (key, value) in &filter.tags {
        filters.push(Filter::single(format!("tag:{key}"), value.clone()));
    }

    filters.push(running_filter());
    filters
}

/// Lists running instances and classifies their reachability.
///
/// Nothing is cached: every call queries the inventory and the registry.
#[derive(Clone)]
pub struct InstanceDirectory {
    pub(crate) inventory: Arc<dyn ComputeInventory>,
    registry: Arc<dyn ExecRegistry>,
}

impl InstanceDirectory {
    pub fn new(inventory: Arc<dyn ComputeInventory>, registry: Arc<dyn ExecRegistry>) -> Self {
        Self {
            inventory,
            registry,
        }
    }

    /// List running instances matching `filter`, in provider order.
    ///
    /// Inventory failures propagate. Registry failures mark the instance
    /// `Unknown` and never fail the listing.
    pub async fn list_instances(&self, filter: &InstanceFilter) -> Result<Vec<Instance>> {
        let filters = build_filters(filter);
        let descriptions = self.inventory.describe_instances(&filters).await?;

        let mut instances = Vec::with_capacity(descriptions.len());
        for description in descriptions {
            let reachability = self.reachability(&description.instance_id).await;
            if filter.reachable_only && !reachability.is_available() {
                continue;
            }
            instances.push(to_instance(description, reachability));
        }

        tracing::debug!(count = instances.len(), "Listed instances");
        Ok(instances)
    }

    /// Ask the registry whether the agent can reach `instance_id`.
    pub async fn reachability(&self, instance_id: &str) -> ReachabilityStatus {
        match self.registry.is_registered(instance_id).await {
            Ok(true) => ReachabilityStatus::Available,
            Ok(false) => ReachabilityStatus::NotAvailable,
            Err(e) => {
                tracing::warn!(instance_id, error = %e, "Registry lookup failed");
                ReachabilityStatus::Unknown
            }
        }
    }
}

fn to_instance(description: InstanceDescription, reachability: ReachabilityStatus) -> Instance {
    let name = description.name_tag().unwrap_or(UNNAMED).to_string();
    Instance {
        id: description.instance_id,
        name,
        instance_type: description.instance_type,
        state: description.state,
        private_ip: description.private_ip,
        public_ip: description.public_ip,
        reachability,
        launch_time: description.launch_time,
        platform: description
            .platform
            .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
        tags: description.tags,
    }
}
