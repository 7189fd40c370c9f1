//! Fleet-wide inventory queries that skip reachability checks.

use crate::directory::{InstanceDirectory, running_filter};
use crate::error::Result;
use crate::provider::Filter;

impl InstanceDirectory {
    /// Count running instances, optionally of one exact type.
    pub async fn count_running_instances(&self, instance_type: Option<&str>) -> Result<usize> {
        let mut filters = vec![running_filter()];
        if let Some(instance_type) = instance_type {
            filters.push(Filter::single("instance-type", instance_type));
        }
        let instances = self.inventory.describe_instances(&filters).await?;
        Ok(instances.len())
    }

    /// Instance types offered in the region, optionally containing `search`.
    pub async fn list_instance_types(&self, search: Option<&str>) -> Result<Vec<String>> {
        let types = self.inventory.describe_instance_types().await?;
        Ok(match search {
            Some(needle) => types.into_iter().filter(|t| t.contains(needle)).collect(),
            None => types,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::mock::MockCloud;
    use crate::provider::InstanceDescription;

    fn fleet() -> Arc<MockCloud> {
        Arc::new(
            MockCloud::new()
                .with_instance(InstanceDescription::new("i-1", "t3.small"))
                .with_instance(InstanceDescription::new("i-2", "t3.small"))
                .with_instance(InstanceDescription::new("i-3", "c5.xlarge"))
                .with_instance(InstanceDescription::new("i-4", "t3.small").with_state("stopped"))
                .with_instance_types(["t3.small", "t3.large", "c5.xlarge"]),
        )
    }

    #[tokio::test]
    async fn test_count_running_instances() {
        let cloud = fleet();
        let directory = InstanceDirectory::new(cloud.clone(), cloud.clone());

        assert_eq!(directory.count_running_instances(None).await.unwrap(), 3);
        assert_eq!(
            directory
                .count_running_instances(Some("t3.small"))
                .await
                .unwrap(),
            2
        );
        assert!(cloud.registry_calls().is_empty());
    }

    #[tokio::test]
    async fn test_list_instance_types_with_search() {
        let cloud = fleet();
        let directory = InstanceDirectory::new(cloud.clone(), cloud.clone());

        assert_eq!(directory.list_instance_types(None).await.unwrap().len(), 3);
        assert_eq!(
            directory.list_instance_types(Some("t3")).await.unwrap(),
            vec!["t3.small", "t3.large"]
        );
        assert!(
            directory
                .list_instance_types(Some("m7"))
                .await
                .unwrap()
                .is_empty()
        );
    }
}
