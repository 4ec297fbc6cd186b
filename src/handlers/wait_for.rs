//! `waitFor`: poll until `condition` on `resource` holds or timeout.

use crate::kube::ClusterApi;
use crate::model::{ComparatorOp, ResourceRef, WaitCondition};
use crate::Result;

#[allow(clippy::too_many_arguments)]
pub async fn wait_for(
    cluster: &dyn ClusterApi,
    resource: &ResourceRef,
    condition: WaitCondition,
    json_path: Option<&str>,
    op: Option<ComparatorOp>,
    value: Option<&serde_json::Value>,
    timeout_seconds: u64,
) -> Result<()> {
    cluster
        .wait_for_resource_condition(resource, condition, json_path, op, value, timeout_seconds)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kube::FakeClusterApi;
    use serde_json::json;

    #[tokio::test]
    async fn waits_for_existence() {
        let cluster = FakeClusterApi::new();
        let resource = ResourceRef {
            api_version: "v1".into(),
            kind: "ConfigMap".into(),
            name: "cm1".into(),
            namespace: Some("default".into()),
        };
        cluster.seed_resource(&resource, json!({}));
        wait_for(&cluster, &resource, WaitCondition::Exist, None, None, None, 5)
            .await
            .unwrap();
    }
}
