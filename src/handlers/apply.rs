//! `apply`/`applyFile`/`delete`/`deleteFile`: create or remove one or more
//! documents via the dynamic client.

use crate::error::EngineError;
use crate::kube::ClusterApi;
use crate::model::ResourceRef;
use crate::Result;
use serde::Deserialize;

pub async fn apply(cluster: &dyn ClusterApi, manifests: &str, default_namespace: &str) -> Result<()> {
    cluster.apply_docs(manifests, default_namespace).await
}

pub async fn apply_file(cluster: &dyn ClusterApi, path: &str, default_namespace: &str) -> Result<()> {
    let content = std::fs::read_to_string(path).map_err(EngineError::Io)?;
    cluster.apply_docs(&content, default_namespace).await
}

pub async fn delete(cluster: &dyn ClusterApi, resource: &ResourceRef) -> Result<()> {
    cluster.delete_target(resource).await
}

pub async fn delete_file(cluster: &dyn ClusterApi, path: &str, default_namespace: &str) -> Result<()> {
    let content = std::fs::read_to_string(path).map_err(EngineError::Io)?;
    for doc in serde_yaml::Deserializer::from_str(&content) {
        let value = serde_yaml::Value::deserialize(doc).map_err(EngineError::Yaml)?;
        if value.is_null() {
            continue;
        }
        let json: serde_json::Value = serde_json::to_value(&value)?;
        let resource = resource_ref_from_doc(&json, default_namespace)?;
        cluster.delete_target(&resource).await?;
    }
    Ok(())
}

fn resource_ref_from_doc(doc: &serde_json::Value, default_namespace: &str) -> Result<ResourceRef> {
    let api_version = doc
        .get("apiVersion")
        .and_then(|v| v.as_str())
        .ok_or_else(|| EngineError::bad_step("manifest document missing apiVersion"))?
        .to_string();
    let kind = doc
        .get("kind")
        .and_then(|v| v.as_str())
        .ok_or_else(|| EngineError::bad_step("manifest document missing kind"))?
        .to_string();
    let name = doc
        .get("metadata")
        .and_then(|m| m.get("name"))
        .and_then(|v| v.as_str())
        .ok_or_else(|| EngineError::bad_step("manifest document missing metadata.name"))?
        .to_string();
    let namespace = doc
        .get("metadata")
        .and_then(|m| m.get("namespace"))
        .and_then(|v| v.as_str())
        .unwrap_or(default_namespace)
        .to_string();
    Ok(ResourceRef {
        api_version,
        kind,
        name,
        namespace: Some(namespace),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kube::FakeClusterApi;

    #[tokio::test]
    async fn apply_then_delete_round_trips() {
        let cluster = FakeClusterApi::new();
        apply(
            &cluster,
            "apiVersion: v1\nkind: ConfigMap\nmetadata:\n  name: cm1\n",
            "default",
        )
        .await
        .unwrap();
        let resource = ResourceRef {
            api_version: "v1".into(),
            kind: "ConfigMap".into(),
            name: "cm1".into(),
            namespace: Some("default".into()),
        };
        assert!(cluster.get_resource_json(&resource).await.unwrap().is_some());
        delete(&cluster, &resource).await.unwrap();
        assert!(cluster.get_resource_json(&resource).await.unwrap().is_none());
    }
}
