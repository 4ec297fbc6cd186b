//! Real `ClusterApi` implementation, backed by a live `kube::Client`.

use super::resources::{api_resource_for, parse_doc};
use super::{ClusterApi, ExecPodSpec};
use crate::constants::{CRD_GROUP, CRD_PLURAL, CRD_VERSION};
use crate::error::{ClusterError, EngineError};
use crate::kube::{exec, wait};
use crate::model::{ComparatorOp, FlowSpec, NodeSelector, ResourceRef, WaitCondition};
use crate::Result;
use async_trait::async_trait;
use k8s_openapi::api::core::v1::Node;
use kube::Client;
use kube::api::{Api, DynamicObject, ListParams, Patch, PatchParams};
use serde::Deserialize;
use std::collections::HashMap;

/// `ClusterApi` backed by a real Kubernetes API server.
pub struct KubeClusterApi {
    client: Client,
}

impl KubeClusterApi {
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Build the connection the usual way: in-cluster config first,
    /// falling back to the local kubeconfig, matching
    /// `get_k8s_api_clients()` in the Python original.
    pub async fn try_default() -> Result<Self> {
        let client = Client::try_default()
            .await
            .map_err(|e| EngineError::ClusterApiError(ClusterError::Kube(e)))?;
        Ok(Self::new(client))
    }

    fn dynamic_api(&self, resource: &ResourceRef) -> std::result::Result<Api<DynamicObject>, ClusterError> {
        let ar = api_resource_for(resource)?;
        Ok(match &resource.namespace {
            Some(ns) => Api::namespaced_with(self.client.clone(), ns, &ar),
            None => Api::all_with(self.client.clone(), &ar),
        })
    }
}

#[async_trait]
impl ClusterApi for KubeClusterApi {
    async fn get_resource_json(&self, resource: &ResourceRef) -> Result<Option<serde_json::Value>> {
        let api = self.dynamic_api(resource)?;
        match api.get_opt(&resource.name).await {
            Ok(Some(obj)) => Ok(Some(serde_json::to_value(obj)?)),
            Ok(None) => Ok(None),
            Err(e) => Err(ClusterError::Kube(e).into()),
        }
    }

    async fn apply_docs(&self, docs: &str, default_namespace: &str) -> Result<()> {
        for doc in serde_yaml::Deserializer::from_str(docs) {
            let value = serde_yaml::Value::deserialize(doc)?;
            if value.is_null() {
                continue;
            }
            let doc_str = serde_yaml::to_string(&value)?;
            let mut obj = parse_doc(&doc_str)?;
            let ns = obj
                .metadata
                .namespace
                .clone()
                .unwrap_or_else(|| default_namespace.to_string());
            obj.metadata.namespace = Some(ns.clone());

            let gvk = obj
                .types
                .as_ref()
                .ok_or_else(|| ClusterError::UnsupportedKind("manifest missing apiVersion/kind".into()))?;
            let resource = ResourceRef {
                api_version: gvk.api_version.clone(),
                kind: gvk.kind.clone(),
                name: obj.metadata.name.clone().unwrap_or_default(),
                namespace: Some(ns.clone()),
            };
            let ar = api_resource_for(&resource)?;
            let api: Api<DynamicObject> = Api::namespaced_with(self.client.clone(), &ns, &ar);

            api.patch(
                &resource.name,
                &PatchParams::apply("pseudoflow").force(),
                &Patch::Apply(&obj),
            )
            .await
            .map_err(ClusterError::Kube)?;
        }
        Ok(())
    }

    async fn delete_target(&self, resource: &ResourceRef) -> Result<()> {
        let api = self.dynamic_api(resource)?;
        match api.delete(&resource.name, &Default::default()).await {
            Ok(_) => Ok(()),
            Err(kube::Error::Api(e)) if e.code == 404 => Ok(()),
            Err(e) => Err(ClusterError::Kube(e).into()),
        }
    }

    async fn patch_labels(
        &self,
        resource: &ResourceRef,
        labels: &HashMap<String, String>,
        remove_keys: &[String],
    ) -> Result<()> {
        let api = self.dynamic_api(resource)?;
        let mut label_patch = serde_json::Map::new();
        for (k, v) in labels {
            label_patch.insert(k.clone(), serde_json::Value::String(v.clone()));
        }
        for k in remove_keys {
            label_patch.insert(k.clone(), serde_json::Value::Null);
        }
        let patch = serde_json::json!({
            "metadata": { "labels": label_patch }
        });
        api.patch(
            &resource.name,
            &PatchParams::default(),
            &Patch::Merge(&patch),
        )
        .await
        .map_err(ClusterError::Kube)?;
        Ok(())
    }

    async fn list_by_selector(
        &self,
        api_version: &str,
        kind: &str,
        namespace: Option<&str>,
        selector: &str,
    ) -> Result<Vec<String>> {
        let probe = ResourceRef {
            api_version: api_version.to_string(),
            kind: kind.to_string(),
            name: String::new(),
            namespace: namespace.map(str::to_string),
        };
        let api = self.dynamic_api(&probe)?;
        let list = api
            .list(&ListParams::default().labels(selector))
            .await
            .map_err(ClusterError::Kube)?;
        Ok(list
            .items
            .into_iter()
            .filter_map(|o| o.metadata.name)
            .collect())
    }

    async fn select_nodes(&self, selector: &NodeSelector) -> Result<Vec<String>> {
        let label_selector = match selector {
            NodeSelector::Selector(s) => s.clone(),
            NodeSelector::Labels(map) => map
                .iter()
                .map(|(k, v)| format!("{k}={v}"))
                .collect::<Vec<_>>()
                .join(","),
        };
        let api: Api<Node> = Api::all(self.client.clone());
        let list = api
            .list(&ListParams::default().labels(&label_selector))
            .await
            .map_err(ClusterError::Kube)?;
        let mut names: Vec<String> = list.items.into_iter().filter_map(|n| n.metadata.name).collect();
        names.sort();
        Ok(names)
    }

    async fn exec_pod(&self, spec: ExecPodSpec) -> Result<String> {
        exec::run_pod_and_get_logs(&self.client, spec).await
    }

    async fn get_flow_spec(&self, name: &str, namespace: &str) -> Result<FlowSpec> {
        let ar = kube::api::ApiResource::from_gvk_with_plural(
            &kube::api::GroupVersionKind {
                group: CRD_GROUP.to_string(),
                version: CRD_VERSION.to_string(),
                kind: crate::constants::CRD_KIND.to_string(),
            },
            CRD_PLURAL,
        );
        let api: Api<DynamicObject> = Api::namespaced_with(self.client.clone(), namespace, &ar);
        let obj = api.get(name).await.map_err(ClusterError::Kube)?;
        let spec_value = obj
            .data
            .get("spec")
            .cloned()
            .ok_or_else(|| ClusterError::UnsupportedKind(format!("{name} has no spec")))?;
        Ok(serde_json::from_value(spec_value)?)
    }

    async fn wait_for_resource_condition(
        &self,
        resource: &ResourceRef,
        condition: WaitCondition,
        json_path: Option<&str>,
        op: Option<ComparatorOp>,
        value: Option<&serde_json::Value>,
        timeout_seconds: u64,
    ) -> Result<()> {
        wait::wait_for_resource_condition(
            &self.client,
            resource,
            condition,
            json_path,
            op,
            value,
            timeout_seconds,
        )
        .await
    }
}
