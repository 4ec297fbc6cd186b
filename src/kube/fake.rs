//! In-memory `ClusterApi`, used by engine/handler unit tests and the CLI's
//! `--dry-run` mode so flows can be exercised without a live cluster.
//! Grounded in the teacher's `adapter::mock`-style fakes used throughout
//! `engine/executor_test.rs`: a `Mutex`-guarded store plus a handful of
//! `with_*`/`seed_*` builder methods test code calls before running a flow.

use super::{ClusterApi, ExecPodSpec};
use crate::Result;
use crate::error::EngineError;
use crate::model::{ComparatorOp, FlowSpec, NodeSelector, ResourceRef, WaitCondition};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

#[derive(Debug, Clone, Eq, PartialEq, Hash)]
struct ObjectKey {
    api_version: String,
    kind: String,
    namespace: String,
    name: String,
}

impl ObjectKey {
    fn of(resource: &ResourceRef) -> Self {
        Self {
            api_version: resource.api_version.clone(),
            kind: resource.kind.clone(),
            namespace: resource.namespace.clone().unwrap_or_default(),
            name: resource.name.clone(),
        }
    }
}

#[derive(Default)]
struct FakeState {
    objects: HashMap<ObjectKey, serde_json::Value>,
    nodes: Vec<(String, HashMap<String, String>)>,
    flows: HashMap<(String, String), FlowSpec>,
    exec_log: Vec<ExecPodSpec>,
    exec_responses: VecDeque<Result<String>>,
}

/// In-memory stand-in for a live Kubernetes API server.
#[derive(Default)]
pub struct FakeClusterApi {
    state: Mutex<FakeState>,
}

impl FakeClusterApi {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a resource so `get_resource_json`/condition evaluation finds it.
    pub fn seed_resource(&self, resource: &ResourceRef, value: serde_json::Value) {
        self.state
            .lock()
            .expect("fake cluster state poisoned")
            .objects
            .insert(ObjectKey::of(resource), value);
    }

    /// Register a node with the given labels, for `loopNodes`/`execNode`
    /// node-selector resolution.
    pub fn seed_node(&self, name: impl Into<String>, labels: HashMap<String, String>) {
        self.state
            .lock()
            .expect("fake cluster state poisoned")
            .nodes
            .push((name.into(), labels));
    }

    /// Register a flow's spec so `includeFlow` can fetch it by name.
    pub fn seed_flow(&self, name: impl Into<String>, namespace: impl Into<String>, spec: FlowSpec) {
        self.state
            .lock()
            .expect("fake cluster state poisoned")
            .flows
            .insert((namespace.into(), name.into()), spec);
    }

    /// Queue the next `exec_pod` call's result (FIFO). Unqueued calls
    /// succeed with empty output.
    pub fn queue_exec_result(&self, result: Result<String>) {
        self.state
            .lock()
            .expect("fake cluster state poisoned")
            .exec_responses
            .push_back(result);
    }

    /// Every `ExecPodSpec` passed to `exec_pod` so far, in call order.
    #[must_use]
    pub fn exec_log(&self) -> Vec<ExecPodSpec> {
        self.state.lock().expect("fake cluster state poisoned").exec_log.clone()
    }
}

fn parse_selector(selector: &str) -> Vec<(String, String)> {
    selector
        .split(',')
        .filter_map(|pair| pair.split_once('='))
        .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        .collect()
}

fn labels_match(labels: &HashMap<String, String>, requirements: &[(String, String)]) -> bool {
    requirements.iter().all(|(k, v)| labels.get(k).is_some_and(|have| have == v))
}

fn object_labels(doc: &serde_json::Value) -> HashMap<String, String> {
    doc.get("metadata")
        .and_then(|m| m.get("labels"))
        .and_then(|l| l.as_object())
        .map(|map| {
            map.iter()
                .filter_map(|(k, v)| v.as_str().map(|s| (k.clone(), s.to_string())))
                .collect()
        })
        .unwrap_or_default()
}

#[async_trait]
impl ClusterApi for FakeClusterApi {
    async fn get_resource_json(&self, resource: &ResourceRef) -> Result<Option<serde_json::Value>> {
        Ok(self
            .state
            .lock()
            .expect("fake cluster state poisoned")
            .objects
            .get(&ObjectKey::of(resource))
            .cloned())
    }

    async fn apply_docs(&self, docs: &str, default_namespace: &str) -> Result<()> {
        for doc in serde_yaml::Deserializer::from_str(docs) {
            let value = serde_yaml::Value::deserialize(doc).map_err(EngineError::Yaml)?;
            if value.is_null() {
                continue;
            }
            let json: serde_json::Value = serde_json::to_value(&value)?;
            let api_version = json
                .get("apiVersion")
                .and_then(|v| v.as_str())
                .ok_or_else(|| EngineError::bad_step("manifest missing apiVersion"))?
                .to_string();
            let kind = json
                .get("kind")
                .and_then(|v| v.as_str())
                .ok_or_else(|| EngineError::bad_step("manifest missing kind"))?
                .to_string();
            let name = json
                .get("metadata")
                .and_then(|m| m.get("name"))
                .and_then(|v| v.as_str())
                .ok_or_else(|| EngineError::bad_step("manifest missing metadata.name"))?
                .to_string();
            let namespace = json
                .get("metadata")
                .and_then(|m| m.get("namespace"))
                .and_then(|v| v.as_str())
                .unwrap_or(default_namespace)
                .to_string();

            let resource = ResourceRef {
                api_version,
                kind,
                name,
                namespace: Some(namespace),
            };
            self.seed_resource(&resource, json);
        }
        Ok(())
    }

    async fn delete_target(&self, resource: &ResourceRef) -> Result<()> {
        self.state
            .lock()
            .expect("fake cluster state poisoned")
            .objects
            .remove(&ObjectKey::of(resource));
        Ok(())
    }

    async fn patch_labels(
        &self,
        resource: &ResourceRef,
        labels: &HashMap<String, String>,
        remove_keys: &[String],
    ) -> Result<()> {
        let mut state = self.state.lock().expect("fake cluster state poisoned");
        let key = ObjectKey::of(resource);
        let obj = state
            .objects
            .entry(key)
            .or_insert_with(|| serde_json::json!({"metadata": {"labels": {}}}));

        let metadata = obj
            .as_object_mut()
            .unwrap()
            .entry("metadata")
            .or_insert_with(|| serde_json::json!({}));
        let label_map = metadata
            .as_object_mut()
            .unwrap()
            .entry("labels")
            .or_insert_with(|| serde_json::json!({}))
            .as_object_mut()
            .unwrap();

        for (k, v) in labels {
            label_map.insert(k.clone(), serde_json::Value::String(v.clone()));
        }
        for k in remove_keys {
            label_map.remove(k);
        }
        Ok(())
    }

    async fn list_by_selector(
        &self,
        api_version: &str,
        kind: &str,
        namespace: Option<&str>,
        selector: &str,
    ) -> Result<Vec<String>> {
        let requirements = parse_selector(selector);
        let state = self.state.lock().expect("fake cluster state poisoned");
        let mut names: Vec<String> = state
            .objects
            .iter()
            .filter(|(key, _)| {
                key.api_version == api_version
                    && key.kind == kind
                    && namespace.map(|ns| ns == key.namespace).unwrap_or(true)
            })
            .filter(|(_, doc)| labels_match(&object_labels(doc), &requirements))
            .map(|(key, _)| key.name.clone())
            .collect();
        names.sort();
        Ok(names)
    }

    async fn select_nodes(&self, selector: &NodeSelector) -> Result<Vec<String>> {
        let requirements = parse_selector(&selector.to_selector_string());
        let state = self.state.lock().expect("fake cluster state poisoned");
        let mut names: Vec<String> = state
            .nodes
            .iter()
            .filter(|(_, labels)| labels_match(labels, &requirements))
            .map(|(name, _)| name.clone())
            .collect();
        names.sort();
        Ok(names)
    }

    async fn exec_pod(&self, spec: ExecPodSpec) -> Result<String> {
        let mut state = self.state.lock().expect("fake cluster state poisoned");
        state.exec_log.push(spec);
        state.exec_responses.pop_front().unwrap_or(Ok(String::new()))
    }

    async fn get_flow_spec(&self, name: &str, namespace: &str) -> Result<FlowSpec> {
        self.state
            .lock()
            .expect("fake cluster state poisoned")
            .flows
            .get(&(namespace.to_string(), name.to_string()))
            .cloned()
            .ok_or_else(|| EngineError::bad_step(format!("no such flow {namespace}/{name}")))
    }

    async fn wait_for_resource_condition(
        &self,
        resource: &ResourceRef,
        condition: WaitCondition,
        json_path: Option<&str>,
        op: Option<ComparatorOp>,
        value: Option<&serde_json::Value>,
        _timeout_seconds: u64,
    ) -> Result<()> {
        if condition == WaitCondition::Custom && (json_path.is_none() || op.is_none() || value.is_none()) {
            return Err(EngineError::bad_step(
                "waitFor with condition=custom requires jsonPath, op, and value",
            ));
        }

        let state = self.state.lock().expect("fake cluster state poisoned");
        let obj = state.objects.get(&ObjectKey::of(resource));
        let satisfied = match condition {
            WaitCondition::Exist => obj.is_some(),
            WaitCondition::Deleted => obj.is_none(),
            WaitCondition::Ready | WaitCondition::Available | WaitCondition::Healthy => {
                obj.map(super::wait::workload_is_ready).unwrap_or(false)
            }
            WaitCondition::Custom => obj
                .map(|doc| super::wait::evaluate_custom(doc, json_path.unwrap(), op.unwrap(), value.unwrap()))
                .unwrap_or(false),
        };

        if satisfied {
            Ok(())
        } else {
            Err(EngineError::timeout_expired(format!(
                "waitFor {} {}/{} not satisfied (fake cluster does not wait across ticks)",
                resource.kind,
                resource.namespace.clone().unwrap_or_default(),
                resource.name
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn res(kind: &str, name: &str) -> ResourceRef {
        ResourceRef {
            api_version: "v1".into(),
            kind: kind.into(),
            name: name.into(),
            namespace: Some("default".into()),
        }
    }

    #[tokio::test]
    async fn seeded_resource_is_fetched() {
        let api = FakeClusterApi::new();
        api.seed_resource(&res("ConfigMap", "cfg"), serde_json::json!({"data": {"k": "v"}}));
        let got = api.get_resource_json(&res("ConfigMap", "cfg")).await.unwrap();
        assert!(got.is_some());
    }

    #[tokio::test]
    async fn missing_resource_is_none() {
        let api = FakeClusterApi::new();
        let got = api.get_resource_json(&res("ConfigMap", "missing")).await.unwrap();
        assert!(got.is_none());
    }

    #[tokio::test]
    async fn delete_then_get_is_none() {
        let api = FakeClusterApi::new();
        api.seed_resource(&res("ConfigMap", "cfg"), serde_json::json!({}));
        api.delete_target(&res("ConfigMap", "cfg")).await.unwrap();
        assert!(api.get_resource_json(&res("ConfigMap", "cfg")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn apply_docs_seeds_resource_with_default_namespace() {
        let api = FakeClusterApi::new();
        api.apply_docs(
            "apiVersion: v1\nkind: ConfigMap\nmetadata:\n  name: cfg\n",
            "fallback-ns",
        )
        .await
        .unwrap();
        let got = api
            .get_resource_json(&ResourceRef {
                api_version: "v1".into(),
                kind: "ConfigMap".into(),
                name: "cfg".into(),
                namespace: Some("fallback-ns".into()),
            })
            .await
            .unwrap();
        assert!(got.is_some());
    }

    #[tokio::test]
    async fn select_nodes_filters_by_labels() {
        let api = FakeClusterApi::new();
        api.seed_node("a", HashMap::from([("zone".to_string(), "east".to_string())]));
        api.seed_node("b", HashMap::from([("zone".to_string(), "west".to_string())]));
        let names = api
            .select_nodes(&NodeSelector::Selector("zone=east".into()))
            .await
            .unwrap();
        assert_eq!(names, vec!["a".to_string()]);
    }

    #[tokio::test]
    async fn exec_pod_records_call_and_returns_queued_result() {
        let api = FakeClusterApi::new();
        api.queue_exec_result(Ok("hello".into()));
        let out = api
            .exec_pod(ExecPodSpec {
                namespace: "default".into(),
                command: "echo hello".into(),
                image: "alpine:3.20".into(),
                node_selector: None,
                privileged: false,
                host_path_mounts: vec![],
                timeout_seconds: 30,
            })
            .await
            .unwrap();
        assert_eq!(out, "hello");
        assert_eq!(api.exec_log().len(), 1);
    }

    #[tokio::test]
    async fn wait_for_exist_succeeds_when_seeded() {
        let api = FakeClusterApi::new();
        api.seed_resource(&res("ConfigMap", "cfg"), serde_json::json!({}));
        api.wait_for_resource_condition(&res("ConfigMap", "cfg"), WaitCondition::Exist, None, None, None, 5)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn wait_for_custom_without_fields_is_bad_step() {
        let api = FakeClusterApi::new();
        let err = api
            .wait_for_resource_condition(&res("ConfigMap", "cfg"), WaitCondition::Custom, None, None, None, 5)
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::BadStep(_)));
    }
}
