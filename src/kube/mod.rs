//! The `ClusterApi` façade: every way a step handler touches the
//! cluster, behind one trait so a real `kube::Client` and an in-memory
//! fake can both satisfy handler code unchanged. Grounded in the
//! teacher's `Adapter` trait (`adapter/mod.rs`), which gave tool-calling
//! code one seam to mock in tests instead of juggling a concrete client
//! type everywhere.

pub mod client;
pub mod exec;
pub mod fake;
pub mod resources;
pub mod wait;

pub use client::KubeClusterApi;
pub use fake::FakeClusterApi;

use crate::Result;
use crate::model::{ComparatorOp, NodeSelector, ResourceRef, WaitCondition};
use async_trait::async_trait;
use std::collections::HashMap;

/// Specification for one ephemeral-pod command execution.
#[derive(Debug, Clone)]
pub struct ExecPodSpec {
    pub namespace: String,
    pub command: String,
    pub image: String,
    pub node_selector: Option<NodeSelector>,
    pub privileged: bool,
    pub host_path_mounts: Vec<(String, String)>,
    pub timeout_seconds: u64,
}

/// Everything a step handler needs from the cluster. One real
/// implementation (`KubeClusterApi`) talks to a live API server; one
/// fake implementation (`FakeClusterApi`) keeps an in-memory object
/// store for tests.
#[async_trait]
pub trait ClusterApi: Send + Sync {
    /// Fetch a resource as a raw JSON document, or `None` if it doesn't
    /// exist. Used by the condition evaluator and `waitFor`.
    async fn get_resource_json(&self, resource: &ResourceRef) -> Result<Option<serde_json::Value>>;

    /// Apply one or more YAML documents, defaulting unset namespaces to
    /// `default_namespace`.
    async fn apply_docs(&self, docs: &str, default_namespace: &str) -> Result<()>;

    /// Delete the referenced resource. A not-found is treated as success.
    async fn delete_target(&self, resource: &ResourceRef) -> Result<()>;

    /// Merge `labels` onto the resource and strip `remove_keys` from it.
    async fn patch_labels(
        &self,
        resource: &ResourceRef,
        labels: &HashMap<String, String>,
        remove_keys: &[String],
    ) -> Result<()>;

    /// List resource names matching a label selector.
    async fn list_by_selector(
        &self,
        api_version: &str,
        kind: &str,
        namespace: Option<&str>,
        selector: &str,
    ) -> Result<Vec<String>>;

    /// Resolve a node selector to concrete node names.
    async fn select_nodes(&self, selector: &NodeSelector) -> Result<Vec<String>>;

    /// Run a command to completion in an ephemeral pod and return its
    /// captured stdout/log output.
    async fn exec_pod(&self, spec: ExecPodSpec) -> Result<String>;

    /// Fetch another `PseudoFlow` custom resource's `spec`, for
    /// `includeFlow`.
    async fn get_flow_spec(
        &self,
        name: &str,
        namespace: &str,
    ) -> Result<crate::model::FlowSpec>;

    /// Block until `resource` satisfies `condition`, or fail with
    /// `TimeoutExpired` after `timeout_seconds`. `json_path`/`op`/`value`
    /// are only consulted for `WaitCondition::Custom`.
    #[allow(clippy::too_many_arguments)]
    async fn wait_for_resource_condition(
        &self,
        resource: &ResourceRef,
        condition: WaitCondition,
        json_path: Option<&str>,
        op: Option<ComparatorOp>,
        value: Option<&serde_json::Value>,
        timeout_seconds: u64,
    ) -> Result<()>;
}
