//! Leaf step handlers. Each module implements one `type`'s effect: field
//! validation (`BadStep` when required fields are absent or malformed)
//! plus the single cluster or local effect spec.md's leaf table assigns
//! it. The dispatcher (`engine::dispatcher`) is the only caller.

mod apply;
mod config_file;
mod eval;
mod exec;
mod exec_node;
mod include;
mod label;
mod log;
mod patch_file;
mod sleep;
mod template_step;
mod wait_for;

pub use apply::{apply, apply_file, delete, delete_file};
pub use config_file::config_file;
pub use eval::eval;
pub use exec::{script, exec as exec_cmd};
pub use exec_node::exec_node;
pub use include::include;
pub use label::{patch_label, remove_label, set_label};
pub use log::log;
pub use patch_file::patch_file;
pub use sleep::sleep;
pub use template_step::template;
pub use wait_for::wait_for;

use crate::kube::ClusterApi;
use crate::model::{LabelTarget, NodeSelector};
use crate::{EngineError, Result};

/// Resolve a `LabelTarget` (exact name or label selector) to zero or more
/// concrete resource names, honoring its own `namespace` when set.
pub(crate) async fn resolve_label_target_names(
    cluster: &dyn ClusterApi,
    target: &LabelTarget,
    default_namespace: &str,
) -> Result<Vec<String>> {
    let namespace = target.namespace.as_deref().unwrap_or(default_namespace);
    match (&target.name, &target.selector) {
        (Some(name), _) => Ok(vec![name.clone()]),
        (None, Some(selector)) => {
            cluster
                .list_by_selector(&target.api_version, &target.kind, Some(namespace), selector)
                .await
        }
        (None, None) => Err(EngineError::bad_step(
            "label target requires either `name` or `selector`",
        )),
    }
}

/// Resolve a node selector to concrete node names, failing with
/// `BadStep` if the step requires one and none was given.
pub(crate) async fn resolve_nodes(
    cluster: &dyn ClusterApi,
    node_selector: Option<&NodeSelector>,
) -> Result<Vec<String>> {
    let selector = node_selector.ok_or_else(|| EngineError::bad_step("missing required field: nodeSelector"))?;
    cluster.select_nodes(selector).await
}
