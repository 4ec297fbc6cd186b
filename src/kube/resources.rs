//! GVK → `ApiResource` resolution shared by the real cluster client.
//!
//! A handful of built-in kinds get their natural plural directly; any
//! other kind falls back to the dynamic client with `kind.lower() + "s"`
//! as a guessed plural. That guess is wrong for kinds whose plural
//! doesn't just add an `s` (e.g. `Ingress` → `ingresses`), a known gap
//! carried over from the original implementation rather than "fixed"
//! with a discovery client lookup.
// TODO: replace the naive plural guess with a `kube::discovery::Discovery`
// lookup once a kind that actually needs it shows up in a flow.

use crate::error::ClusterError;
use crate::model::ResourceRef;
use kube::api::{ApiResource, DynamicObject, GroupVersionKind};

/// Build the `ApiResource` used to construct a dynamic `kube::Api` for
/// `resource`, using a built-in plural for common kinds and the naive
/// `kind.lower() + "s"` heuristic otherwise.
pub fn api_resource_for(resource: &ResourceRef) -> Result<ApiResource, ClusterError> {
    let (group, version) = split_api_version(&resource.api_version);
    let gvk = GroupVersionKind {
        group,
        version,
        kind: resource.kind.clone(),
    };

    let plural = builtin_plural(&resource.kind).unwrap_or_else(|| naive_plural(&resource.kind));
    Ok(ApiResource::from_gvk_with_plural(&gvk, &plural))
}

/// Split `"apps/v1"` into `("apps", "v1")`, or `"v1"` into `("", "v1")`
/// for the core group.
fn split_api_version(api_version: &str) -> (String, String) {
    match api_version.split_once('/') {
        Some((group, version)) => (group.to_string(), version.to_string()),
        None => (String::new(), api_version.to_string()),
    }
}

fn builtin_plural(kind: &str) -> Option<String> {
    let plural = match kind {
        "ConfigMap" => "configmaps",
        "Secret" => "secrets",
        "Service" => "services",
        "Pod" => "pods",
        "Node" => "nodes",
        "Deployment" => "deployments",
        "DaemonSet" => "daemonsets",
        "StatefulSet" => "statefulsets",
        _ => return None,
    };
    Some(plural.to_string())
}

fn naive_plural(kind: &str) -> String {
    format!("{}s", kind.to_lowercase())
}

/// A single YAML document parsed for `apply`/`delete` purposes: enough
/// to build a `DynamicObject`.
pub fn parse_doc(doc: &str) -> Result<DynamicObject, ClusterError> {
    serde_yaml::from_str::<DynamicObject>(doc)
        .map_err(|e| ClusterError::UnsupportedKind(format!("invalid manifest document: {e}")))
}
