//! `waitFor` polling loop: block until a resource reaches the requested
//! condition, or fail with `TimeoutExpired`. Grounded in
//! `pseudoflow/kube/wait.py`, which polls the same small set of
//! conditions (`exist`, `deleted`, `ready`/`available`/`healthy`,
//! `custom`) against the dynamic client.

use super::resources::api_resource_for;
use crate::Result;
use crate::constants::WAIT_POLL_INTERVAL_SECS;
use crate::error::{ClusterError, EngineError};
use crate::model::{ComparatorOp, ResourceRef, WaitCondition};
use kube::Client;
use kube::api::{Api, DynamicObject};
use serde_json::Value;
use serde_json_path::JsonPath;
use std::time::Duration;

/// Poll `resource` until `condition` holds, or until `timeout_seconds`
/// elapses.
pub async fn wait_for_resource_condition(
    client: &Client,
    resource: &ResourceRef,
    condition: WaitCondition,
    json_path: Option<&str>,
    op: Option<ComparatorOp>,
    value: Option<&Value>,
    timeout_seconds: u64,
) -> Result<()> {
    let ar = api_resource_for(resource)?;
    let ns = resource
        .namespace
        .clone()
        .unwrap_or_default();
    let api: Api<DynamicObject> = if ns.is_empty() {
        Api::all_with(client.clone(), &ar)
    } else {
        Api::namespaced_with(client.clone(), &ns, &ar)
    };

    if condition == WaitCondition::Custom && (json_path.is_none() || op.is_none() || value.is_none()) {
        return Err(EngineError::bad_step(
            "waitFor with condition=custom requires jsonPath, op, and value",
        ));
    }

    let deadline = tokio::time::Instant::now() + Duration::from_secs(timeout_seconds.max(1));
    loop {
        let obj = api.get_opt(&resource.name).await.map_err(ClusterError::Kube)?;
        let satisfied = match condition {
            WaitCondition::Exist => obj.is_some(),
            WaitCondition::Deleted => obj.is_none(),
            WaitCondition::Ready | WaitCondition::Available | WaitCondition::Healthy => obj
                .as_ref()
                .map(|o| workload_is_ready(&o.data))
                .unwrap_or(false),
            WaitCondition::Custom => obj
                .as_ref()
                .map(|o| evaluate_custom(&o.data, json_path.unwrap(), op.unwrap(), value.unwrap()))
                .unwrap_or(false),
        };

        if satisfied {
            return Ok(());
        }

        if tokio::time::Instant::now() >= deadline {
            return Err(EngineError::timeout_expired(format!(
                "waitFor {} {}/{} did not reach {:?} within {timeout_seconds}s",
                resource.kind, ns, resource.name, condition
            )));
        }

        tokio::time::sleep(Duration::from_secs(WAIT_POLL_INTERVAL_SECS)).await;
    }
}

/// Readiness check for the handful of workload kinds `waitFor` cares
/// about: `status.readyReplicas == status.replicas` (with both
/// defaulting to `0`), which covers Deployment, DaemonSet and
/// StatefulSet status shapes identically.
///
/// `pub(crate)` so `FakeClusterApi` can evaluate the same conditions
/// against its in-memory store without duplicating the comparison logic.
pub(crate) fn workload_is_ready(doc: &Value) -> bool {
    let status = match doc.get("status") {
        Some(s) => s,
        None => return false,
    };
    let ready = status.get("readyReplicas").and_then(Value::as_i64).unwrap_or(0);
    let desired = status
        .get("replicas")
        .and_then(Value::as_i64)
        .unwrap_or_else(|| doc
            .get("spec")
            .and_then(|s| s.get("replicas"))
            .and_then(Value::as_i64)
            .unwrap_or(1));
    desired > 0 && ready >= desired
}

pub(crate) fn evaluate_custom(doc: &Value, json_path: &str, op: ComparatorOp, expected: &Value) -> bool {
    let path = match JsonPath::parse(json_path) {
        Ok(p) => p,
        Err(_) => return false,
    };
    let found = path.query(doc).exactly_one().ok();
    let actual = match found {
        Some(v) => v,
        None => return false,
    };
    compare(actual, op, expected)
}

fn compare(actual: &Value, op: ComparatorOp, expected: &Value) -> bool {
    match op {
        ComparatorOp::Equals => actual == expected,
        ComparatorOp::NotEquals => actual != expected,
        ComparatorOp::Contains => match (actual.as_str(), expected.as_str()) {
            (Some(a), Some(e)) => a.contains(e),
            _ => false,
        },
        ComparatorOp::GreaterThan => match (actual.as_f64(), expected.as_f64()) {
            (Some(a), Some(e)) => a > e,
            _ => false,
        },
        ComparatorOp::LessThan => match (actual.as_f64(), expected.as_f64()) {
            (Some(a), Some(e)) => a < e,
            _ => false,
        },
    }
}
