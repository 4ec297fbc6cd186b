//! Condition evaluation: fetch a resource through the `ClusterApi`, run a
//! JSONPath query against it, and compare the match list against a value.
//! Grounded in `pseudoflow/engine/runner.py::_eval_condition`.

use crate::kube::ClusterApi;
use crate::model::{ComparatorOp, Condition};
use serde_json::Value;
use serde_json_path::JsonPath;

/// Evaluate `condition` against the cluster. Fetch errors (including
/// not-found) are swallowed and treated as `false` — the condition
/// evaluator never raises, matching the source's intentional
/// simplification.
pub async fn evaluate(cluster: &dyn ClusterApi, condition: &Condition) -> bool {
    let doc = match cluster.get_resource_json(&condition.resource).await {
        Ok(Some(doc)) => doc,
        Ok(None) => return false,
        Err(_) => return false,
    };

    let candidates = match_list(&doc, condition.json_path.as_deref().unwrap_or(""));
    candidates.iter().any(|candidate| compare(candidate, condition.op, &condition.value))
}

/// The JSONPath match list: the whole document as a singleton if
/// `json_path` is empty, otherwise every value the query extracts.
fn match_list(doc: &Value, json_path: &str) -> Vec<Value> {
    if json_path.trim().is_empty() {
        return vec![doc.clone()];
    }
    match JsonPath::parse(json_path) {
        Ok(path) => path.query(doc).all().into_iter().cloned().collect(),
        Err(_) => Vec::new(),
    }
}

fn compare(actual: &Value, op: ComparatorOp, expected: &Value) -> bool {
    use ComparatorOp::{Contains, Equals, GreaterThan, LessThan, NotEquals};
    match op {
        Equals => string_of(actual) == string_of(expected),
        NotEquals => string_of(actual) != string_of(expected),
        Contains => string_of(actual).contains(&string_of(expected)),
        GreaterThan => match (actual.as_f64(), expected.as_f64()) {
            (Some(a), Some(b)) => a > b,
            _ => false,
        },
        LessThan => match (actual.as_f64(), expected.as_f64()) {
            (Some(a), Some(b)) => a < b,
            _ => false,
        },
    }
}

fn string_of(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kube::FakeClusterApi;
    use crate::model::ResourceRef;
    use serde_json::json;

    fn configmap_condition(json_path: &str, op: ComparatorOp, value: Value) -> Condition {
        Condition {
            resource: ResourceRef {
                api_version: "v1".into(),
                kind: "ConfigMap".into(),
                name: "cm1".into(),
                namespace: Some("default".into()),
            },
            json_path: Some(json_path.into()),
            op,
            value,
        }
    }

    #[tokio::test]
    async fn equals_match_on_nested_field() {
        let cluster = FakeClusterApi::new();
        cluster.seed_resource(
            &ResourceRef {
                api_version: "v1".into(),
                kind: "ConfigMap".into(),
                name: "cm1".into(),
                namespace: Some("default".into()),
            },
            json!({"data": {"ready": "yes"}}),
        );
        let cond = configmap_condition("$.data.ready", ComparatorOp::Equals, json!("yes"));
        assert!(evaluate(&cluster, &cond).await);
    }

    #[tokio::test]
    async fn missing_resource_is_false_not_an_error() {
        let cluster = FakeClusterApi::new();
        let cond = configmap_condition("$.data.ready", ComparatorOp::Equals, json!("yes"));
        assert!(!evaluate(&cluster, &cond).await);
    }

    #[tokio::test]
    async fn empty_json_path_matches_whole_document() {
        let cluster = FakeClusterApi::new();
        let resource = ResourceRef {
            api_version: "v1".into(),
            kind: "ConfigMap".into(),
            name: "cm1".into(),
            namespace: Some("default".into()),
        };
        cluster.seed_resource(&resource, json!("sentinel"));
        let cond = Condition {
            resource,
            json_path: None,
            op: ComparatorOp::Equals,
            value: json!("sentinel"),
        };
        assert!(evaluate(&cluster, &cond).await);
    }

    #[tokio::test]
    async fn greater_than_is_numeric() {
        let cluster = FakeClusterApi::new();
        let resource = ResourceRef {
            api_version: "v1".into(),
            kind: "ConfigMap".into(),
            name: "cm1".into(),
            namespace: Some("default".into()),
        };
        cluster.seed_resource(&resource, json!({"data": {"count": 5}}));
        let cond = configmap_condition("$.data.count", ComparatorOp::GreaterThan, json!(3));
        assert!(evaluate(&cluster, &cond).await);
        let cond = configmap_condition("$.data.count", ComparatorOp::GreaterThan, json!(10));
        assert!(!evaluate(&cluster, &cond).await);
    }
}
