//! `setLabel`/`removeLabel`/`patchLabel`: patch labels on one or more
//! targets resolved by exact name or label selector.

use super::resolve_label_target_names;
use crate::error::EngineError;
use crate::kube::ClusterApi;
use crate::model::{Context, LabelTarget};
use crate::Result;
use std::collections::HashMap;

pub async fn set_label(
    cluster: &dyn ClusterApi,
    ctx: &Context,
    target: &LabelTarget,
    labels: &HashMap<String, String>,
) -> Result<()> {
    patch(cluster, ctx, target, labels, &[]).await
}

pub async fn remove_label(
    cluster: &dyn ClusterApi,
    ctx: &Context,
    target: &LabelTarget,
    keys: &[String],
) -> Result<()> {
    patch(cluster, ctx, target, &HashMap::new(), keys).await
}

/// `patchLabel`: the `{resourceName -> labels}` mapping is read from
/// `ctx.vars[from_var]` as JSON, and each named resource is patched with
/// its own label map. `target` supplies the `apiVersion`/`kind`/
/// `namespace` shared by every entry; its own `name`/`selector` are
/// unused here since the map keys are the target names.
pub async fn patch_label(
    cluster: &dyn ClusterApi,
    ctx: &Context,
    from_var: &str,
    target: &LabelTarget,
) -> Result<()> {
    let raw = ctx
        .vars
        .get(from_var)
        .ok_or_else(|| EngineError::bad_step(format!("patchLabel: vars[{from_var}] is not set")))?;
    let mapping: HashMap<String, HashMap<String, String>> = match raw {
        serde_json::Value::String(s) => serde_json::from_str(s)?,
        other => serde_json::from_value(other.clone())?,
    };

    let namespace = target.namespace.as_deref().unwrap_or(ctx.effective_namespace());
    for (name, labels) in mapping {
        let per_target = LabelTarget {
            api_version: target.api_version.clone(),
            kind: target.kind.clone(),
            namespace: Some(namespace.to_string()),
            name: Some(name),
            selector: None,
        };
        patch(cluster, ctx, &per_target, &labels, &[]).await?;
    }
    Ok(())
}

async fn patch(
    cluster: &dyn ClusterApi,
    ctx: &Context,
    target: &LabelTarget,
    labels: &HashMap<String, String>,
    remove_keys: &[String],
) -> Result<()> {
    let names = resolve_label_target_names(cluster, target, ctx.effective_namespace()).await?;
    let namespace = target.namespace.as_deref().unwrap_or(ctx.effective_namespace());
    for name in names {
        let resource = crate::model::ResourceRef {
            api_version: target.api_version.clone(),
            kind: target.kind.clone(),
            name,
            namespace: Some(namespace.to_string()),
        };
        cluster.patch_labels(&resource, labels, remove_keys).await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kube::FakeClusterApi;
    use serde_json::json;

    fn target(name: Option<&str>, selector: Option<&str>) -> LabelTarget {
        LabelTarget {
            api_version: "v1".into(),
            kind: "ConfigMap".into(),
            namespace: Some("default".into()),
            name: name.map(str::to_string),
            selector: selector.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn set_label_by_name() {
        let cluster = FakeClusterApi::new();
        let resource = crate::model::ResourceRef {
            api_version: "v1".into(),
            kind: "ConfigMap".into(),
            name: "cm1".into(),
            namespace: Some("default".into()),
        };
        cluster.seed_resource(&resource, json!({}));
        let ctx = Context::new("default", None);
        set_label(
            &cluster,
            &ctx,
            &target(Some("cm1"), None),
            &HashMap::from([("env".to_string(), "prod".to_string())]),
        )
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn set_label_without_name_or_selector_is_bad_step() {
        let cluster = FakeClusterApi::new();
        let ctx = Context::new("default", None);
        let err = set_label(&cluster, &ctx, &target(None, None), &HashMap::new())
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::BadStep(_)));
    }

    #[tokio::test]
    async fn patch_label_reads_mapping_from_vars() {
        let cluster = FakeClusterApi::new();
        cluster.seed_resource(
            &crate::model::ResourceRef {
                api_version: "v1".into(),
                kind: "ConfigMap".into(),
                name: "cm1".into(),
                namespace: Some("default".into()),
            },
            json!({}),
        );
        let mut ctx = Context::new("default", None);
        ctx.vars.insert(
            "mapping".to_string(),
            json!({"cm1": {"env": "prod"}}),
        );
        patch_label(&cluster, &ctx, "mapping", &target(None, None)).await.unwrap();
    }
}
