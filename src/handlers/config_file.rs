//! `configFile`: write `content` to `path` on each selected node,
//! privileged, with the node filesystem host-mounted at `/host`.

use super::resolve_nodes;
use crate::config::Config;
use crate::kube::{ClusterApi, ExecPodSpec};
use crate::model::{Context, NodeSelector};
use crate::Result;

pub async fn config_file(
    cluster: &dyn ClusterApi,
    config: &Config,
    ctx: &Context,
    path: &str,
    content: &str,
    node_selector: Option<&NodeSelector>,
) -> Result<()> {
    let nodes = resolve_nodes(cluster, node_selector).await?;
    let host_path = format!("/host{path}");
    let command = format!(
        "mkdir -p $(dirname {host_path}) && cat > {host_path} <<'PSEUDOFLOW_EOF'\n{content}\nPSEUDOFLOW_EOF",
        host_path = shell_words::quote(&host_path),
    );

    for node in nodes {
        let selector = NodeSelector::Selector(format!("kubernetes.io/hostname={node}"));
        cluster
            .exec_pod(ExecPodSpec {
                namespace: ctx.operator_ns.clone(),
                command: command.clone(),
                image: config.runner_image.clone(),
                node_selector: Some(selector),
                privileged: true,
                host_path_mounts: vec![("/".to_string(), "/host".to_string())],
                timeout_seconds: 120,
            })
            .await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kube::FakeClusterApi;
    use std::collections::HashMap;

    #[tokio::test]
    async fn writes_to_every_selected_node() {
        let cluster = FakeClusterApi::new();
        cluster.seed_node("a", HashMap::new());
        cluster.seed_node("b", HashMap::new());
        cluster.queue_exec_result(Ok(String::new()));
        cluster.queue_exec_result(Ok(String::new()));

        let config = Config::default();
        let ctx = Context::new("default", None);
        config_file(
            &cluster,
            &config,
            &ctx,
            "/etc/motd",
            "hello",
            Some(&NodeSelector::Selector(String::new())),
        )
        .await
        .unwrap();

        let calls = cluster.exec_log();
        assert_eq!(calls.len(), 2);
        assert!(calls.iter().all(|c| c.privileged));
    }
}
