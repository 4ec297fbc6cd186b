//! `execNode`: run `cmd` on one or more selected nodes via privileged
//! ephemeral pods, capturing per-node output as a JSON object in
//! `vars[var_per_node]`.

use super::resolve_nodes;
use crate::config::Config;
use crate::kube::{ClusterApi, ExecPodSpec};
use crate::model::{Context, NodeSelector, RunOn};
use crate::Result;
use std::collections::BTreeMap;

pub async fn exec_node(
    cluster: &dyn ClusterApi,
    config: &Config,
    ctx: &mut Context,
    cmd: &str,
    node_selector: Option<&NodeSelector>,
    run_on: RunOn,
    privileged: bool,
    var_per_node: &str,
) -> Result<()> {
    let mut nodes = resolve_nodes(cluster, node_selector).await?;
    nodes.sort();

    let targets: Vec<&String> = match run_on {
        RunOn::All => nodes.iter().collect(),
        RunOn::Any | RunOn::First => nodes.first().into_iter().collect(),
    };

    let mut outputs = BTreeMap::new();
    for node in targets {
        let selector = NodeSelector::Selector(format!("kubernetes.io/hostname={node}"));
        let output = cluster
            .exec_pod(ExecPodSpec {
                namespace: ctx.operator_ns.clone(),
                command: cmd.to_string(),
                image: config.runner_image.clone(),
                node_selector: Some(selector),
                privileged,
                host_path_mounts: Vec::new(),
                timeout_seconds: 300,
            })
            .await?;
        outputs.insert(node.clone(), serde_json::Value::String(output));
    }

    ctx.vars.insert(
        var_per_node.to_string(),
        serde_json::Value::Object(outputs.into_iter().collect()),
    );
    Ok(())
}
