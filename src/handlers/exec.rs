//! `exec`/`script`: run a command (or multi-line shell body) in an
//! ephemeral pod in the operator namespace; optionally capture stdout
//! into `vars[var]`.

use crate::config::Config;
use crate::kube::{ClusterApi, ExecPodSpec};
use crate::model::{Context, NodeSelector};
use crate::Result;

pub async fn exec(
    cluster: &dyn ClusterApi,
    config: &Config,
    ctx: &mut Context,
    cmd: &str,
    node_selector: Option<&NodeSelector>,
    privileged: bool,
    var: Option<&str>,
) -> Result<()> {
    let output = run(cluster, config, ctx, cmd, node_selector, privileged).await?;
    if let Some(var) = var {
        ctx.vars
            .insert(var.to_string(), serde_json::Value::String(output));
    }
    Ok(())
}

pub async fn script(
    cluster: &dyn ClusterApi,
    config: &Config,
    ctx: &mut Context,
    code: &str,
    node_selector: Option<&NodeSelector>,
    privileged: bool,
    var: Option<&str>,
) -> Result<()> {
    exec(cluster, config, ctx, code, node_selector, privileged, var).await
}

async fn run(
    cluster: &dyn ClusterApi,
    config: &Config,
    ctx: &Context,
    cmd: &str,
    node_selector: Option<&NodeSelector>,
    privileged: bool,
) -> Result<String> {
    cluster
        .exec_pod(ExecPodSpec {
            namespace: ctx.operator_ns.clone(),
            command: cmd.to_string(),
            image: config.runner_image.clone(),
            node_selector: node_selector.cloned(),
            privileged,
            host_path_mounts: Vec::new(),
            timeout_seconds: 300,
        })
        .await
}
