//! `patchFile`: in-place `sed` substitution of `pattern` → `replace` in
//! `path` on each selected node.
//!
//! `pattern`/`replace` are shell-quoted with `shell_words::quote` before
//! being spliced into the `sed` invocation, closing the shell-quoting
//! gap spec.md §9 flags: a raw string interpolation here would let a
//! flow author's `pattern`/`replace` break out of the intended `sed`
//! argument.

use super::resolve_nodes;
use crate::config::Config;
use crate::kube::{ClusterApi, ExecPodSpec};
use crate::model::{Context, NodeSelector};
use crate::Result;

pub async fn patch_file(
    cluster: &dyn ClusterApi,
    config: &Config,
    ctx: &Context,
    path: &str,
    pattern: &str,
    replace: &str,
    node_selector: Option<&NodeSelector>,
) -> Result<()> {
    let nodes = resolve_nodes(cluster, node_selector).await?;
    let host_path = format!("/host{path}");
    let sed_expr = format!("s/{}/{}/g", escape_sed(pattern), escape_sed(replace));
    let command = format!(
        "sed -i {} {}",
        shell_words::quote(&sed_expr),
        shell_words::quote(&host_path),
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

/// Escape characters meaningful inside a `sed` `s/…/…/` expression
/// (`/` and `&`, plus a literal backslash) so `pattern`/`replace` are
/// treated as literal text rather than `sed` syntax.
fn escape_sed(s: &str) -> String {
    s.replace('\\', "\\\\").replace('/', "\\/").replace('&', "\\&")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kube::FakeClusterApi;
    use std::collections::HashMap;

    #[tokio::test]
    async fn escapes_slashes_in_pattern_and_replace() {
        assert_eq!(escape_sed("a/b"), "a\\/b");
        assert_eq!(escape_sed("x&y"), "x\\&y");
    }

    #[tokio::test]
    async fn patches_every_selected_node() {
        let cluster = FakeClusterApi::new();
        cluster.seed_node("a", HashMap::new());
        cluster.queue_exec_result(Ok(String::new()));

        let config = Config::default();
        let ctx = Context::new("default", None);
        patch_file(
            &cluster,
            &config,
            &ctx,
            "/etc/hosts",
            "old",
            "new",
            Some(&NodeSelector::Selector(String::new())),
        )
        .await
        .unwrap();

        assert_eq!(cluster.exec_log().len(), 1);
    }
}
