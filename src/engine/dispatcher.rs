//! Routes an already-rendered leaf step to its handler. Combinators are
//! intercepted by the runner before a step ever reaches here; `dispatch`
//! only ever sees leaf variants (or `Step::Unknown`, for which it raises
//! `UnsupportedStepType`).

use crate::config::Config;
use crate::error::EngineError;
use crate::handlers;
use crate::kube::ClusterApi;
use crate::model::{Context, Step};
use crate::Result;

pub async fn dispatch(cluster: &dyn ClusterApi, config: &Config, step: &Step, ctx: &mut Context) -> Result<()> {
    match step {
        Step::Log { message } => handlers::log(message),

        Step::Sleep { seconds } => handlers::sleep(*seconds).await,

        Step::Apply { manifests } => handlers::apply(cluster, manifests, ctx.effective_namespace()).await,

        Step::ApplyFile { path } => {
            handlers::apply_file(cluster, path, ctx.effective_namespace()).await
        }

        Step::Delete { target } => handlers::delete(cluster, target).await,

        Step::DeleteFile { path } => {
            handlers::delete_file(cluster, path, ctx.effective_namespace()).await
        }

        Step::Include { source } => handlers::include(cluster, source, ctx.effective_namespace()).await,

        Step::WaitFor {
            resource,
            condition,
            json_path,
            op,
            value,
            timeout_seconds,
        } => {
            handlers::wait_for(
                cluster,
                resource,
                *condition,
                json_path.as_deref(),
                *op,
                value.as_ref(),
                *timeout_seconds,
            )
            .await
        }

        Step::SetLabel { target, labels } => handlers::set_label(cluster, ctx, target, labels).await,

        Step::RemoveLabel { target, keys } => handlers::remove_label(cluster, ctx, target, keys).await,

        Step::PatchLabel { from_var, target } => {
            handlers::patch_label(cluster, ctx, from_var, target).await
        }

        Step::Template { template, output, var } => {
            handlers::template(ctx, template, output.as_deref(), var.as_deref())
        }

        Step::Exec {
            cmd,
            node_selector,
            privileged,
            var,
        } => {
            handlers::exec_cmd(
                cluster,
                config,
                ctx,
                cmd,
                node_selector.as_ref(),
                *privileged,
                var.as_deref(),
            )
            .await
        }

        Step::Script {
            code,
            node_selector,
            privileged,
            var,
        } => {
            handlers::script(
                cluster,
                config,
                ctx,
                code,
                node_selector.as_ref(),
                *privileged,
                var.as_deref(),
            )
            .await
        }

        Step::ExecNode {
            cmd,
            node_selector,
            run_on,
            privileged,
            var_per_node,
        } => {
            handlers::exec_node(
                cluster,
                config,
                ctx,
                cmd,
                node_selector.as_ref(),
                *run_on,
                *privileged,
                var_per_node,
            )
            .await
        }

        Step::ConfigFile {
            path,
            content,
            node_selector,
        } => handlers::config_file(cluster, config, ctx, path, content, node_selector.as_ref()).await,

        Step::PatchFile {
            path,
            pattern,
            replace,
            node_selector,
        } => handlers::patch_file(cluster, config, ctx, path, pattern, replace, node_selector.as_ref()).await,

        Step::Eval { expression, var } => handlers::eval(ctx, var, expression),

        Step::Unknown => Err(EngineError::unsupported_step_type("unknown")),

        // Combinators never reach the dispatcher; the runner handles
        // them directly before calling here.
        other => Err(EngineError::unsupported_step_type(other.type_name())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kube::FakeClusterApi;
    use crate::model::Step;

    #[tokio::test]
    async fn unknown_step_is_unsupported() {
        let cluster = FakeClusterApi::new();
        let config = Config::default();
        let mut ctx = Context::new("default", None);
        let err = dispatch(&cluster, &config, &Step::Unknown, &mut ctx).await.unwrap_err();
        assert!(matches!(err, EngineError::UnsupportedStepType(_)));
    }

    #[tokio::test]
    async fn log_step_dispatches_to_handler() {
        let cluster = FakeClusterApi::new();
        let config = Config::default();
        let mut ctx = Context::new("default", None);
        let step = Step::Log { message: "hi".into() };
        dispatch(&cluster, &config, &step, &mut ctx).await.unwrap();
    }
}
