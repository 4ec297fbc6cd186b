//! Execution engine for the PseudoFlow operator.
//!
//! The engine ties the three pieces the rest of this module exposes
//! together: `dispatcher` routes a leaf step to its handler, `condition`
//! evaluates `if`/`when`/`waitFor`-style predicates, and `runner` is the
//! composite-execution loop that drives a whole flow's `steps` to
//! completion against a `ClusterApi`.

pub mod condition;
pub mod dispatcher;
pub mod runner;

use crate::config::Config;
use crate::dsl::Templater;
use crate::error::EngineError;
use crate::kube::{ClusterApi, FakeClusterApi, KubeClusterApi};
use crate::model::{Context, FlowSpec, RunResult};
use crate::Result;
use std::sync::Arc;

/// Owns the dependencies a flow run needs and exposes the single public
/// entry point, `execute_flow`. Construct once per operator process and
/// share via `Arc<Engine>`; for unit tests use `Engine::for_testing()`.
pub struct Engine {
    cluster: Arc<dyn ClusterApi>,
    templater: Templater,
    config: Config,
}

impl Engine {
    #[must_use]
    pub fn new(cluster: Arc<dyn ClusterApi>, config: Config) -> Self {
        Self {
            cluster,
            templater: Templater::new(),
            config,
        }
    }

    /// Build an engine backed by a real Kubernetes client, loading
    /// config from the environment.
    pub async fn connect() -> Result<Self> {
        let client = kube::Client::try_default()
            .await
            .map_err(|e| EngineError::internal(format!("failed to build kube client: {e}")))?;
        Ok(Self::new(Arc::new(KubeClusterApi::new(client)), Config::from_env()))
    }

    /// An engine backed by an in-memory fake cluster, for tests and
    /// `--dry-run` CLI invocations.
    #[must_use]
    pub fn for_testing() -> Self {
        Self::new(Arc::new(FakeClusterApi::new()), Config::default())
    }

    #[must_use]
    pub fn cluster(&self) -> &Arc<dyn ClusterApi> {
        &self.cluster
    }

    /// Run `flow` to completion in `namespace`, returning the
    /// accumulated `RunResult` even when the run ultimately fails —
    /// callers that need pass/fail should check `RunResult::succeeded`
    /// or propagate the returned `Err` themselves.
    pub async fn execute_flow(&self, flow: &FlowSpec, namespace: Option<String>) -> (RunResult, Result<()>) {
        let mut ctx = Context::new(self.config.operator_namespace.clone(), namespace);
        ctx.vars = flow.vars.clone();
        let mut result = RunResult::new();

        let outcome = match flow.options.as_ref().and_then(|o| o.timeout_seconds) {
            Some(timeout_seconds) => {
                match tokio::time::timeout(
                    std::time::Duration::from_secs(timeout_seconds),
                    runner::run(self.cluster.as_ref(), &self.config, &self.templater, &flow.steps, &mut ctx, &mut result),
                )
                .await
                {
                    Ok(inner) => inner,
                    Err(_) => Err(EngineError::timeout_expired(format!(
                        "flow did not complete within {timeout_seconds}s"
                    ))),
                }
            }
            None => {
                runner::run(self.cluster.as_ref(), &self.config, &self.templater, &flow.steps, &mut ctx, &mut result).await
            }
        };

        result.summary = if outcome.is_ok() {
            format!("{} steps ok, {} failed", result.steps_ok, result.steps_fail)
        } else {
            format!(
                "{} steps ok, {} failed before error",
                result.steps_ok, result.steps_fail
            )
        };

        (result, outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Step;

    #[tokio::test]
    async fn successful_flow_reports_summary_and_ok_count() {
        let engine = Engine::for_testing();
        let flow = FlowSpec {
            vars: Default::default(),
            steps: vec![Step::Log { message: "hi".into() }],
            options: None,
        };
        let (result, outcome) = engine.execute_flow(&flow, None).await;
        assert!(outcome.is_ok());
        assert!(result.succeeded());
        assert_eq!(result.steps_ok, 1);
        assert!(result.summary.contains("1 steps ok"));
    }

    #[tokio::test]
    async fn failing_flow_returns_partial_result_and_error() {
        let engine = Engine::for_testing();
        let flow = FlowSpec {
            vars: Default::default(),
            steps: vec![Step::Eval { expression: "int(nope)".into(), var: "v".into() }],
            options: None,
        };
        let (result, outcome) = engine.execute_flow(&flow, None).await;
        assert!(outcome.is_err());
        assert!(!result.succeeded());
        assert_eq!(result.steps_fail, 1);
    }
}
