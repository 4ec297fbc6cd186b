//! Composite execution: iterates a step list, intercepting the eight
//! combinator types before they would ever reach the dispatcher and
//! handing every leaf step off to it. Grounded in
//! `pseudoflow/engine/runner.py::run`.
//!
//! Async fns can't recurse directly, so `run` is hand-written as a
//! boxed future. Every combinator that executes a nested step list uses
//! a fresh, local `RunResult` for that nested run and discards it,
//! contributing exactly one ok/fail increment to the `RunResult` its
//! own containing call owns — a `loop` over a hundred items still
//! counts as a single step in the outer tally.

use crate::config::Config;
use crate::constants::{VAR_ITEM, VAR_LAST_ERROR, VAR_NODE};
use crate::dsl::Templater;
use crate::engine::{condition, dispatcher};
use crate::error::EngineError;
use crate::kube::ClusterApi;
use crate::model::{Context, ForEach, RunResult, Step};
use crate::Result;
use futures::stream::{FuturesUnordered, StreamExt};
use serde_json::Value;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Render, then execute, `steps` against `ctx`, accumulating into
/// `result`. `result` is an out-parameter rather than a return value so
/// a partial ok/fail count survives a run that ultimately returns
/// `Err` — the error itself still propagates to the caller.
pub fn run<'a>(
    cluster: &'a (dyn ClusterApi + 'a),
    config: &'a Config,
    templater: &'a Templater,
    steps: &'a [Step],
    ctx: &'a mut Context,
    result: &'a mut RunResult,
) -> BoxFuture<'a, Result<()>> {
    Box::pin(run_inner(cluster, config, templater, steps, ctx, result))
}

async fn run_inner(
    cluster: &dyn ClusterApi,
    config: &Config,
    templater: &Templater,
    steps: &[Step],
    ctx: &mut Context,
    result: &mut RunResult,
) -> Result<()> {
    let mut i = 0;
    while i < steps.len() {
        let rendered = render_step(templater, &steps[i], ctx)?;

        match run_one(cluster, config, templater, &rendered, ctx).await {
            Ok(()) => {
                result.steps_ok += 1;
            }
            Err(e) => {
                // An implicit onError guard: a failing step immediately
                // followed by a literal `onError` block catches the
                // error there instead of propagating it. This is the
                // interpretation picked for the reachability gap
                // spec.md flags around `onError`.
                if let Some(Step::OnError { steps: guard_steps }) = steps.get(i + 1) {
                    result.steps_fail += 1;
                    ctx.vars
                        .insert(VAR_LAST_ERROR.to_string(), Value::String(e.to_string()));
                    let mut guard_result = RunResult::new();
                    run(cluster, config, templater, guard_steps, ctx, &mut guard_result).await?;
                    result.steps_ok += 1;
                    i += 2;
                    continue;
                }
                result.steps_fail += 1;
                return Err(e);
            }
        }
        i += 1;
    }
    Ok(())
}

/// Deep-render one step's string leaves against `ctx.vars` and
/// re-parse it back into a `Step`.
fn render_step(templater: &Templater, step: &Step, ctx: &Context) -> Result<Step> {
    let raw = serde_json::to_value(step).map_err(EngineError::Json)?;
    let rendered = templater.deep_render(&raw, &ctx.vars);
    serde_json::from_value(rendered).map_err(EngineError::Json)
}

/// Execute one already-rendered step. Combinators are handled here
/// directly; anything else is handed to the dispatcher.
async fn run_one(cluster: &dyn ClusterApi, config: &Config, templater: &Templater, step: &Step, ctx: &mut Context) -> Result<()> {
    match step {
        Step::If { condition: cond, then, else_ } => {
            let branch = if condition::evaluate(cluster, cond).await { then } else { else_ };
            let mut local = RunResult::new();
            run(cluster, config, templater, branch, ctx, &mut local).await
        }

        Step::When { condition: cond, steps } => {
            if condition::evaluate(cluster, cond).await {
                let mut local = RunResult::new();
                run(cluster, config, templater, steps, ctx, &mut local).await
            } else {
                Ok(())
            }
        }

        Step::Loop { for_each, steps } => {
            let items = resolve_for_each(for_each)?;
            for item in items {
                let mut scope = ctx.child_scope();
                scope.vars.insert(VAR_ITEM.to_string(), Value::String(item));
                let mut local = RunResult::new();
                run(cluster, config, templater, steps, &mut scope, &mut local).await?;
            }
            Ok(())
        }

        Step::LoopNodes { selector, steps } => {
            let nodes = cluster.select_nodes(selector).await?;
            for node in nodes {
                let mut scope = ctx.child_scope();
                scope.vars.insert(VAR_NODE.to_string(), Value::String(node));
                let mut local = RunResult::new();
                run(cluster, config, templater, steps, &mut scope, &mut local).await?;
            }
            Ok(())
        }

        Step::Parallel { groups, wait_for_all } => run_parallel(cluster, config, templater, groups, *wait_for_all, ctx).await,

        Step::Retry { attempts, backoff_seconds, steps } => {
            let attempts = (*attempts).max(1);
            let mut last_err = None;
            for attempt in 0..attempts {
                if attempt > 0 {
                    tokio::time::sleep(Duration::from_secs(*backoff_seconds * u64::from(attempt))).await;
                }
                let mut local = RunResult::new();
                match run(cluster, config, templater, steps, ctx, &mut local).await {
                    Ok(()) => return Ok(()),
                    Err(e) => last_err = Some(e),
                }
            }
            Err(last_err.unwrap_or_else(|| EngineError::internal("retry: no attempts ran")))
        }

        // A bare `onError` reached directly (its guarded predecessor
        // succeeded, or it's the first step) is a no-op.
        Step::OnError { .. } => Ok(()),

        Step::IncludeFlow { name, namespace, inherit_vars } => {
            let sub_namespace = namespace.clone().unwrap_or_else(|| ctx.effective_namespace().to_string());
            let flow = cluster.get_flow_spec(name, &sub_namespace).await?;
            let mut sub_ctx = Context::new(ctx.operator_ns.clone(), Some(sub_namespace));
            if *inherit_vars {
                sub_ctx.vars = ctx.vars.clone();
            }
            let mut local = RunResult::new();
            run(cluster, config, templater, &flow.steps, &mut sub_ctx, &mut local).await
        }

        leaf => dispatcher::dispatch(cluster, config, leaf, ctx).await,
    }
}

async fn run_parallel(
    cluster: &dyn ClusterApi,
    config: &Config,
    templater: &Templater,
    groups: &[Vec<Step>],
    wait_for_all: bool,
    ctx: &Context,
) -> Result<()> {
    let mut scopes: Vec<Context> = groups.iter().map(|_| ctx.child_scope()).collect();
    let mut pending: FuturesUnordered<_> = groups
        .iter()
        .zip(scopes.iter_mut())
        .map(|(group_steps, scope)| async move {
            let mut local = RunResult::new();
            run(cluster, config, templater, group_steps, scope, &mut local).await
        })
        .collect();

    if wait_for_all {
        let mut first_err = None;
        while let Some(outcome) = pending.next().await {
            if let Err(e) = outcome {
                if first_err.is_none() {
                    first_err = Some(e);
                }
            }
        }
        match first_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    } else {
        // First completion or first error wins; dropping `pending` here
        // cancels every still-running sibling group.
        match pending.next().await {
            Some(outcome) => outcome,
            None => Ok(()),
        }
    }
}

fn resolve_for_each(for_each: &ForEach) -> Result<Vec<String>> {
    match for_each {
        ForEach::List(items) => Ok(items.iter().map(stringify_item).collect()),
        ForEach::Text(text) => {
            let trimmed = text.trim();
            if trimmed.starts_with('[') && trimmed.ends_with(']') {
                let parsed: Vec<serde_json::Value> = serde_yaml::from_str(trimmed)
                    .map_err(|e| EngineError::bad_step(format!("loop: invalid forEach bracket literal: {e}")))?;
                Ok(parsed.iter().map(stringify_item).collect())
            } else {
                Ok(trimmed.split_whitespace().map(str::to_string).collect())
            }
        }
    }
}

fn stringify_item(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
