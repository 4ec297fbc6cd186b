//! Translates a flow run's outcome into the `PseudoFlow` custom
//! resource's observed status. Grounded in spec.md §6's status
//! contract; the operator's watch/update loop that drives this against
//! a live API server sits outside this engine's scope and is left to
//! the caller (a `kube::runtime::Controller` reconcile function would
//! call `Engine::execute_flow` and then `observe`).

use crate::model::{FlowSpec, RunResult};
use crate::Result;
use serde::{Deserialize, Serialize};

/// One incoming reconcile: the `PseudoFlow` resource's identity, spec,
/// and the generation the caller observed it at.
#[derive(Debug, Clone)]
pub struct ReconcileEvent {
    pub name: String,
    pub namespace: String,
    pub spec: FlowSpec,
    pub generation: i64,
}

/// Phase written back to `status.phase`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum Phase {
    Pending,
    Running,
    Succeeded,
    Failed,
}

/// One entry of `status.conditions`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Condition {
    #[serde(rename = "type")]
    pub type_: String,
    pub status: String,
    pub reason: String,
    pub message: String,
}

/// The full status object written back to the resource after a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconcileOutcome {
    pub observed_generation: i64,
    pub phase: Phase,
    pub message: String,
    pub conditions: Vec<Condition>,
}

/// Turn a completed run's `RunResult`/outcome into the status object to
/// write back. Always sets `observedGeneration` to the generation the
/// caller observed the spec at.
#[must_use]
pub fn observe(generation: i64, result: &RunResult, outcome: &Result<()>) -> ReconcileOutcome {
    match outcome {
        Ok(()) => ReconcileOutcome {
            observed_generation: generation,
            phase: Phase::Succeeded,
            message: format!("ok: {}", result.summary),
            conditions: vec![Condition {
                type_: "Ready".to_string(),
                status: "True".to_string(),
                reason: "RunSucceeded".to_string(),
                message: result.summary.clone(),
            }],
        },
        Err(e) => ReconcileOutcome {
            observed_generation: generation,
            phase: Phase::Failed,
            message: e.to_string(),
            conditions: vec![Condition {
                type_: "Degraded".to_string(),
                status: "True".to_string(),
                reason: "RunFailed".to_string(),
                message: e.to_string(),
            }],
        },
    }
}

/// The status to write immediately on accepting a reconcile, before the
/// flow has actually run — `Pending`→`Running` happens synchronously
/// with the run itself, so this is really "about to run".
#[must_use]
pub fn starting(generation: i64) -> ReconcileOutcome {
    ReconcileOutcome {
        observed_generation: generation,
        phase: Phase::Running,
        message: String::new(),
        conditions: vec![Condition {
            type_: "Ready".to_string(),
            status: "Unknown".to_string(),
            reason: "Reconciling".to_string(),
            message: "flow run in progress".to_string(),
        }],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Step;

    fn run_result(ok: u64, fail: u64) -> RunResult {
        let mut r = RunResult::new();
        r.steps_ok = ok;
        r.steps_fail = fail;
        r.summary = format!("{ok} steps ok, {fail} failed");
        r
    }

    #[test]
    fn successful_outcome_is_ready_and_succeeded() {
        let result = run_result(3, 0);
        let outcome = observe(5, &result, &Ok(()));
        assert_eq!(outcome.phase, Phase::Succeeded);
        assert_eq!(outcome.observed_generation, 5);
        assert_eq!(outcome.conditions[0].type_, "Ready");
        assert!(outcome.message.starts_with("ok: "));
    }

    #[test]
    fn failed_outcome_is_degraded_and_failed() {
        let result = run_result(1, 1);
        let err = crate::EngineError::bad_step("boom");
        let outcome = observe(5, &result, &Err(err));
        assert_eq!(outcome.phase, Phase::Failed);
        assert_eq!(outcome.conditions[0].type_, "Degraded");
        assert!(outcome.message.contains("boom"));
    }

    #[test]
    fn reconcile_event_carries_generation_and_spec() {
        let event = ReconcileEvent {
            name: "demo".to_string(),
            namespace: "default".to_string(),
            spec: FlowSpec {
                vars: Default::default(),
                steps: vec![Step::Log { message: "hi".into() }],
                options: None,
            },
            generation: 2,
        };
        assert_eq!(event.generation, 2);
        assert_eq!(event.spec.steps.len(), 1);
    }
}
