//! Core data models for the PseudoFlow engine
//!
//! These types mirror the `PseudoFlow` custom resource's `spec` field and
//! the runtime contracts (`Context`, `RunResult`) the runner and step
//! handlers exchange. `Step` is a tagged enum discriminated by `type`
//! rather than one flat struct: the combinator variants (`if`, `when`,
//! `loop`, `loopNodes`, `parallel`, `retry`, `onError`, `includeFlow`)
//! carry nested steps, while leaf variants carry only the fields their
//! handler needs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Top-level flow document, the `spec` of a `PseudoFlow` custom resource.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FlowSpec {
    /// Flow-level variables, seeded into the root `Context` before the
    /// first step runs.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub vars: HashMap<String, serde_json::Value>,

    /// Ordered top-level steps. Combinators nest further steps inside
    /// themselves; this list always runs in literal declaration order.
    pub steps: Vec<Step>,

    /// Flow-wide options.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Options>,
}

/// Flow-wide options.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Options {
    /// Overall wall-clock budget for the whole flow. When set, the runner
    /// wraps execution in a timeout and raises `TimeoutExpired` if the
    /// flow hasn't finished by the deadline.
    #[serde(default, skip_serializing_if = "Option::is_none", rename = "timeoutSeconds")]
    pub timeout_seconds: Option<u64>,
}

/// A resource selector: enough to address one Kubernetes object, typed
/// or via the dynamic client fallback.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceRef {
    pub api_version: String,
    pub kind: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
}

/// A label-patch target: addressed either by exact `name` or by a label
/// `selector` resolved to zero or more matching resources at run time.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelTarget {
    pub api_version: String,
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selector: Option<String>,
}

/// Comparator used when evaluating a condition's match list against
/// `value`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ComparatorOp {
    Equals,
    NotEquals,
    Contains,
    GreaterThan,
    LessThan,
}

/// A condition block: the resource to fetch, the JSONPath to query it
/// with (empty/absent means the whole object as a singleton list), and
/// the comparator/value the match list is tested against (existential).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    pub resource: ResourceRef,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub json_path: Option<String>,
    pub op: ComparatorOp,
    pub value: serde_json::Value,
}

/// How `execNode` distributes a command across selected nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum RunOn {
    /// Run once, on whichever node sorts first. Same effect as `First`.
    #[default]
    Any,
    /// Run once, on whichever node sorts first.
    First,
    /// Run on every selected node, independently.
    All,
}

/// A node selector: a raw label-selector string, or a map of `k=v` pairs
/// joined with commas, matching the Python original's dual acceptance.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NodeSelector {
    Selector(String),
    Labels(HashMap<String, String>),
}

impl NodeSelector {
    /// Render as a comma-joined `k=v` label selector string.
    #[must_use]
    pub fn to_selector_string(&self) -> String {
        match self {
            NodeSelector::Selector(s) => s.clone(),
            NodeSelector::Labels(map) => map
                .iter()
                .map(|(k, v)| format!("{k}={v}"))
                .collect::<Vec<_>>()
                .join(","),
        }
    }

    /// Render as a `BTreeMap`, suitable for a pod's `nodeSelector` field,
    /// by splitting a string selector on `,` and `=`.
    #[must_use]
    pub fn to_label_map(&self) -> std::collections::BTreeMap<String, String> {
        match self {
            NodeSelector::Labels(map) => map.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
            NodeSelector::Selector(s) => s
                .split(',')
                .filter_map(|pair| pair.split_once('='))
                .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
                .collect(),
        }
    }
}

/// A single flow step. Tagged by `type` so the dispatcher never has to
/// guess which fields are meaningful for a given step; unrecognized
/// `type` values fall back to `Unknown` so a flow with a step type this
/// build doesn't know about still parses, and the runner can raise
/// `UnsupportedStepType` for that one step instead of failing to load
/// the whole flow.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Step {
    // --- combinators -----------------------------------------------
    If {
        condition: Condition,
        then: Vec<Step>,
        #[serde(default, rename = "else")]
        else_: Vec<Step>,
    },
    When {
        condition: Condition,
        steps: Vec<Step>,
    },
    Loop {
        for_each: ForEach,
        steps: Vec<Step>,
    },
    LoopNodes {
        selector: NodeSelector,
        steps: Vec<Step>,
    },
    Parallel {
        /// Named `steps` on the wire (spec.md calls a parallel group list
        /// `steps`, confusingly reusing the name); each inner `Vec<Step>`
        /// is one independently-scoped group.
        #[serde(rename = "steps")]
        groups: Vec<Vec<Step>>,
        #[serde(default = "default_true")]
        wait_for_all: bool,
    },
    Retry {
        #[serde(default = "default_retry_attempts")]
        attempts: u32,
        #[serde(default = "default_backoff_seconds")]
        backoff_seconds: u64,
        steps: Vec<Step>,
    },
    OnError {
        steps: Vec<Step>,
    },
    IncludeFlow {
        name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        namespace: Option<String>,
        #[serde(default)]
        inherit_vars: bool,
    },

    // --- leaves ------------------------------------------------------
    Log {
        message: String,
    },
    Sleep {
        seconds: u64,
    },
    Apply {
        manifests: String,
    },
    ApplyFile {
        path: String,
    },
    Delete {
        target: ResourceRef,
    },
    DeleteFile {
        path: String,
    },
    Include {
        source: String,
    },
    WaitFor {
        resource: ResourceRef,
        condition: WaitCondition,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        json_path: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        op: Option<ComparatorOp>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        value: Option<serde_json::Value>,
        #[serde(default = "default_wait_timeout")]
        timeout_seconds: u64,
    },
    SetLabel {
        target: LabelTarget,
        labels: HashMap<String, String>,
    },
    RemoveLabel {
        target: LabelTarget,
        keys: Vec<String>,
    },
    PatchLabel {
        from_var: String,
        target: LabelTarget,
    },
    Template {
        template: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        output: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        var: Option<String>,
    },
    Exec {
        cmd: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        node_selector: Option<NodeSelector>,
        #[serde(default)]
        privileged: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        var: Option<String>,
    },
    Script {
        code: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        node_selector: Option<NodeSelector>,
        #[serde(default)]
        privileged: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        var: Option<String>,
    },
    ExecNode {
        cmd: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        node_selector: Option<NodeSelector>,
        #[serde(default)]
        run_on: RunOn,
        #[serde(default)]
        privileged: bool,
        var_per_node: String,
    },
    ConfigFile {
        path: String,
        content: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        node_selector: Option<NodeSelector>,
    },
    PatchFile {
        path: String,
        pattern: String,
        replace: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        node_selector: Option<NodeSelector>,
    },
    Eval {
        expression: String,
        var: String,
    },

    /// Forward-compatibility catch-all: any `type` value this build
    /// doesn't recognize deserializes here instead of failing to parse
    /// the whole flow. The dispatcher raises `UnsupportedStepType` when
    /// it encounters one.
    #[serde(other)]
    Unknown,
}

impl Step {
    /// A short label for logging: the step's `type` discriminant.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Step::If { .. } => "if",
            Step::When { .. } => "when",
            Step::Loop { .. } => "loop",
            Step::LoopNodes { .. } => "loopNodes",
            Step::Parallel { .. } => "parallel",
            Step::Retry { .. } => "retry",
            Step::OnError { .. } => "onError",
            Step::IncludeFlow { .. } => "includeFlow",
            Step::Log { .. } => "log",
            Step::Sleep { .. } => "sleep",
            Step::Apply { .. } => "apply",
            Step::ApplyFile { .. } => "applyFile",
            Step::Delete { .. } => "delete",
            Step::DeleteFile { .. } => "deleteFile",
            Step::Include { .. } => "include",
            Step::WaitFor { .. } => "waitFor",
            Step::SetLabel { .. } => "setLabel",
            Step::RemoveLabel { .. } => "removeLabel",
            Step::PatchLabel { .. } => "patchLabel",
            Step::Template { .. } => "template",
            Step::Exec { .. } => "exec",
            Step::Script { .. } => "script",
            Step::ExecNode { .. } => "execNode",
            Step::ConfigFile { .. } => "configFile",
            Step::PatchFile { .. } => "patchFile",
            Step::Eval { .. } => "eval",
            Step::Unknown => "unknown",
        }
    }
}

/// `loop`'s `forEach` accepts either a native YAML sequence or a string
/// that the runner further splits: a bracketed literal (`"[a, b, c]"`,
/// parsed as YAML) or a whitespace-separated list of tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ForEach {
    List(Vec<serde_json::Value>),
    Text(String),
}

/// The condition a `waitFor` step polls for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum WaitCondition {
    Exist,
    Deleted,
    Ready,
    Available,
    Healthy,
    Custom,
}

fn default_true() -> bool {
    true
}

fn default_retry_attempts() -> u32 {
    3
}

fn default_backoff_seconds() -> u64 {
    2
}

fn default_wait_timeout() -> u64 {
    120
}

/// Execution context threaded through a run. `vars` is cloned (not
/// shared) whenever a combinator opens a new scope (`loop`, `loopNodes`,
/// each `parallel` group, `includeFlow`), so writes inside one branch
/// never leak into a sibling branch or the parent scope.
#[derive(Debug, Clone, Default)]
pub struct Context {
    pub operator_ns: String,
    pub namespace: Option<String>,
    pub vars: HashMap<String, serde_json::Value>,
}

impl Context {
    #[must_use]
    pub fn new(operator_ns: impl Into<String>, namespace: Option<String>) -> Self {
        Self {
            operator_ns: operator_ns.into(),
            namespace,
            vars: HashMap::new(),
        }
    }

    /// The namespace steps should act in: the flow's own namespace if
    /// set, otherwise the operator's namespace.
    #[must_use]
    pub fn effective_namespace(&self) -> &str {
        self.namespace.as_deref().unwrap_or(&self.operator_ns)
    }

    /// Open a new child scope with an independent copy of `vars`.
    #[must_use]
    pub fn child_scope(&self) -> Self {
        self.clone()
    }
}

/// Outcome of running a sequence of steps.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunResult {
    pub steps_ok: u64,
    pub steps_fail: u64,
    pub started_at: DateTime<Utc>,
    pub summary: String,
}

impl RunResult {
    #[must_use]
    pub fn new() -> Self {
        Self {
            steps_ok: 0,
            steps_fail: 0,
            started_at: Utc::now(),
            summary: String::new(),
        }
    }

    #[must_use]
    pub fn succeeded(&self) -> bool {
        self.steps_fail == 0
    }
}

impl Default for RunResult {
    fn default() -> Self {
        Self::new()
    }
}
