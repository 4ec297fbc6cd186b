//! Constants used throughout the PseudoFlow engine: the CRD's group/
//! version/kind, the finalizer string, environment variable names, and
//! the templating variable regex the templater is built around.

// ============================================================================
// CRD IDENTITY
// ============================================================================

/// API group of the `PseudoFlow` custom resource.
pub const CRD_GROUP: &str = "ops.example.com";

/// API version of the `PseudoFlow` custom resource.
pub const CRD_VERSION: &str = "v1alpha1";

/// Kind of the custom resource.
pub const CRD_KIND: &str = "PseudoFlow";

/// Plural form used in the API path.
pub const CRD_PLURAL: &str = "pseudoflows";

/// kubectl short name.
pub const CRD_SHORT_NAME: &str = "pflow";

/// Finalizer added to a `PseudoFlow` while the operator still has
/// cleanup work pending for it.
pub const FINALIZER: &str = "ops.example.com/pseudoflow-finalizer";

// ============================================================================
// ENVIRONMENT VARIABLES
// ============================================================================

/// Container image used for ephemeral exec pods (`exec`, `script`,
/// `execNode`, `configFile`, `patchFile`).
pub const ENV_RUNNER_IMAGE: &str = "PSEUDOFLOW_RUNNER_IMAGE";

/// Default runner image when `PSEUDOFLOW_RUNNER_IMAGE` is unset.
pub const DEFAULT_RUNNER_IMAGE: &str = "alpine:3.20";

/// Log level / verbosity, consumed by `tracing_subscriber::EnvFilter`.
pub const ENV_LOG_LEVEL: &str = "LOG_LEVEL";

/// Legacy boolean debug flag, treated as `LOG_LEVEL=debug` when set.
pub const ENV_DEBUG: &str = "DEBUG";

/// Namespace the operator itself runs in; the default namespace flows
/// without their own `namespace` act in.
pub const ENV_OPERATOR_NAMESPACE: &str = "PSEUDOFLOW_OPERATOR_NAMESPACE";

/// Default operator namespace when `PSEUDOFLOW_OPERATOR_NAMESPACE` is unset.
pub const DEFAULT_OPERATOR_NAMESPACE: &str = "default";

// ============================================================================
// RESERVED CONTEXT VARIABLE NAMES
// ============================================================================

/// Bound by `loop` to the stringified current item.
pub const VAR_ITEM: &str = "item";

/// Bound by `loopNodes` to the current node's name.
pub const VAR_NODE: &str = "node";

/// Bound in the `onError` block's scope to the triggering step's error
/// message.
pub const VAR_LAST_ERROR: &str = "__last_error__";

// ============================================================================
// TIMING DEFAULTS
// ============================================================================

/// Poll interval while waiting for an ephemeral pod to finish.
pub const EXEC_POD_POLL_INTERVAL_SECS: u64 = 2;

/// Grace period used when deleting an ephemeral pod.
pub const EXEC_POD_DELETE_GRACE_SECONDS: i64 = 0;

/// Timeout applied to remote `include` fetches.
pub const INCLUDE_FETCH_TIMEOUT_SECS: u64 = 20;

/// Default `waitFor` timeout when a step doesn't set one.
pub const DEFAULT_WAIT_TIMEOUT_SECS: u64 = 120;

/// Poll interval while waiting for a `waitFor` condition to be satisfied.
pub const WAIT_POLL_INTERVAL_SECS: u64 = 2;
