//! Error types for the PseudoFlow engine
//!
//! `EngineError` is the top-level error every public operation returns.
//! It wraps narrower per-concern error enums so call sites can match on
//! `EngineError` directly without unwrapping a source chain, while still
//! carrying the underlying cause via `#[source]`/`#[from]`.

use thiserror::Error;

/// Main error type for engine operations.
#[derive(Error, Debug)]
pub enum EngineError {
    /// A step is missing a required field or has an internally
    /// inconsistent shape (e.g. `retry` with zero attempts).
    #[error("bad step: {0}")]
    BadStep(String),

    /// The dispatcher has no handler for a step's `type`.
    #[error("unsupported step type: {0}")]
    UnsupportedStepType(String),

    /// A flow-level or `waitFor`-level timeout elapsed before completion.
    #[error("timeout expired: {0}")]
    TimeoutExpired(String),

    /// A Kubernetes API call failed.
    #[error("cluster API error: {0}")]
    ClusterApiError(#[from] ClusterError),

    /// Fetching a remote `include` source failed.
    #[error("remote fetch error: {0}")]
    RemoteFetchError(#[from] RemoteFetchError),

    /// An ephemeral-pod command exited non-zero or the pod itself failed.
    #[error("exec failed: {0}")]
    ExecFailed(String),

    #[error("template error: {0}")]
    Template(#[from] TemplateError),

    #[error("config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

/// Templating-specific errors. In practice the templater never fails
/// (unresolved `${name}` references are left verbatim), but the type
/// exists for the same reason the teacher keeps one: a seam for future
/// strict-mode rendering without reshaping `EngineError`.
#[derive(Error, Debug)]
pub enum TemplateError {
    #[error("template syntax error: {0}")]
    Syntax(String),
}

/// Kubernetes client errors, narrower than the full `kube::Error` so
/// call sites can match on the handful of cases the runner cares about.
#[derive(Error, Debug)]
pub enum ClusterError {
    #[error("resource not found: {0}")]
    NotFound(String),

    #[error("kube client error: {0}")]
    Kube(#[from] kube::Error),

    #[error("unsupported resource kind: {0}")]
    UnsupportedKind(String),
}

/// Errors fetching a remote `include` source.
#[derive(Error, Debug)]
pub enum RemoteFetchError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP status {status} fetching {url}")]
    Status { status: u16, url: String },

    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}

/// Convenient result type for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;

impl EngineError {
    #[inline]
    pub fn bad_step<S: Into<String>>(msg: S) -> Self {
        EngineError::BadStep(msg.into())
    }

    #[inline]
    pub fn unsupported_step_type<S: Into<String>>(type_name: S) -> Self {
        EngineError::UnsupportedStepType(type_name.into())
    }

    #[inline]
    pub fn timeout_expired<S: Into<String>>(msg: S) -> Self {
        EngineError::TimeoutExpired(msg.into())
    }

    #[inline]
    pub fn exec_failed<S: Into<String>>(msg: S) -> Self {
        EngineError::ExecFailed(msg.into())
    }

    #[inline]
    pub fn config<S: Into<String>>(msg: S) -> Self {
        EngineError::Config(msg.into())
    }

    #[inline]
    pub fn internal<S: Into<String>>(msg: S) -> Self {
        EngineError::Internal(msg.into())
    }

    /// A stable, short label for the error kind, used in status messages
    /// and log fields where the full `Display` text is too verbose.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            EngineError::BadStep(_) => "BadStep",
            EngineError::UnsupportedStepType(_) => "UnsupportedStepType",
            EngineError::TimeoutExpired(_) => "TimeoutExpired",
            EngineError::ClusterApiError(_) => "ClusterApiError",
            EngineError::RemoteFetchError(_) => "RemoteFetchError",
            EngineError::ExecFailed(_) => "ExecFailed",
            EngineError::Template(_) => "TemplateError",
            EngineError::Config(_) => "ConfigError",
            EngineError::Io(_) => "IoError",
            EngineError::Json(_) => "JsonError",
            EngineError::Yaml(_) => "YamlError",
            EngineError::Internal(_) => "InternalError",
        }
    }

    /// Add context to an error, preserved the same way the teacher's
    /// `context()` helper threads a prefix onto message-only variants.
    pub fn context<C: std::fmt::Display>(self, context: C) -> Self {
        match self {
            Self::BadStep(msg) => Self::BadStep(format!("{context}: {msg}")),
            Self::UnsupportedStepType(msg) => Self::UnsupportedStepType(format!("{context}: {msg}")),
            Self::TimeoutExpired(msg) => Self::TimeoutExpired(format!("{context}: {msg}")),
            Self::ExecFailed(msg) => Self::ExecFailed(format!("{context}: {msg}")),
            Self::Config(msg) => Self::Config(format!("{context}: {msg}")),
            Self::Internal(msg) => Self::Internal(format!("{context}: {msg}")),
            other => Self::Internal(format!("{context}: {other}")),
        }
    }
}
