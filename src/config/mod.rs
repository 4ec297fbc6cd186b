//! Configuration for the PseudoFlow engine.
//!
//! There is no config file: every setting is environment-driven, which
//! matches how the operator is actually deployed (env vars on the pod
//! spec), and mirrors the Python original's `os.environ.get(...)` reads.

use crate::constants::{
    DEFAULT_OPERATOR_NAMESPACE, DEFAULT_RUNNER_IMAGE, ENV_DEBUG, ENV_LOG_LEVEL,
    ENV_OPERATOR_NAMESPACE, ENV_RUNNER_IMAGE,
};
use std::env;

/// Runtime configuration for the engine and CLI.
#[derive(Debug, Clone)]
pub struct Config {
    /// Image used for ephemeral exec pods.
    pub runner_image: String,

    /// Level passed to `tracing_subscriber::EnvFilter`.
    pub log_level: String,

    /// Namespace the operator runs in; the fallback namespace for flows
    /// that don't set their own.
    pub operator_namespace: String,
}

impl Config {
    /// Load configuration from the environment, applying defaults for
    /// anything unset.
    #[must_use]
    pub fn from_env() -> Self {
        let log_level = env::var(ENV_LOG_LEVEL).unwrap_or_else(|_| {
            if env_flag_set(ENV_DEBUG) {
                "debug".to_string()
            } else {
                "info".to_string()
            }
        });

        Self {
            runner_image: env::var(ENV_RUNNER_IMAGE).unwrap_or_else(|_| DEFAULT_RUNNER_IMAGE.to_string()),
            log_level,
            operator_namespace: env::var(ENV_OPERATOR_NAMESPACE)
                .unwrap_or_else(|_| DEFAULT_OPERATOR_NAMESPACE.to_string()),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            runner_image: DEFAULT_RUNNER_IMAGE.to_string(),
            log_level: "info".to_string(),
            operator_namespace: DEFAULT_OPERATOR_NAMESPACE.to_string(),
        }
    }
}

fn env_flag_set(name: &str) -> bool {
    matches!(
        env::var(name).ok().as_deref(),
        Some("1") | Some("true") | Some("TRUE") | Some("yes")
    )
}

#[cfg(test)]
mod config_test;
