use super::*;

#[test]
fn defaults_when_env_unset() {
    let config = Config::default();
    assert_eq!(config.runner_image, "alpine:3.20");
    assert_eq!(config.log_level, "info");
    assert_eq!(config.operator_namespace, "default");
}

#[test]
fn from_env_reads_runner_image() {
    unsafe {
        std::env::set_var("PSEUDOFLOW_RUNNER_IMAGE", "busybox:1.36");
    }
    let config = Config::from_env();
    assert_eq!(config.runner_image, "busybox:1.36");
    unsafe {
        std::env::remove_var("PSEUDOFLOW_RUNNER_IMAGE");
    }
}

#[test]
fn debug_flag_raises_default_log_level() {
    unsafe {
        std::env::remove_var("LOG_LEVEL");
        std::env::set_var("DEBUG", "true");
    }
    let config = Config::from_env();
    assert_eq!(config.log_level, "debug");
    unsafe {
        std::env::remove_var("DEBUG");
    }
}

#[test]
fn explicit_log_level_wins_over_debug_flag() {
    unsafe {
        std::env::set_var("DEBUG", "true");
        std::env::set_var("LOG_LEVEL", "warn");
    }
    let config = Config::from_env();
    assert_eq!(config.log_level, "warn");
    unsafe {
        std::env::remove_var("DEBUG");
        std::env::remove_var("LOG_LEVEL");
    }
}
