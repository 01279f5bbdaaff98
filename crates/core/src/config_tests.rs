// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serial_test::serial;
use std::env;

fn clear_env() {
    for var in [
        "AGENT_API_KEY",
        "AGENT_PROVIDER_URL",
        "SANDBOX_SNAPSHOT_NAME",
        "CONTROL_PLANE_DB_PATH",
        "SESSION_INITIAL_TIMEOUT_MS",
        "SESSION_ACTIVITY_TIMEOUT_MS",
        "SETTINGS_VISIBLE",
    ] {
        env::remove_var(var);
    }
}

fn set_required() {
    env::set_var("AGENT_API_KEY", "sk-test");
    env::set_var("AGENT_PROVIDER_URL", "https://api.example.test");
    env::set_var("SANDBOX_SNAPSHOT_NAME", "default-snapshot");
    env::set_var("CONTROL_PLANE_DB_PATH", "/tmp/control-plane.json");
}

#[test]
#[serial]
fn missing_required_var_is_a_typed_error() {
    clear_env();
    let err = Config::from_env().unwrap_err();
    assert!(matches!(err, ConfigError::Missing("AGENT_API_KEY")));
}

#[test]
#[serial]
fn defaults_apply_when_timeouts_unset() {
    clear_env();
    set_required();
    let cfg = Config::from_env().unwrap();
    assert_eq!(cfg.initial_timeout, Duration::from_millis(DEFAULT_INITIAL_TIMEOUT_MS));
    assert_eq!(cfg.activity_timeout, Duration::from_millis(DEFAULT_ACTIVITY_TIMEOUT_MS));
    assert!(!cfg.settings_visible);
}

#[test]
#[serial]
fn test_only_timeout_overrides_are_honored() {
    clear_env();
    set_required();
    env::set_var("SESSION_INITIAL_TIMEOUT_MS", "50");
    env::set_var("SESSION_ACTIVITY_TIMEOUT_MS", "75");
    let cfg = Config::from_env().unwrap();
    assert_eq!(cfg.initial_timeout, Duration::from_millis(50));
    assert_eq!(cfg.activity_timeout, Duration::from_millis(75));
    clear_env();
}

#[test]
#[serial]
fn invalid_timeout_is_a_typed_error_not_a_panic() {
    clear_env();
    set_required();
    env::set_var("SESSION_INITIAL_TIMEOUT_MS", "not-a-number");
    let err = Config::from_env().unwrap_err();
    assert!(matches!(err, ConfigError::Invalid { name: "SESSION_INITIAL_TIMEOUT_MS", .. }));
    clear_env();
}

#[test]
fn apply_setting_overlays_environment_defaults() {
    clear_env();
    set_required();
    let mut cfg = Config::from_env().unwrap();
    cfg.apply_setting(crate::model::SettingKey::AgentApiKey, "sk-from-store".into());
    assert_eq!(cfg.agent_api_key, "sk-from-store");
    clear_env();
}
