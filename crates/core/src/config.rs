// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Environment-driven process configuration, loaded once at boot and
//! overlaid with `Setting` rows read from the store.

use std::env;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

const DEFAULT_INITIAL_TIMEOUT_MS: u64 = 90_000;
const DEFAULT_ACTIVITY_TIMEOUT_MS: u64 = 300_000;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    Missing(&'static str),
    #[error("invalid value for {name}: {value:?}")]
    Invalid { name: &'static str, value: String },
}

/// Process-wide configuration. `Setting` rows loaded from the store at boot
/// are applied on top of these environment defaults (see
/// [`Config::apply_setting`]).
#[derive(Debug, Clone)]
pub struct Config {
    pub agent_api_key: String,
    pub agent_provider_url: String,
    pub sandbox_snapshot_name: String,
    pub db_path: PathBuf,
    pub initial_timeout: Duration,
    pub activity_timeout: Duration,
    pub settings_visible: bool,
}

impl Config {
    /// Load from environment variables, falling back to the original spec's
    /// documented defaults for the two (test-only) timeout overrides.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            agent_api_key: require("AGENT_API_KEY")?,
            agent_provider_url: require("AGENT_PROVIDER_URL")?,
            sandbox_snapshot_name: require("SANDBOX_SNAPSHOT_NAME")?,
            db_path: PathBuf::from(require("CONTROL_PLANE_DB_PATH")?),
            initial_timeout: duration_ms_env("SESSION_INITIAL_TIMEOUT_MS", DEFAULT_INITIAL_TIMEOUT_MS)?,
            activity_timeout: duration_ms_env("SESSION_ACTIVITY_TIMEOUT_MS", DEFAULT_ACTIVITY_TIMEOUT_MS)?,
            settings_visible: bool_env("SETTINGS_VISIBLE", false)?,
        })
    }

    /// Apply a persisted `Setting` row on top of the environment defaults.
    /// Called once per row at boot and again whenever a setting changes.
    pub fn apply_setting(&mut self, key: crate::model::SettingKey, value: String) {
        use crate::model::SettingKey::*;
        match key {
            AgentApiKey => self.agent_api_key = value,
            AgentProviderUrl => self.agent_provider_url = value,
            SandboxSnapshotName => self.sandbox_snapshot_name = value,
            SettingsVisible => self.settings_visible = value == "true",
        }
    }
}

fn require(name: &'static str) -> Result<String, ConfigError> {
    env::var(name).map_err(|_| ConfigError::Missing(name))
}

fn duration_ms_env(name: &'static str, default: u64) -> Result<Duration, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw
            .parse::<u64>()
            .map(Duration::from_millis)
            .map_err(|_| ConfigError::Invalid { name, value: raw }),
        Err(_) => Ok(Duration::from_millis(default)),
    }
}

fn bool_env(name: &'static str, default: bool) -> Result<bool, ConfigError> {
    match env::var(name) {
        Ok(raw) => match raw.as_str() {
            "true" | "1" => Ok(true),
            "false" | "0" => Ok(false),
            _ => Err(ConfigError::Invalid { name, value: raw }),
        },
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
