// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Sandbox Provider Adapter (§4.1): a thin driver over the remote sandbox
//! host. Produces opaque `SandboxId`s and never embeds orchestration logic.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod http;
pub mod state;

#[cfg(any(test, feature = "test-support"))]
pub mod fake;

use async_trait::async_trait;
use scp_core::SandboxId;
use thiserror::Error;

pub use state::ProviderState;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("sandbox not found: {0}")]
    NotFound(SandboxId),
    #[error("sandbox create failed: {0}")]
    CreateFailed(String),
    #[error("sandbox still has dependent forks, stop instead of delete")]
    HasDependents,
    #[error("provider request failed: {0}")]
    Request(String),
}

#[derive(Debug, Clone)]
pub struct SshAccess {
    pub ssh_user: String,
    pub ssh_host: String,
    pub ssh_port: u16,
    pub expires_at: u64,
}

#[derive(Debug, Clone)]
pub struct PortPreview {
    pub url: String,
    pub token: String,
}

/// Contract of §4.1. Any operation may fail; errors propagate verbatim to
/// the caller, which decides how to surface them (see §7).
#[async_trait]
pub trait SandboxProvider: Send + Sync + 'static {
    async fn create_sandbox(
        &self,
        snapshot: &str,
        project_name: &str,
        git_repo: Option<&str>,
    ) -> Result<SandboxId, ProviderError>;

    async fn reconnect_sandbox(&self, id: SandboxId, dir_name: &str) -> Result<(), ProviderError>;

    async fn stop_sandbox(&self, id: SandboxId) -> Result<(), ProviderError>;

    /// May fail with [`ProviderError::HasDependents`] when forks still
    /// reference `id`; callers must treat this as stop-instead (§4.4).
    async fn delete_sandbox(&self, id: SandboxId) -> Result<(), ProviderError>;

    async fn get_sandbox_state(&self, id: SandboxId) -> Result<ProviderState, ProviderError>;

    async fn fork_sandbox(
        &self,
        src_id: SandboxId,
        branch: &str,
        project_name: &str,
    ) -> Result<SandboxId, ProviderError>;

    async fn get_port_preview_url(
        &self,
        id: SandboxId,
        port: u16,
    ) -> Result<PortPreview, ProviderError>;

    async fn get_vscode_url(&self, id: SandboxId) -> Result<String, ProviderError>;

    async fn create_ssh_access(&self, id: SandboxId) -> Result<SshAccess, ProviderError>;

    /// The internal address (host:port) where the sandbox's bridge process
    /// listens, used by the Bridge Transport to open its WebSocket.
    async fn bridge_address(&self, id: SandboxId) -> Result<String, ProviderError>;
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
