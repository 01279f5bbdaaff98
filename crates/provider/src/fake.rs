// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory `SandboxProvider` test double, grounded on the teacher's
//! `FakeAgentAdapter` pattern: records every call for assertion and lets
//! tests script failures per sandbox id.

use crate::{PortPreview, ProviderError, ProviderState, SandboxProvider, SshAccess};
use async_trait::async_trait;
use parking_lot::Mutex;
use scp_core::SandboxId;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq)]
pub enum ProviderCall {
    Create { project_name: String },
    Reconnect { id: SandboxId },
    Stop { id: SandboxId },
    Delete { id: SandboxId },
    Fork { src_id: SandboxId, branch: String },
}

#[derive(Default)]
struct Inner {
    calls: Vec<ProviderCall>,
    states: HashMap<SandboxId, ProviderState>,
    /// Sandboxes that must fail `delete_sandbox` with `HasDependents`.
    delete_blocked: std::collections::HashSet<SandboxId>,
    /// Overrides for `bridge_address`, keyed by sandbox id, so tests can
    /// point a sandbox at a real listener instead of the synthetic default.
    bridge_addresses: HashMap<SandboxId, String>,
}

#[derive(Clone, Default)]
pub struct FakeProvider {
    inner: Arc<Mutex<Inner>>,
}

impl FakeProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<ProviderCall> {
        self.inner.lock().calls.clone()
    }

    pub fn set_state(&self, id: SandboxId, state: ProviderState) {
        self.inner.lock().states.insert(id, state);
    }

    /// Makes the next `delete_sandbox(id)` return `HasDependents`.
    pub fn block_delete(&self, id: SandboxId) {
        self.inner.lock().delete_blocked.insert(id);
    }

    /// Points `bridge_address(id)` at a real listener for tests that need
    /// the manager to dial something other than the synthetic default.
    pub fn set_bridge_address(&self, id: SandboxId, address: impl Into<String>) {
        self.inner.lock().bridge_addresses.insert(id, address.into());
    }

    pub fn unblock_delete(&self, id: SandboxId) {
        self.inner.lock().delete_blocked.remove(&id);
    }
}

#[async_trait]
impl SandboxProvider for FakeProvider {
    async fn create_sandbox(
        &self,
        _snapshot: &str,
        project_name: &str,
        _git_repo: Option<&str>,
    ) -> Result<SandboxId, ProviderError> {
        let id = SandboxId::new();
        let mut inner = self.inner.lock();
        inner.calls.push(ProviderCall::Create { project_name: project_name.to_string() });
        inner.states.insert(id, ProviderState::Started);
        Ok(id)
    }

    async fn reconnect_sandbox(&self, id: SandboxId, _dir_name: &str) -> Result<(), ProviderError> {
        let mut inner = self.inner.lock();
        inner.calls.push(ProviderCall::Reconnect { id });
        inner.states.insert(id, ProviderState::Started);
        Ok(())
    }

    async fn stop_sandbox(&self, id: SandboxId) -> Result<(), ProviderError> {
        let mut inner = self.inner.lock();
        inner.calls.push(ProviderCall::Stop { id });
        inner.states.insert(id, ProviderState::Stopped);
        Ok(())
    }

    async fn delete_sandbox(&self, id: SandboxId) -> Result<(), ProviderError> {
        let mut inner = self.inner.lock();
        inner.calls.push(ProviderCall::Delete { id });
        if inner.delete_blocked.contains(&id) {
            return Err(ProviderError::HasDependents);
        }
        inner.states.remove(&id);
        Ok(())
    }

    async fn get_sandbox_state(&self, id: SandboxId) -> Result<ProviderState, ProviderError> {
        self.inner.lock().states.get(&id).copied().ok_or(ProviderError::NotFound(id))
    }

    async fn fork_sandbox(
        &self,
        src_id: SandboxId,
        branch: &str,
        _project_name: &str,
    ) -> Result<SandboxId, ProviderError> {
        let id = SandboxId::new();
        let mut inner = self.inner.lock();
        inner.calls.push(ProviderCall::Fork { src_id, branch: branch.to_string() });
        inner.states.insert(id, ProviderState::Started);
        Ok(id)
    }

    async fn get_port_preview_url(
        &self,
        id: SandboxId,
        port: u16,
    ) -> Result<PortPreview, ProviderError> {
        Ok(PortPreview { url: format!("https://{id}-{port}.preview.test"), token: "fake-token".into() })
    }

    async fn get_vscode_url(&self, id: SandboxId) -> Result<String, ProviderError> {
        Ok(format!("https://{id}.vscode.test"))
    }

    async fn create_ssh_access(&self, _id: SandboxId) -> Result<SshAccess, ProviderError> {
        Ok(SshAccess {
            ssh_user: "sandbox".into(),
            ssh_host: "localhost".into(),
            ssh_port: 2222,
            expires_at: scp_core::model::now_ms() + 3_600_000,
        })
    }

    async fn bridge_address(&self, id: SandboxId) -> Result<String, ProviderError> {
        let inner = self.inner.lock();
        inner.states.get(&id).ok_or(ProviderError::NotFound(id))?;
        Ok(inner.bridge_addresses.get(&id).cloned().unwrap_or_else(|| format!("127.0.0.1:0#{id}")))
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
