// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Sandbox Manager (§4.3): the process-wide registry of live bridge
//! connections, generalized from the teacher's `RuntimeRouter`
//! (`daemon/src/adapters/agent/router.rs`) — one entry per agent there,
//! one entry per sandbox here — with listener bookkeeping modeled on
//! `daemon/src/listener/mod.rs`'s `ListenCtx`.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

use parking_lot::Mutex;
use scp_bridge::{BridgeEvent, BridgeTransport, ConnectConfig};
use scp_core::SandboxId;
use scp_wire::bridge::Outbound;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{broadcast, mpsc};

#[derive(Debug, Error)]
pub enum ManagerError {
    #[error("sandbox {0} has no live connection")]
    NotConnected(SandboxId),
    #[error(transparent)]
    Bridge(#[from] scp_bridge::BridgeError),
}

/// Identifies a manager instance so consumers can detect replacement by
/// comparing generations rather than holding on to identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ManagerHandle {
    pub generation: u64,
}

static NEXT_GENERATION: AtomicU64 = AtomicU64::new(1);

struct Entry {
    transport: Arc<BridgeTransport>,
    project_name: Option<String>,
}

struct Inner {
    sandboxes: HashMap<SandboxId, Entry>,
}

/// Owns every live `BridgeTransport` in the process. Inbound events from
/// every sandbox are fanned out on a single broadcast stream tagged with
/// `sandbox_id`; the manager itself tracks no consumer identity — that is
/// the Client Gateway's job.
#[derive(Clone)]
pub struct SandboxManager {
    generation: u64,
    inner: Arc<Mutex<Inner>>,
    events_tx: broadcast::Sender<BridgeEvent>,
}

impl SandboxManager {
    pub fn new() -> Self {
        let (events_tx, _rx) = broadcast::channel(1024);
        Self {
            generation: NEXT_GENERATION.fetch_add(1, Ordering::SeqCst),
            inner: Arc::new(Mutex::new(Inner { sandboxes: HashMap::new() })),
            events_tx,
        }
    }

    pub fn handle(&self) -> ManagerHandle {
        ManagerHandle { generation: self.generation }
    }

    pub fn is_current(&self, handle: ManagerHandle) -> bool {
        handle.generation == self.generation
    }

    /// Subscribe to the full inbound event stream. Consumers filter by
    /// `sandbox_id` themselves.
    pub fn subscribe(&self) -> broadcast::Receiver<BridgeEvent> {
        self.events_tx.subscribe()
    }

    /// Establish (or re-establish) a bridge connection for `sandbox_id`,
    /// forwarding every inbound event onto the shared broadcast stream.
    pub async fn connect(&self, sandbox_id: SandboxId, addr: &str) -> Result<(), ManagerError> {
        self.connect_with_config(sandbox_id, addr, ConnectConfig::default()).await
    }

    pub async fn connect_with_config(
        &self,
        sandbox_id: SandboxId,
        addr: &str,
        config: ConnectConfig,
    ) -> Result<(), ManagerError> {
        let (fwd_tx, mut fwd_rx) = mpsc::channel(256);
        let transport =
            BridgeTransport::connect_with_config(sandbox_id, addr, fwd_tx, config).await?;

        let broadcast_tx = self.events_tx.clone();
        tokio::spawn(async move {
            while let Some(event) = fwd_rx.recv().await {
                let _ = broadcast_tx.send(event);
            }
        });

        let mut inner = self.inner.lock();
        let project_name = inner.sandboxes.get(&sandbox_id).and_then(|e| e.project_name.clone());
        inner.sandboxes.insert(sandbox_id, Entry { transport: Arc::new(transport), project_name });
        Ok(())
    }

    pub fn disconnect(&self, sandbox_id: SandboxId) {
        self.inner.lock().sandboxes.remove(&sandbox_id);
    }

    pub fn is_connected(&self, sandbox_id: SandboxId) -> bool {
        self.inner.lock().sandboxes.contains_key(&sandbox_id)
    }

    /// Cache the project slug used to resolve `$HOME/<slug>` inside the
    /// sandbox. A no-op for sandboxes with no live connection.
    pub fn register_project_name(&self, sandbox_id: SandboxId, name: impl Into<String>) {
        if let Some(entry) = self.inner.lock().sandboxes.get_mut(&sandbox_id) {
            entry.project_name = Some(name.into());
        }
    }

    pub fn get_project_dir(&self, sandbox_id: SandboxId) -> Option<String> {
        let name = self.inner.lock().sandboxes.get(&sandbox_id)?.project_name.clone()?;
        Some(format!("$HOME/{name}"))
    }

    /// Forward a command to the sandbox's transport. Never awaits a reply —
    /// replies arrive later on the broadcast event stream.
    pub async fn send(&self, sandbox_id: SandboxId, command: Outbound) -> Result<(), ManagerError> {
        let transport = {
            let inner = self.inner.lock();
            inner
                .sandboxes
                .get(&sandbox_id)
                .map(|entry| Arc::clone(&entry.transport))
                .ok_or(ManagerError::NotConnected(sandbox_id))?
        };
        transport.send(command).await?;
        Ok(())
    }
}

impl Default for SandboxManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
