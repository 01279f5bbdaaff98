// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Client Gateway (§4.6): the WebSocket-facing dispatcher. Accepts one
//! task per browser connection (grounded on the teacher's
//! `listener::{Listener, ListenCtx, handle_connection}` accept loop),
//! maintains `sandboxSubscribers: sandboxId -> set<clientId>`, and fans
//! both orchestrator events and raw bridge traffic into the right sockets.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod commands;
mod connection;
mod fanout;

use parking_lot::Mutex;
use scp_core::{ClientId, EventBus, ProjectId, SandboxId};
use scp_manager::{ManagerHandle, SandboxManager};
use scp_orchestrator::Orchestrator;
use scp_provider::SandboxProvider;
use scp_registry::Registry;
use scp_wire::browser::Outbound;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

const DEFAULT_OPERATION_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Shared state for every connection this gateway instance serves.
pub(crate) struct GatewayCtx {
    registry: Arc<Registry>,
    manager: Arc<SandboxManager>,
    orchestrator: Arc<Orchestrator>,
    provider: Arc<dyn SandboxProvider>,
    events: EventBus,
    snapshot_name: String,
    operation_timeout: Duration,
    clients: Mutex<HashMap<ClientId, mpsc::Sender<Outbound>>>,
    sandbox_subscribers: Mutex<HashMap<SandboxId, HashSet<ClientId>>>,
    /// Clears and re-binds when the manager's generation changes (§5).
    bound_generation: Mutex<Option<ManagerHandle>>,
}

impl GatewayCtx {
    fn register_client(&self, client_id: ClientId, tx: mpsc::Sender<Outbound>) {
        self.clients.lock().insert(client_id, tx);
    }

    fn unregister_client(&self, client_id: ClientId) {
        self.clients.lock().remove(&client_id);
        let mut subs = self.sandbox_subscribers.lock();
        for set in subs.values_mut() {
            set.remove(&client_id);
        }
        subs.retain(|_, set| !set.is_empty());
    }

    fn subscribe_sandbox(&self, sandbox_id: SandboxId, client_id: ClientId) {
        self.sandbox_subscribers.lock().entry(sandbox_id).or_default().insert(client_id);
    }

    fn send_to(&self, client_id: ClientId, message: Outbound) {
        if let Some(tx) = self.clients.lock().get(&client_id) {
            let _ = tx.try_send(message);
        }
    }

    fn broadcast_all(&self, message: Outbound) {
        for tx in self.clients.lock().values() {
            let _ = tx.try_send(message.clone());
        }
    }

    fn broadcast_sandbox(&self, sandbox_id: SandboxId, message: Outbound) {
        let targets: Vec<ClientId> = self
            .sandbox_subscribers
            .lock()
            .get(&sandbox_id)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default();
        let clients = self.clients.lock();
        for client_id in targets {
            if let Some(tx) = clients.get(&client_id) {
                let _ = tx.try_send(message.clone());
            }
        }
    }

    fn project_sandbox(&self, project_id: ProjectId) -> Option<SandboxId> {
        self.registry.get(project_id).and_then(|p| p.sandbox_id)
    }
}

/// Accepts browser WebSocket connections and dispatches their commands.
pub struct Gateway {
    ctx: Arc<GatewayCtx>,
}

impl Gateway {
    pub fn new(
        registry: Arc<Registry>,
        manager: Arc<SandboxManager>,
        orchestrator: Arc<Orchestrator>,
        events: EventBus,
        snapshot_name: impl Into<String>,
    ) -> Self {
        Self::with_operation_timeout(
            registry,
            manager,
            orchestrator,
            events,
            snapshot_name,
            DEFAULT_OPERATION_TIMEOUT,
        )
    }

    pub fn with_operation_timeout(
        registry: Arc<Registry>,
        manager: Arc<SandboxManager>,
        orchestrator: Arc<Orchestrator>,
        events: EventBus,
        snapshot_name: impl Into<String>,
        operation_timeout: Duration,
    ) -> Self {
        let provider = registry.provider();
        let ctx = Arc::new(GatewayCtx {
            registry,
            manager,
            orchestrator,
            provider,
            events,
            snapshot_name: snapshot_name.into(),
            operation_timeout,
            clients: Mutex::new(HashMap::new()),
            sandbox_subscribers: Mutex::new(HashMap::new()),
            bound_generation: Mutex::new(None),
        });
        Self { ctx }
    }

    /// Run the accept loop until the listener errors or the process exits.
    /// Spawns the event-bus and bridge-event fan-out tasks once, then one
    /// task per accepted connection.
    pub async fn run(self, listener: TcpListener) -> Result<(), GatewayError> {
        fanout::spawn_event_fanout(Arc::clone(&self.ctx));
        fanout::ensure_bridge_fanout_bound(&self.ctx);

        loop {
            let (stream, addr) = listener.accept().await?;
            tracing::debug!(%addr, "browser connection accepted");
            let ctx = Arc::clone(&self.ctx);
            tokio::spawn(async move {
                if let Err(e) = connection::handle_connection(stream, ctx).await {
                    tracing::debug!(%e, "browser connection ended");
                }
            });
        }
    }
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
