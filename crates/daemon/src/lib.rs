// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Wires the Sandbox Provider Adapter, Bridge Transport, Sandbox Manager,
//! Project/Fork Registry, Session Orchestrator, and Client Gateway into one
//! running process, plus the admin socket the `cli` binary drives.
//! Grounded on the teacher's own daemon `lib.rs`, which plays the same
//! role for its job engine and listener.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod admin;

use scp_core::{Config, ConfigError, EventBus};
use scp_gateway::{Gateway, GatewayError};
use scp_manager::SandboxManager;
use scp_orchestrator::{Orchestrator, OrchestratorConfig};
use scp_provider::http::HttpProvider;
use scp_provider::SandboxProvider;
use scp_registry::store::{JsonStore, Store, StoreError};
use scp_registry::{Registry, RegistryError};
use std::sync::Arc;
use thiserror::Error;
use tokio::net::{TcpListener, UnixListener};

#[derive(Debug, Error)]
pub enum DaemonError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

/// Everything this process owns, assembled once at boot and handed to
/// [`App::run`].
pub struct App {
    pub registry: Arc<Registry>,
    pub manager: Arc<SandboxManager>,
    pub orchestrator: Arc<Orchestrator>,
    pub events: EventBus,
    pub config: Config,
}

impl App {
    pub fn bootstrap(config: Config) -> Result<Self, DaemonError> {
        let store: Arc<dyn Store> = Arc::new(JsonStore::new(config.db_path.clone()));
        let provider: Arc<dyn SandboxProvider> =
            Arc::new(HttpProvider::new(config.agent_provider_url.clone(), config.agent_api_key.clone()));
        let events = EventBus::default();

        let registry = Arc::new(Registry::new(Arc::clone(&store), provider, events.clone())?);
        let manager = Arc::new(SandboxManager::new());
        let orchestrator = Arc::new(Orchestrator::new(
            Arc::clone(&registry),
            Arc::clone(&manager),
            store,
            events.clone(),
            OrchestratorConfig::from(&config),
        ));

        Ok(Self { registry, manager, orchestrator, events, config })
    }

    /// Forward every raw bridge event into the orchestrator's prompt-turn
    /// state machine. The Client Gateway subscribes to the same manager
    /// broadcast independently, for raw terminal/file/port fan-out.
    fn spawn_bridge_forwarding(&self) {
        let orchestrator = Arc::clone(&self.orchestrator);
        let mut rx = self.manager.subscribe();
        tokio::spawn(async move {
            while let Ok(event) = rx.recv().await {
                orchestrator.handle_bridge_event(event).await;
            }
        });
    }

    pub async fn run(self, gateway_listener: TcpListener, admin_listener: UnixListener) -> Result<(), DaemonError> {
        self.spawn_bridge_forwarding();

        let registry_for_admin = Arc::clone(&self.registry);
        tokio::spawn(async move {
            admin::serve(admin_listener, registry_for_admin).await;
        });

        let gateway = Gateway::new(
            self.registry,
            self.manager,
            self.orchestrator,
            self.events,
            self.config.sandbox_snapshot_name.clone(),
        );
        gateway.run(gateway_listener).await?;
        Ok(())
    }
}
