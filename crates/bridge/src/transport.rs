// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-sandbox transport, grounded on the teacher's
//! `docker/ws.rs::event_bridge`: a `tokio::select!` loop over the read half
//! that parses `Message::Text` frames and emits a synthetic "gone" event on
//! close, error, or stream end, paired with a write half fed by an
//! internal queue so commands can be sent without awaiting the reply.

use crate::connect::{connect_with_retry, ConnectConfig, WsStream};
use futures_util::{SinkExt, StreamExt};
use scp_core::SandboxId;
use scp_wire::bridge::{Inbound, Outbound};
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tokio_tungstenite::tungstenite::Message;

#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("connect failed: {0}")]
    Connect(String),
    #[error("transport already shut down")]
    Closed,
}

/// An event observed on a sandbox's bridge connection.
#[derive(Debug, Clone)]
pub enum BridgeEvent {
    Inbound { sandbox_id: SandboxId, event: Inbound },
    /// The underlying connection ended (close frame, stream end, or error).
    /// Carries no retry decision — that belongs to the Sandbox Manager.
    Gone { sandbox_id: SandboxId },
}

/// One sandbox's live connection. Commands are queued onto an internal
/// channel drained by a background writer task; replies arrive later on the
/// shared `BridgeEvent` stream tagged with this transport's `sandbox_id`,
/// per contract (1) in §4.2 — there is no synchronous request/response here.
pub struct BridgeTransport {
    sandbox_id: SandboxId,
    outbound_tx: mpsc::Sender<Outbound>,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl BridgeTransport {
    /// Dial `addr` and start the event loop. `events_tx` receives every
    /// inbound event and the terminal `Gone` event; it is shared across all
    /// sandboxes so the Sandbox Manager can multiplex on one channel.
    pub async fn connect(
        sandbox_id: SandboxId,
        addr: &str,
        events_tx: mpsc::Sender<BridgeEvent>,
    ) -> Result<Self, BridgeError> {
        Self::connect_with_config(sandbox_id, addr, events_tx, ConnectConfig::default()).await
    }

    pub async fn connect_with_config(
        sandbox_id: SandboxId,
        addr: &str,
        events_tx: mpsc::Sender<BridgeEvent>,
        config: ConnectConfig,
    ) -> Result<Self, BridgeError> {
        let stream = connect_with_retry(addr, config)
            .await
            .map_err(|e| BridgeError::Connect(e.to_string()))?;

        let (outbound_tx, outbound_rx) = mpsc::channel(256);
        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        tokio::spawn(event_loop(sandbox_id, stream, outbound_rx, shutdown_rx, events_tx));

        Ok(Self { sandbox_id, outbound_tx, shutdown_tx: Some(shutdown_tx) })
    }

    pub fn sandbox_id(&self) -> SandboxId {
        self.sandbox_id
    }

    /// Enqueue a command. Never blocks on a reply.
    pub async fn send(&self, command: Outbound) -> Result<(), BridgeError> {
        self.outbound_tx.send(command).await.map_err(|_| BridgeError::Closed)
    }

    /// Tear down the connection without losing the caller's handle to this
    /// struct — a subsequent [`BridgeTransport::connect`] establishes a
    /// fresh socket; subscription bookkeeping lives one layer up, in the
    /// Sandbox Manager, so it survives this call.
    pub fn disconnect(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

impl Drop for BridgeTransport {
    fn drop(&mut self) {
        self.disconnect();
    }
}

async fn event_loop(
    sandbox_id: SandboxId,
    stream: WsStream,
    mut outbound_rx: mpsc::Receiver<Outbound>,
    mut shutdown_rx: oneshot::Receiver<()>,
    events_tx: mpsc::Sender<BridgeEvent>,
) {
    let (mut write, mut read) = stream.split();

    loop {
        tokio::select! {
            msg = read.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        match serde_json::from_str::<Inbound>(&text) {
                            Ok(event) => {
                                tracing::debug!(%sandbox_id, ?event, "bridge inbound event");
                                let _ = events_tx.send(BridgeEvent::Inbound { sandbox_id, event }).await;
                            }
                            Err(e) => {
                                tracing::warn!(%sandbox_id, %e, "bridge event failed to parse");
                            }
                        }
                    }
                    Some(Ok(Message::Close(frame))) => {
                        tracing::info!(%sandbox_id, ?frame, "bridge received close frame");
                        let _ = events_tx.send(BridgeEvent::Gone { sandbox_id }).await;
                        break;
                    }
                    None => {
                        tracing::info!(%sandbox_id, "bridge stream ended");
                        let _ = events_tx.send(BridgeEvent::Gone { sandbox_id }).await;
                        break;
                    }
                    Some(Err(e)) => {
                        tracing::warn!(%sandbox_id, %e, "bridge read error");
                        let _ = events_tx.send(BridgeEvent::Gone { sandbox_id }).await;
                        break;
                    }
                    _ => {} // Ping/Pong/Binary — ignore
                }
            }
            cmd = outbound_rx.recv() => {
                match cmd {
                    Some(cmd) => {
                        let text = match serde_json::to_string(&cmd) {
                            Ok(t) => t,
                            Err(e) => {
                                tracing::warn!(%sandbox_id, %e, "bridge command failed to serialize");
                                continue;
                            }
                        };
                        if let Err(e) = write.send(Message::Text(text.into())).await {
                            tracing::warn!(%sandbox_id, %e, "bridge write failed");
                            let _ = events_tx.send(BridgeEvent::Gone { sandbox_id }).await;
                            break;
                        }
                    }
                    None => break, // all senders dropped
                }
            }
            _ = &mut shutdown_rx => {
                break;
            }
        }
    }
}

#[cfg(test)]
#[path = "transport_tests.rs"]
mod tests;
