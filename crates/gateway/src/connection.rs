// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use crate::{commands, GatewayCtx};
use futures_util::{SinkExt, StreamExt};
use scp_core::ClientId;
use scp_wire::browser::{Inbound, Outbound};
use std::sync::Arc;
use thiserror::Error;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message as WsMessage;

const OUTBOUND_BUFFER: usize = 256;

#[derive(Debug, Error)]
pub(crate) enum ConnectionError {
    #[error(transparent)]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),
}

/// Own one accepted browser socket end to end: handshake, then race the
/// read loop (commands in) against the write loop (broadcasts and replies
/// out) until either side closes.
pub(crate) async fn handle_connection(
    stream: TcpStream,
    ctx: Arc<GatewayCtx>,
) -> Result<(), ConnectionError> {
    let ws = tokio_tungstenite::accept_async(stream).await?;
    let (mut sink, mut source) = ws.split();

    let client_id = ClientId::new();
    let (tx, mut rx) = mpsc::channel::<Outbound>(OUTBOUND_BUFFER);
    ctx.register_client(client_id, tx);

    let write_task = tokio::spawn(async move {
        while let Some(message) = rx.recv().await {
            let Ok(text) = serde_json::to_string(&message) else { continue };
            if sink.send(WsMessage::Text(text.into())).await.is_err() {
                break;
            }
        }
    });

    while let Some(frame) = source.next().await {
        let frame = match frame {
            Ok(f) => f,
            Err(e) => {
                tracing::debug!(%e, "websocket read error");
                break;
            }
        };
        match frame {
            WsMessage::Text(text) => match serde_json::from_str::<Inbound>(&text) {
                Ok(inbound) => commands::dispatch(&ctx, client_id, inbound).await,
                Err(e) => {
                    ctx.send_to(client_id, Outbound::Error { message: format!("bad request: {e}") });
                }
            },
            WsMessage::Close(_) => break,
            _ => {}
        }
    }

    ctx.unregister_client(client_id);
    write_task.abort();
    Ok(())
}
