// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Retry-connect loop, grounded directly on the teacher's
//! `docker/ws.rs::connect_ws`: bounded attempts with a fixed delay so a
//! consumer can connect eagerly while the sandbox is still starting up.

use std::time::Duration;
use tokio_tungstenite::tungstenite::Error as WsError;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

#[derive(Debug, Clone, Copy)]
pub struct ConnectConfig {
    pub max_attempts: usize,
    pub retry_delay: Duration,
}

impl Default for ConnectConfig {
    fn default() -> Self {
        Self { max_attempts: 20, retry_delay: Duration::from_millis(500) }
    }
}

pub type WsStream = WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>;

/// Dial `url` up to `config.max_attempts` times, sleeping `retry_delay`
/// between attempts. Returns the last error if every attempt fails.
pub async fn connect_with_retry(url: &str, config: ConnectConfig) -> Result<WsStream, WsError> {
    let mut last_err = None;
    for attempt in 0..config.max_attempts {
        if attempt > 0 {
            tokio::time::sleep(config.retry_delay).await;
        }
        match tokio_tungstenite::connect_async(url).await {
            Ok((stream, _response)) => {
                if attempt > 0 {
                    tracing::info!(%url, attempt, "bridge connect succeeded after retry");
                }
                return Ok(stream);
            }
            Err(e) => {
                tracing::debug!(%url, attempt, error = %e, "bridge connect attempt failed");
                last_err = Some(e);
            }
        }
    }
    tracing::warn!(%url, attempts = config.max_attempts, "bridge connect failed, giving up");
    Err(last_err.unwrap_or(WsError::ConnectionClosed))
}

#[cfg(test)]
#[path = "connect_tests.rs"]
mod tests;
