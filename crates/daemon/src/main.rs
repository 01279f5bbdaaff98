// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use scp_core::Config;
use scp_daemon::App;
use std::path::PathBuf;
use tokio::net::{TcpListener, UnixListener};
use tracing_subscriber::prelude::*;

const DEFAULT_GATEWAY_BIND_ADDR: &str = "0.0.0.0:7890";
const DEFAULT_ADMIN_SOCKET_PATH: &str = "/tmp/scpd.sock";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::from_env()?;

    let log_dir = config.db_path.parent().unwrap_or_else(|| std::path::Path::new("."));
    let file_appender = tracing_appender::rolling::daily(log_dir, "scpd.log");
    let (file_writer, _guard) = tracing_appender::non_blocking(file_appender);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::fmt::layer().with_writer(file_writer).with_ansi(false))
        .init();

    let app = App::bootstrap(config)?;

    let gateway_addr =
        std::env::var("GATEWAY_BIND_ADDR").unwrap_or_else(|_| DEFAULT_GATEWAY_BIND_ADDR.to_string());
    let gateway_listener = TcpListener::bind(&gateway_addr).await?;
    tracing::info!(addr = %gateway_addr, "client gateway listening");

    let admin_path =
        std::env::var("ADMIN_SOCKET_PATH").unwrap_or_else(|_| DEFAULT_ADMIN_SOCKET_PATH.to_string());
    let admin_path = PathBuf::from(admin_path);
    let _ = std::fs::remove_file(&admin_path);
    let admin_listener = UnixListener::bind(&admin_path)?;
    tracing::info!(path = %admin_path.display(), "admin socket listening");

    app.run(gateway_listener, admin_listener).await?;
    Ok(())
}
