// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `scp status` — project count known to a running daemon.

use anyhow::Result;

use crate::client::DaemonClient;
use crate::output::OutputFormat;

pub async fn handle(format: OutputFormat) -> Result<()> {
    let mut client = match DaemonClient::connect().await {
        Ok(c) => c,
        Err(_) => {
            println!("daemon is not running");
            return Ok(());
        }
    };

    let project_count = client.status().await?;

    crate::output::format_or_json(
        format,
        &serde_json::json!({ "project_count": project_count }),
        || println!("{} project(s) tracked", crate::color::header(&project_count.to_string())),
    )
}
