// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `scp projects` — list every project the daemon's registry knows about.

use anyhow::Result;
use std::io::Write;

use crate::client::DaemonClient;
use crate::output::OutputFormat;

pub async fn handle(format: OutputFormat) -> Result<()> {
    let mut client = DaemonClient::connect().await?;
    let projects = client.list_projects().await?;

    crate::output::handle_list(format, &projects, "no projects", |projects, out| {
        for project in projects {
            let sandbox = project.sandbox_id.map(|id| id.to_string()).unwrap_or_else(|| "-".to_string());
            let _ = writeln!(
                out,
                "{}  {}  {}  sandbox={}  updated {}",
                crate::color::header(&project.id.to_string()),
                project.name,
                project.status,
                crate::color::context(&sandbox),
                crate::output::format_time_ago(project.updated_at),
            );
        }
    })
}
