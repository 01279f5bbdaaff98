// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `scp reconcile` — force a project's status to sync with its sandbox's
//! actual provider state, bypassing the gateway's normal on-subscribe
//! reconciliation.

use anyhow::Result;

use crate::client::DaemonClient;
use crate::output::OutputFormat;
use scp_core::ProjectId;

pub async fn handle(project_id: String, format: OutputFormat) -> Result<()> {
    let mut client = DaemonClient::connect().await?;
    let project = client.force_reconcile(ProjectId::from_string(project_id)).await?;

    crate::output::format_or_json(format, &project, || {
        println!("{} is now {}", crate::color::header(&project.id.to_string()), project.status);
    })
}
