// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The small request/response protocol the `cli` binary drives over a
//! local Unix socket: status, list projects, force a reconcile. Framed
//! with `scp_wire::framing`'s length-delimited JSON, grounded on the
//! teacher's own daemon `protocol::{Request, Response}` pair, generalized
//! to the control plane's project model.

use scp_core::{Project, ProjectId};
use scp_registry::Registry;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::net::{UnixListener, UnixStream};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Request {
    Status,
    ListProjects,
    ForceReconcile { project_id: ProjectId },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Response {
    Status { project_count: usize },
    Projects { projects: Vec<Project> },
    Reconciled { project: Project },
    Error { message: String },
}

/// Accept admin connections until the listener errors. One request per
/// connection: the CLI dials in, asks, reads the reply, and disconnects.
pub async fn serve(listener: UnixListener, registry: Arc<Registry>) {
    loop {
        let (stream, _) = match listener.accept().await {
            Ok(pair) => pair,
            Err(e) => {
                tracing::warn!(%e, "admin socket accept failed");
                continue;
            }
        };
        let registry = Arc::clone(&registry);
        tokio::spawn(async move {
            handle_one(stream, registry).await;
        });
    }
}

async fn handle_one(mut stream: UnixStream, registry: Arc<Registry>) {
    let request = match scp_wire::read_message::<_, Request>(&mut stream).await {
        Ok(Some(request)) => request,
        Ok(None) => return,
        Err(e) => {
            tracing::debug!(%e, "admin request framing error");
            return;
        }
    };
    let response = dispatch(&registry, request).await;
    if let Err(e) = scp_wire::write_message(&mut stream, &response).await {
        tracing::debug!(%e, "admin response framing error");
    }
}

async fn dispatch(registry: &Registry, request: Request) -> Response {
    match request {
        Request::Status => Response::Status { project_count: registry.list().len() },
        Request::ListProjects => Response::Projects { projects: registry.list() },
        Request::ForceReconcile { project_id } => match registry.reconcile_sandbox_status(project_id).await {
            Ok(project) => Response::Reconciled { project },
            Err(e) => Response::Error { message: e.to_string() },
        },
    }
}
