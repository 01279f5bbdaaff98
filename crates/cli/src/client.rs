// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Thin client for the daemon's admin socket, grounded on the teacher's
//! own `DaemonClient` (connect, send one [`Request`], read one
//! [`Response`]) but speaking the control plane's admin protocol instead
//! of the job engine's.

use scp_daemon::admin::{Request, Response};
use scp_wire::FramingError;
use std::path::PathBuf;
use thiserror::Error;
use tokio::net::UnixStream;

const DEFAULT_ADMIN_SOCKET_PATH: &str = "/tmp/scpd.sock";

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("could not reach daemon at {path}: {source}")]
    Connect { path: PathBuf, source: std::io::Error },
    #[error(transparent)]
    Framing(#[from] FramingError),
    #[error("daemon closed the connection without replying")]
    NoReply,
    #[error("unexpected response from daemon: {0:?}")]
    UnexpectedResponse(Response),
    #[error("daemon returned an error: {0}")]
    Daemon(String),
}

pub struct DaemonClient {
    stream: UnixStream,
}

impl DaemonClient {
    /// Connect to the admin socket named by `ADMIN_SOCKET_PATH`, or the
    /// daemon's own default if unset.
    pub async fn connect() -> Result<Self, ClientError> {
        let path = std::env::var("ADMIN_SOCKET_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_ADMIN_SOCKET_PATH));
        Self::connect_to(&path).await
    }

    pub async fn connect_to(path: &std::path::Path) -> Result<Self, ClientError> {
        let stream = UnixStream::connect(path)
            .await
            .map_err(|source| ClientError::Connect { path: path.to_path_buf(), source })?;
        Ok(Self { stream })
    }

    async fn send(&mut self, request: &Request) -> Result<Response, ClientError> {
        scp_wire::write_message(&mut self.stream, request).await?;
        match scp_wire::read_message::<_, Response>(&mut self.stream).await? {
            Some(response) => Ok(response),
            None => Err(ClientError::NoReply),
        }
    }

    fn reject<T>(response: Response) -> Result<T, ClientError> {
        match response {
            Response::Error { message } => Err(ClientError::Daemon(message)),
            other => Err(ClientError::UnexpectedResponse(other)),
        }
    }

    pub async fn status(&mut self) -> Result<usize, ClientError> {
        match self.send(&Request::Status).await? {
            Response::Status { project_count } => Ok(project_count),
            other => Self::reject(other),
        }
    }

    pub async fn list_projects(&mut self) -> Result<Vec<scp_core::Project>, ClientError> {
        match self.send(&Request::ListProjects).await? {
            Response::Projects { projects } => Ok(projects),
            other => Self::reject(other),
        }
    }

    pub async fn force_reconcile(&mut self, project_id: scp_core::ProjectId) -> Result<scp_core::Project, ClientError> {
        match self.send(&Request::ForceReconcile { project_id }).await? {
            Response::Reconciled { project } => Ok(project),
            other => Self::reject(other),
        }
    }
}
