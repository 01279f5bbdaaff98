// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP-driven `SandboxProvider`, grounded on the same authenticated-GET
//! pattern the teacher's docker adapter uses to poll a sidecar, generalized
//! to the full provider surface over `reqwest`.

use crate::{PortPreview, ProviderError, ProviderState, SandboxProvider, SshAccess};
use async_trait::async_trait;
use scp_core::SandboxId;
use serde::Deserialize;

pub struct HttpProvider {
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl HttpProvider {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self { base_url: base_url.into(), api_key: api_key.into(), client: reqwest::Client::new() }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

    async fn get_authed(&self, path: &str) -> Result<serde_json::Value, ProviderError> {
        let resp = self
            .client
            .get(self.url(path))
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|e| ProviderError::Request(e.to_string()))?;
        if !resp.status().is_success() {
            return Err(ProviderError::Request(format!("status {}", resp.status())));
        }
        resp.json().await.map_err(|e| ProviderError::Request(e.to_string()))
    }

    async fn post_authed(
        &self,
        path: &str,
        body: &serde_json::Value,
    ) -> Result<serde_json::Value, ProviderError> {
        let resp = self
            .client
            .post(self.url(path))
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| ProviderError::Request(e.to_string()))?;
        let status = resp.status();
        if status.as_u16() == 409 {
            return Err(ProviderError::HasDependents);
        }
        if !status.is_success() {
            return Err(ProviderError::Request(format!("status {status}")));
        }
        resp.json().await.map_err(|e| ProviderError::Request(e.to_string()))
    }
}

#[derive(Deserialize)]
struct SandboxIdResponse {
    sandbox_id: String,
}

#[async_trait]
impl SandboxProvider for HttpProvider {
    async fn create_sandbox(
        &self,
        snapshot: &str,
        project_name: &str,
        git_repo: Option<&str>,
    ) -> Result<SandboxId, ProviderError> {
        let body = serde_json::json!({
            "snapshot": snapshot,
            "project_name": project_name,
            "git_repo": git_repo,
        });
        let resp: SandboxIdResponse = serde_json::from_value(
            self.post_authed("/sandboxes", &body).await?,
        )
        .map_err(|e| ProviderError::Request(e.to_string()))?;
        Ok(SandboxId::from_string(resp.sandbox_id))
    }

    async fn reconnect_sandbox(&self, id: SandboxId, dir_name: &str) -> Result<(), ProviderError> {
        let body = serde_json::json!({ "dir_name": dir_name });
        self.post_authed(&format!("/sandboxes/{id}/reconnect"), &body).await?;
        Ok(())
    }

    async fn stop_sandbox(&self, id: SandboxId) -> Result<(), ProviderError> {
        self.post_authed(&format!("/sandboxes/{id}/stop"), &serde_json::json!({})).await?;
        Ok(())
    }

    async fn delete_sandbox(&self, id: SandboxId) -> Result<(), ProviderError> {
        self.post_authed(&format!("/sandboxes/{id}/delete"), &serde_json::json!({})).await?;
        Ok(())
    }

    async fn get_sandbox_state(&self, id: SandboxId) -> Result<ProviderState, ProviderError> {
        let json = self.get_authed(&format!("/sandboxes/{id}")).await?;
        let state = json.get("state").and_then(|v| v.as_str()).unwrap_or("error");
        serde_json::from_value(serde_json::Value::String(state.to_string()))
            .map_err(|e| ProviderError::Request(e.to_string()))
    }

    async fn fork_sandbox(
        &self,
        src_id: SandboxId,
        branch: &str,
        project_name: &str,
    ) -> Result<SandboxId, ProviderError> {
        let body = serde_json::json!({ "branch": branch, "project_name": project_name });
        let resp: SandboxIdResponse = serde_json::from_value(
            self.post_authed(&format!("/sandboxes/{src_id}/fork"), &body).await?,
        )
        .map_err(|e| ProviderError::Request(e.to_string()))?;
        Ok(SandboxId::from_string(resp.sandbox_id))
    }

    async fn get_port_preview_url(
        &self,
        id: SandboxId,
        port: u16,
    ) -> Result<PortPreview, ProviderError> {
        let json = self.get_authed(&format!("/sandboxes/{id}/preview/{port}")).await?;
        Ok(PortPreview {
            url: json.get("url").and_then(|v| v.as_str()).unwrap_or_default().to_string(),
            token: json.get("token").and_then(|v| v.as_str()).unwrap_or_default().to_string(),
        })
    }

    async fn get_vscode_url(&self, id: SandboxId) -> Result<String, ProviderError> {
        let json = self.get_authed(&format!("/sandboxes/{id}/vscode-url")).await?;
        Ok(json.get("url").and_then(|v| v.as_str()).unwrap_or_default().to_string())
    }

    async fn create_ssh_access(&self, id: SandboxId) -> Result<SshAccess, ProviderError> {
        let json = self.post_authed(&format!("/sandboxes/{id}/ssh-access"), &serde_json::json!({})).await?;
        Ok(SshAccess {
            ssh_user: json.get("ssh_user").and_then(|v| v.as_str()).unwrap_or_default().to_string(),
            ssh_host: json.get("ssh_host").and_then(|v| v.as_str()).unwrap_or_default().to_string(),
            ssh_port: json.get("ssh_port").and_then(|v| v.as_u64()).unwrap_or(22) as u16,
            expires_at: json.get("expires_at").and_then(|v| v.as_u64()).unwrap_or(0),
        })
    }

    async fn bridge_address(&self, id: SandboxId) -> Result<String, ProviderError> {
        let json = self.get_authed(&format!("/sandboxes/{id}/bridge-address")).await?;
        Ok(json.get("address").and_then(|v| v.as_str()).unwrap_or_default().to_string())
    }
}
