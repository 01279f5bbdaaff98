// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The durable data model: `User`, `Project`, `Chat`, `Message`, `Setting`.

use crate::ids::{ChatId, MessageId, ProjectId, SandboxId, UserId};
use crate::simple_display;
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// Milliseconds since the Unix epoch. Kept as a plain integer (rather than
/// `chrono::DateTime`) at the model boundary so snapshot JSON is stable
/// across timezone/library changes; `chrono` is still used for the
/// human-facing timestamps in logs and snapshot envelopes.
pub type EpochMs = u64;

pub fn now_ms() -> EpochMs {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub name: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ProjectStatus {
    Creating,
    Starting,
    Running,
    Stopped,
    Error,
}

simple_display! {
    ProjectStatus {
        Creating => "creating",
        Starting => "starting",
        Running => "running",
        Stopped => "stopped",
        Error => "error",
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Project {
    pub id: ProjectId,
    pub user_id: UserId,
    pub name: String,
    pub sandbox_id: Option<SandboxId>,
    pub status: ProjectStatus,
    pub status_error: Option<String>,
    pub agent_type: String,
    pub git_repo: Option<String>,
    /// Always the family root, never another fork; collapsed at fork time.
    pub forked_from_id: Option<ProjectId>,
    pub branch_name: Option<String>,
    /// Soft-delete tombstone marker. `Some` means the record is retained
    /// only because its sandbox could not yet be removed.
    pub deleted_at: Option<EpochMs>,
    pub created_at: EpochMs,
    pub updated_at: EpochMs,
}

impl Project {
    pub fn is_tombstone(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// The id to use for directory-slug resolution: the fork root's, if any.
    pub fn slug_source_id(&self) -> ProjectId {
        self.forked_from_id.unwrap_or(self.id)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ChatStatus {
    Idle,
    Running,
    Completed,
    Error,
}

simple_display! {
    ChatStatus {
        Idle => "idle",
        Running => "running",
        Completed => "completed",
        Error => "error",
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ChatMode {
    Agent,
    Plan,
    Ask,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Chat {
    pub id: ChatId,
    pub project_id: ProjectId,
    pub title: String,
    pub status: ChatStatus,
    /// Set exactly once, from the agent's `system/init` event on the first
    /// prompt. Never overwritten by a session id reported on a later resume.
    pub agent_session_id: Option<String>,
    pub mode: Option<ChatMode>,
    pub created_at: EpochMs,
    pub updated_at: EpochMs,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
    System,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    Text { text: String },
    ToolUse { id: String, name: String, input: serde_json::Value },
    /// Answers an earlier `ToolUse` block, keyed by `tool_use_id`.
    ToolResult { tool_use_id: String, content: serde_json::Value },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    pub id: MessageId,
    pub chat_id: ChatId,
    pub role: MessageRole,
    pub content: Vec<ContentBlock>,
    #[serde(default)]
    pub metadata: serde_json::Map<String, serde_json::Value>,
    pub created_at: EpochMs,
}

impl Message {
    pub fn user_text(chat_id: ChatId, text: impl Into<String>) -> Self {
        Self {
            id: MessageId::new(),
            chat_id,
            role: MessageRole::User,
            content: vec![ContentBlock::Text { text: text.into() }],
            metadata: Default::default(),
            created_at: now_ms(),
        }
    }

    pub fn tool_result(chat_id: ChatId, tool_use_id: impl Into<String>, answer: serde_json::Value) -> Self {
        Self {
            id: MessageId::new(),
            chat_id,
            role: MessageRole::User,
            content: vec![ContentBlock::ToolResult { tool_use_id: tool_use_id.into(), content: answer }],
            metadata: Default::default(),
            created_at: now_ms(),
        }
    }
}

/// Closed allow-list of configuration keys persisted in the `Setting` table.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SettingKey {
    AgentApiKey,
    AgentProviderUrl,
    SandboxSnapshotName,
    SettingsVisible,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Setting {
    pub key: SettingKey,
    pub value: String,
}

#[cfg(test)]
#[path = "model_tests.rs"]
mod tests;
