// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The Browser ↔ Control Plane protocol (§6). One JSON object per
//! WebSocket text frame, exactly the vocabulary named in the spec.

use scp_core::{ChatMode, Message, Project, ProjectId};
use serde::{Deserialize, Serialize};

use crate::bridge::PortEntry;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum Inbound {
    #[serde(rename = "subscribe_project")]
    SubscribeProject { project_id: ProjectId },

    #[serde(rename = "send_prompt")]
    SendPrompt {
        chat_id: String,
        prompt: String,
        #[serde(default)]
        mode: Option<ChatMode>,
        #[serde(default)]
        model: Option<String>,
    },
    #[serde(rename = "execute_chat")]
    ExecuteChat {
        chat_id: String,
        #[serde(default)]
        mode: Option<ChatMode>,
        #[serde(default)]
        model: Option<String>,
    },
    #[serde(rename = "user_answer")]
    UserAnswer { chat_id: String, tool_use_id: String, answer: serde_json::Value },

    #[serde(rename = "terminal_create")]
    TerminalCreate { project_id: ProjectId, cwd: Option<String> },
    #[serde(rename = "terminal_input")]
    TerminalInput { project_id: ProjectId, terminal_id: String, data: String },
    #[serde(rename = "terminal_resize")]
    TerminalResize { project_id: ProjectId, terminal_id: String, cols: u16, rows: u16 },
    #[serde(rename = "terminal_close")]
    TerminalClose { project_id: ProjectId, terminal_id: String },
    #[serde(rename = "terminal_list")]
    TerminalList { project_id: ProjectId },

    #[serde(rename = "port_preview_url")]
    PortPreviewUrl { project_id: ProjectId, port: u16 },
    #[serde(rename = "project_info")]
    ProjectInfo { project_id: ProjectId },

    #[serde(rename = "file_list")]
    FileList { project_id: ProjectId, path: String },
    #[serde(rename = "file_create")]
    FileCreate { project_id: ProjectId, path: String, is_dir: bool },
    #[serde(rename = "file_rename")]
    FileRename { project_id: ProjectId, from: String, to: String },
    #[serde(rename = "file_delete")]
    FileDelete { project_id: ProjectId, path: String },
    #[serde(rename = "file_read")]
    FileRead { project_id: ProjectId, path: String },
    #[serde(rename = "file_write")]
    FileWrite { project_id: ProjectId, path: String, content: String },
    #[serde(rename = "file_search")]
    FileSearch { project_id: ProjectId, query: String },
    #[serde(rename = "file_move")]
    FileMove { project_id: ProjectId, from: String, to: String },

    #[serde(rename = "git_status")]
    GitStatus { project_id: ProjectId },
    #[serde(rename = "git_stage")]
    GitStage { project_id: ProjectId, paths: Vec<String> },
    #[serde(rename = "git_unstage")]
    GitUnstage { project_id: ProjectId, paths: Vec<String> },
    #[serde(rename = "git_discard")]
    GitDiscard { project_id: ProjectId, paths: Vec<String> },
    #[serde(rename = "git_commit")]
    GitCommit { project_id: ProjectId, message: String },
    #[serde(rename = "git_push")]
    GitPush { project_id: ProjectId },
    #[serde(rename = "git_pull")]
    GitPull { project_id: ProjectId },
    #[serde(rename = "git_branches")]
    GitBranches { project_id: ProjectId },
    #[serde(rename = "git_create_branch")]
    GitCreateBranch { project_id: ProjectId, name: String },
    #[serde(rename = "git_checkout")]
    GitCheckout { project_id: ProjectId, branch: String },

    #[serde(rename = "layout_save")]
    LayoutSave { project_id: ProjectId, layout: serde_json::Value },
    #[serde(rename = "layout_load")]
    LayoutLoad { project_id: ProjectId },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum Outbound {
    #[serde(rename = "subscribed")]
    Subscribed { project_id: ProjectId, sandbox_id: Option<scp_core::SandboxId> },
    #[serde(rename = "prompt_accepted")]
    PromptAccepted { chat_id: String },

    #[serde(rename = "agent_message")]
    AgentMessage { chat_id: String, message: Box<Message> },
    #[serde(rename = "agent_status")]
    AgentStatus { chat_id: String, status: String },
    #[serde(rename = "agent_error")]
    AgentError { chat_id: String, message: String },

    #[serde(rename = "terminal_created")]
    TerminalCreated { terminal_id: String },
    #[serde(rename = "terminal_output")]
    TerminalOutput { terminal_id: String, data: String },
    #[serde(rename = "terminal_exit")]
    TerminalExit { terminal_id: String, code: Option<i32> },
    #[serde(rename = "terminal_error")]
    TerminalError { terminal_id: String, error: String },
    #[serde(rename = "terminal_list")]
    TerminalList { terminals: Vec<String> },

    #[serde(rename = "port_preview_url_result")]
    PortPreviewUrlResult { url: String, token: String },
    #[serde(rename = "project_info")]
    ProjectInfo { project: Box<Project> },

    #[serde(rename = "file_list_result")]
    FileListResult { path: String, entries: Vec<String> },
    #[serde(rename = "file_op_result")]
    FileOpResult { ok: bool },
    #[serde(rename = "file_read_result")]
    FileReadResult { path: String, content: String },
    #[serde(rename = "file_write_result")]
    FileWriteResult { path: String, ok: bool },
    #[serde(rename = "file_search_result")]
    FileSearchResult { matches: Vec<String> },
    #[serde(rename = "file_changed")]
    FileChanged { dirs: Vec<String> },

    #[serde(rename = "git_status_result")]
    GitStatusResult { value: serde_json::Value },
    #[serde(rename = "git_op_result")]
    GitOpResult { ok: bool, message: Option<String> },
    #[serde(rename = "git_branches_result")]
    GitBranchesResult { branches: Vec<String> },

    #[serde(rename = "layout_data")]
    LayoutData { layout: serde_json::Value },
    #[serde(rename = "ports_update")]
    PortsUpdate { ports: Vec<PortEntry> },

    #[serde(rename = "project_created")]
    ProjectCreated { project: Box<Project> },
    #[serde(rename = "project_updated")]
    ProjectUpdated { project: Box<Project> },
    #[serde(rename = "project_deleted")]
    ProjectDeleted { project_id: ProjectId },

    #[serde(rename = "error")]
    Error { message: String },
}

#[cfg(test)]
#[path = "browser_tests.rs"]
mod tests;
