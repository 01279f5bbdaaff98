// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The Control Plane ↔ Sandbox Bridge protocol (§4.2, §6). One JSON object
//! per WebSocket text frame.

use serde::{Deserialize, Serialize};

/// Messages the bridge sends into the control plane.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum Inbound {
    /// Handshake sent once the bridge accepts the connection.
    #[serde(rename = "bridge_ready")]
    BridgeReady,

    /// A structured agent event. `data` carries the inner discriminator
    /// (`system/init`, `assistant`, `result`) and is forwarded to the
    /// orchestrator verbatim for further parsing.
    #[serde(rename = "claude_message")]
    ClaudeMessage { chat_id: String, data: serde_json::Value },
    #[serde(rename = "claude_stderr")]
    ClaudeStderr { chat_id: String, data: String },
    #[serde(rename = "claude_exit")]
    ClaudeExit { chat_id: String, code: i32 },
    #[serde(rename = "claude_error")]
    ClaudeError { chat_id: String, error: String },

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

    #[serde(rename = "file_changed")]
    FileChanged { dirs: Vec<String> },
    #[serde(rename = "ports_update")]
    PortsUpdate { ports: Vec<PortEntry> },

    /// Correlated replies to the file, git, and layout commands in
    /// [`Outbound`]. The inbound vocabulary is a superset of the browser
    /// one precisely so these round trips can be relayed rather than
    /// stubbed (§4.6).
    #[serde(rename = "file_list_result")]
    FileListResult { entries: Vec<String> },
    #[serde(rename = "file_read_result")]
    FileReadResult { content: String },
    #[serde(rename = "file_write_result")]
    FileWriteResult { ok: bool },
    #[serde(rename = "file_op_result")]
    FileOpResult { ok: bool },
    #[serde(rename = "file_search_result")]
    FileSearchResult { matches: Vec<String> },

    #[serde(rename = "git_status_result")]
    GitStatusResult { value: serde_json::Value },
    #[serde(rename = "git_op_result")]
    GitOpResult { ok: bool, message: Option<String> },
    #[serde(rename = "git_branches_result")]
    GitBranchesResult { branches: Vec<String> },

    #[serde(rename = "layout_data")]
    LayoutData { layout: serde_json::Value },
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct PortEntry {
    pub port: u16,
    pub open: bool,
}

/// The discriminator embedded in `ClaudeMessage::data`, parsed separately
/// by the orchestrator since the outer envelope only tells it which chat
/// the payload belongs to.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
pub enum ClaudeEvent {
    #[serde(rename = "system")]
    System {
        subtype: String,
        #[serde(default)]
        session_id: Option<String>,
    },
    #[serde(rename = "assistant")]
    Assistant {
        #[serde(default)]
        message: AssistantPayload,
    },
    #[serde(rename = "result")]
    Result {
        #[serde(default)]
        is_error: bool,
        #[serde(default)]
        session_id: Option<String>,
        #[serde(default)]
        num_turns: u32,
        #[serde(default)]
        duration_ms: u64,
        #[serde(default)]
        total_cost_usd: f64,
        #[serde(default)]
        usage: Usage,
    },
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AssistantPayload {
    #[serde(default)]
    pub content: Vec<serde_json::Value>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub stop_reason: Option<String>,
    #[serde(default)]
    pub usage: Usage,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct Usage {
    #[serde(default)]
    pub input_tokens: u64,
    #[serde(default)]
    pub output_tokens: u64,
}

/// Commands the control plane sends into the bridge.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum Outbound {
    #[serde(rename = "send_prompt")]
    SendPrompt {
        chat_id: String,
        prompt: String,
        #[serde(default)]
        agent_session_id: Option<String>,
        #[serde(default)]
        mode: Option<String>,
        #[serde(default)]
        model: Option<String>,
    },
    #[serde(rename = "send_user_answer")]
    SendUserAnswer { chat_id: String, tool_use_id: String, answer: serde_json::Value },

    #[serde(rename = "terminal_create")]
    TerminalCreate { cwd: Option<String> },
    #[serde(rename = "terminal_input")]
    TerminalInput { terminal_id: String, data: String },
    #[serde(rename = "terminal_resize")]
    TerminalResize { terminal_id: String, cols: u16, rows: u16 },
    #[serde(rename = "terminal_close")]
    TerminalClose { terminal_id: String },
    #[serde(rename = "terminal_list")]
    TerminalList,

    #[serde(rename = "file_list")]
    FileList { path: String },
    #[serde(rename = "file_read")]
    FileRead { path: String },
    #[serde(rename = "file_write")]
    FileWrite { path: String, content: String },
    #[serde(rename = "file_create")]
    FileCreate { path: String, is_dir: bool },
    #[serde(rename = "file_rename")]
    FileRename { from: String, to: String },
    #[serde(rename = "file_delete")]
    FileDelete { path: String },
    #[serde(rename = "file_move")]
    FileMove { from: String, to: String },
    #[serde(rename = "file_search")]
    FileSearch { query: String },

    #[serde(rename = "git_status")]
    GitStatus,
    #[serde(rename = "git_stage")]
    GitStage { paths: Vec<String> },
    #[serde(rename = "git_unstage")]
    GitUnstage { paths: Vec<String> },
    #[serde(rename = "git_discard")]
    GitDiscard { paths: Vec<String> },
    #[serde(rename = "git_commit")]
    GitCommit { message: String },
    #[serde(rename = "git_push")]
    GitPush,
    #[serde(rename = "git_pull")]
    GitPull,
    #[serde(rename = "git_branches")]
    GitBranches,
    #[serde(rename = "git_create_branch")]
    GitCreateBranch { name: String },
    #[serde(rename = "git_checkout")]
    GitCheckout { branch: String },

    #[serde(rename = "layout_save")]
    LayoutSave { layout: serde_json::Value },
    #[serde(rename = "layout_load")]
    LayoutLoad,

    #[serde(rename = "get_git_branch")]
    GetGitBranch,
    #[serde(rename = "get_project_dir")]
    GetProjectDir,
}

#[cfg(test)]
#[path = "bridge_tests.rs"]
mod tests;
