// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session Orchestrator (§4.5) — the core of the core. Drives the per-chat
//! prompt-turn state machine: `Idle -> Starting -> AwaitingFirst ->
//! Streaming -> {Completed, Errored, Retrying}`, with `Retrying` looping
//! back to `Starting` at most once.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod persistence;
mod session;
mod stderr_ring;

pub use session::SessionState;

use parking_lot::Mutex;
use persistence::Persistence;
use scp_core::{
    emit, now_ms, Chat, ChatId, ChatMode, ChatStatus, ClientId, ContentBlock, Event, EventBus,
    Message, MessageRole, ProjectId, SandboxId,
};
use scp_manager::{ManagerError, SandboxManager};
use scp_registry::{Registry, RegistryError};
use scp_wire::bridge::{ClaudeEvent, Inbound, Outbound};
use session::Session;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

pub use scp_bridge::BridgeEvent;
pub use scp_registry::store::{Store, StoreError};

const RESTART_CONTINUATION_PROMPT: &str =
    "Continue from where you left off. You had crashed and were restarted.";

#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("chat {0} not found")]
    ChatNotFound(ChatId),
    #[error("project {0} not found")]
    ProjectNotFound(ProjectId),
    #[error("chat {0} has no prior user message to execute")]
    NothingToExecute(ChatId),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error(transparent)]
    Manager(#[from] ManagerError),
}

#[derive(Debug, Clone, Copy)]
pub struct OrchestratorConfig {
    pub initial_timeout: Duration,
    pub activity_timeout: Duration,
}

impl From<&scp_core::Config> for OrchestratorConfig {
    fn from(config: &scp_core::Config) -> Self {
        Self { initial_timeout: config.initial_timeout, activity_timeout: config.activity_timeout }
    }
}

pub struct PromptRequest {
    pub chat_id: ChatId,
    pub client_id: ClientId,
    pub prompt: String,
    pub mode: Option<ChatMode>,
    pub model: Option<String>,
}

/// Drives every chat's prompt-turn state machine. One instance per process,
/// shared behind an `Arc` by the Client Gateway.
pub struct Orchestrator {
    registry: Arc<Registry>,
    manager: Arc<SandboxManager>,
    persistence: Persistence,
    events: EventBus,
    config: OrchestratorConfig,
    sessions: Arc<Mutex<HashMap<ChatId, Session>>>,
}

impl Orchestrator {
    pub fn new(
        registry: Arc<Registry>,
        manager: Arc<SandboxManager>,
        store: Arc<dyn Store>,
        events: EventBus,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            registry,
            manager,
            persistence: Persistence::new(store),
            events,
            config,
            sessions: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn state_of(&self, chat_id: ChatId) -> Option<SessionState> {
        self.sessions.lock().get(&chat_id).map(|s| s.state)
    }

    /// Persist the user's prompt and drive the turn to completion.
    pub async fn handle_send_prompt(self: &Arc<Self>, req: PromptRequest) -> Result<(), OrchestratorError> {
        self.persistence.append_message(Message::user_text(req.chat_id, req.prompt.clone()))?;
        self.start_turn(req.chat_id, req.client_id, req.prompt, req.mode, req.model).await
    }

    /// Re-run a chat's most recent user message instead of persisting a
    /// new one — used to retry a chat from the gateway without resubmitting.
    pub async fn handle_execute_chat(
        self: &Arc<Self>,
        chat_id: ChatId,
        client_id: ClientId,
    ) -> Result<(), OrchestratorError> {
        let prompt = self
            .persistence
            .messages_for_chat(chat_id)?
            .into_iter()
            .rev()
            .find(|m| m.role == MessageRole::User)
            .and_then(|m| user_text_of(&m))
            .ok_or(OrchestratorError::NothingToExecute(chat_id))?;

        self.start_turn(chat_id, client_id, prompt, None, None).await
    }

    async fn start_turn(
        self: &Arc<Self>,
        chat_id: ChatId,
        client_id: ClientId,
        prompt: String,
        mode: Option<ChatMode>,
        model: Option<String>,
    ) -> Result<(), OrchestratorError> {
        let chat = self.persistence.get_chat(chat_id)?.ok_or(OrchestratorError::ChatNotFound(chat_id))?;
        let project = self
            .registry
            .get(chat.project_id)
            .ok_or(OrchestratorError::ProjectNotFound(chat.project_id))?;

        let Some(sandbox_id) = project.sandbox_id else {
            emit(&self.events, Event::AgentError {
                chat_id,
                sandbox_id: SandboxId::new(),
                message: "project has no sandbox; start it before sending a prompt".to_string(),
            });
            return Ok(());
        };

        self.manager.register_project_name(sandbox_id, scp_core::slug(&project.name));

        let cancel = {
            let mut sessions = self.sessions.lock();
            let session = sessions.entry(chat_id).or_insert_with(|| Session::new(sandbox_id));
            session.sandbox_id = sandbox_id;
            session.subscribers.insert(client_id);
            session.state = SessionState::Starting;
            session.retried = false;
            session.received_first_message = false;
            session.mode = mode;
            session.model = model.clone();
            session.rearm()
        };

        self.persistence.save_chat(Chat { status: ChatStatus::Running, updated_at: now_ms(), ..chat.clone() })?;
        emit(&self.events, Event::ChatStatus { chat_id, project_id: chat.project_id, status: ChatStatus::Running });

        self.arm_timer(chat_id, sandbox_id, self.config.initial_timeout, cancel);

        let outbound = Outbound::SendPrompt {
            chat_id: chat_id.to_string(),
            prompt,
            agent_session_id: chat.agent_session_id.clone(),
            mode: mode.map(mode_str).map(str::to_string),
            model,
        };

        match self.manager.send(sandbox_id, outbound).await {
            Ok(()) => {
                self.set_state(chat_id, SessionState::AwaitingFirst);
                emit(&self.events, Event::PromptAccepted { chat_id, sandbox_id });
            }
            Err(e) => {
                self.cleanup(chat_id);
                self.set_state(chat_id, SessionState::Errored);
                emit(&self.events, Event::AgentError { chat_id, sandbox_id, message: e.to_string() });
            }
        }
        Ok(())
    }

    /// Forwards a user's answer to an outstanding tool-use question.
    /// Does not affect the state machine.
    pub async fn send_user_answer(
        &self,
        chat_id: ChatId,
        tool_use_id: String,
        answer: serde_json::Value,
    ) -> Result<(), OrchestratorError> {
        let sandbox_id = self
            .sessions
            .lock()
            .get(&chat_id)
            .map(|s| s.sandbox_id)
            .ok_or(OrchestratorError::ChatNotFound(chat_id))?;

        self.persistence.append_message(Message::tool_result(chat_id, tool_use_id.clone(), answer.clone()))?;
        self.manager
            .send(sandbox_id, Outbound::SendUserAnswer { chat_id: chat_id.to_string(), tool_use_id, answer })
            .await?;
        Ok(())
    }

    /// Dispatch one event observed on the bridge event stream. Unrelated
    /// events (wrong sandbox, wrong chat, no active session) are ignored.
    pub async fn handle_bridge_event(self: &Arc<Self>, event: BridgeEvent) {
        match event {
            BridgeEvent::Gone { sandbox_id } => self.handle_sandbox_gone(sandbox_id).await,
            BridgeEvent::Inbound { sandbox_id, event } => self.handle_inbound(sandbox_id, event).await,
        }
    }

    async fn handle_sandbox_gone(self: &Arc<Self>, sandbox_id: SandboxId) {
        let affected: Vec<ChatId> = {
            let sessions = self.sessions.lock();
            sessions.iter().filter(|(_, s)| s.sandbox_id == sandbox_id).map(|(id, _)| *id).collect()
        };
        for chat_id in affected {
            self.fail_turn(chat_id, sandbox_id, "sandbox connection lost".to_string()).await;
        }
    }

    async fn handle_inbound(self: &Arc<Self>, sandbox_id: SandboxId, event: Inbound) {
        match event {
            Inbound::ClaudeStderr { chat_id, data } => {
                let chat_id = ChatId::from_string(chat_id);
                if !self.owns(chat_id, sandbox_id) {
                    return;
                }
                {
                    let mut sessions = self.sessions.lock();
                    if let Some(s) = sessions.get_mut(&chat_id) {
                        s.stderr.push(&data);
                    }
                }
                self.rearm_activity(chat_id, sandbox_id);
            }
            Inbound::ClaudeMessage { chat_id, data } => {
                let chat_id = ChatId::from_string(chat_id);
                if !self.owns(chat_id, sandbox_id) {
                    return;
                }
                self.handle_claude_message(chat_id, sandbox_id, data).await;
            }
            Inbound::ClaudeExit { chat_id, code } => {
                let chat_id = ChatId::from_string(chat_id);
                if !self.owns(chat_id, sandbox_id) {
                    return;
                }
                self.handle_claude_exit(chat_id, sandbox_id, code).await;
            }
            Inbound::ClaudeError { chat_id, error } => {
                let chat_id = ChatId::from_string(chat_id);
                if !self.owns(chat_id, sandbox_id) {
                    return;
                }
                self.cleanup(chat_id);
                self.set_state(chat_id, SessionState::Errored);
                emit(&self.events, Event::AgentError { chat_id, sandbox_id, message: error });
            }
            // Terminal/file/port traffic bypasses the orchestrator entirely.
            _ => {}
        }
    }

    fn owns(&self, chat_id: ChatId, sandbox_id: SandboxId) -> bool {
        self.sessions.lock().get(&chat_id).is_some_and(|s| s.sandbox_id == sandbox_id)
    }

    async fn handle_claude_message(self: &Arc<Self>, chat_id: ChatId, sandbox_id: SandboxId, data: serde_json::Value) {
        {
            let mut sessions = self.sessions.lock();
            let Some(session) = sessions.get_mut(&chat_id) else { return };
            session.received_first_message = true;
            if session.state == SessionState::AwaitingFirst {
                session.state = SessionState::Streaming;
            }
        }
        self.rearm_activity(chat_id, sandbox_id);

        let Ok(claude_event) = serde_json::from_value::<ClaudeEvent>(data) else {
            tracing::warn!(%chat_id, "unparseable claude_message payload");
            return;
        };

        match claude_event {
            ClaudeEvent::System { session_id: Some(session_id), .. } => {
                self.persist_session_id_once(chat_id, session_id);
            }
            ClaudeEvent::System { .. } => {}
            ClaudeEvent::Assistant { message } => {
                let content: Vec<ContentBlock> = message
                    .content
                    .into_iter()
                    .filter_map(|v| serde_json::from_value(v).ok())
                    .collect();
                let mut metadata = serde_json::Map::new();
                if let Some(model) = message.model {
                    metadata.insert("model".to_string(), model.into());
                }
                if let Some(stop_reason) = message.stop_reason {
                    metadata.insert("stopReason".to_string(), stop_reason.into());
                }
                metadata.insert("usage".to_string(), serde_json::json!({
                    "inputTokens": message.usage.input_tokens,
                    "outputTokens": message.usage.output_tokens,
                }));

                let assistant_message = Message {
                    id: scp_core::MessageId::new(),
                    chat_id,
                    role: MessageRole::Assistant,
                    content,
                    metadata,
                    created_at: now_ms(),
                };
                if let Err(e) = self.persistence.append_message(assistant_message.clone()) {
                    tracing::warn!(%chat_id, %e, "failed to persist assistant message");
                }
                emit(&self.events, Event::AgentMessage { chat_id, sandbox_id, message: Box::new(assistant_message) });
            }
            ClaudeEvent::Result { is_error, session_id, num_turns, duration_ms, total_cost_usd, usage } => {
                if let Some(session_id) = session_id {
                    self.persist_session_id_once(chat_id, session_id);
                }
                let metadata = serde_json::json!({
                    "costUsd": total_cost_usd,
                    "durationMs": duration_ms,
                    "numTurns": num_turns,
                    "inputTokens": usage.input_tokens,
                    "outputTokens": usage.output_tokens,
                })
                .as_object()
                .cloned()
                .unwrap_or_default();

                let summary = Message {
                    id: scp_core::MessageId::new(),
                    chat_id,
                    role: MessageRole::System,
                    content: vec![],
                    metadata,
                    created_at: now_ms(),
                };
                let _ = self.persistence.append_message(summary);

                self.cleanup(chat_id);
                let final_status = if is_error { ChatStatus::Error } else { ChatStatus::Completed };
                self.set_state(
                    chat_id,
                    if is_error { SessionState::Errored } else { SessionState::Completed },
                );
                self.finish_chat_status(chat_id, final_status);
                emit(&self.events, Event::AgentStatus { chat_id, sandbox_id, status: final_status });
            }
        }
    }

    async fn handle_claude_exit(self: &Arc<Self>, chat_id: ChatId, sandbox_id: SandboxId, code: i32) {
        if code == 0 {
            self.cleanup(chat_id);
            self.set_state(chat_id, SessionState::Completed);
            self.finish_chat_status(chat_id, ChatStatus::Completed);
            emit(&self.events, Event::AgentStatus { chat_id, sandbox_id, status: ChatStatus::Completed });
            return;
        }

        let hint = {
            let sessions = self.sessions.lock();
            sessions.get(&chat_id).map(|s| s.stderr.tail()).unwrap_or_default()
        };
        let message = format!("agent process exited with code {code}: {hint}");
        emit(&self.events, Event::AgentError { chat_id, sandbox_id, message: message.clone() });
        self.retry_or_fail(chat_id, sandbox_id, message).await;
    }

    async fn fail_turn(self: &Arc<Self>, chat_id: ChatId, sandbox_id: SandboxId, message: String) {
        emit(&self.events, Event::AgentError { chat_id, sandbox_id, message: message.clone() });
        self.retry_or_fail(chat_id, sandbox_id, message).await;
    }

    /// Timer fire handler — called by the background timer task spawned in
    /// [`Self::arm_timer`].
    async fn handle_timer_fire(self: &Arc<Self>, chat_id: ChatId, sandbox_id: SandboxId, timeout: Duration) {
        let (received_first, hint) = {
            let sessions = self.sessions.lock();
            match sessions.get(&chat_id) {
                Some(s) => (s.received_first_message, s.stderr.tail()),
                None => return,
            }
        };

        let base = if received_first {
            "Agent stopped responding".to_string()
        } else {
            format!(
                "Agent did not respond within {}s — the CLI process may have failed to start",
                timeout.as_secs()
            )
        };
        let message = if hint.is_empty() { base } else { format!("{base}: {hint}") };

        self.retry_or_fail(chat_id, sandbox_id, message).await;
    }

    async fn retry_or_fail(self: &Arc<Self>, chat_id: ChatId, sandbox_id: SandboxId, message: String) {
        let should_retry = {
            let mut sessions = self.sessions.lock();
            match sessions.get_mut(&chat_id) {
                Some(s) if !s.retried => {
                    s.retried = true;
                    true
                }
                _ => false,
            }
        };

        if !should_retry {
            self.cleanup(chat_id);
            self.set_state(chat_id, SessionState::Errored);
            self.finish_chat_status(chat_id, ChatStatus::Error);
            emit(&self.events, Event::AgentError { chat_id, sandbox_id, message });
            emit(&self.events, Event::AgentStatus { chat_id, sandbox_id, status: ChatStatus::Error });
            return;
        }

        self.set_state(chat_id, SessionState::Retrying);

        let Ok(Some(chat)) = self.persistence.get_chat(chat_id) else { return };
        let prompt = if chat.agent_session_id.is_none() {
            self.persistence
                .messages_for_chat(chat_id)
                .ok()
                .and_then(|ms| ms.into_iter().rev().find(|m| m.role == MessageRole::User))
                .and_then(|m| user_text_of(&m))
                .unwrap_or_default()
        } else {
            RESTART_CONTINUATION_PROMPT.to_string()
        };

        let (cancel, mode, model) = {
            let mut sessions = self.sessions.lock();
            let Some(session) = sessions.get_mut(&chat_id) else { return };
            session.state = SessionState::Starting;
            (session.rearm(), session.mode, session.model.clone())
        };
        self.arm_timer(chat_id, sandbox_id, self.config.initial_timeout, cancel);

        let outbound = Outbound::SendPrompt {
            chat_id: chat_id.to_string(),
            prompt,
            agent_session_id: chat.agent_session_id.clone(),
            mode: mode.map(mode_str).map(str::to_string),
            model,
        };
        match self.manager.send(sandbox_id, outbound).await {
            Ok(()) => self.set_state(chat_id, SessionState::AwaitingFirst),
            Err(e) => {
                self.cleanup(chat_id);
                self.set_state(chat_id, SessionState::Errored);
                self.finish_chat_status(chat_id, ChatStatus::Error);
                emit(&self.events, Event::AgentError { chat_id, sandbox_id, message: e.to_string() });
            }
        }
    }

    fn persist_session_id_once(&self, chat_id: ChatId, session_id: String) {
        if let Ok(Some(chat)) = self.persistence.get_chat(chat_id) {
            if chat.agent_session_id.is_none() {
                let _ = self.persistence.save_chat(Chat {
                    agent_session_id: Some(session_id),
                    updated_at: now_ms(),
                    ..chat
                });
            }
        }
    }

    fn finish_chat_status(&self, chat_id: ChatId, status: ChatStatus) {
        if let Ok(Some(chat)) = self.persistence.get_chat(chat_id) {
            let project_id = chat.project_id;
            let _ = self.persistence.save_chat(Chat { status, updated_at: now_ms(), ..chat });
            emit(&self.events, Event::ChatStatus { chat_id, project_id, status });
        }
    }

    fn set_state(&self, chat_id: ChatId, state: SessionState) {
        if let Some(session) = self.sessions.lock().get_mut(&chat_id) {
            session.state = state;
        }
    }

    fn rearm_activity(self: &Arc<Self>, chat_id: ChatId, sandbox_id: SandboxId) {
        let cancel = {
            let mut sessions = self.sessions.lock();
            let Some(session) = sessions.get_mut(&chat_id) else { return };
            session.rearm()
        };
        self.arm_timer(chat_id, sandbox_id, self.config.activity_timeout, cancel);
    }

    fn arm_timer(self: &Arc<Self>, chat_id: ChatId, sandbox_id: SandboxId, timeout: Duration, cancel: CancellationToken) {
        let this = Arc::clone(self);
        tokio::spawn(async move {
            tokio::select! {
                _ = tokio::time::sleep(timeout) => {
                    this.handle_timer_fire(chat_id, sandbox_id, timeout).await;
                }
                _ = cancel.cancelled() => {}
            }
        });
    }

    /// Idempotent cleanup: cancel the active timer, drop the handler
    /// registration. Per §4.5 this runs on every terminal transition.
    fn cleanup(&self, chat_id: ChatId) {
        if let Some(session) = self.sessions.lock().get(&chat_id) {
            session.timer_cancel.cancel();
        }
        self.sessions.lock().remove(&chat_id);
    }
}

fn mode_str(mode: ChatMode) -> &'static str {
    match mode {
        ChatMode::Agent => "agent",
        ChatMode::Plan => "plan",
        ChatMode::Ask => "ask",
    }
}

fn user_text_of(message: &Message) -> Option<String> {
    message.content.iter().find_map(|block| match block {
        ContentBlock::Text { text } => Some(text.clone()),
        _ => None,
    })
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
