// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Domain events emitted by the Registry and the Orchestrator onto the
//! shared `EventBus`, and fanned out to subscribers by the Gateway.
//!
//! Raw bridge traffic (terminal output, file-change notifications, port
//! listings) does not round-trip through this bus — the Sandbox Manager
//! forwards those directly to a sandbox's listeners, since they carry no
//! state-machine semantics of their own. This bus exists for the events
//! that change durable state: project lifecycle and chat/agent turns.

use crate::ids::{ChatId, ProjectId, SandboxId};
use crate::model::{ChatStatus, Message, Project};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum Event {
    #[serde(rename = "project:created")]
    ProjectCreated { project: Project },
    #[serde(rename = "project:updated")]
    ProjectUpdated { project: Project },
    #[serde(rename = "project:deleted")]
    ProjectDeleted { project_id: ProjectId },

    #[serde(rename = "chat:status")]
    ChatStatus { chat_id: ChatId, project_id: ProjectId, status: ChatStatus },

    #[serde(rename = "agent:message")]
    AgentMessage { chat_id: ChatId, sandbox_id: SandboxId, message: Box<Message> },
    #[serde(rename = "agent:status")]
    AgentStatus { chat_id: ChatId, sandbox_id: SandboxId, status: ChatStatus },
    #[serde(rename = "agent:error")]
    AgentError { chat_id: ChatId, sandbox_id: SandboxId, message: String },
    #[serde(rename = "agent:prompt_accepted")]
    PromptAccepted { chat_id: ChatId, sandbox_id: SandboxId },
}

impl Event {
    pub fn name(&self) -> &'static str {
        match self {
            Event::ProjectCreated { .. } => "project:created",
            Event::ProjectUpdated { .. } => "project:updated",
            Event::ProjectDeleted { .. } => "project:deleted",
            Event::ChatStatus { .. } => "chat:status",
            Event::AgentMessage { .. } => "agent:message",
            Event::AgentStatus { .. } => "agent:status",
            Event::AgentError { .. } => "agent:error",
            Event::PromptAccepted { .. } => "agent:prompt_accepted",
        }
    }

    /// The sandbox this event should be fanned out against, if any.
    /// `None` for events broadcast on the global projects namespace.
    pub fn sandbox_id(&self) -> Option<SandboxId> {
        match self {
            Event::AgentMessage { sandbox_id, .. }
            | Event::AgentStatus { sandbox_id, .. }
            | Event::AgentError { sandbox_id, .. }
            | Event::PromptAccepted { sandbox_id, .. } => Some(*sandbox_id),
            Event::ProjectCreated { .. }
            | Event::ProjectUpdated { .. }
            | Event::ProjectDeleted { .. }
            | Event::ChatStatus { .. } => None,
        }
    }
}

/// Process-wide fan-out bus. A `tokio::sync::broadcast` channel, matching
/// the teacher's own `EventBus` shape: one producer side shared via `Arc`,
/// many independent subscriber receivers, lagging receivers skip forward
/// rather than block producers.
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<Event>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }

    /// Best-effort publish: no subscribers is not an error.
    pub fn publish(&self, event: Event) {
        let _ = self.tx.send(event);
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(1024)
    }
}

/// Emit `event` on `bus`, logging at the teacher's conventional span level.
pub fn emit(bus: &EventBus, event: Event) {
    tracing::debug!(kind = event.name(), "event emitted");
    bus.publish(event);
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
