// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use crate::GatewayCtx;
use scp_bridge::BridgeEvent;
use scp_core::Event;
use scp_wire::bridge::Inbound;
use scp_wire::browser::Outbound;
use std::sync::Arc;

/// Translate orchestrator/registry domain events into browser frames and
/// fan them out to the right sockets. One task for the lifetime of the
/// gateway.
pub(crate) fn spawn_event_fanout(ctx: Arc<GatewayCtx>) {
    let mut rx = ctx.events.subscribe();
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(event) => handle_event(&ctx, event),
                Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "gateway event fanout lagged, some broadcasts were dropped");
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            }
        }
    });
}

fn handle_event(ctx: &GatewayCtx, event: Event) {
    match event {
        Event::ProjectCreated { project } => ctx.broadcast_all(Outbound::ProjectCreated { project: Box::new(project) }),
        Event::ProjectUpdated { project } => ctx.broadcast_all(Outbound::ProjectUpdated { project: Box::new(project) }),
        Event::ProjectDeleted { project_id } => ctx.broadcast_all(Outbound::ProjectDeleted { project_id }),

        Event::ChatStatus { chat_id, project_id, status } => {
            if let Some(sandbox_id) = ctx.project_sandbox(project_id) {
                ctx.broadcast_sandbox(
                    sandbox_id,
                    Outbound::AgentStatus { chat_id: chat_id.to_string(), status: status.to_string() },
                );
            }
        }
        Event::AgentMessage { chat_id, sandbox_id, message } => {
            ctx.broadcast_sandbox(sandbox_id, Outbound::AgentMessage { chat_id: chat_id.to_string(), message });
        }
        Event::AgentStatus { chat_id, sandbox_id, status } => {
            ctx.broadcast_sandbox(
                sandbox_id,
                Outbound::AgentStatus { chat_id: chat_id.to_string(), status: status.to_string() },
            );
        }
        Event::AgentError { chat_id, sandbox_id, message } => {
            ctx.broadcast_sandbox(sandbox_id, Outbound::AgentError { chat_id: chat_id.to_string(), message });
        }
        Event::PromptAccepted { chat_id, sandbox_id } => {
            ctx.broadcast_sandbox(sandbox_id, Outbound::PromptAccepted { chat_id: chat_id.to_string() });
        }
    }
}

/// (Re)bind the raw bridge-traffic listener if the manager's generation has
/// changed since the last binding, per the per-generation attachment rule
/// of §4.6.
pub(crate) fn ensure_bridge_fanout_bound(ctx: &Arc<GatewayCtx>) {
    let current = ctx.manager.handle();
    let mut bound = ctx.bound_generation.lock();
    if *bound == Some(current) {
        return;
    }
    *bound = Some(current);
    drop(bound);

    let mut rx = ctx.manager.subscribe();
    let ctx = Arc::clone(ctx);
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(BridgeEvent::Inbound { sandbox_id, event }) => forward_bridge_event(&ctx, sandbox_id, event),
                Ok(BridgeEvent::Gone { .. }) => {}
                Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "bridge fanout lagged, some frames were dropped");
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            }
        }
    });
}

fn forward_bridge_event(ctx: &GatewayCtx, sandbox_id: scp_core::SandboxId, event: Inbound) {
    let outbound = match event {
        Inbound::TerminalCreated { terminal_id } => Outbound::TerminalCreated { terminal_id },
        Inbound::TerminalOutput { terminal_id, data } => Outbound::TerminalOutput { terminal_id, data },
        Inbound::TerminalExit { terminal_id, code } => Outbound::TerminalExit { terminal_id, code },
        Inbound::TerminalError { terminal_id, error } => Outbound::TerminalError { terminal_id, error },
        Inbound::TerminalList { terminals } => Outbound::TerminalList { terminals },
        Inbound::FileChanged { dirs } => Outbound::FileChanged { dirs },
        Inbound::PortsUpdate { ports } => Outbound::PortsUpdate { ports },
        // Claude traffic is the orchestrator's concern, not raw fan-out.
        Inbound::BridgeReady
        | Inbound::ClaudeMessage { .. }
        | Inbound::ClaudeStderr { .. }
        | Inbound::ClaudeExit { .. }
        | Inbound::ClaudeError { .. } => return,
        // File, git, and layout replies are request-scoped: only the
        // client that asked sees them, via `relay_for_reply`'s own
        // subscription. Broadcasting them here would leak one client's
        // file contents or git status to every other subscriber.
        Inbound::FileListResult { .. }
        | Inbound::FileReadResult { .. }
        | Inbound::FileWriteResult { .. }
        | Inbound::FileOpResult { .. }
        | Inbound::FileSearchResult { .. }
        | Inbound::GitStatusResult { .. }
        | Inbound::GitOpResult { .. }
        | Inbound::GitBranchesResult { .. }
        | Inbound::LayoutData { .. } => return,
    };
    ctx.broadcast_sandbox(sandbox_id, outbound);
}
