// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Translate one browser [`Inbound`] command into orchestrator, registry,
//! manager, or provider calls, and reply on the same connection. Grounded
//! on the teacher's `listener::commands` dispatch table — one arm per
//! request kind, each owning its own reply shape.

use crate::GatewayCtx;
use scp_core::{ChatId, ClientId, ProjectStatus};
use scp_orchestrator::PromptRequest;
use scp_wire::bridge::{Inbound as BridgeInbound, Outbound as BridgeOutbound};
use scp_wire::browser::{Inbound, Outbound};
use tokio::sync::broadcast;

pub(crate) async fn dispatch(ctx: &std::sync::Arc<GatewayCtx>, client_id: ClientId, inbound: Inbound) {
    match inbound {
        Inbound::SubscribeProject { project_id } => subscribe_project(ctx, client_id, project_id).await,

        Inbound::SendPrompt { chat_id, prompt, mode, model } => {
            let req = PromptRequest { chat_id: ChatId::from_string(chat_id), client_id, prompt, mode, model };
            if let Err(e) = ctx.orchestrator.handle_send_prompt(req).await {
                ctx.send_to(client_id, Outbound::Error { message: e.to_string() });
            }
        }
        Inbound::ExecuteChat { chat_id, .. } => {
            let chat_id = ChatId::from_string(chat_id);
            if let Err(e) = ctx.orchestrator.handle_execute_chat(chat_id, client_id).await {
                ctx.send_to(client_id, Outbound::Error { message: e.to_string() });
            }
        }
        Inbound::UserAnswer { chat_id, tool_use_id, answer } => {
            let chat_id = ChatId::from_string(chat_id);
            if let Err(e) = ctx.orchestrator.send_user_answer(chat_id, tool_use_id, answer).await {
                ctx.send_to(client_id, Outbound::Error { message: e.to_string() });
            }
        }

        Inbound::ProjectInfo { project_id } => match ctx.registry.get(project_id) {
            Some(project) => ctx.send_to(client_id, Outbound::ProjectInfo { project: Box::new(project) }),
            None => ctx.send_to(client_id, Outbound::Error { message: format!("project {project_id} not found") }),
        },

        Inbound::PortPreviewUrl { project_id, port } => {
            let Some(sandbox_id) = ctx.project_sandbox(project_id) else {
                ctx.send_to(client_id, Outbound::Error { message: format!("project {project_id} has no sandbox") });
                return;
            };
            match ctx.provider.get_port_preview_url(sandbox_id, port).await {
                Ok(preview) => {
                    ctx.send_to(client_id, Outbound::PortPreviewUrlResult { url: preview.url, token: preview.token })
                }
                Err(e) => ctx.send_to(client_id, Outbound::Error { message: e.to_string() }),
            }
        }

        Inbound::TerminalCreate { project_id, cwd } => {
            relay_for_reply(ctx, client_id, project_id, BridgeOutbound::TerminalCreate { cwd }, |reply| match reply {
                BridgeInbound::TerminalCreated { terminal_id } => Some(Outbound::TerminalCreated { terminal_id }),
                BridgeInbound::TerminalError { error, .. } => Some(Outbound::Error { message: error }),
                _ => None,
            })
            .await
        }
        Inbound::TerminalList { project_id } => {
            relay_for_reply(ctx, client_id, project_id, BridgeOutbound::TerminalList, |reply| match reply {
                BridgeInbound::TerminalList { terminals } => Some(Outbound::TerminalList { terminals }),
                _ => None,
            })
            .await
        }
        Inbound::TerminalInput { project_id, terminal_id, data } => {
            forward(ctx, project_id, BridgeOutbound::TerminalInput { terminal_id, data }).await
        }
        Inbound::TerminalResize { project_id, terminal_id, cols, rows } => {
            forward(ctx, project_id, BridgeOutbound::TerminalResize { terminal_id, cols, rows }).await
        }
        Inbound::TerminalClose { project_id, terminal_id } => {
            forward(ctx, project_id, BridgeOutbound::TerminalClose { terminal_id }).await
        }

        // File, git, and layout operations follow the same relay pattern as
        // terminal ops: forward, then race the correlated bridge reply
        // against the operation timeout (§4.6).
        Inbound::FileList { project_id, path } => {
            relay_for_reply(ctx, client_id, project_id, BridgeOutbound::FileList { path: path.clone() }, |reply| match reply {
                BridgeInbound::FileListResult { entries } => Some(Outbound::FileListResult { path: path.clone(), entries }),
                _ => None,
            })
            .await
        }
        Inbound::FileRead { project_id, path } => {
            relay_for_reply(ctx, client_id, project_id, BridgeOutbound::FileRead { path: path.clone() }, |reply| match reply {
                BridgeInbound::FileReadResult { content } => Some(Outbound::FileReadResult { path: path.clone(), content }),
                _ => None,
            })
            .await
        }
        Inbound::FileWrite { project_id, path, content } => {
            relay_for_reply(ctx, client_id, project_id, BridgeOutbound::FileWrite { path: path.clone(), content }, |reply| match reply {
                BridgeInbound::FileWriteResult { ok } => Some(Outbound::FileWriteResult { path: path.clone(), ok }),
                _ => None,
            })
            .await
        }
        Inbound::FileCreate { project_id, path, is_dir } => {
            relay_for_reply(ctx, client_id, project_id, BridgeOutbound::FileCreate { path, is_dir }, |reply| match reply {
                BridgeInbound::FileOpResult { ok } => Some(Outbound::FileOpResult { ok }),
                _ => None,
            })
            .await
        }
        Inbound::FileRename { project_id, from, to } => {
            relay_for_reply(ctx, client_id, project_id, BridgeOutbound::FileRename { from, to }, |reply| match reply {
                BridgeInbound::FileOpResult { ok } => Some(Outbound::FileOpResult { ok }),
                _ => None,
            })
            .await
        }
        Inbound::FileDelete { project_id, path } => {
            relay_for_reply(ctx, client_id, project_id, BridgeOutbound::FileDelete { path }, |reply| match reply {
                BridgeInbound::FileOpResult { ok } => Some(Outbound::FileOpResult { ok }),
                _ => None,
            })
            .await
        }
        Inbound::FileMove { project_id, from, to } => {
            relay_for_reply(ctx, client_id, project_id, BridgeOutbound::FileMove { from, to }, |reply| match reply {
                BridgeInbound::FileOpResult { ok } => Some(Outbound::FileOpResult { ok }),
                _ => None,
            })
            .await
        }
        Inbound::FileSearch { project_id, query } => {
            relay_for_reply(ctx, client_id, project_id, BridgeOutbound::FileSearch { query }, |reply| match reply {
                BridgeInbound::FileSearchResult { matches } => Some(Outbound::FileSearchResult { matches }),
                _ => None,
            })
            .await
        }

        Inbound::GitStatus { project_id } => {
            relay_for_reply(ctx, client_id, project_id, BridgeOutbound::GitStatus, |reply| match reply {
                BridgeInbound::GitStatusResult { value } => Some(Outbound::GitStatusResult { value }),
                _ => None,
            })
            .await
        }
        Inbound::GitStage { project_id, paths } => {
            relay_for_reply(ctx, client_id, project_id, BridgeOutbound::GitStage { paths }, git_op_matcher).await
        }
        Inbound::GitUnstage { project_id, paths } => {
            relay_for_reply(ctx, client_id, project_id, BridgeOutbound::GitUnstage { paths }, git_op_matcher).await
        }
        Inbound::GitDiscard { project_id, paths } => {
            relay_for_reply(ctx, client_id, project_id, BridgeOutbound::GitDiscard { paths }, git_op_matcher).await
        }
        Inbound::GitCommit { project_id, message } => {
            relay_for_reply(ctx, client_id, project_id, BridgeOutbound::GitCommit { message }, git_op_matcher).await
        }
        Inbound::GitPush { project_id } => {
            relay_for_reply(ctx, client_id, project_id, BridgeOutbound::GitPush, git_op_matcher).await
        }
        Inbound::GitPull { project_id } => {
            relay_for_reply(ctx, client_id, project_id, BridgeOutbound::GitPull, git_op_matcher).await
        }
        Inbound::GitBranches { project_id } => {
            relay_for_reply(ctx, client_id, project_id, BridgeOutbound::GitBranches, |reply| match reply {
                BridgeInbound::GitBranchesResult { branches } => Some(Outbound::GitBranchesResult { branches }),
                _ => None,
            })
            .await
        }
        Inbound::GitCreateBranch { project_id, name } => {
            relay_for_reply(ctx, client_id, project_id, BridgeOutbound::GitCreateBranch { name }, git_op_matcher).await
        }
        Inbound::GitCheckout { project_id, branch } => {
            relay_for_reply(ctx, client_id, project_id, BridgeOutbound::GitCheckout { branch }, git_op_matcher).await
        }

        Inbound::LayoutSave { project_id, layout } => {
            relay_for_reply(ctx, client_id, project_id, BridgeOutbound::LayoutSave { layout }, |reply| match reply {
                BridgeInbound::FileOpResult { ok } => Some(Outbound::FileOpResult { ok }),
                _ => None,
            })
            .await
        }
        Inbound::LayoutLoad { project_id } => {
            relay_for_reply(ctx, client_id, project_id, BridgeOutbound::LayoutLoad, |reply| match reply {
                BridgeInbound::LayoutData { layout } => Some(Outbound::LayoutData { layout }),
                _ => None,
            })
            .await
        }
    }
}

fn git_op_matcher(reply: BridgeInbound) -> Option<Outbound> {
    match reply {
        BridgeInbound::GitOpResult { ok, message } => Some(Outbound::GitOpResult { ok, message }),
        _ => None,
    }
}

/// Reconnect (if needed), opportunistically reconcile status, remember the
/// subscription, and reply with the current sandbox id. A project still
/// `Creating` is never reconciled — its sandbox isn't up yet, so polling it
/// would only produce a spurious `Error` reading.
async fn subscribe_project(ctx: &std::sync::Arc<GatewayCtx>, client_id: ClientId, project_id: scp_core::ProjectId) {
    let Some(project) = ctx.registry.get(project_id) else {
        ctx.send_to(client_id, Outbound::Error { message: format!("project {project_id} not found") });
        return;
    };

    if let Some(sandbox_id) = project.sandbox_id {
        ctx.subscribe_sandbox(sandbox_id, client_id);

        if project.status != ProjectStatus::Creating {
            if !ctx.manager.is_connected(sandbox_id) {
                if let Ok(addr) = ctx.provider.bridge_address(sandbox_id).await {
                    if ctx.manager.connect(sandbox_id, &addr).await.is_ok() {
                        crate::fanout::ensure_bridge_fanout_bound(ctx);
                    }
                }
            }
            let _ = ctx.registry.reconcile_sandbox_status(project_id).await;
        }
    }

    ctx.send_to(client_id, Outbound::Subscribed { project_id, sandbox_id: project.sandbox_id });
}

/// Send a command to a project's sandbox without waiting on a reply.
async fn forward(ctx: &GatewayCtx, project_id: scp_core::ProjectId, command: BridgeOutbound) {
    let Some(sandbox_id) = ctx.project_sandbox(project_id) else { return };
    if let Err(e) = ctx.manager.send(sandbox_id, command).await {
        tracing::debug!(%e, "failed to forward command to sandbox");
    }
}

/// Send a command, then race a fresh subscription to the raw bridge stream
/// against a timeout, returning the first reply `matcher` accepts.
async fn relay_for_reply<F>(
    ctx: &GatewayCtx,
    client_id: ClientId,
    project_id: scp_core::ProjectId,
    command: BridgeOutbound,
    matcher: F,
) where
    F: Fn(BridgeInbound) -> Option<Outbound>,
{
    let Some(sandbox_id) = ctx.project_sandbox(project_id) else {
        ctx.send_to(client_id, Outbound::Error { message: format!("project {project_id} has no sandbox") });
        return;
    };

    let mut rx = ctx.manager.subscribe();
    if let Err(e) = ctx.manager.send(sandbox_id, command).await {
        ctx.send_to(client_id, Outbound::Error { message: e.to_string() });
        return;
    }

    let wait = async {
        loop {
            match rx.recv().await {
                Ok(scp_bridge::BridgeEvent::Inbound { sandbox_id: sid, event }) if sid == sandbox_id => {
                    if let Some(reply) = matcher(event) {
                        return Some(reply);
                    }
                }
                Ok(_) => continue,
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    };

    match tokio::time::timeout(ctx.operation_timeout, wait).await {
        Ok(Some(reply)) => ctx.send_to(client_id, reply),
        Ok(None) => ctx.send_to(client_id, Outbound::Error { message: "sandbox connection closed".to_string() }),
        Err(_) => ctx.send_to(client_id, Outbound::Error { message: "sandbox did not reply in time".to_string() }),
    }
}
