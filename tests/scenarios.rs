// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! End-to-end walkthroughs of the six concrete scenarios: a prompt that
//! completes cleanly, a bridge that stalls and gets retried, a bridge that
//! crashes mid-turn, a three-way fork family torn down leaf-first, a
//! subscribe that lands mid-provision, and a subscribe that pre-warms a
//! cold bridge connection. Each test drives the real `registry` /
//! `orchestrator` / `gateway` stack over a real TCP socket against a fake
//! bridge, the same way a browser client and a sandbox's bridge process
//! would talk to the daemon in production.

use futures_util::{SinkExt, StreamExt};
use scp_core::{now_ms, Chat, ChatId, ChatMode, ChatStatus, ClientId, EventBus, MessageRole, ProjectStatus, UserId};
use scp_gateway::Gateway;
use scp_manager::SandboxManager;
use scp_orchestrator::{Orchestrator, OrchestratorConfig, PromptRequest};
use scp_provider::fake::FakeProvider;
use scp_registry::store::{JsonStore, Store};
use scp_registry::Registry;
use scp_wire::bridge::Inbound as BridgeInbound;
use scp_wire::browser::{Inbound as BrowserInbound, Outbound as BrowserOutbound};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio_tungstenite::tungstenite::Message as WsMessage;

struct Harness {
    store: Arc<dyn Store>,
    registry: Arc<Registry>,
    manager: Arc<SandboxManager>,
    orchestrator: Arc<Orchestrator>,
    events: EventBus,
    provider: Arc<FakeProvider>,
}

fn new_harness(initial_ms: u64, activity_ms: u64) -> Harness {
    let dir = tempfile::tempdir().expect("tempdir");
    let store: Arc<dyn Store> = Arc::new(JsonStore::new(dir.path().join("state.json")));
    let provider = Arc::new(FakeProvider::new());
    let events = EventBus::default();
    let registry =
        Arc::new(Registry::new(Arc::clone(&store), Arc::clone(&provider) as Arc<dyn scp_provider::SandboxProvider>, events.clone()).expect("registry"));
    let manager = Arc::new(SandboxManager::new());
    let config = OrchestratorConfig {
        initial_timeout: Duration::from_millis(initial_ms),
        activity_timeout: Duration::from_millis(activity_ms),
    };
    let orchestrator = Arc::new(Orchestrator::new(
        Arc::clone(&registry),
        Arc::clone(&manager),
        Arc::clone(&store),
        events.clone(),
        config,
    ));

    let forward = Arc::clone(&orchestrator);
    let mut rx = manager.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = rx.recv().await {
            forward.handle_bridge_event(event).await;
        }
    });

    Harness { store, registry, manager, orchestrator, events, provider }
}

async fn bind_fake_bridge() -> (String, TcpListener) {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local_addr");
    (format!("ws://{addr}"), listener)
}

async fn provision_chat(h: &Harness, bridge_url: &str) -> (scp_core::ProjectId, ChatId) {
    let project = h.registry.create(UserId::new(), "demo", "claude", None).expect("create");
    let project = h.registry.start_or_provision_sandbox(project.id, "snap-1").await.expect("provision");
    let sandbox_id = project.sandbox_id.expect("sandbox assigned");
    h.manager.connect(sandbox_id, bridge_url).await.expect("connect");

    let chat = Chat {
        id: ChatId::new(),
        project_id: project.id,
        title: "scenario chat".to_string(),
        status: ChatStatus::Idle,
        agent_session_id: None,
        mode: Some(ChatMode::Agent),
        created_at: now_ms(),
        updated_at: now_ms(),
    };
    let chat_id = chat.id;
    let mut snapshot = h.store.load().expect("load");
    snapshot.chats.push(chat);
    h.store.save(&snapshot).expect("save");
    (project.id, chat_id)
}

fn bridge_text(event: &BridgeInbound) -> WsMessage {
    WsMessage::Text(serde_json::to_string(event).expect("serialize").into())
}

fn browser_text(event: &BrowserInbound) -> WsMessage {
    WsMessage::Text(serde_json::to_string(event).expect("serialize").into())
}

async fn next_browser_message(
    client: &mut (impl futures_util::Stream<Item = Result<WsMessage, tokio_tungstenite::tungstenite::Error>> + Unpin),
) -> BrowserOutbound {
    loop {
        let frame = tokio::time::timeout(Duration::from_secs(2), client.next())
            .await
            .expect("timed out waiting for a browser frame")
            .expect("stream ended")
            .expect("ws error");
        if let WsMessage::Text(text) = frame {
            return serde_json::from_str(&text).expect("valid browser outbound frame");
        }
    }
}

/// S1 — Happy prompt: init, one assistant block, then a clean result.
/// Chat gains a session id, ends `completed`, and the assistant message
/// lands alongside a system summary carrying the spec's metadata keys.
#[tokio::test]
async fn s1_happy_prompt_completes_and_persists_the_transcript() {
    let h = new_harness(2_000, 2_000);
    let (bridge_url, bridge_listener) = bind_fake_bridge().await;
    let (_project_id, chat_id) = provision_chat(&h, &bridge_url).await;

    let bridge = tokio::spawn(async move {
        let (stream, _) = bridge_listener.accept().await.expect("accept");
        let mut ws = tokio_tungstenite::accept_async(stream).await.expect("handshake");
        let _prompt = ws.next().await.expect("stream ended").expect("ws error");

        ws.send(bridge_text(&BridgeInbound::ClaudeMessage {
            chat_id: chat_id.to_string(),
            data: serde_json::json!({"type": "system", "subtype": "init", "session_id": "s-1"}),
        }))
        .await
        .expect("send init");

        ws.send(bridge_text(&BridgeInbound::ClaudeMessage {
            chat_id: chat_id.to_string(),
            data: serde_json::json!({
                "type": "assistant",
                "message": {"content": [{"type": "text", "text": "Hello"}], "model": "claude"}
            }),
        }))
        .await
        .expect("send assistant");

        ws.send(bridge_text(&BridgeInbound::ClaudeMessage {
            chat_id: chat_id.to_string(),
            data: serde_json::json!({
                "type": "result",
                "is_error": false,
                "num_turns": 1,
                "duration_ms": 120,
                "total_cost_usd": 0.01,
            }),
        }))
        .await
        .expect("send result");
    });

    h.orchestrator
        .handle_send_prompt(PromptRequest { chat_id, client_id: ClientId::new(), prompt: "Hi".to_string(), mode: None, model: None })
        .await
        .expect("send prompt");

    tokio::time::timeout(Duration::from_secs(2), bridge).await.expect("timed out").expect("bridge panicked");
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert_eq!(h.orchestrator.state_of(chat_id), None, "cleanup should drop the session");

    let snapshot = h.store.load().expect("load");
    let chat = snapshot.chats.iter().find(|c| c.id == chat_id).expect("chat exists");
    assert_eq!(chat.status, ChatStatus::Completed);
    assert_eq!(chat.agent_session_id.as_deref(), Some("s-1"));

    let messages: Vec<_> = snapshot.messages.iter().filter(|m| m.chat_id == chat_id).collect();
    assert!(messages.iter().any(|m| m.role == MessageRole::User));
    assert!(messages.iter().any(|m| m.role == MessageRole::Assistant));
    let summary = messages.iter().find(|m| m.role == MessageRole::System).expect("system summary present");
    assert_eq!(summary.metadata.get("costUsd").and_then(|v| v.as_f64()), Some(0.01));
    assert_eq!(summary.metadata.get("durationMs").and_then(|v| v.as_u64()), Some(120));
    assert_eq!(summary.metadata.get("numTurns").and_then(|v| v.as_u64()), Some(1));
}

/// S2 — Stall then retry: no events at all. The initial timeout fires one
/// retry with the same prompt; a second silence past the activity timeout
/// ends the chat in error with a "did not respond" message.
#[tokio::test]
async fn s2_a_silent_bridge_retries_once_then_errors() {
    let h = new_harness(80, 150);
    let (bridge_url, bridge_listener) = bind_fake_bridge().await;
    let (_project_id, chat_id) = provision_chat(&h, &bridge_url).await;

    let bridge = tokio::spawn(async move {
        let (stream, _) = bridge_listener.accept().await.expect("accept");
        let mut ws = tokio_tungstenite::accept_async(stream).await.expect("handshake");
        // First send_prompt: the original. Say nothing.
        let first = ws.next().await.expect("stream ended").expect("ws error");
        // Retry: the same prompt text, re-issued once the initial timeout fires.
        let second = ws.next().await.expect("stream ended").expect("ws error");
        (first, second)
    });

    h.orchestrator
        .handle_send_prompt(PromptRequest { chat_id, client_id: ClientId::new(), prompt: "Hi".to_string(), mode: None, model: None })
        .await
        .expect("send prompt");

    let (first, second) =
        tokio::time::timeout(Duration::from_secs(2), bridge).await.expect("timed out").expect("bridge panicked");
    let first_prompt = match first { WsMessage::Text(t) => t, other => panic!("unexpected frame: {other:?}") };
    let second_prompt = match second { WsMessage::Text(t) => t, other => panic!("unexpected frame: {other:?}") };
    assert!(first_prompt.contains("\"Hi\""));
    assert!(second_prompt.contains("\"Hi\""), "retry must re-issue the same prompt text");

    tokio::time::sleep(Duration::from_millis(300)).await;

    assert_eq!(h.orchestrator.state_of(chat_id), None);
    let snapshot = h.store.load().expect("load");
    let chat = snapshot.chats.iter().find(|c| c.id == chat_id).expect("chat exists");
    assert_eq!(chat.status, ChatStatus::Error);
}

/// S3 — Crash after first message: init plus one assistant block, then a
/// nonzero exit. A single retry is issued with the fixed continuation
/// prompt and the session id already observed is preserved.
#[tokio::test]
async fn s3_a_crash_after_the_first_message_retries_with_continuation_prompt() {
    let h = new_harness(2_000, 2_000);
    let (bridge_url, bridge_listener) = bind_fake_bridge().await;
    let (_project_id, chat_id) = provision_chat(&h, &bridge_url).await;

    let bridge = tokio::spawn(async move {
        let (stream, _) = bridge_listener.accept().await.expect("accept");
        let mut ws = tokio_tungstenite::accept_async(stream).await.expect("handshake");
        let _prompt = ws.next().await.expect("stream ended").expect("ws error");

        ws.send(bridge_text(&BridgeInbound::ClaudeMessage {
            chat_id: chat_id.to_string(),
            data: serde_json::json!({"type": "system", "subtype": "init", "session_id": "s-2"}),
        }))
        .await
        .expect("send init");
        ws.send(bridge_text(&BridgeInbound::ClaudeMessage {
            chat_id: chat_id.to_string(),
            data: serde_json::json!({
                "type": "assistant",
                "message": {"content": [{"type": "text", "text": "working on it"}], "model": "claude"}
            }),
        }))
        .await
        .expect("send assistant");
        ws.send(bridge_text(&BridgeInbound::ClaudeExit { chat_id: chat_id.to_string(), code: 1 })).await.expect("send exit");

        let retry = ws.next().await.expect("stream ended").expect("ws error");
        ws.send(bridge_text(&BridgeInbound::ClaudeMessage {
            chat_id: chat_id.to_string(),
            data: serde_json::json!({"type": "result", "is_error": false, "num_turns": 1}),
        }))
        .await
        .expect("send result");
        retry
    });

    h.orchestrator
        .handle_send_prompt(PromptRequest { chat_id, client_id: ClientId::new(), prompt: "Hi".to_string(), mode: None, model: None })
        .await
        .expect("send prompt");

    let retry = tokio::time::timeout(Duration::from_secs(2), bridge).await.expect("timed out").expect("bridge panicked");
    let retry_prompt = match retry { WsMessage::Text(t) => t, other => panic!("unexpected frame: {other:?}") };
    assert!(
        retry_prompt.contains("Continue from where you left off. You had crashed and were restarted."),
        "retry must use the fixed continuation prompt, got: {retry_prompt}"
    );

    tokio::time::sleep(Duration::from_millis(50)).await;
    let snapshot = h.store.load().expect("load");
    let chat = snapshot.chats.iter().find(|c| c.id == chat_id).expect("chat exists");
    assert_eq!(chat.status, ChatStatus::Completed);
    assert_eq!(chat.agent_session_id.as_deref(), Some("s-2"), "session id observed before the crash must survive the retry");
}

/// S4 — Fork family cleanup: a root with two forks, torn down leaf-first.
/// The root's sandbox only disappears once the last fork referencing it
/// is gone, and the root's tombstone is hard-deleted in the same sweep.
#[tokio::test]
async fn s4_deleting_a_fork_family_leaf_first_sweeps_the_root_last() {
    let h = new_harness(2_000, 2_000);
    let root = h.registry.create(UserId::new(), "demo", "claude", None).expect("create root");
    let root = h.registry.start_or_provision_sandbox(root.id, "snap-1").await.expect("provision root");
    let root_sandbox = root.sandbox_id.expect("root sandbox");

    let fork_one = h.registry.fork_project(root.id, "branch-1").await.expect("fork one");
    let fork_two = h.registry.fork_project(root.id, "branch-2").await.expect("fork two");
    assert_eq!(fork_one.forked_from_id, Some(root.id));
    assert_eq!(fork_two.forked_from_id, Some(root.id));

    h.provider.block_delete(root_sandbox);

    h.registry.remove(root.id).await.expect("delete root");
    let tombstoned_root = h.registry.get(root.id).expect("root still present as a tombstone");
    assert!(tombstoned_root.deleted_at.is_some());
    assert_eq!(tombstoned_root.sandbox_id, Some(root_sandbox));

    h.registry.remove(fork_one.id).await.expect("delete fork one");
    assert!(h.registry.get(fork_one.id).is_none(), "fork one is hard-deleted");
    assert!(h.registry.get(root.id).is_some(), "root's sandbox is still referenced by fork two");

    // Fork two was the last live reference to the root's sandbox; unblock
    // it the way the real provider would once it sees no dependents left.
    h.provider.unblock_delete(root_sandbox);
    h.registry.remove(fork_two.id).await.expect("delete fork two");
    assert!(h.registry.get(fork_two.id).is_none(), "fork two is hard-deleted");
    assert!(h.registry.get(root.id).is_none(), "orphan sweep hard-deletes the root's tombstone once nothing references it");
}

/// S5 — Subscribe while provisioning: a `creating` project with no
/// sandbox yet. The reply reports a null sandbox id and the status is
/// left untouched — no reconcile, no connect attempt.
#[tokio::test]
async fn s5_subscribing_while_creating_reports_no_sandbox_and_does_not_reconcile() {
    let h = new_harness(2_000, 2_000);
    let project = h.registry.create(UserId::new(), "demo", "claude", None).expect("create");
    assert_eq!(project.status, ProjectStatus::Creating);
    assert!(project.sandbox_id.is_none());

    let gateway =
        Gateway::with_operation_timeout(Arc::clone(&h.registry), Arc::clone(&h.manager), Arc::clone(&h.orchestrator), h.events.clone(), "snap-1", Duration::from_secs(1));
    let gateway_listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let gateway_addr = gateway_listener.local_addr().expect("addr");
    tokio::spawn(gateway.run(gateway_listener));

    let (client, _) = tokio_tungstenite::connect_async(format!("ws://{gateway_addr}")).await.expect("client connect");
    let (mut sink, mut source) = client.split();

    sink.send(browser_text(&BrowserInbound::SubscribeProject { project_id: project.id })).await.expect("subscribe");
    let reply = next_browser_message(&mut source).await;
    assert!(matches!(reply, BrowserOutbound::Subscribed { project_id: p, sandbox_id: None } if p == project.id));

    assert_eq!(h.registry.get(project.id).expect("still there").status, ProjectStatus::Creating);
}

/// S6 — Reconnect pre-warm: subscribing to a `running` project with a
/// sandbox that has no live bridge connection dials it before replying,
/// so the very next terminal-affecting command no longer needs to dial.
#[tokio::test]
async fn s6_subscribing_to_a_running_project_pre_warms_the_bridge_connection() {
    let h = new_harness(2_000, 2_000);
    let (bridge_url, bridge_listener) = bind_fake_bridge().await;
    let project = h.registry.create(UserId::new(), "demo", "claude", None).expect("create");
    let project = h.registry.start_or_provision_sandbox(project.id, "snap-1").await.expect("provision");
    let sandbox_id = project.sandbox_id.expect("sandbox assigned");
    assert_eq!(project.status, ProjectStatus::Starting);

    h.provider.set_bridge_address(sandbox_id, &bridge_url);

    let bridge_accept = tokio::spawn(async move {
        let (stream, _) = bridge_listener.accept().await.expect("accept");
        let _ws = tokio_tungstenite::accept_async(stream).await.expect("handshake");
    });

    assert!(!h.manager.is_connected(sandbox_id), "no bridge dialed yet");

    let gateway =
        Gateway::with_operation_timeout(Arc::clone(&h.registry), Arc::clone(&h.manager), Arc::clone(&h.orchestrator), h.events.clone(), "snap-1", Duration::from_secs(1));
    let gateway_listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let gateway_addr = gateway_listener.local_addr().expect("addr");
    tokio::spawn(gateway.run(gateway_listener));

    let (client, _) = tokio_tungstenite::connect_async(format!("ws://{gateway_addr}")).await.expect("client connect");
    let (mut sink, mut source) = client.split();

    sink.send(browser_text(&BrowserInbound::SubscribeProject { project_id: project.id })).await.expect("subscribe");
    let reply = next_browser_message(&mut source).await;
    assert!(matches!(reply, BrowserOutbound::Subscribed { sandbox_id: Some(s), .. } if s == sandbox_id));

    tokio::time::timeout(Duration::from_secs(2), bridge_accept).await.expect("timed out").expect("bridge accept panicked");
    assert!(h.manager.is_connected(sandbox_id), "subscribing to a running project must pre-warm its bridge connection");

    // A follow-up command against the same sandbox must not need to dial
    // again; `is_connected` staying true across the call is the only
    // externally observable signature of that, since the manager does
    // not expose a dial counter.
    sink.send(browser_text(&BrowserInbound::TerminalList { project_id: project.id })).await.expect("terminal_list");
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(h.manager.is_connected(sandbox_id));
}
