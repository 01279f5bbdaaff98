// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn claude_message_round_trips_as_inbound() {
    let raw = serde_json::json!({
        "type": "claude_message",
        "chat_id": "chat-1",
        "data": {"type": "assistant", "message": {"content": []}},
    });
    let parsed: Inbound = serde_json::from_value(raw).unwrap();
    match parsed {
        Inbound::ClaudeMessage { chat_id, .. } => assert_eq!(chat_id, "chat-1"),
        other => panic!("unexpected: {other:?}"),
    }
}

#[test]
fn system_init_event_parses_session_id() {
    let raw = serde_json::json!({"type": "system", "subtype": "init", "session_id": "s-1"});
    let event: ClaudeEvent = serde_json::from_value(raw).unwrap();
    match event {
        ClaudeEvent::System { subtype, session_id } => {
            assert_eq!(subtype, "init");
            assert_eq!(session_id.as_deref(), Some("s-1"));
        }
        other => panic!("unexpected: {other:?}"),
    }
}

#[test]
fn result_event_parses_cost_and_turns() {
    let raw = serde_json::json!({
        "type": "result",
        "is_error": false,
        "num_turns": 1,
        "duration_ms": 120,
        "total_cost_usd": 0.01,
    });
    let event: ClaudeEvent = serde_json::from_value(raw).unwrap();
    match event {
        ClaudeEvent::Result { is_error, num_turns, duration_ms, total_cost_usd, .. } => {
            assert!(!is_error);
            assert_eq!(num_turns, 1);
            assert_eq!(duration_ms, 120);
            assert!((total_cost_usd - 0.01).abs() < f64::EPSILON);
        }
        other => panic!("unexpected: {other:?}"),
    }
}

#[test]
fn send_prompt_serializes_with_tagged_type() {
    let cmd = Outbound::SendPrompt {
        chat_id: "chat-1".into(),
        prompt: "Hi".into(),
        agent_session_id: None,
        mode: None,
        model: None,
    };
    let json = serde_json::to_value(&cmd).unwrap();
    assert_eq!(json["type"], "send_prompt");
    assert_eq!(json["prompt"], "Hi");
}
