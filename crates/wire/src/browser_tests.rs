// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use scp_core::ProjectId;

#[test]
fn subscribe_project_round_trips() {
    let project_id = ProjectId::new();
    let msg = Inbound::SubscribeProject { project_id };
    let json = serde_json::to_value(&msg).unwrap();
    assert_eq!(json["type"], "subscribe_project");
    let back: Inbound = serde_json::from_value(json).unwrap();
    assert_eq!(back, msg);
}

#[test]
fn subscribed_carries_nullable_sandbox_id() {
    let out = Outbound::Subscribed { project_id: ProjectId::new(), sandbox_id: None };
    let json = serde_json::to_value(&out).unwrap();
    assert_eq!(json["sandbox_id"], serde_json::Value::Null);
}

#[test]
fn unknown_type_tag_fails_to_parse() {
    let raw = serde_json::json!({"type": "not_a_real_message"});
    let result: Result<Inbound, _> = serde_json::from_value(raw);
    assert!(result.is_err());
}
