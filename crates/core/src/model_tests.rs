// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn project_slug_source_is_fork_root() {
    let root = ProjectId::new();
    let mut p = sample_project();
    p.forked_from_id = Some(root);
    assert_eq!(p.slug_source_id(), root);
}

#[test]
fn project_slug_source_is_self_when_not_a_fork() {
    let p = sample_project();
    assert_eq!(p.slug_source_id(), p.id);
}

#[test]
fn project_tombstone_detection() {
    let mut p = sample_project();
    assert!(!p.is_tombstone());
    p.deleted_at = Some(now_ms());
    assert!(p.is_tombstone());
}

#[test]
fn tool_result_message_is_keyed_by_tool_use_id() {
    let msg = Message::tool_result(ChatId::new(), "tool-1", serde_json::json!({"ok": true}));
    match &msg.content[0] {
        ContentBlock::ToolResult { tool_use_id, .. } => assert_eq!(tool_use_id, "tool-1"),
        other => panic!("unexpected content block: {other:?}"),
    }
}

#[test]
fn project_status_display() {
    assert_eq!(ProjectStatus::Running.to_string(), "running");
    assert_eq!(ChatStatus::Error.to_string(), "error");
}

fn sample_project() -> Project {
    Project {
        id: ProjectId::new(),
        user_id: UserId::new(),
        name: "demo".into(),
        sandbox_id: None,
        status: ProjectStatus::Creating,
        status_error: None,
        agent_type: "default".into(),
        git_repo: None,
        forked_from_id: None,
        branch_name: None,
        deleted_at: None,
        created_at: now_ms(),
        updated_at: now_ms(),
    }
}
