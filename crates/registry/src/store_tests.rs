// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use scp_core::{now_ms, Project, ProjectId, ProjectStatus, UserId};

fn sample_project() -> Project {
    Project {
        id: ProjectId::new(),
        user_id: UserId::new(),
        name: "demo".to_string(),
        sandbox_id: None,
        status: ProjectStatus::Creating,
        status_error: None,
        agent_type: "claude".to_string(),
        git_repo: None,
        forked_from_id: None,
        branch_name: None,
        deleted_at: None,
        created_at: now_ms(),
        updated_at: now_ms(),
    }
}

#[test]
fn loading_a_missing_file_returns_an_empty_snapshot() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = JsonStore::new(dir.path().join("state.json"));
    let snapshot = store.load().expect("load");
    assert!(snapshot.projects.is_empty());
}

#[test]
fn save_then_load_round_trips() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = JsonStore::new(dir.path().join("state.json"));

    let mut snapshot = StoreSnapshot::default();
    snapshot.projects.push(sample_project());
    store.save(&snapshot).expect("save");

    let loaded = store.load().expect("load");
    assert_eq!(loaded.projects.len(), 1);
    assert_eq!(loaded.projects[0].name, "demo");
}

#[test]
fn second_save_rotates_the_previous_file_into_bak() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("state.json");
    let store = JsonStore::new(&path);

    let mut first = StoreSnapshot::default();
    first.projects.push(sample_project());
    store.save(&first).expect("save first");

    let mut second = StoreSnapshot::default();
    second.projects.push(sample_project());
    second.projects.push(sample_project());
    store.save(&second).expect("save second");

    let bak = path.with_extension("bak");
    assert!(bak.exists());
    let bak_snapshot: Envelope =
        serde_json::from_slice(&std::fs::read(&bak).expect("read bak")).expect("parse bak");
    assert_eq!(bak_snapshot.snapshot.projects.len(), 1);

    let current = store.load().expect("load current");
    assert_eq!(current.projects.len(), 2);
}

#[test]
fn no_tmp_file_survives_a_successful_save() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("state.json");
    let store = JsonStore::new(&path);
    store.save(&StoreSnapshot::default()).expect("save");
    assert!(!tmp_path_for(&path).exists());
}
