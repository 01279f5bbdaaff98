// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[tokio::test]
async fn create_records_a_call_and_tracks_state() {
    let provider = FakeProvider::new();
    let id = provider.create_sandbox("snap", "demo", None).await.unwrap();
    assert_eq!(provider.get_sandbox_state(id).await.unwrap(), ProviderState::Started);
    assert_eq!(provider.calls(), vec![ProviderCall::Create { project_name: "demo".into() }]);
}

#[tokio::test]
async fn blocked_delete_returns_has_dependents() {
    let provider = FakeProvider::new();
    let id = provider.create_sandbox("snap", "demo", None).await.unwrap();
    provider.block_delete(id);
    let err = provider.delete_sandbox(id).await.unwrap_err();
    assert!(matches!(err, ProviderError::HasDependents));
    // Sandbox still exists — a blocked delete never removes state.
    assert!(provider.get_sandbox_state(id).await.is_ok());
}

#[tokio::test]
async fn unblocked_delete_removes_sandbox_state() {
    let provider = FakeProvider::new();
    let id = provider.create_sandbox("snap", "demo", None).await.unwrap();
    provider.delete_sandbox(id).await.unwrap();
    assert!(matches!(provider.get_sandbox_state(id).await, Err(ProviderError::NotFound(_))));
}

#[tokio::test]
async fn fork_produces_a_new_sandbox_id() {
    let provider = FakeProvider::new();
    let src = provider.create_sandbox("snap", "root", None).await.unwrap();
    let forked = provider.fork_sandbox(src, "feature-x", "root").await.unwrap();
    assert_ne!(src, forked);
}
