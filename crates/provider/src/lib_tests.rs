// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::fake::FakeProvider;

#[tokio::test]
async fn trait_object_is_usable_through_dyn_dispatch() {
    let provider: std::sync::Arc<dyn SandboxProvider> = std::sync::Arc::new(FakeProvider::new());
    let id = provider.create_sandbox("snap", "demo", None).await.unwrap();
    let state = provider.get_sandbox_state(id).await.unwrap();
    assert_eq!(state, ProviderState::Started);
}
