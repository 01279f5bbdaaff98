// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use crate::stderr_ring::StderrRing;
use scp_core::{ChatMode, ClientId, SandboxId};
use std::collections::HashSet;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Starting,
    AwaitingFirst,
    Streaming,
    Completed,
    Errored,
    Retrying,
}

/// In-memory state for one chat's active turn (§3, §5). Owned exclusively
/// by the orchestrator; never persisted.
pub(crate) struct Session {
    pub state: SessionState,
    pub sandbox_id: SandboxId,
    pub subscribers: HashSet<ClientId>,
    pub received_first_message: bool,
    pub retried: bool,
    /// The turn's original `mode`/`model`, reused verbatim on retry so a
    /// restart doesn't silently fall back to defaults.
    pub mode: Option<ChatMode>,
    pub model: Option<String>,
    pub stderr: StderrRing,
    /// Cancelled whenever a new timer is armed or the handler is torn down,
    /// the single idempotent cleanup primitive per §4.5 [ADDED].
    pub timer_cancel: CancellationToken,
}

impl Session {
    pub fn new(sandbox_id: SandboxId) -> Self {
        Self {
            state: SessionState::Idle,
            sandbox_id,
            subscribers: HashSet::new(),
            received_first_message: false,
            retried: false,
            mode: None,
            model: None,
            stderr: StderrRing::new(),
            timer_cancel: CancellationToken::new(),
        }
    }

    /// Cancel the outstanding timer and install a fresh token for the next one.
    pub fn rearm(&mut self) -> CancellationToken {
        self.timer_cancel.cancel();
        self.timer_cancel = CancellationToken::new();
        self.timer_cancel.clone()
    }
}
