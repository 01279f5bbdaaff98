// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Raw provider states and their fixed mapping onto `ProjectStatus` (§4.1).

use scp_core::ProjectStatus;
use serde::Deserialize;

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ProviderState {
    Started,
    Stopped,
    Starting,
    Stopping,
    Archived,
    Error,
}

impl ProviderState {
    /// `started→running, stopped→stopped, starting→starting,
    /// stopping→stopped, archived→stopped, error→error`.
    pub fn to_project_status(self) -> ProjectStatus {
        match self {
            ProviderState::Started => ProjectStatus::Running,
            ProviderState::Stopped => ProjectStatus::Stopped,
            ProviderState::Starting => ProjectStatus::Starting,
            ProviderState::Stopping => ProjectStatus::Stopped,
            ProviderState::Archived => ProjectStatus::Stopped,
            ProviderState::Error => ProjectStatus::Error,
        }
    }
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
