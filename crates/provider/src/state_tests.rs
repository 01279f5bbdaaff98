// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use yare::parameterized;

#[parameterized(
    started = { ProviderState::Started, ProjectStatus::Running },
    stopped = { ProviderState::Stopped, ProjectStatus::Stopped },
    starting = { ProviderState::Starting, ProjectStatus::Starting },
    stopping = { ProviderState::Stopping, ProjectStatus::Stopped },
    archived = { ProviderState::Archived, ProjectStatus::Stopped },
    error = { ProviderState::Error, ProjectStatus::Error },
)]
fn mapping_table_is_fixed(raw: ProviderState, expected: ProjectStatus) {
    assert_eq!(raw.to_project_status(), expected);
}
