// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Shared identifiers, data model, clock abstraction, and event bus for the
//! sandbox session control plane.

pub mod macros;

pub mod clock;
pub mod config;
pub mod event;
pub mod id;
pub mod ids;
pub mod model;
pub mod slug;

pub use clock::{Clock, FakeClock, SystemClock};
pub use config::{Config, ConfigError};
pub use event::{emit, Event, EventBus};
pub use ids::{ChatId, ClientId, MessageId, ProjectId, SandboxId, UserId};
pub use model::{
    now_ms, Chat, ChatMode, ChatStatus, ContentBlock, EpochMs, Message, MessageRole, Project,
    ProjectStatus, Setting, SettingKey, User,
};
pub use slug::slug;
