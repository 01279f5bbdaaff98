// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Entity identifiers for the control plane's data model.

crate::define_id! {
    /// Identifies a `User` row.
    pub struct UserId("user-");
}

crate::define_id! {
    /// Identifies a `Project` row. Also used, unprefixed-stripped, as the
    /// fallback slug source when a project has no human-readable name.
    pub struct ProjectId("proj-");
}

crate::define_id! {
    /// Identifies a `Chat` (conversation) row.
    pub struct ChatId("chat-");
}

crate::define_id! {
    /// Identifies a `Message` row.
    pub struct MessageId("msg-");
}

crate::define_id! {
    /// Opaque sandbox identifier minted by the Sandbox Provider Adapter.
    pub struct SandboxId("sbx-");
}

crate::define_id! {
    /// Identifies one browser client connection to the Client Gateway.
    pub struct ClientId("cli-");
}

#[cfg(test)]
#[path = "ids_tests.rs"]
mod tests;
