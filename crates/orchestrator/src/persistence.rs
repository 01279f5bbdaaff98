// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Chat/message persistence, sharing the registry's `Store` contract. Like
//! `Registry::snapshot_and_persist`, every write loads the whole snapshot,
//! replaces the one table it owns, and saves — the registry does the same
//! for `projects`. Both components writing through one `JsonStore` file is
//! a known single-process simplification (see DESIGN.md).

use scp_core::{Chat, ChatId, Message};
use scp_registry::store::{Store, StoreError};
use std::sync::Arc;

pub(crate) struct Persistence {
    store: Arc<dyn Store>,
}

impl Persistence {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub fn get_chat(&self, chat_id: ChatId) -> Result<Option<Chat>, StoreError> {
        Ok(self.store.load()?.chats.into_iter().find(|c| c.id == chat_id))
    }

    pub fn save_chat(&self, chat: Chat) -> Result<(), StoreError> {
        let mut snapshot = self.store.load()?;
        if let Some(existing) = snapshot.chats.iter_mut().find(|c| c.id == chat.id) {
            *existing = chat;
        } else {
            snapshot.chats.push(chat);
        }
        self.store.save(&snapshot)
    }

    pub fn append_message(&self, message: Message) -> Result<(), StoreError> {
        let mut snapshot = self.store.load()?;
        snapshot.messages.push(message);
        self.store.save(&snapshot)
    }

    pub fn messages_for_chat(&self, chat_id: ChatId) -> Result<Vec<Message>, StoreError> {
        Ok(self.store.load()?.messages.into_iter().filter(|m| m.chat_id == chat_id).collect())
    }
}
