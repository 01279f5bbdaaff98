// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn ids_carry_their_type_prefix() {
    assert!(ProjectId::new().as_str().starts_with("proj-"));
    assert!(ChatId::new().as_str().starts_with("chat-"));
    assert!(MessageId::new().as_str().starts_with("msg-"));
    assert!(UserId::new().as_str().starts_with("user-"));
    assert!(SandboxId::new().as_str().starts_with("sbx-"));
    assert!(ClientId::new().as_str().starts_with("cli-"));
}

#[test]
fn ids_are_unique() {
    assert_ne!(ProjectId::new(), ProjectId::new());
}

#[test]
fn ids_round_trip_through_string() {
    let id = ProjectId::new();
    let parsed = ProjectId::from_string(id.as_str());
    assert_eq!(id, parsed);
}

#[test]
fn ids_usable_as_hash_map_keys_by_borrowed_str() {
    use std::collections::HashMap;
    let id = ChatId::new();
    let key = id.as_str().to_string();
    let mut map: HashMap<ChatId, u32> = HashMap::new();
    map.insert(id, 7);
    assert_eq!(map.get(key.as_str()), Some(&7));
}
