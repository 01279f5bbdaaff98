// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn tail_returns_everything_when_under_the_limit() {
    let mut ring = StderrRing::new();
    ring.push("short message");
    assert_eq!(ring.tail(), "short message");
}

#[test]
fn tail_truncates_to_the_last_500_chars() {
    let mut ring = StderrRing::new();
    ring.push(&"a".repeat(1000));
    let tail = ring.tail();
    assert_eq!(tail.chars().count(), 500);
    assert!(tail.chars().all(|c| c == 'a'));
}

#[test]
fn push_evicts_old_bytes_once_the_ring_cap_is_exceeded() {
    let mut ring = StderrRing::new();
    ring.push(&"x".repeat(20 * 1024));
    assert!(ring.buf.len() <= 16 * 1024);
}

#[test]
fn multiple_pushes_accumulate() {
    let mut ring = StderrRing::new();
    ring.push("one ");
    ring.push("two ");
    ring.push("three");
    assert_eq!(ring.tail(), "one two three");
}
