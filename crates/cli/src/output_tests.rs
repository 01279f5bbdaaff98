// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn format_time_ago_zero_is_dash() {
    assert_eq!(format_time_ago(0), "-");
}

#[test]
fn format_time_ago_buckets_by_magnitude() {
    let now_ms =
        std::time::SystemTime::now().duration_since(std::time::UNIX_EPOCH).unwrap().as_millis() as u64;
    assert_eq!(format_time_ago(now_ms - 5_000), "5s");
    assert_eq!(format_time_ago(now_ms - 120_000), "2m");
    assert_eq!(format_time_ago(now_ms - 3_600_000), "1h");
    assert_eq!(format_time_ago(now_ms - 86_400_000), "1d");
}

#[test]
fn apply_limit_truncates_and_reports_remaining() {
    let mut items: Vec<i32> = (0..10).collect();
    let truncation = apply_limit(&mut items, 3, false);
    assert_eq!(items, vec![0, 1, 2]);
    assert_eq!(truncation.unwrap().remaining, 7);
}

#[test]
fn apply_limit_no_limit_keeps_everything() {
    let mut items: Vec<i32> = (0..10).collect();
    let truncation = apply_limit(&mut items, 3, true);
    assert_eq!(items.len(), 10);
    assert!(truncation.is_none());
}

#[test]
fn apply_limit_under_limit_is_noop() {
    let mut items = vec![1, 2];
    let truncation = apply_limit(&mut items, 5, false);
    assert_eq!(items, vec![1, 2]);
    assert!(truncation.is_none());
}
