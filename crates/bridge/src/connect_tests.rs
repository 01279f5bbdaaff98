// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[tokio::test]
async fn gives_up_after_max_attempts_against_an_unreachable_port() {
    let config = ConnectConfig { max_attempts: 2, retry_delay: Duration::from_millis(1) };
    // Port 0 never accepts, so every attempt fails fast.
    let result = connect_with_retry("ws://127.0.0.1:0/ws", config).await;
    assert!(result.is_err());
}

#[test]
fn default_config_matches_bridge_startup_budget() {
    let config = ConnectConfig::default();
    assert_eq!(config.max_attempts, 20);
    assert_eq!(config.retry_delay, Duration::from_millis(500));
}
