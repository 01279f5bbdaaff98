// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bridge Transport (§4.2): one WebSocket connection per sandbox, carrying
//! typed JSON messages to and from the in-sandbox bridge process.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod connect;
pub mod transport;

pub use connect::{connect_with_retry, ConnectConfig};
pub use transport::{BridgeError, BridgeEvent, BridgeTransport};
