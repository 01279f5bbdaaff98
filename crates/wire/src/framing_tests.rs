// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serde::Deserialize;

#[derive(Debug, Serialize, Deserialize, PartialEq)]
struct Sample {
    a: u32,
    b: String,
}

#[tokio::test]
async fn round_trips_through_a_duplex_stream() {
    let (mut client, mut server) = tokio::io::duplex(4096);
    let value = Sample { a: 7, b: "hi".into() };
    write_message(&mut client, &value).await.unwrap();
    let got: Sample = read_message(&mut server).await.unwrap().unwrap();
    assert_eq!(got, value);
}

#[tokio::test]
async fn read_message_returns_none_on_clean_eof() {
    let (client, mut server) = tokio::io::duplex(4096);
    drop(client);
    let got: Option<Sample> = read_message(&mut server).await.unwrap();
    assert!(got.is_none());
}

#[tokio::test]
async fn oversized_frame_header_is_rejected_before_allocating_payload() {
    let (mut client, mut server) = tokio::io::duplex(4096);
    let huge_len = MAX_FRAME_LEN + 1;
    client.write_all(&huge_len.to_be_bytes()).await.unwrap();
    let err = read_message::<_, Sample>(&mut server).await.unwrap_err();
    assert!(matches!(err, FramingError::FrameTooLarge(len) if len == huge_len));
}
