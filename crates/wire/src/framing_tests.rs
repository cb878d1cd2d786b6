// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::api::{ApiRequest, CheckCancelRequest};
use std::io::Cursor;

#[test]
fn encode_prefixes_with_big_endian_length() {
    let req = ApiRequest::CheckCancel(CheckCancelRequest { job_id: "job-1".into() });
    let frame = encode(&req).unwrap();
    let len = u32::from_be_bytes([frame[0], frame[1], frame[2], frame[3]]);
    assert_eq!(len as usize, frame.len() - 4);
}

#[tokio::test]
async fn write_then_read_roundtrips() {
    let req = ApiRequest::CheckCancel(CheckCancelRequest { job_id: "job-42".into() });
    let mut buf = Vec::new();
    write_message(&mut buf, &req).await.unwrap();

    let mut cursor = Cursor::new(buf);
    let back: Option<ApiRequest> = read_message(&mut cursor).await.unwrap();
    assert_eq!(back, Some(req));
}

#[tokio::test]
async fn read_message_on_clean_eof_returns_none() {
    let mut cursor = Cursor::new(Vec::<u8>::new());
    let result: Option<ApiRequest> = read_message(&mut cursor).await.unwrap();
    assert!(result.is_none());
}

#[tokio::test]
async fn oversized_length_prefix_is_rejected() {
    let mut buf = Vec::new();
    buf.extend_from_slice(&(MAX_MESSAGE_BYTES + 1).to_be_bytes());
    let mut cursor = Cursor::new(buf);
    let result: Result<Option<ApiRequest>, _> = read_message(&mut cursor).await;
    assert!(matches!(result, Err(ProtocolError::MessageTooLarge(_, _))));
}
