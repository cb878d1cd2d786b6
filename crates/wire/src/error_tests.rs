// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn display_matches_wire_tag() {
    assert_eq!(ErrorKind::InvalidArgument.to_string(), "invalid_argument");
    assert_eq!(ErrorKind::NotFound.to_string(), "not_found");
    assert_eq!(ErrorKind::ConflictingState.to_string(), "conflicting_state");
    assert_eq!(ErrorKind::Internal.to_string(), "internal");
}

#[test]
fn body_formats_as_kind_colon_message() {
    let body = ApiErrorBody::not_found("job job-xyz not found");
    assert_eq!(body.to_string(), "not_found: job job-xyz not found");
}

#[test]
fn roundtrips_through_json() {
    let body = ApiErrorBody::conflicting_state("worker mismatch");
    let json = serde_json::to_string(&body).unwrap();
    let back: ApiErrorBody = serde_json::from_str(&json).unwrap();
    assert_eq!(body, back);
}
