// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn image_pull_failed_names_the_image() {
    let err = SandboxError::ImagePullFailed { image: "python:3.12-slim".into(), reason: "timeout".into() };
    assert!(err.to_string().contains("python:3.12-slim"));
}

#[test]
fn spawn_failed_carries_the_runtime_message() {
    let err = SandboxError::SpawnFailed("exec format error".into());
    assert!(err.to_string().contains("exec format error"));
}
