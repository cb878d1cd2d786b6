// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use thiserror::Error;

/// Failure modes of a single [`crate::ContainerBackend::run`] invocation.
#[derive(Debug, Error)]
pub enum SandboxError {
    #[error("container runtime is unavailable: {0}")]
    SandboxUnavailable(String),

    #[error("failed to pull image {image}: {reason}")]
    ImagePullFailed { image: String, reason: String },

    #[error("runtime rejected container spawn: {0}")]
    SpawnFailed(String),
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
