// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The [`ContainerBackend`] trait: one disposable, hardened container per
//! sub-command. [`DockerBackend`](crate::docker::DockerBackend) is the real
//! implementation; [`FakeBackend`](crate::fake::FakeBackend) stands in for
//! tests and for harnesses that don't want a real container runtime.

use std::path::PathBuf;

use async_trait::async_trait;
use forge_core::ResourceLimits;
use tokio::sync::mpsc::UnboundedSender;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::error::SandboxError;

/// Which stream an [`OutputChunk`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputStream {
    Stdout,
    Stderr,
}

/// One fragment of captured output, forwarded to the caller as it arrives.
#[derive(Debug, Clone)]
pub struct OutputChunk {
    pub stream: OutputStream,
    pub bytes: Vec<u8>,
}

/// Everything needed to run one sub-command in its own container.
pub struct RunRequest {
    pub job_id: String,
    pub command: String,
    pub workspace_dir: PathBuf,
    pub image: String,
    pub limits: ResourceLimits,
    pub deadline: Instant,
}

/// The terminal result of a single [`ContainerBackend::run`] call.
#[derive(Debug, Clone, Default)]
pub struct RunOutcome {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
    pub timed_out: bool,
    pub cancelled: bool,
}

/// Exit code the runner reports when it kills the container on deadline
/// expiry, matching the shell convention for signal-terminated processes.
pub const TIMEOUT_EXIT_CODE: i32 = 124;

/// Exit code the runner reports when it kills the container on cancellation
/// (SIGINT's conventional shell exit code).
pub const CANCELLED_EXIT_CODE: i32 = 130;

/// Runs one command string inside a disposable, isolated container.
///
/// Every sub-command of a job gets its own `run` call and its own container;
/// nothing about a container outlives the call that spawned it.
#[async_trait]
pub trait ContainerBackend: Send + Sync {
    /// Stream output to `on_chunk` as it is produced, in addition to
    /// accumulating it into the returned [`RunOutcome`]. `cancel` may be
    /// triggered concurrently by the caller to request early termination.
    async fn run(
        &self,
        req: RunRequest,
        cancel: CancellationToken,
        on_chunk: UnboundedSender<OutputChunk>,
    ) -> Result<RunOutcome, SandboxError>;
}
