// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! An in-process [`ContainerBackend`] for tests and local harnesses that
//! don't want a real container runtime on the machine running them.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::sync::mpsc::UnboundedSender;
use tokio_util::sync::CancellationToken;

use crate::backend::{ContainerBackend, OutputChunk, OutputStream, RunOutcome, RunRequest};
use crate::error::SandboxError;

/// Canned response returned by [`FakeBackend::run`] for the next call.
#[derive(Debug, Clone, Default)]
pub struct FakeRun {
    pub outcome: RunOutcome,
    pub error: Option<String>,
}

/// Queues canned [`RunOutcome`]s (or errors) and hands them out in order,
/// recording every [`RunRequest`] it was asked to serve.
#[derive(Default)]
pub struct FakeBackend {
    queue: Mutex<VecDeque<FakeRun>>,
    requests: Mutex<Vec<RunRequest>>,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the outcome the next `run` call should return.
    pub fn push_outcome(&self, outcome: RunOutcome) {
        self.queue.lock().unwrap_or_else(|e| e.into_inner()).push_back(FakeRun { outcome, error: None });
    }

    /// Queue a [`SandboxError::SpawnFailed`] for the next `run` call.
    pub fn push_error(&self, message: impl Into<String>) {
        self.queue
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(FakeRun { outcome: RunOutcome::default(), error: Some(message.into()) });
    }

    pub fn requested_jobs(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .map(|r| r.job_id.clone())
            .collect()
    }
}

#[async_trait]
impl ContainerBackend for FakeBackend {
    async fn run(
        &self,
        req: RunRequest,
        cancel: CancellationToken,
        on_chunk: UnboundedSender<OutputChunk>,
    ) -> Result<RunOutcome, SandboxError> {
        self.requests.lock().unwrap_or_else(|e| e.into_inner()).push(RunRequest {
            job_id: req.job_id.clone(),
            command: req.command.clone(),
            workspace_dir: req.workspace_dir.clone(),
            image: req.image.clone(),
            limits: req.limits.clone(),
            deadline: req.deadline,
        });

        if cancel.is_cancelled() {
            return Ok(RunOutcome { exit_code: 130, cancelled: true, ..Default::default() });
        }

        let next = self.queue.lock().unwrap_or_else(|e| e.into_inner()).pop_front();
        match next {
            Some(FakeRun { error: Some(message), .. }) => Err(SandboxError::SpawnFailed(message)),
            Some(FakeRun { outcome, .. }) => {
                if !outcome.stdout.is_empty() {
                    let _ = on_chunk.send(OutputChunk {
                        stream: OutputStream::Stdout,
                        bytes: outcome.stdout.clone().into_bytes(),
                    });
                }
                if !outcome.stderr.is_empty() {
                    let _ = on_chunk.send(OutputChunk {
                        stream: OutputStream::Stderr,
                        bytes: outcome.stderr.clone().into_bytes(),
                    });
                }
                Ok(outcome)
            }
            None => Ok(RunOutcome { exit_code: 0, ..Default::default() }),
        }
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
