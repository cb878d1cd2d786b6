// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StateError {
    #[error("job {0} not found")]
    JobNotFound(String),
    #[error("worker {0} not found")]
    WorkerNotFound(String),
    #[error("{context}: job {job_id} is not assigned to worker {worker_id}")]
    WorkerMismatch { context: &'static str, job_id: String, worker_id: String },
    #[error("job {0} is in a terminal state")]
    JobTerminal(String),
    #[error("job {0} is not running")]
    JobNotRunning(String),
    #[error("store write failed: {0}")]
    StoreWrite(String),
}

#[derive(Debug, Error)]
pub enum NormalizeError {
    #[error("record missing required field {0}")]
    MissingField(&'static str),
    #[error("record has unrecognized shape: {0}")]
    UnrecognizedShape(String),
    #[error("malformed json: {0}")]
    Json(#[from] serde_json::Error),
}
