// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `CoordinatorApi`'s own error type. Matches the teacher's per-crate
//! `thiserror` style; [`ApiError::into_wire`] is the single place that maps
//! down to the [`forge_wire::ErrorKind`] taxonomy that actually crosses the
//! wire (spec.md §7).

use forge_wire::error::ApiErrorBody;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("job {0} not found")]
    JobNotFound(String),
    #[error("worker {0} not found")]
    WorkerNotFound(String),
    #[error("job {job_id} is not assigned to worker {worker_id}")]
    NotOwner { job_id: String, worker_id: String },
    #[error("job {0} is already in a terminal state")]
    JobTerminal(String),
    #[error("job {0} is not currently running")]
    JobNotRunning(String),
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

impl ApiError {
    pub fn into_wire(self) -> ApiErrorBody {
        match self {
            ApiError::JobNotFound(id) => ApiErrorBody::not_found(format!("job {id} not found")),
            ApiError::WorkerNotFound(id) => ApiErrorBody::not_found(format!("worker {id} not found")),
            ApiError::NotOwner { job_id, worker_id } => ApiErrorBody::conflicting_state(format!(
                "job {job_id} is not assigned to worker {worker_id}"
            )),
            ApiError::JobTerminal(id) => {
                ApiErrorBody::conflicting_state(format!("job {id} is already in a terminal state"))
            }
            ApiError::JobNotRunning(id) => {
                ApiErrorBody::conflicting_state(format!("job {id} is not currently running"))
            }
            ApiError::InvalidArgument(message) => ApiErrorBody::invalid_argument(message),
        }
    }
}

impl From<ApiError> for ApiErrorBody {
    fn from(err: ApiError) -> Self {
        err.into_wire()
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
