// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Event log vocabulary for the materialized job/worker state.
//!
//! Every mutation of [`crate::types::MaterializedState`] is expressed as an
//! `Event` first and applied through [`apply_event`]; this is the one path
//! the WAL and the request handlers both go through, so replay after a
//! crash produces the same state a live run would have reached.

use forge_core::job::OutputStream;
use forge_core::{Job, Worker};
use serde::{Deserialize, Serialize};

use crate::types::MaterializedState;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind")]
pub enum Event {
    JobSubmitted { job: Job },
    JobAssigned { job_id: String, worker_id: String, now_ms: u64 },
    JobStarted { job_id: String, now_ms: u64 },
    JobOutputAppended { job_id: String, stream: OutputStream, chunk: String },
    JobCompleted { job_id: String, stdout: String, stderr: String, exit_code: i32, now_ms: u64 },
    /// `counts_as_attempt` is true for a timeout/worker-failure reclamation
    /// (Pass A, Pass B, `ReportFailure`) and false for a direct user cancel —
    /// cancelling a job that never started running does not burn a retry.
    JobFailed { job_id: String, error_message: String, now_ms: u64, counts_as_attempt: bool },
    JobRequeued { job_id: String, now_ms: u64 },
    JobCancelRequested { job_id: String },
    WorkerRegistered { worker: Worker },
    WorkerHeartbeat {
        worker_id: String,
        cpu_usage: f64,
        ram_free_mb: u64,
        ram_total_mb: u64,
        status: String,
        now_ms: u64,
    },
    WorkerMarkedOffline { worker_id: String },
    WorkerMarkedUnhealthy { worker_id: String, cooldown_until_ms: u64, reason: String },
    WorkerCooldownCleared { worker_id: String },
}

/// Apply one event to the materialized state.
///
/// Idempotency requirement: applying the same event object twice must be a
/// no-op beyond the first application (replay after a crash must not double
/// -reserve capacity or double-append output). Each handler below checks the
/// record's current state before mutating rather than blindly overwriting.
pub fn apply_event(state: &mut MaterializedState, event: &Event) {
    match event {
        Event::JobSubmitted { .. }
        | Event::JobAssigned { .. }
        | Event::JobStarted { .. }
        | Event::JobOutputAppended { .. }
        | Event::JobCompleted { .. }
        | Event::JobFailed { .. }
        | Event::JobRequeued { .. }
        | Event::JobCancelRequested { .. } => crate::jobs::apply(state, event),
        Event::WorkerRegistered { .. }
        | Event::WorkerHeartbeat { .. }
        | Event::WorkerMarkedOffline { .. }
        | Event::WorkerMarkedUnhealthy { .. }
        | Event::WorkerCooldownCleared { .. } => crate::workers::apply(state, event),
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
