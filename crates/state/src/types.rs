// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The materialized, in-memory view of all jobs and workers.

use std::collections::HashMap;

use forge_core::{Job, Worker};
use serde::{Deserialize, Serialize};

/// Per-job stdout/stderr cap. Once hit, further appends for that job are
/// dropped and `truncated` is set instead of growing the buffer unbounded.
pub const MAX_OUTPUT_BYTES: usize = 10 * 1024 * 1024;

/// The single shared mutable object in the coordinator process. Every
/// request handler and the scheduler mutate this exclusively through
/// [`crate::event::apply_event`] while holding [`crate::handle::StateHandle`]'s
/// lock.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MaterializedState {
    pub jobs: HashMap<String, Job>,
    pub workers: HashMap<String, Worker>,
}

impl MaterializedState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn job(&self, job_id: &str) -> Option<&Job> {
        self.jobs.get(job_id)
    }

    pub fn worker(&self, worker_id: &str) -> Option<&Worker> {
        self.workers.get(worker_id)
    }

    /// Jobs currently assigned to (or running on) the given worker.
    pub fn jobs_for_worker<'a>(&'a self, worker_id: &'a str) -> impl Iterator<Item = &'a Job> {
        self.jobs.values().filter(move |j| j.assigned_agent_id.as_deref() == Some(worker_id))
    }
}

#[cfg(test)]
#[path = "types_tests.rs"]
mod tests;
