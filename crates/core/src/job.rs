// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job identifier and record.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

/// Unique identifier for a submitted job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobId(pub String);

impl JobId {
    /// Generate a fresh random job id.
    pub fn generate() -> Self {
        Self(format!("job-{}", nanoid::nanoid!(16)))
    }

    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for JobId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for JobId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl PartialEq<str> for JobId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for JobId {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

impl Borrow<str> for JobId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Lifecycle state of a job.
///
/// Queued -> Assigned -> Running -> (Completed | Failed), with a return path
/// from Assigned/Running back to Queued when a worker is declared unhealthy
/// or misses a claim deadline (see the scheduler's Pass A).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Queued,
    Assigned,
    Running,
    Completed,
    Failed,
}

crate::simple_display! {
    JobStatus {
        Queued => "queued",
        Assigned => "assigned",
        Running => "running",
        Completed => "completed",
        Failed => "failed",
    }
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

fn default_required_cpu() -> u32 {
    1
}

fn default_required_ram_mb() -> u64 {
    256
}

fn default_timeout_ms() -> u64 {
    300_000
}

fn default_max_retries() -> u32 {
    3
}

/// Per-job stream of truncation for the capped stdout/stderr buffers.
/// See `forge_state::MAX_OUTPUT_BYTES`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputStream {
    Stdout,
    Stderr,
}

crate::simple_display! {
    OutputStream {
        Stdout => "stdout",
        Stderr => "stderr",
    }
}

/// A unit of work submitted to the coordinator.
///
/// `command` is a newline-separated sequence of shell sub-commands executed
/// in order inside the sandbox; the job is a successful completion
/// irrespective of per sub-command exit codes — only a worker-reported
/// `failure` (orchestration error) distinguishes Completed from Failed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub command: String,
    pub archive_ref: String,
    pub filename: String,
    #[serde(default = "default_required_cpu")]
    pub required_cpu: u32,
    #[serde(default = "default_required_ram_mb")]
    pub required_ram_mb: u64,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    pub status: JobStatus,
    pub queued_at_ms: u64,
    #[serde(default)]
    pub assigned_agent_id: Option<String>,
    #[serde(default)]
    pub assigned_at_ms: Option<u64>,
    #[serde(default)]
    pub started_at_ms: Option<u64>,
    #[serde(default)]
    pub completed_at_ms: Option<u64>,
    #[serde(default)]
    pub exit_code: Option<i32>,
    #[serde(default)]
    pub stdout: String,
    #[serde(default)]
    pub stderr: String,
    #[serde(default)]
    pub truncated: bool,
    #[serde(default)]
    pub error_message: Option<String>,
    /// Number of times this job has been reclaimed from a timeout or
    /// worker-reported failure. Starts at zero for a job that has never been
    /// reclaimed and never exceeds `max_retries + 1`.
    #[serde(default = "default_attempts")]
    pub attempts: u32,
    #[serde(default)]
    pub cancel_requested: bool,
}

fn default_attempts() -> u32 {
    0
}

impl Job {
    #[allow(clippy::too_many_arguments)]
    pub fn new_queued(
        command: impl Into<String>,
        archive_ref: impl Into<String>,
        filename: impl Into<String>,
        required_cpu: u32,
        required_ram_mb: u64,
        timeout_ms: u64,
        max_retries: u32,
        now_ms: u64,
    ) -> Self {
        Self {
            id: JobId::generate(),
            command: command.into(),
            archive_ref: archive_ref.into(),
            filename: filename.into(),
            required_cpu,
            required_ram_mb,
            timeout_ms,
            max_retries,
            status: JobStatus::Queued,
            queued_at_ms: now_ms,
            assigned_agent_id: None,
            assigned_at_ms: None,
            started_at_ms: None,
            completed_at_ms: None,
            exit_code: None,
            stdout: String::new(),
            stderr: String::new(),
            truncated: false,
            error_message: None,
            attempts: default_attempts(),
            cancel_requested: false,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Whether the NEXT reclamation (timeout or worker-reported failure)
    /// should requeue rather than fail this job outright. `attempts` counts
    /// reclamations already taken, so there's budget left iff one more
    /// wouldn't push it past `max_retries`.
    pub fn can_retry(&self) -> bool {
        self.attempts < self.max_retries
    }
}

crate::builder! {
    pub struct JobBuilder => Job {
        into {
            command: String = "",
            archive_ref: String = "",
            filename: String = "input.zip",
        }
        set {
            id: JobId = JobId::generate(),
            required_cpu: u32 = default_required_cpu(),
            required_ram_mb: u64 = default_required_ram_mb(),
            timeout_ms: u64 = default_timeout_ms(),
            max_retries: u32 = default_max_retries(),
            status: JobStatus = JobStatus::Queued,
            queued_at_ms: u64 = 0,
            exit_code: Option<i32> = None,
            stdout: String = String::new(),
            stderr: String = String::new(),
            truncated: bool = false,
            attempts: u32 = default_attempts(),
            cancel_requested: bool = false,
        }
        option {
            assigned_agent_id: String = None,
            error_message: String = None,
        }
        computed {
            assigned_at_ms: Option<u64> = None,
            started_at_ms: Option<u64> = None,
            completed_at_ms: Option<u64> = None,
        }
    }
}

#[cfg(test)]
#[path = "job_tests.rs"]
mod tests;
