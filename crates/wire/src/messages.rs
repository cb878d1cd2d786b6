// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Push-channel messages exchanged on the persistent coordinator<->worker
//! connection. When push is unavailable, callers encode the same payloads
//! as REST polls against the equivalent `CoordinatorApi` operation.

use forge_core::job::OutputStream;
use serde::{Deserialize, Serialize};

/// `job-assign`: server -> worker.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JobAssign {
    pub job_id: String,
    pub command: String,
    pub archive_ref: String,
    pub filename: String,
    pub required_cpu: u32,
    pub required_ram_mb: u64,
    pub timeout_ms: u64,
    #[serde(default)]
    pub container_image: Option<String>,
    #[serde(default)]
    pub work_dir: Option<String>,
}

/// `heartbeat`: worker -> server. Payload mirrors the `Heartbeat` API call.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Heartbeat {
    pub worker_id: String,
    pub cpu_usage: f64,
    pub ram_free_mb: u64,
    pub ram_total_mb: u64,
    pub status: String,
}

/// `log-chunk`: worker -> server.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LogChunk {
    pub job_id: String,
    pub stream: OutputStream,
    pub data: String,
}

/// `result`: worker -> server, success path.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JobResult {
    pub job_id: String,
    pub worker_id: String,
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

/// `failure`: worker -> server, orchestration-error path.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JobFailure {
    pub job_id: String,
    pub worker_id: String,
    pub error_message: String,
}

/// `job-cancel`: server -> worker (push variant of `CheckCancel`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JobCancel {
    pub job_id: String,
}

/// `cancel-ack`: worker -> server.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CancelAck {
    pub job_id: String,
}

/// Envelope for every push-channel message, tagged by `type` the same way
/// the coordinator's request/response DTOs are tagged.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum PushMessage {
    #[serde(rename = "job-assign")]
    JobAssign(JobAssign),
    #[serde(rename = "heartbeat")]
    Heartbeat(Heartbeat),
    #[serde(rename = "log-chunk")]
    LogChunk(LogChunk),
    #[serde(rename = "result")]
    Result(JobResult),
    #[serde(rename = "failure")]
    Failure(JobFailure),
    #[serde(rename = "job-cancel")]
    JobCancel(JobCancel),
    #[serde(rename = "cancel-ack")]
    CancelAck(CancelAck),
}

#[cfg(test)]
#[path = "messages_tests.rs"]
mod tests;
