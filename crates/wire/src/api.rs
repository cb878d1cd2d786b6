// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Request/response DTOs for the nine `CoordinatorApi` operations
//! (spec §4.5). These are transport-agnostic: the in-process test harness
//! and the TCP listener loop both speak these types.

use forge_core::job::OutputStream;
use forge_core::Job;
use serde::{Deserialize, Serialize};

use crate::error::ApiErrorBody;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SubmitJobRequest {
    pub command: String,
    pub archive_ref: String,
    pub filename: String,
    #[serde(default)]
    pub required_cpu: Option<u32>,
    #[serde(default)]
    pub required_ram_mb: Option<u64>,
    #[serde(default)]
    pub timeout_ms: Option<u64>,
    #[serde(default)]
    pub max_retries: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SubmitJobResponse {
    pub job_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CancelJobRequest {
    pub job_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CancelJobResponse {}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GetJobStatusRequest {
    pub job_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GetJobStatusResponse {
    pub job: Job,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ListJobsFilter {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub worker_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ListJobsRequest {
    #[serde(default)]
    pub filter: ListJobsFilter,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ListJobsResponse {
    pub jobs: Vec<Job>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RegisterWorkerRequest {
    pub worker_id: String,
    pub hostname: String,
    pub os: String,
    pub cpu_count: u32,
    pub cpu_usage: f64,
    pub ram_total_mb: u64,
    pub ram_free_mb: u64,
    pub version: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RegisterWorkerResponse {}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HeartbeatRequest {
    pub worker_id: String,
    pub cpu_usage: f64,
    pub ram_free_mb: u64,
    pub ram_total_mb: u64,
    pub status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HeartbeatResponse {}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClaimNextRequest {
    pub worker_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClaimNextResponse {
    pub job: Option<Job>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppendOutputRequest {
    pub job_id: String,
    pub worker_id: String,
    pub stream: OutputStream,
    pub chunk: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppendOutputResponse {}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CheckCancelRequest {
    pub job_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CheckCancelResponse {
    pub cancel_requested: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SubmitResultRequest {
    pub job_id: String,
    pub worker_id: String,
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SubmitResultResponse {}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReportFailureRequest {
    pub job_id: String,
    pub worker_id: String,
    pub error_message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReportFailureResponse {}

/// Every request the coordinator's listener loop accepts, tagged by `type`
/// so the framing layer can dispatch without a second lookup table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum ApiRequest {
    SubmitJob(SubmitJobRequest),
    CancelJob(CancelJobRequest),
    GetJobStatus(GetJobStatusRequest),
    ListJobs(ListJobsRequest),
    RegisterWorker(RegisterWorkerRequest),
    Heartbeat(HeartbeatRequest),
    ClaimNext(ClaimNextRequest),
    AppendOutput(AppendOutputRequest),
    CheckCancel(CheckCancelRequest),
    SubmitResult(SubmitResultRequest),
    ReportFailure(ReportFailureRequest),
}

/// Every successful response. The error path is `Err(ApiErrorBody)`, carried
/// separately by the framing layer rather than as a variant here so a
/// handler can just return `Result<ApiResponse, ApiErrorBody>`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum ApiResponse {
    SubmitJob(SubmitJobResponse),
    CancelJob(CancelJobResponse),
    GetJobStatus(GetJobStatusResponse),
    ListJobs(ListJobsResponse),
    RegisterWorker(RegisterWorkerResponse),
    Heartbeat(HeartbeatResponse),
    ClaimNext(ClaimNextResponse),
    AppendOutput(AppendOutputResponse),
    CheckCancel(CheckCancelResponse),
    SubmitResult(SubmitResultResponse),
    ReportFailure(ReportFailureResponse),
}

/// Wire envelope for one request/response exchange over the length-prefixed
/// framing in [`crate::framing`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApiEnvelope<T> {
    pub request_id: u64,
    pub body: T,
}

pub type ApiResult = Result<ApiResponse, ApiErrorBody>;

/// Wire shape for one response. [`ApiResult`] (`Result<ApiResponse,
/// ApiErrorBody>`) is the handler-facing type, but `Result` has no serde
/// impl of its own — this is the explicit on-the-wire encoding the listener
/// loop writes and a client reads back, one frame per outcome.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "outcome")]
pub enum ApiOutcome {
    Ok { body: ApiResponse },
    Err { error: ApiErrorBody },
}

impl From<ApiResult> for ApiOutcome {
    fn from(result: ApiResult) -> Self {
        match result {
            Ok(body) => ApiOutcome::Ok { body },
            Err(error) => ApiOutcome::Err { error },
        }
    }
}

impl From<ApiOutcome> for ApiResult {
    fn from(outcome: ApiOutcome) -> Self {
        match outcome {
            ApiOutcome::Ok { body } => Ok(body),
            ApiOutcome::Err { error } => Err(error),
        }
    }
}

#[cfg(test)]
#[path = "api_tests.rs"]
mod tests;
