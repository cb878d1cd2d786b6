// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! forge-wire: wire protocol for coordinator<->worker and client<->coordinator
//! communication.
//!
//! Wire format: 4-byte length prefix (big-endian) + JSON payload.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod api;
pub mod error;
pub mod framing;
pub mod messages;

pub use api::{
    AppendOutputRequest, AppendOutputResponse, ApiEnvelope, ApiOutcome, ApiRequest, ApiResponse,
    ApiResult, CancelJobRequest, CancelJobResponse, CheckCancelRequest, CheckCancelResponse, ClaimNextRequest,
    ClaimNextResponse, GetJobStatusRequest, GetJobStatusResponse, HeartbeatRequest,
    HeartbeatResponse, ListJobsFilter, ListJobsRequest, ListJobsResponse, RegisterWorkerRequest,
    RegisterWorkerResponse, ReportFailureRequest, ReportFailureResponse, SubmitJobRequest,
    SubmitJobResponse, SubmitResultRequest, SubmitResultResponse,
};
pub use error::{ApiErrorBody, ErrorKind};
pub use framing::{decode, encode, read_message, write_message, ProtocolError, MAX_MESSAGE_BYTES};
pub use messages::{
    CancelAck, Heartbeat, JobAssign, JobCancel, JobFailure, JobResult, LogChunk, PushMessage,
};
