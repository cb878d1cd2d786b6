// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The seam between the agent's task loop and the coordinator connection.
//!
//! `forge-wire`'s `PushMessage` vocabulary exists for a persistent push
//! channel, but no such transport is built on the coordinator side (§4.5:
//! "a real HTTP/WebSocket gateway... is explicitly out of scope and not
//! built"). [`TcpWorkerChannel`] instead drives the same length-prefixed
//! `ApiRequest`/`ApiEnvelope` framing the coordinator's listener speaks,
//! so every operation here is a REST-equivalent poll over one kept-alive
//! TCP connection — exactly the fallback spec.md describes ("if push is
//! not provided, all of these are REST polls with equivalent payloads").

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use forge_wire::{
    AppendOutputRequest, AppendOutputResponse, ApiEnvelope, ApiErrorBody, ApiOutcome, ApiRequest,
    ApiResponse, CheckCancelRequest, CheckCancelResponse, ClaimNextRequest, ClaimNextResponse,
    HeartbeatRequest, HeartbeatResponse, RegisterWorkerRequest, RegisterWorkerResponse,
    ReportFailureRequest, ReportFailureResponse, SubmitResultRequest, SubmitResultResponse,
};
use tokio::net::TcpStream;
use tokio::sync::Mutex;

use crate::error::AgentError;

/// Everything the agent's background tasks need from the coordinator,
/// independent of transport — the worker-side analogue of
/// `forge_coordinatord::CoordinatorApi`.
#[async_trait]
pub trait WorkerChannel: Send + Sync {
    async fn register_worker(&self, req: RegisterWorkerRequest) -> Result<RegisterWorkerResponse, AgentError>;
    async fn heartbeat(&self, req: HeartbeatRequest) -> Result<HeartbeatResponse, AgentError>;
    async fn claim_next(&self, req: ClaimNextRequest) -> Result<ClaimNextResponse, AgentError>;
    async fn append_output(&self, req: AppendOutputRequest) -> Result<AppendOutputResponse, AgentError>;
    async fn check_cancel(&self, req: CheckCancelRequest) -> Result<CheckCancelResponse, AgentError>;
    async fn submit_result(&self, req: SubmitResultRequest) -> Result<SubmitResultResponse, AgentError>;
    async fn report_failure(&self, req: ReportFailureRequest) -> Result<ReportFailureResponse, AgentError>;
}

/// A `WorkerChannel` driven over one TCP connection to the coordinator's
/// listener, reconnecting lazily on the next call after a transport error.
pub struct TcpWorkerChannel {
    addr: String,
    conn: Mutex<Option<TcpStream>>,
    next_request_id: AtomicU64,
}

impl TcpWorkerChannel {
    pub fn new(addr: impl Into<String>) -> Self {
        Self { addr: addr.into(), conn: Mutex::new(None), next_request_id: AtomicU64::new(1) }
    }

    async fn call(&self, req: ApiRequest) -> Result<ApiResponse, AgentError> {
        let request_id = self.next_request_id.fetch_add(1, Ordering::Relaxed);
        let mut guard = self.conn.lock().await;

        let stream = match guard.as_mut() {
            Some(stream) => stream,
            None => {
                let stream = TcpStream::connect(&self.addr)
                    .await
                    .map_err(|source| AgentError::Connect { addr: self.addr.clone(), source })?;
                guard.insert(stream)
            }
        };

        // Borrow the live connection for exactly one request/response; on any
        // transport error, drop it so the next call reconnects from scratch
        // rather than retrying against a socket in an unknown state.
        let envelope = ApiEnvelope { request_id, body: req };
        let result = async {
            forge_wire::write_message(stream, &envelope).await?;
            let response: ApiEnvelope<ApiOutcome> = forge_wire::read_message(stream)
                .await?
                .ok_or(forge_wire::ProtocolError::Io(std::io::Error::from(std::io::ErrorKind::UnexpectedEof)))?;
            Ok::<_, forge_wire::ProtocolError>(response.body)
        }
        .await;

        match result {
            Ok(ApiOutcome::Ok { body }) => Ok(body),
            Ok(ApiOutcome::Err { error }) => Err(AgentError::Api(error)),
            Err(e) => {
                *guard = None;
                Err(AgentError::Protocol(e))
            }
        }
    }
}

macro_rules! channel_method {
    ($name:ident, $req_ty:ident, $resp_ty:ident, $variant:ident) => {
        async fn $name(&self, req: $req_ty) -> Result<$resp_ty, AgentError> {
            match self.call(ApiRequest::$variant(req)).await? {
                ApiResponse::$variant(resp) => Ok(resp),
                other => Err(AgentError::Api(ApiErrorBody::internal(format!(
                    "coordinator returned an unexpected response shape for {}: {other:?}",
                    stringify!($variant)
                )))),
            }
        }
    };
}

#[async_trait]
impl WorkerChannel for TcpWorkerChannel {
    channel_method!(register_worker, RegisterWorkerRequest, RegisterWorkerResponse, RegisterWorker);
    channel_method!(heartbeat, HeartbeatRequest, HeartbeatResponse, Heartbeat);
    channel_method!(claim_next, ClaimNextRequest, ClaimNextResponse, ClaimNext);
    channel_method!(append_output, AppendOutputRequest, AppendOutputResponse, AppendOutput);
    channel_method!(check_cancel, CheckCancelRequest, CheckCancelResponse, CheckCancel);
    channel_method!(submit_result, SubmitResultRequest, SubmitResultResponse, SubmitResult);
    channel_method!(report_failure, ReportFailureRequest, ReportFailureResponse, ReportFailure);
}

/// An in-process [`WorkerChannel`] that records every call it receives and
/// hands back hand-queued canned responses, the agent-side analogue of
/// `forge_sandbox::FakeBackend`. Used by the executor/run-loop test suites
/// so they don't need a real TCP listener.
#[derive(Default)]
pub struct FakeWorkerChannel {
    claim_queue: Mutex<std::collections::VecDeque<Option<forge_core::Job>>>,
    cancel_queue: Mutex<std::collections::VecDeque<bool>>,
    calls: Mutex<Vec<String>>,
}

impl FakeWorkerChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the job (or `None` for "nothing to claim") the next
    /// `claim_next` call should return.
    pub async fn push_claim(&self, job: Option<forge_core::Job>) {
        self.claim_queue.lock().await.push_back(job);
    }

    /// Queue the `cancel_requested` flag the next `check_cancel` call
    /// should return.
    pub async fn push_cancel(&self, requested: bool) {
        self.cancel_queue.lock().await.push_back(requested);
    }

    /// Names of every method called so far, in order, for assertions.
    pub async fn calls(&self) -> Vec<String> {
        self.calls.lock().await.clone()
    }

    async fn record(&self, name: &str) {
        self.calls.lock().await.push(name.to_string());
    }
}

#[async_trait]
impl WorkerChannel for FakeWorkerChannel {
    async fn register_worker(&self, _req: RegisterWorkerRequest) -> Result<RegisterWorkerResponse, AgentError> {
        self.record("register_worker").await;
        Ok(RegisterWorkerResponse {})
    }

    async fn heartbeat(&self, _req: HeartbeatRequest) -> Result<HeartbeatResponse, AgentError> {
        self.record("heartbeat").await;
        Ok(HeartbeatResponse {})
    }

    async fn claim_next(&self, _req: ClaimNextRequest) -> Result<ClaimNextResponse, AgentError> {
        self.record("claim_next").await;
        let job = self.claim_queue.lock().await.pop_front().flatten();
        Ok(ClaimNextResponse { job })
    }

    async fn append_output(&self, _req: AppendOutputRequest) -> Result<AppendOutputResponse, AgentError> {
        self.record("append_output").await;
        Ok(AppendOutputResponse {})
    }

    async fn check_cancel(&self, _req: CheckCancelRequest) -> Result<CheckCancelResponse, AgentError> {
        self.record("check_cancel").await;
        let cancel_requested = self.cancel_queue.lock().await.pop_front().unwrap_or(false);
        Ok(CheckCancelResponse { cancel_requested })
    }

    async fn submit_result(&self, _req: SubmitResultRequest) -> Result<SubmitResultResponse, AgentError> {
        self.record("submit_result").await;
        Ok(SubmitResultResponse {})
    }

    async fn report_failure(&self, _req: ReportFailureRequest) -> Result<ReportFailureResponse, AgentError> {
        self.record("report_failure").await;
        Ok(ReportFailureResponse {})
    }
}

#[cfg(test)]
#[path = "channel_tests.rs"]
mod tests;
