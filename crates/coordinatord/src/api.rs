// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The `CoordinatorApi` trait (spec.md §4.5): eleven request/response
//! operations, each either reading a consistent snapshot or atomically
//! mutating [`forge_state::MaterializedState`] under its single lock.
//!
//! [`CoordinatorService`] is the one implementation. It is transport-agnostic
//! on purpose — the in-process integration tests and `crate::listener`'s TCP
//! loop both drive it through [`CoordinatorApi::dispatch`].

use std::sync::Arc;

use async_trait::async_trait;
use forge_core::metrics::names as metric_names;
use forge_core::{Clock, Job, JobStatus, Metrics, Worker, WorkerStatus};
use forge_scheduler::{retry_decision, RetryDecision};
use forge_state::{Event, StateHandle};
use forge_wire::{
    AppendOutputRequest, AppendOutputResponse, ApiErrorBody, ApiRequest, ApiResponse, ApiResult,
    CancelJobRequest, CancelJobResponse, CheckCancelRequest, CheckCancelResponse, ClaimNextRequest,
    ClaimNextResponse, GetJobStatusRequest, GetJobStatusResponse, HeartbeatRequest, HeartbeatResponse,
    ListJobsRequest, ListJobsResponse, RegisterWorkerRequest, RegisterWorkerResponse,
    ReportFailureRequest, ReportFailureResponse, SubmitJobRequest, SubmitJobResponse,
    SubmitResultRequest, SubmitResultResponse,
};
use tokio::sync::Notify;

use crate::error::ApiError;
use crate::persist::{PersistHandle, PersistTask};

/// Per-field fallbacks for a `SubmitJob` call that omits them, loaded from
/// `job.*` configuration (spec.md §6).
#[derive(Debug, Clone, Copy)]
pub struct JobDefaults {
    pub cpu: u32,
    pub ram_mb: u64,
    pub timeout_ms: u64,
    pub max_retries: u32,
}

/// The eleven operations a coordinator process exposes, independent of
/// transport. Every method maps crate-local failures down to
/// [`forge_wire::ApiErrorBody`] via [`crate::error::ApiError::into_wire`].
#[async_trait]
pub trait CoordinatorApi: Send + Sync {
    async fn submit_job(&self, req: SubmitJobRequest) -> Result<SubmitJobResponse, ApiErrorBody>;
    async fn cancel_job(&self, req: CancelJobRequest) -> Result<CancelJobResponse, ApiErrorBody>;
    async fn get_job_status(&self, req: GetJobStatusRequest) -> Result<GetJobStatusResponse, ApiErrorBody>;
    async fn list_jobs(&self, req: ListJobsRequest) -> Result<ListJobsResponse, ApiErrorBody>;
    async fn register_worker(&self, req: RegisterWorkerRequest) -> Result<RegisterWorkerResponse, ApiErrorBody>;
    async fn heartbeat(&self, req: HeartbeatRequest) -> Result<HeartbeatResponse, ApiErrorBody>;
    async fn claim_next(&self, req: ClaimNextRequest) -> Result<ClaimNextResponse, ApiErrorBody>;
    async fn append_output(&self, req: AppendOutputRequest) -> Result<AppendOutputResponse, ApiErrorBody>;
    async fn check_cancel(&self, req: CheckCancelRequest) -> Result<CheckCancelResponse, ApiErrorBody>;
    async fn submit_result(&self, req: SubmitResultRequest) -> Result<SubmitResultResponse, ApiErrorBody>;
    async fn report_failure(&self, req: ReportFailureRequest) -> Result<ReportFailureResponse, ApiErrorBody>;

    /// Dispatch a tagged [`ApiRequest`] to the matching typed method. The one
    /// entry point the listener loop and the in-process test harness share.
    async fn dispatch(&self, req: ApiRequest) -> ApiResult {
        match req {
            ApiRequest::SubmitJob(r) => self.submit_job(r).await.map(ApiResponse::SubmitJob),
            ApiRequest::CancelJob(r) => self.cancel_job(r).await.map(ApiResponse::CancelJob),
            ApiRequest::GetJobStatus(r) => self.get_job_status(r).await.map(ApiResponse::GetJobStatus),
            ApiRequest::ListJobs(r) => self.list_jobs(r).await.map(ApiResponse::ListJobs),
            ApiRequest::RegisterWorker(r) => self.register_worker(r).await.map(ApiResponse::RegisterWorker),
            ApiRequest::Heartbeat(r) => self.heartbeat(r).await.map(ApiResponse::Heartbeat),
            ApiRequest::ClaimNext(r) => self.claim_next(r).await.map(ApiResponse::ClaimNext),
            ApiRequest::AppendOutput(r) => self.append_output(r).await.map(ApiResponse::AppendOutput),
            ApiRequest::CheckCancel(r) => self.check_cancel(r).await.map(ApiResponse::CheckCancel),
            ApiRequest::SubmitResult(r) => self.submit_result(r).await.map(ApiResponse::SubmitResult),
            ApiRequest::ReportFailure(r) => self.report_failure(r).await.map(ApiResponse::ReportFailure),
        }
    }
}

/// The concrete, in-process implementation: one [`StateHandle`] serialization
/// point, a [`PersistHandle`] to hand committed events off to durable
/// storage, and a [`Notify`] shared with `forge-scheduler`'s run loop so a
/// submission/heartbeat/result lands a sweep immediately instead of waiting
/// out the full period (spec.md §4.4's "additionally on... events").
pub struct CoordinatorService<C: Clock> {
    state: StateHandle,
    persist: PersistHandle,
    scheduler_notify: Arc<Notify>,
    clock: C,
    metrics: Metrics,
    job_defaults: JobDefaults,
    cooldown_ms: u64,
}

impl<C: Clock> CoordinatorService<C> {
    pub fn new(
        state: StateHandle,
        persist: PersistHandle,
        scheduler_notify: Arc<Notify>,
        clock: C,
        metrics: Metrics,
        job_defaults: JobDefaults,
        cooldown_ms: u64,
    ) -> Self {
        Self { state, persist, scheduler_notify, clock, metrics, job_defaults, cooldown_ms }
    }

    fn now(&self) -> u64 {
        self.clock.epoch_ms()
    }

    fn apply_and_persist(&self, event: Event, job: Option<Job>, worker: Option<Worker>) {
        self.state.lock_state_mut(|state| forge_state::apply_event(state, &event));
        self.persist.submit(PersistTask { event, job, worker });
    }

    fn wake_scheduler(&self) {
        self.scheduler_notify.notify_one();
    }
}

#[async_trait]
impl<C: Clock> CoordinatorApi for CoordinatorService<C> {
    async fn submit_job(&self, req: SubmitJobRequest) -> Result<SubmitJobResponse, ApiErrorBody> {
        if req.command.trim().is_empty() {
            return Err(ApiError::InvalidArgument("command must not be empty".to_string()).into_wire());
        }

        let job = Job::new_queued(
            req.command,
            req.archive_ref,
            req.filename,
            req.required_cpu.unwrap_or(self.job_defaults.cpu),
            req.required_ram_mb.unwrap_or(self.job_defaults.ram_mb),
            req.timeout_ms.unwrap_or(self.job_defaults.timeout_ms),
            req.max_retries.unwrap_or(self.job_defaults.max_retries),
            self.now(),
        );
        let job_id = job.id.0.clone();

        self.apply_and_persist(Event::JobSubmitted { job: job.clone() }, Some(job), None);
        self.wake_scheduler();

        Ok(SubmitJobResponse { job_id })
    }

    async fn cancel_job(&self, req: CancelJobRequest) -> Result<CancelJobResponse, ApiErrorBody> {
        let job = self
            .state
            .lock_state(|state| state.job(&req.job_id).cloned())
            .ok_or_else(|| ApiError::JobNotFound(req.job_id.clone()).into_wire())?;

        if job.is_terminal() {
            return Ok(CancelJobResponse {});
        }

        let now_ms = self.now();
        let is_running = job.status == JobStatus::Running;
        let event = if is_running {
            Event::JobCancelRequested { job_id: req.job_id.clone() }
        } else {
            // Cancelling a job that never started running does not burn a
            // retry attempt: go straight to FAILED without the requeue path.
            Event::JobFailed {
                job_id: req.job_id.clone(),
                error_message: "cancelled".to_string(),
                now_ms,
                counts_as_attempt: false,
            }
        };

        self.apply_completion(event, &req.job_id).await;
        if !is_running {
            self.metrics.incr(metric_names::JOBS_FAILED, 1);
        }

        Ok(CancelJobResponse {})
    }

    async fn get_job_status(&self, req: GetJobStatusRequest) -> Result<GetJobStatusResponse, ApiErrorBody> {
        let job = self
            .state
            .lock_state(|state| state.job(&req.job_id).cloned())
            .ok_or_else(|| ApiError::JobNotFound(req.job_id).into_wire())?;
        Ok(GetJobStatusResponse { job })
    }

    async fn list_jobs(&self, req: ListJobsRequest) -> Result<ListJobsResponse, ApiErrorBody> {
        let jobs = self.state.lock_state(|state| {
            state
                .jobs
                .values()
                .filter(|job| {
                    req.filter.status.as_deref().map_or(true, |s| job.status.to_string() == s)
                        && req
                            .filter
                            .worker_id
                            .as_deref()
                            .map_or(true, |w| job.assigned_agent_id.as_deref() == Some(w))
                })
                .cloned()
                .collect::<Vec<_>>()
        });
        Ok(ListJobsResponse { jobs })
    }

    async fn register_worker(&self, req: RegisterWorkerRequest) -> Result<RegisterWorkerResponse, ApiErrorBody> {
        let now_ms = self.now();
        let existing = self.state.lock_state(|state| state.worker(&req.worker_id).cloned());
        let worker = Worker {
            id: forge_core::WorkerId::new(req.worker_id),
            hostname: req.hostname,
            os: req.os,
            cpu_count: req.cpu_count,
            cpu_usage: req.cpu_usage,
            ram_total_mb: req.ram_total_mb,
            ram_free_mb: req.ram_free_mb,
            status: existing.as_ref().map(|w| w.status).unwrap_or(WorkerStatus::Idle),
            last_heartbeat_ms: existing.as_ref().map(|w| w.last_heartbeat_ms).unwrap_or(now_ms),
            registered_at_ms: existing.as_ref().map(|w| w.registered_at_ms).unwrap_or(now_ms),
            current_job_ids: existing.as_ref().map(|w| w.current_job_ids.clone()).unwrap_or_default(),
            reserved_cpu: existing.as_ref().map(|w| w.reserved_cpu).unwrap_or(0),
            reserved_ram_mb: existing.as_ref().map(|w| w.reserved_ram_mb).unwrap_or(0),
            cooldown_until_ms: existing.as_ref().and_then(|w| w.cooldown_until_ms),
            health_reason: existing.as_ref().and_then(|w| w.health_reason.clone()),
            version: req.version,
        };

        self.apply_and_persist(Event::WorkerRegistered { worker: worker.clone() }, None, Some(worker));
        self.wake_scheduler();

        Ok(RegisterWorkerResponse {})
    }

    async fn heartbeat(&self, req: HeartbeatRequest) -> Result<HeartbeatResponse, ApiErrorBody> {
        self.state
            .lock_state(|state| state.worker(&req.worker_id).map(|_| ()))
            .ok_or_else(|| ApiError::WorkerNotFound(req.worker_id.clone()).into_wire())?;

        let now_ms = self.now();
        let event = Event::WorkerHeartbeat {
            worker_id: req.worker_id.clone(),
            cpu_usage: req.cpu_usage,
            ram_free_mb: req.ram_free_mb,
            ram_total_mb: req.ram_total_mb,
            status: req.status,
            now_ms,
        };
        self.state.lock_state_mut(|state| forge_state::apply_event(state, &event));
        let worker = self.state.lock_state(|state| state.worker(&req.worker_id).cloned());
        self.persist.submit(PersistTask { event, job: None, worker });
        self.wake_scheduler();

        Ok(HeartbeatResponse {})
    }

    async fn claim_next(&self, req: ClaimNextRequest) -> Result<ClaimNextResponse, ApiErrorBody> {
        self.state
            .lock_state(|state| state.worker(&req.worker_id).map(|_| ()))
            .ok_or_else(|| ApiError::WorkerNotFound(req.worker_id.clone()).into_wire())?;

        let now_ms = self.now();
        let claimed_id = self.state.lock_state(|state| {
            let mut candidates: Vec<&Job> = state
                .jobs
                .values()
                .filter(|job| {
                    job.status == JobStatus::Assigned
                        && job.assigned_agent_id.as_deref() == Some(req.worker_id.as_str())
                })
                .collect();
            candidates.sort_by_key(|j| (j.assigned_at_ms, j.id.0.clone()));
            candidates.first().map(|j| j.id.0.clone())
        });

        let Some(job_id) = claimed_id else {
            return Ok(ClaimNextResponse { job: None });
        };

        let event = Event::JobStarted { job_id: job_id.clone(), now_ms };
        self.state.lock_state_mut(|state| forge_state::apply_event(state, &event));
        let job = self.state.lock_state(|state| state.job(&job_id).cloned());
        self.persist.submit(PersistTask { event, job: job.clone(), worker: None });

        Ok(ClaimNextResponse { job })
    }

    async fn append_output(&self, req: AppendOutputRequest) -> Result<AppendOutputResponse, ApiErrorBody> {
        let job = self
            .state
            .lock_state(|state| state.job(&req.job_id).cloned())
            .ok_or_else(|| ApiError::JobNotFound(req.job_id.clone()).into_wire())?;

        if job.assigned_agent_id.as_deref() != Some(req.worker_id.as_str()) {
            return Err(ApiError::NotOwner { job_id: req.job_id, worker_id: req.worker_id }.into_wire());
        }
        if job.status != JobStatus::Running {
            return Err(ApiError::JobNotRunning(req.job_id).into_wire());
        }

        let event = Event::JobOutputAppended { job_id: req.job_id.clone(), stream: req.stream, chunk: req.chunk };
        self.state.lock_state_mut(|state| forge_state::apply_event(state, &event));
        let job = self.state.lock_state(|state| state.job(&req.job_id).cloned());
        self.persist.submit(PersistTask { event, job, worker: None });

        Ok(AppendOutputResponse {})
    }

    async fn check_cancel(&self, req: CheckCancelRequest) -> Result<CheckCancelResponse, ApiErrorBody> {
        let job = self
            .state
            .lock_state(|state| state.job(&req.job_id).cloned())
            .ok_or_else(|| ApiError::JobNotFound(req.job_id).into_wire())?;
        Ok(CheckCancelResponse { cancel_requested: job.cancel_requested })
    }

    async fn submit_result(&self, req: SubmitResultRequest) -> Result<SubmitResultResponse, ApiErrorBody> {
        let job = self
            .state
            .lock_state(|state| state.job(&req.job_id).cloned())
            .ok_or_else(|| ApiError::JobNotFound(req.job_id.clone()).into_wire())?;

        if job.assigned_agent_id.as_deref() != Some(req.worker_id.as_str()) {
            return Err(ApiError::NotOwner { job_id: req.job_id, worker_id: req.worker_id }.into_wire());
        }
        if job.is_terminal() {
            return Err(ApiError::JobTerminal(req.job_id).into_wire());
        }

        let now_ms = self.now();
        let event = Event::JobCompleted {
            job_id: req.job_id.clone(),
            stdout: req.stdout,
            stderr: req.stderr,
            exit_code: req.exit_code,
            now_ms,
        };
        self.apply_completion(event, &req.job_id).await;
        self.metrics.incr(metric_names::JOBS_COMPLETED, 1);
        self.wake_scheduler();

        Ok(SubmitResultResponse {})
    }

    async fn report_failure(&self, req: ReportFailureRequest) -> Result<ReportFailureResponse, ApiErrorBody> {
        let job = self
            .state
            .lock_state(|state| state.job(&req.job_id).cloned())
            .ok_or_else(|| ApiError::JobNotFound(req.job_id.clone()).into_wire())?;

        if job.assigned_agent_id.as_deref() != Some(req.worker_id.as_str()) {
            return Err(ApiError::NotOwner { job_id: req.job_id, worker_id: req.worker_id }.into_wire());
        }
        if job.is_terminal() {
            return Err(ApiError::JobTerminal(req.job_id).into_wire());
        }

        let now_ms = self.now();
        let decision = retry_decision(&job);
        let job_event = match decision {
            RetryDecision::Requeue => Event::JobRequeued { job_id: req.job_id.clone(), now_ms },
            RetryDecision::Fail => Event::JobFailed {
                job_id: req.job_id.clone(),
                error_message: req.error_message.clone(),
                now_ms,
                counts_as_attempt: true,
            },
        };
        self.apply_completion(job_event, &req.job_id).await;
        self.metrics.incr(
            match decision {
                RetryDecision::Requeue => metric_names::JOBS_REQUEUED,
                RetryDecision::Fail => metric_names::JOBS_FAILED,
            },
            1,
        );

        let cooldown_event = Event::WorkerMarkedUnhealthy {
            worker_id: req.worker_id.clone(),
            cooldown_until_ms: now_ms + self.cooldown_ms,
            reason: req.error_message,
        };
        self.state.lock_state_mut(|state| forge_state::apply_event(state, &cooldown_event));
        let worker = self.state.lock_state(|state| state.worker(&req.worker_id).cloned());
        self.persist.submit(PersistTask { event: cooldown_event, job: None, worker });
        self.metrics.incr(metric_names::WORKERS_MARKED_UNHEALTHY, 1);
        self.wake_scheduler();

        Ok(ReportFailureResponse {})
    }
}

impl<C: Clock> CoordinatorService<C> {
    /// Apply a job-terminal-or-requeue event, then hand the refreshed job
    /// record off to the persistence worker.
    async fn apply_completion(&self, event: Event, job_id: &str) {
        self.state.lock_state_mut(|state| forge_state::apply_event(state, &event));
        let job = self.state.lock_state(|state| state.job(job_id).cloned());
        self.persist.submit(PersistTask { event, job, worker: None });
    }
}

#[cfg(test)]
#[path = "api_tests.rs"]
mod tests;
