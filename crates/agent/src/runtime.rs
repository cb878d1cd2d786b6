// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Wires the agent's three cooperating background tasks — heartbeat
//! ticker, claim/poll loop, per-job executor — around one shared
//! [`AgentState`] (SPEC_FULL.md §4.2 "Ambient addition — process
//! structure").

use std::sync::Arc;
use std::time::Duration;

use forge_wire::{ClaimNextRequest, HeartbeatRequest, RegisterWorkerRequest};
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::channel::WorkerChannel;
use crate::error::AgentError;
use crate::executor::{self, ExecutorContext};
use crate::telemetry::{cpu_count, hostname, CpuSnapshot, MemInfo};

/// Shared state for one worker agent process.
pub struct AgentState {
    pub worker_id: String,
    pub heartbeat_period: Duration,
    pub poll_period: Duration,
    executor_ctx: Arc<ExecutorContext>,
    in_flight: Arc<Semaphore>,
    max_parallel: usize,
}

impl AgentState {
    pub fn new(
        worker_id: String,
        heartbeat_period: Duration,
        poll_period: Duration,
        max_parallel: usize,
        executor_ctx: ExecutorContext,
    ) -> Arc<Self> {
        Arc::new(Self {
            worker_id,
            heartbeat_period,
            poll_period,
            executor_ctx: Arc::new(executor_ctx),
            in_flight: Arc::new(Semaphore::new(max_parallel.max(1))),
            max_parallel: max_parallel.max(1),
        })
    }

    fn channel(&self) -> &Arc<dyn WorkerChannel> {
        &self.executor_ctx.channel
    }

    /// Send the one-time `RegisterWorker` call the agent makes on startup,
    /// carrying its capacity snapshot and an initial CPU sample.
    pub async fn register(&self) -> Result<(), AgentError> {
        let mem = MemInfo::read().unwrap_or_default();
        self.channel()
            .register_worker(RegisterWorkerRequest {
                worker_id: self.worker_id.clone(),
                hostname: hostname(),
                os: std::env::consts::OS.to_string(),
                cpu_count: cpu_count(),
                cpu_usage: 0.0,
                ram_total_mb: mem.total_mb,
                ram_free_mb: mem.available_mb,
                version: env!("CARGO_PKG_VERSION").to_string(),
            })
            .await?;
        info!(worker_id = %self.worker_id, "registered with coordinator");
        Ok(())
    }

    /// Every `heartbeat_period`, sample CPU/RAM and report telemetry plus
    /// current busy/idle status, until `shutdown` fires.
    pub async fn run_heartbeat(self: Arc<Self>, shutdown: CancellationToken) {
        let mut previous = CpuSnapshot::read().unwrap_or_default();
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => return,
                _ = tokio::time::sleep(self.heartbeat_period) => {}
            }

            let current = CpuSnapshot::read().unwrap_or_default();
            let cpu_usage = previous.usage_percent_since(&current);
            previous = current;
            let mem = MemInfo::read().unwrap_or_default();
            let status = if self.in_flight.available_permits() < self.max_parallel { "busy" } else { "idle" };

            if let Err(e) = self
                .channel()
                .heartbeat(HeartbeatRequest {
                    worker_id: self.worker_id.clone(),
                    cpu_usage,
                    ram_free_mb: mem.available_mb,
                    ram_total_mb: mem.total_mb,
                    status: status.to_string(),
                })
                .await
            {
                warn!(worker_id = %self.worker_id, error = %e, "heartbeat failed, will retry next tick");
            }
        }
    }

    /// Every `poll_period`, if the worker has spare parallelism, ask the
    /// coordinator for the next assigned job and spawn its executor.
    /// Refuses to claim beyond `max_parallel` jobs in flight (spec.md §4.2:
    /// "the worker refuses to claim more than P jobs concurrently").
    pub async fn run_claim_loop(self: Arc<Self>, shutdown: CancellationToken) {
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => return,
                _ = tokio::time::sleep(self.poll_period) => {}
            }

            let permit = match self.in_flight.clone().try_acquire_owned() {
                Ok(permit) => permit,
                Err(_) => continue,
            };

            let claimed =
                self.channel().claim_next(ClaimNextRequest { worker_id: self.worker_id.clone() }).await;
            match claimed {
                Ok(resp) => match resp.job {
                    Some(job) => {
                        info!(job_id = %job.id, worker_id = %self.worker_id, "claimed job");
                        let executor_ctx = self.executor_ctx.clone();
                        tokio::spawn(async move {
                            let _permit = permit;
                            if let Err(e) = executor::execute(&executor_ctx, job).await {
                                warn!(error = %e, "failed to report a job's terminal outcome to the coordinator");
                            }
                        });
                    }
                    None => drop(permit),
                },
                Err(e) => {
                    warn!(worker_id = %self.worker_id, error = %e, "claim poll failed, will retry next tick");
                    drop(permit);
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "runtime_tests.rs"]
mod tests;
