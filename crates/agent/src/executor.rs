// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Executes one claimed job end to end (spec.md §4.2 "Execute a job"):
//! fetch and unpack the input archive, run each newline-separated
//! sub-command in its own sandbox container in order, stream output back
//! to the coordinator as it arrives, poll for cancellation between
//! sub-commands, and submit a terminal result or failure — cleaning up the
//! job's workspace regardless of outcome.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use forge_core::job::OutputStream as JobOutputStream;
use forge_core::{pick_image, Job, ResourceLimits};
use forge_sandbox::{ContainerBackend, OutputStream as SandboxOutputStream, RunRequest};
use forge_wire::{AppendOutputRequest, CheckCancelRequest, ReportFailureRequest, SubmitResultRequest};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, info_span, warn, Instrument};

use crate::channel::WorkerChannel;
use crate::error::AgentError;

/// Everything a job execution needs that outlives any single job.
pub struct ExecutorContext {
    pub channel: Arc<dyn WorkerChannel>,
    pub backend: Arc<dyn ContainerBackend>,
    pub http: reqwest::Client,
    pub file_service_base_url: String,
    pub workspace_root: PathBuf,
    pub worker_id: String,
    pub limits: ResourceLimits,
    pub cancel_poll_period: Duration,
}

/// Run one job to completion, reporting its terminal outcome to the
/// coordinator and cleaning up its workspace directory before returning.
///
/// Only returns `Err` when the terminal report itself could not be
/// delivered to the coordinator — a job-level failure (archive setup,
/// sandbox error) is reported via `report_failure` and swallowed here, so
/// one job's orchestration failure never brings down the agent's other
/// background tasks.
pub async fn execute(ctx: &ExecutorContext, job: Job) -> Result<(), AgentError> {
    let span = info_span!("agent.execute_job", job_id = %job.id);
    async move { run(ctx, job).await }.instrument(span).await
}

async fn run(ctx: &ExecutorContext, job: Job) -> Result<(), AgentError> {
    let job_dir = match crate::archive::fetch_and_unpack(
        &ctx.http,
        &ctx.file_service_base_url,
        &job.archive_ref,
        job.id.as_str(),
        &ctx.workspace_root,
    )
    .await
    {
        Ok(dir) => dir,
        Err(e) => {
            warn!(error = %e, "failed to set up job workspace");
            return report_failure(ctx, &job, e.to_string()).await;
        }
    };

    let cancel = CancellationToken::new();
    let poll_handle = spawn_cancel_poll(ctx, job.id.as_str(), cancel.clone());

    let outcome = run_subcommands(ctx, &job, &job_dir, cancel).await;

    poll_handle.abort();
    crate::archive::cleanup(&job_dir);

    match outcome {
        Ok((stdout, stderr, exit_code)) => submit_result(ctx, &job, stdout, stderr, exit_code).await,
        Err(e) => {
            warn!(error = %e, "job execution failed");
            report_failure(ctx, &job, e.to_string()).await
        }
    }
}

/// Poll `CheckCancel` every `cancel_poll_period` for the lifetime of the
/// job and raise `cancel` on the first positive response (spec.md §4.2
/// "Cancellation"). Aborted by the caller once the job has finished.
fn spawn_cancel_poll(ctx: &ExecutorContext, job_id: &str, cancel: CancellationToken) -> JoinHandle<()> {
    let channel = ctx.channel.clone();
    let job_id = job_id.to_string();
    let period = ctx.cancel_poll_period;
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(period).await;
            match channel.check_cancel(CheckCancelRequest { job_id: job_id.clone() }).await {
                Ok(resp) if resp.cancel_requested => {
                    info!(job_id = %job_id, "cancellation requested, raising sandbox cancel token");
                    cancel.cancel();
                    return;
                }
                Ok(_) => {}
                Err(e) => warn!(job_id = %job_id, error = %e, "check-cancel poll failed, will retry"),
            }
        }
    })
}

/// Run every newline-separated sub-command in order, each in its own
/// container. A non-zero sub-command exit continues to the next one; the
/// returned exit code is always the last sub-command's. Stops early (but
/// still returns `Ok`) once `cancel` fires.
async fn run_subcommands(
    ctx: &ExecutorContext,
    job: &Job,
    job_dir: &Path,
    cancel: CancellationToken,
) -> Result<(String, String, i32), AgentError> {
    let mut stdout = String::new();
    let mut stderr = String::new();
    let mut exit_code = 0;

    for command in job.command.split('\n').map(str::trim).filter(|c| !c.is_empty()) {
        let deadline = tokio::time::Instant::now() + Duration::from_millis(job.timeout_ms);
        let req = RunRequest {
            job_id: job.id.0.clone(),
            command: command.to_string(),
            workspace_dir: job_dir.to_path_buf(),
            image: pick_image(command).to_string(),
            limits: ctx.limits.clone(),
            deadline,
        };

        let (tx, rx) = mpsc::unbounded_channel();
        let forward_handle = spawn_chunk_forwarder(ctx, job.id.0.clone(), rx);
        let outcome = ctx.backend.run(req, cancel.clone(), tx).await?;
        let _ = forward_handle.await;

        stdout.push_str(&outcome.stdout);
        stderr.push_str(&outcome.stderr);
        exit_code = outcome.exit_code;

        if outcome.cancelled || cancel.is_cancelled() {
            break;
        }
    }

    Ok((stdout, stderr, exit_code))
}

/// Forward each container output chunk to the coordinator as it arrives,
/// tagged with the job/worker ids and stream type (spec.md §4.2: "forward
/// each chunk to the coordinator as a log stream message").
fn spawn_chunk_forwarder(
    ctx: &ExecutorContext,
    job_id: String,
    mut rx: mpsc::UnboundedReceiver<forge_sandbox::OutputChunk>,
) -> JoinHandle<()> {
    let channel = ctx.channel.clone();
    let worker_id = ctx.worker_id.clone();
    tokio::spawn(async move {
        while let Some(chunk) = rx.recv().await {
            let stream = match chunk.stream {
                SandboxOutputStream::Stdout => JobOutputStream::Stdout,
                SandboxOutputStream::Stderr => JobOutputStream::Stderr,
            };
            let req = AppendOutputRequest {
                job_id: job_id.clone(),
                worker_id: worker_id.clone(),
                stream,
                chunk: String::from_utf8_lossy(&chunk.bytes).into_owned(),
            };
            if let Err(e) = channel.append_output(req).await {
                warn!(job_id = %job_id, error = %e, "failed to forward an output chunk, continuing");
            }
        }
    })
}

async fn submit_result(
    ctx: &ExecutorContext,
    job: &Job,
    stdout: String,
    stderr: String,
    exit_code: i32,
) -> Result<(), AgentError> {
    ctx.channel
        .submit_result(SubmitResultRequest {
            job_id: job.id.0.clone(),
            worker_id: ctx.worker_id.clone(),
            stdout,
            stderr,
            exit_code,
        })
        .await?;
    Ok(())
}

async fn report_failure(ctx: &ExecutorContext, job: &Job, error_message: String) -> Result<(), AgentError> {
    ctx.channel
        .report_failure(ReportFailureRequest {
            job_id: job.id.0.clone(),
            worker_id: ctx.worker_id.clone(),
            error_message,
        })
        .await?;
    Ok(())
}

#[cfg(test)]
#[path = "executor_tests.rs"]
mod tests;
