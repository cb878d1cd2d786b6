// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Docker-backed [`ContainerBackend`] — shells out to the `docker` CLI for
//! every stage of a container's life (image check, spawn, log streaming,
//! wait, teardown) rather than linking a client library.

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::mpsc::UnboundedSender;
use tokio_util::sync::CancellationToken;
use tracing::{info, info_span, warn, Instrument};

use crate::backend::{
    ContainerBackend, OutputChunk, OutputStream, RunOutcome, RunRequest, CANCELLED_EXIT_CODE,
    TIMEOUT_EXIT_CODE,
};
use crate::error::SandboxError;

/// Upper bound on pulling an image that isn't cached locally yet.
const IMAGE_PULL_TIMEOUT: Duration = Duration::from_secs(600);

/// Grace period given to log streaming to drain after the container exits.
const LOG_DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Runs sub-commands in disposable, hardened Docker containers.
///
/// Every container gets a unique `--name` so concurrent jobs on the same
/// host never collide, and is force-removed on every exit path (normal
/// completion, timeout, cancellation, or spawn failure).
pub struct DockerBackend {
    docker_bin: String,
}

impl Default for DockerBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl DockerBackend {
    pub fn new() -> Self {
        let docker_bin = std::env::var("FORGE_DOCKER_BIN").unwrap_or_else(|_| "docker".to_string());
        Self { docker_bin }
    }

    async fn exec(&self, args: &[&str]) -> Result<String, String> {
        let output = Command::new(&self.docker_bin)
            .args(args)
            .output()
            .await
            .map_err(|e| format!("failed to exec {}: {e}", self.docker_bin))?;

        if output.status.success() {
            Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            Err(format!("{} {} failed: {}", self.docker_bin, args.first().unwrap_or(&""), stderr.trim()))
        }
    }

    async fn ensure_image(&self, image: &str) -> Result<(), SandboxError> {
        if self.exec(&["image", "inspect", image]).await.is_ok() {
            return Ok(());
        }
        info!(image, "image not cached locally, pulling");
        match tokio::time::timeout(IMAGE_PULL_TIMEOUT, self.exec(&["pull", image])).await {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(reason)) => Err(SandboxError::ImagePullFailed { image: image.to_string(), reason }),
            Err(_) => Err(SandboxError::ImagePullFailed {
                image: image.to_string(),
                reason: "pull timed out".to_string(),
            }),
        }
    }

    async fn kill_and_remove(&self, name: &str) {
        if let Err(e) = self.exec(&["kill", name]).await {
            warn!(container = name, error = %e, "kill failed (container may have already exited)");
        }
        if let Err(e) = self.exec(&["rm", "-f", name]).await {
            warn!(container = name, error = %e, "rm failed");
        }
    }

    /// Spawn `docker logs -f <name>` and stream both its stdout and stderr
    /// to `on_chunk` as they arrive, accumulating the full text of each into
    /// the handles returned alongside the child.
    fn spawn_log_follower(
        &self,
        name: &str,
        on_chunk: UnboundedSender<OutputChunk>,
    ) -> Result<LogFollower, String> {
        let mut child = Command::new(&self.docker_bin)
            .args(["logs", "-f", name])
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| format!("failed to follow logs for {name}: {e}"))?;

        let stdout_task = child
            .stdout
            .take()
            .map(|r| tokio::spawn(drain_stream(r, OutputStream::Stdout, on_chunk.clone())));
        let stderr_task =
            child.stderr.take().map(|r| tokio::spawn(drain_stream(r, OutputStream::Stderr, on_chunk)));

        Ok(LogFollower { child, stdout_task, stderr_task })
    }
}

/// A running `docker logs -f` child plus the tasks accumulating its output.
struct LogFollower {
    child: Child,
    stdout_task: Option<tokio::task::JoinHandle<String>>,
    stderr_task: Option<tokio::task::JoinHandle<String>>,
}

impl LogFollower {
    /// Wait briefly for the drain tasks to finish, then return whatever they
    /// accumulated. A lagging or hung `docker logs -f` is abandoned rather
    /// than blocking the job's result indefinitely.
    async fn finish(mut self) -> (String, String) {
        let _ = tokio::time::timeout(LOG_DRAIN_TIMEOUT, self.child.wait()).await;
        let stdout = match self.stdout_task {
            Some(t) => tokio::time::timeout(LOG_DRAIN_TIMEOUT, t).await.ok().and_then(Result::ok),
            None => None,
        };
        let stderr = match self.stderr_task {
            Some(t) => tokio::time::timeout(LOG_DRAIN_TIMEOUT, t).await.ok().and_then(Result::ok),
            None => None,
        };
        (stdout.unwrap_or_default(), stderr.unwrap_or_default())
    }
}

async fn drain_stream(
    reader: impl tokio::io::AsyncRead + Unpin,
    stream: OutputStream,
    on_chunk: UnboundedSender<OutputChunk>,
) -> String {
    let mut acc = String::new();
    let mut lines = BufReader::new(reader).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        acc.push_str(&line);
        acc.push('\n');
        let mut bytes = line.into_bytes();
        bytes.push(b'\n');
        let _ = on_chunk.send(OutputChunk { stream, bytes });
    }
    acc
}

#[async_trait]
impl ContainerBackend for DockerBackend {
    async fn run(
        &self,
        req: RunRequest,
        cancel: CancellationToken,
        on_chunk: UnboundedSender<OutputChunk>,
    ) -> Result<RunOutcome, SandboxError> {
        let span = info_span!("sandbox.run", job_id = %req.job_id, image = %req.image);
        self.run_inner(req, cancel, on_chunk).instrument(span).await
    }
}

impl DockerBackend {
    async fn run_inner(
        &self,
        req: RunRequest,
        cancel: CancellationToken,
        on_chunk: UnboundedSender<OutputChunk>,
    ) -> Result<RunOutcome, SandboxError> {
        self.ensure_image(&req.image).await?;

        let name = container_name(&req.job_id);
        let owned_args = build_run_args(&name, &req);
        let args: Vec<&str> = owned_args.iter().map(String::as_str).collect();

        info!(container = %name, "spawning sandbox container");
        self.exec(&args).await.map_err(SandboxError::SpawnFailed)?;

        let mut log_follower = match self.spawn_log_follower(&name, on_chunk) {
            Ok(child) => Some(child),
            Err(e) => {
                warn!(container = %name, error = %e, "failed to attach log follower, output will be empty");
                None
            }
        };

        let wait = Command::new(&self.docker_bin).args(["wait", &name]).output();

        let outcome = tokio::select! {
            biased;

            _ = cancel.cancelled() => {
                self.kill_and_remove(&name).await;
                RunOutcome { exit_code: CANCELLED_EXIT_CODE, cancelled: true, ..Default::default() }
            }
            _ = tokio::time::sleep_until(req.deadline) => {
                self.kill_and_remove(&name).await;
                RunOutcome { exit_code: TIMEOUT_EXIT_CODE, timed_out: true, ..Default::default() }
            }
            result = wait => {
                let exit_code = match result {
                    Ok(output) if output.status.success() => {
                        String::from_utf8_lossy(&output.stdout).trim().parse().unwrap_or(-1)
                    }
                    _ => -1,
                };
                RunOutcome { exit_code, ..Default::default() }
            }
        };

        let (stdout, stderr) = match log_follower.take() {
            Some(follower) => follower.finish().await,
            None => (String::new(), String::new()),
        };
        self.exec(&["rm", "-f", &name]).await.ok();

        Ok(RunOutcome { stdout, stderr, ..outcome })
    }
}

fn container_name(job_id: &str) -> String {
    format!("forge-{job_id}-{}", nanoid::nanoid!(8))
}

/// Build the full `docker run` argument list for one sandboxed sub-command,
/// applying every isolation control the runner contract requires.
fn build_run_args(name: &str, req: &RunRequest) -> Vec<String> {
    vec![
        "run".to_string(),
        "-d".to_string(),
        "--name".to_string(),
        name.to_string(),
        "--read-only".to_string(),
        "--cap-drop".to_string(),
        "ALL".to_string(),
        "--security-opt".to_string(),
        "no-new-privileges".to_string(),
        "--network".to_string(),
        "none".to_string(),
        "--memory".to_string(),
        req.limits.memory.clone(),
        "--memory-swap".to_string(),
        req.limits.memory.clone(),
        "--cpus".to_string(),
        req.limits.cpu_quota.to_string(),
        "--pids-limit".to_string(),
        req.limits.pids_limit.to_string(),
        "--tmpfs".to_string(),
        format!("/tmp:size={}m", req.limits.tmp_tmpfs_mb),
        "--tmpfs".to_string(),
        format!("/run:size={}m", req.limits.run_tmpfs_mb),
        "-v".to_string(),
        format!("{}:/workspace:rw", req.workspace_dir.display()),
        "-w".to_string(),
        "/workspace".to_string(),
        req.image.clone(),
        "sh".to_string(),
        "-c".to_string(),
        req.command.clone(),
    ]
}

#[cfg(test)]
#[path = "docker_tests.rs"]
mod tests;
