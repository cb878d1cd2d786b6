// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use forge_agent::{AgentState, Config, ExecutorContext, TcpWorkerChannel};
use forge_sandbox::DockerBackend;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Upper bound on the registration retry backoff (spec.md §4.2: `RegistrationFailed` → retry with backoff).
const MAX_REGISTER_BACKOFF: Duration = Duration::from_secs(30);

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::parse();
    let worker_id = config.worker_id.clone().unwrap_or_else(|| format!("wkr-{}", uuid::Uuid::new_v4()));

    let shutdown = CancellationToken::new();
    tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            let _ = tokio::signal::ctrl_c().await;
            info!("received shutdown signal");
            shutdown.cancel();
        }
    });

    let channel = Arc::new(TcpWorkerChannel::new(config.coordinator_addr.clone()));
    let executor_ctx = ExecutorContext {
        channel: channel.clone(),
        backend: Arc::new(DockerBackend::new()),
        http: reqwest::Client::new(),
        file_service_base_url: config.file_service_base_url.clone(),
        workspace_root: config.workspace_dir.clone(),
        worker_id: worker_id.clone(),
        limits: config.resource_limits(),
        cancel_poll_period: Duration::from_millis(config.cancel_poll_period_ms),
    };

    let state = AgentState::new(
        worker_id,
        Duration::from_millis(config.heartbeat_period_ms),
        Duration::from_millis(config.poll_period_ms),
        config.effective_max_parallel_jobs(),
        executor_ctx,
    );

    if register_with_retry(&state, &shutdown).await.is_err() {
        return ExitCode::FAILURE;
    }

    let heartbeat_task = tokio::spawn(state.clone().run_heartbeat(shutdown.clone()));
    let claim_task = tokio::spawn(state.clone().run_claim_loop(shutdown.clone()));

    shutdown.cancelled().await;

    let _ = heartbeat_task.await;
    let _ = claim_task.await;

    ExitCode::SUCCESS
}

/// Retry `Register` with doubling backoff until it succeeds or shutdown is
/// requested first.
async fn register_with_retry(state: &Arc<AgentState>, shutdown: &CancellationToken) -> Result<(), ()> {
    let mut backoff = Duration::from_millis(500);
    loop {
        match state.register().await {
            Ok(()) => return Ok(()),
            Err(e) => {
                error!(error = %e, "failed to register with coordinator, retrying");
                tokio::select! {
                    _ = tokio::time::sleep(backoff) => {}
                    _ = shutdown.cancelled() => return Err(()),
                }
                backoff = (backoff * 2).min(MAX_REGISTER_BACKOFF);
            }
        }
    }
}
