// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::process::ExitCode;

use clap::Parser;
use forge_coordinatord::Config;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::parse();

    let bootstrapped = match forge_coordinatord::bootstrap(&config).await {
        Ok(bootstrapped) => bootstrapped,
        Err(e) => {
            error!(error = %e, "failed to bootstrap coordinator");
            return ExitCode::FAILURE;
        }
    };

    let shutdown = CancellationToken::new();

    let scheduler_shutdown = shutdown.clone();
    let scheduler = bootstrapped.scheduler;
    let scheduler_task = tokio::spawn(async move {
        scheduler.run(scheduler_shutdown).await;
    });

    let listener_shutdown = shutdown.clone();
    let api = bootstrapped.api;
    let listener_task =
        tokio::spawn(async move { forge_coordinatord::listener::serve(&config.addr, api, listener_shutdown).await });

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("received shutdown signal");
        }
    }

    shutdown.cancel();

    let _ = scheduler_task.await;
    match listener_task.await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => error!(error = %e, "listener exited with an error"),
        Err(e) => error!(error = %e, "listener task panicked"),
    }
    bootstrapped.persist_task.abort();

    ExitCode::SUCCESS
}
