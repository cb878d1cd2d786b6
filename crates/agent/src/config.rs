// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worker agent configuration, loaded the same way `forge-coordinatord`
//! loads its own: a typed `clap::Parser` struct with environment-variable
//! fallbacks, flags taking precedence.

use std::path::PathBuf;

use clap::Parser;

#[derive(Debug, Clone, Parser)]
#[command(name = "forge-agent", about = "Forge worker agent")]
pub struct Config {
    /// TCP address of the coordinator to connect to.
    #[arg(long, env = "FORGE_AGENT_COORDINATOR_ADDR", default_value = "127.0.0.1:7420")]
    pub coordinator_addr: String,

    /// Stable worker id to register with. Defaults to a fresh random id on
    /// every process start (a worker has no durable identity of its own).
    #[arg(long, env = "FORGE_AGENT_WORKER_ID")]
    pub worker_id: Option<String>,

    /// Directory each job's input archive is unpacked into (one
    /// subdirectory per job, cleaned up after the job finishes).
    #[arg(long, env = "FORGE_AGENT_WORKSPACE_DIR", default_value = "./forge-agent-workspace")]
    pub workspace_dir: PathBuf,

    #[arg(long, env = "FORGE_AGENT_HEARTBEAT_PERIOD_MS", default_value_t = 10_000)]
    pub heartbeat_period_ms: u64,

    #[arg(long, env = "FORGE_AGENT_POLL_PERIOD_MS", default_value_t = 5_000)]
    pub poll_period_ms: u64,

    /// How often a running job polls `CheckCancel` between sub-commands.
    #[arg(long, env = "FORGE_AGENT_CANCEL_POLL_PERIOD_MS", default_value_t = 2_000)]
    pub cancel_poll_period_ms: u64,

    /// Maximum number of jobs this worker will run concurrently. `0` means
    /// auto: `max(1, cpuCount / 2)`.
    #[arg(long, env = "FORGE_AGENT_MAX_PARALLEL_JOBS", default_value_t = 0)]
    pub max_parallel_jobs: u32,

    /// Base URL the agent fetches `archiveRef`s from (the file service is
    /// out of scope for this crate; this just names where to GET it).
    #[arg(long, env = "FORGE_AGENT_FILE_SERVICE_BASE_URL", default_value = "http://127.0.0.1:8088/archives")]
    pub file_service_base_url: String,

    /// `sandbox.memoryLimit` — Docker-style human-readable memory cap
    /// applied to every sub-command's container.
    #[arg(long, env = "FORGE_AGENT_SANDBOX_MEMORY_LIMIT", default_value = "512m")]
    pub sandbox_memory_limit: String,

    /// `sandbox.cpuLimit` — fractional core count cap per container.
    #[arg(long, env = "FORGE_AGENT_SANDBOX_CPU_LIMIT", default_value_t = 2.0)]
    pub sandbox_cpu_limit: f64,

    /// `sandbox.tmpfsMb` — size of the `/tmp` tmpfs mounted into the
    /// container.
    #[arg(long, env = "FORGE_AGENT_SANDBOX_TMPFS_MB", default_value_t = 1024)]
    pub sandbox_tmpfs_mb: u64,
}

impl Config {
    /// Resolve the configured resource limits applied to every sub-command's
    /// container, falling back to `forge_core::ResourceLimits`'s own
    /// defaults for the fields this config doesn't expose directly.
    pub fn resource_limits(&self) -> forge_core::ResourceLimits {
        forge_core::ResourceLimits {
            memory: self.sandbox_memory_limit.clone(),
            cpu_quota: self.sandbox_cpu_limit,
            tmp_tmpfs_mb: self.sandbox_tmpfs_mb,
            ..forge_core::ResourceLimits::default()
        }
    }

    /// Resolve the worker's concurrency cap: the configured value, or
    /// `max(1, cpuCount / 2)` when left at the `0` "auto" sentinel.
    pub fn effective_max_parallel_jobs(&self) -> usize {
        if self.max_parallel_jobs > 0 {
            self.max_parallel_jobs as usize
        } else {
            std::cmp::max(1, crate::telemetry::cpu_count() as usize / 2)
        }
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
