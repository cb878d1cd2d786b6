// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Coordinator configuration (spec.md §6's `coordinator.*`/`scheduler.*`/
//! `job.*` keys), loaded the way the teacher's daemon loads its `Config`: a
//! typed struct with sane defaults, overridable by environment variables and
//! `clap` flags, flags taking precedence.

use std::path::PathBuf;

use clap::Parser;
use forge_scheduler::SchedulerConfig;

#[derive(Debug, Clone, Parser)]
#[command(name = "forge-coordinatord", about = "Forge coordinator daemon")]
pub struct Config {
    /// TCP address the listener binds to.
    #[arg(long, env = "FORGE_COORDINATOR_ADDR", default_value = "127.0.0.1:7420")]
    pub addr: String,

    /// Directory holding the write-ahead log and persisted state documents.
    #[arg(long, env = "FORGE_COORDINATOR_DATA_DIR", default_value = "./forge-data")]
    pub data_dir: PathBuf,

    #[arg(long, env = "FORGE_SCHEDULER_SWEEP_PERIOD_MS", default_value_t = 5_000)]
    pub scheduler_sweep_period_ms: u64,

    #[arg(long, env = "FORGE_SCHEDULER_HEARTBEAT_TIMEOUT_MS", default_value_t = 30_000)]
    pub scheduler_heartbeat_timeout_ms: u64,

    #[arg(long, env = "FORGE_SCHEDULER_COOLDOWN_MS", default_value_t = 30_000)]
    pub scheduler_cooldown_ms: u64,

    #[arg(long, env = "FORGE_JOB_DEFAULT_TIMEOUT_MS", default_value_t = 300_000)]
    pub job_default_timeout_ms: u64,

    #[arg(long, env = "FORGE_JOB_DEFAULT_CPU", default_value_t = 1)]
    pub job_default_cpu: u32,

    #[arg(long, env = "FORGE_JOB_DEFAULT_RAM_MB", default_value_t = 256)]
    pub job_default_ram_mb: u64,

    #[arg(long, env = "FORGE_JOB_DEFAULT_MAX_RETRIES", default_value_t = 3)]
    pub job_default_max_retries: u32,
}

impl Config {
    pub fn scheduler_config(&self) -> SchedulerConfig {
        SchedulerConfig {
            sweep_period_ms: self.scheduler_sweep_period_ms,
            heartbeat_timeout_ms: self.scheduler_heartbeat_timeout_ms,
            cooldown_ms: self.scheduler_cooldown_ms,
            ..SchedulerConfig::default()
        }
    }

    pub fn wal_path(&self) -> PathBuf {
        self.data_dir.join("coordinator.wal")
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
