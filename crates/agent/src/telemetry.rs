// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Host CPU/RAM telemetry for heartbeats, read straight from `/proc` rather
//! than through a crate — the workspace carries no `sysinfo`-style
//! dependency, and this is the only place that would need one.
//!
//! CPU usage is a delta of busy/idle jiffies between two `/proc/stat`
//! snapshots taken at consecutive heartbeat times, matching the spec's
//! "computed from a delta... between two snapshots" wording exactly: a
//! single snapshot's absolute tick counts say nothing about recent load.

use std::fs;
use std::path::Path;

/// One snapshot of the aggregate `cpu` line in `/proc/stat`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CpuSnapshot {
    idle: u64,
    total: u64,
}

impl CpuSnapshot {
    /// Read the current aggregate CPU snapshot from `/proc/stat`.
    pub fn read() -> std::io::Result<Self> {
        Self::read_from(Path::new("/proc/stat"))
    }

    fn read_from(path: &Path) -> std::io::Result<Self> {
        let contents = fs::read_to_string(path)?;
        let line = contents.lines().find(|l| l.starts_with("cpu ")).unwrap_or("cpu 0 0 0 0 0 0 0 0 0 0");
        Ok(Self::parse(line))
    }

    fn parse(line: &str) -> Self {
        let fields: Vec<u64> = line.split_whitespace().skip(1).filter_map(|f| f.parse().ok()).collect();
        // user, nice, system, idle, iowait, irq, softirq, steal, guest, guest_nice
        let idle = fields.get(3).copied().unwrap_or(0) + fields.get(4).copied().unwrap_or(0);
        let total: u64 = fields.iter().sum();
        Self { idle, total }
    }

    /// Percentage of CPU busy between `self` (earlier) and `later`, clamped
    /// to `[0.0, 100.0]`. Returns 0.0 if no ticks elapsed (e.g. called twice
    /// in immediate succession).
    pub fn usage_percent_since(&self, later: &CpuSnapshot) -> f64 {
        let total_delta = later.total.saturating_sub(self.total);
        if total_delta == 0 {
            return 0.0;
        }
        let idle_delta = later.idle.saturating_sub(self.idle);
        let busy_delta = total_delta.saturating_sub(idle_delta);
        (busy_delta as f64 / total_delta as f64 * 100.0).clamp(0.0, 100.0)
    }
}

/// Static + live memory figures, in megabytes.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MemInfo {
    pub total_mb: u64,
    pub available_mb: u64,
}

impl MemInfo {
    pub fn read() -> std::io::Result<Self> {
        Self::read_from(Path::new("/proc/meminfo"))
    }

    fn read_from(path: &Path) -> std::io::Result<Self> {
        let contents = fs::read_to_string(path)?;
        let mut total_kb = 0u64;
        let mut available_kb = 0u64;
        for line in contents.lines() {
            if let Some(rest) = line.strip_prefix("MemTotal:") {
                total_kb = parse_kb(rest);
            } else if let Some(rest) = line.strip_prefix("MemAvailable:") {
                available_kb = parse_kb(rest);
            }
        }
        Ok(Self { total_mb: total_kb / 1024, available_mb: available_kb / 1024 })
    }
}

fn parse_kb(field: &str) -> u64 {
    field.split_whitespace().next().and_then(|v| v.parse().ok()).unwrap_or(0)
}

/// Number of logical CPUs available to this process.
pub fn cpu_count() -> u32 {
    std::thread::available_parallelism().map(|n| n.get() as u32).unwrap_or(1)
}

/// Best-effort host name for the `Register` call's identity payload.
/// Falls back to a fixed placeholder rather than failing registration over
/// a cosmetic field.
pub fn hostname() -> String {
    std::env::var("HOSTNAME")
        .ok()
        .or_else(|| fs::read_to_string("/proc/sys/kernel/hostname").ok().map(|s| s.trim().to_string()))
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "unknown-host".to_string())
}

#[cfg(test)]
#[path = "telemetry_tests.rs"]
mod tests;
