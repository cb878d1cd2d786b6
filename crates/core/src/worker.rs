// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worker identifier.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

/// Unique identifier for a worker instance.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WorkerId(pub String);

impl WorkerId {
    /// Create a new WorkerId from any string-like value.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the string value of this WorkerId.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WorkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for WorkerId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for WorkerId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl PartialEq<str> for WorkerId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for WorkerId {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

impl Borrow<str> for WorkerId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl Default for WorkerId {
    /// Generate a fresh random worker id (used the first time a worker
    /// process runs with no stable identity configured).
    fn default() -> Self {
        Self(format!("wkr-{}", nanoid::nanoid!(16)))
    }
}

/// Live status of a worker as tracked by the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkerStatus {
    /// Registered, no jobs in flight, not in cooldown.
    Idle,
    /// At least one job in flight.
    Busy,
    /// In cooldown after reporting a failure.
    Unhealthy,
    /// Scheduler-set: worker unreachable (heartbeat timeout).
    Offline,
}

crate::simple_display! {
    WorkerStatus {
        Idle => "idle",
        Busy => "busy",
        Unhealthy => "unhealthy",
        Offline => "offline",
    }
}

/// A worker's static capacity and live telemetry, plus scheduler bookkeeping.
///
/// Workers only ever report telemetry (`cpu_usage`, `ram_free_mb`, `status`)
/// via heartbeat; `reserved_cpu`/`reserved_ram_mb` and `current_job_ids` are
/// maintained exclusively by the scheduler under the state mutex.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Worker {
    pub id: WorkerId,
    pub hostname: String,
    pub os: String,
    pub cpu_count: u32,
    pub cpu_usage: f64,
    pub ram_total_mb: u64,
    pub ram_free_mb: u64,
    pub status: WorkerStatus,
    /// Epoch milliseconds of the last accepted heartbeat.
    pub last_heartbeat_ms: u64,
    pub registered_at_ms: u64,
    #[serde(default)]
    pub current_job_ids: Vec<String>,
    #[serde(default)]
    pub reserved_cpu: u32,
    #[serde(default)]
    pub reserved_ram_mb: u64,
    #[serde(default)]
    pub cooldown_until_ms: Option<u64>,
    #[serde(default)]
    pub health_reason: Option<String>,
    #[serde(default)]
    pub version: String,
}

impl Worker {
    /// True when the worker can accept at least one more job of the given shape,
    /// ignoring cooldown and staleness (callers apply those separately — see
    /// the scheduler's Pass C candidate filter).
    ///
    /// Checked against live `ram_free_mb` telemetry, not `ram_total_mb` (spec.md
    /// §4.4: `ramFreeMb - reservedRamMb ≥ requiredRamMb`) — a worker under real
    /// memory pressure must not look like it has headroom just because its
    /// installed RAM does.
    pub fn has_capacity_for(&self, required_cpu: u32, required_ram_mb: u64) -> bool {
        self.cpu_count.saturating_sub(self.reserved_cpu) >= required_cpu
            && self.ram_free_mb.saturating_sub(self.reserved_ram_mb) >= required_ram_mb
    }

    /// Whether this worker is in an active cooldown window at `now_ms`.
    pub fn in_cooldown(&self, now_ms: u64) -> bool {
        self.cooldown_until_ms.is_some_and(|until| now_ms < until)
    }
}

#[cfg(any(test, feature = "test-support"))]
impl Worker {
    /// Build a worker record with sane defaults, for tests.
    pub fn test_fixture(id: impl Into<String>) -> Self {
        Self {
            id: WorkerId::new(id),
            hostname: "test-host".to_string(),
            os: "linux".to_string(),
            cpu_count: 4,
            cpu_usage: 10.0,
            ram_total_mb: 8192,
            ram_free_mb: 7000,
            status: WorkerStatus::Idle,
            last_heartbeat_ms: 0,
            registered_at_ms: 0,
            current_job_ids: Vec::new(),
            reserved_cpu: 0,
            reserved_ram_mb: 0,
            cooldown_until_ms: None,
            health_reason: None,
            version: "test".to_string(),
        }
    }
}

#[cfg(test)]
#[path = "worker_tests.rs"]
mod tests;
