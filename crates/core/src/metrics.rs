// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! A small counter registry for scheduler and coordinator instrumentation.
//!
//! This is not a metrics exporter — there is no StatsD/Prometheus wiring.
//! It exists so sweep and request-handling code has somewhere cheap to bump
//! a named counter, and so tests can assert on counts without touching logs.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

/// A shared, cloneable registry of named monotonic counters.
#[derive(Debug, Clone, Default)]
pub struct Metrics {
    counters: Arc<RwLock<HashMap<&'static str, Arc<AtomicU64>>>>,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Increment the named counter by `n`, creating it at zero if absent.
    pub fn incr(&self, name: &'static str, n: u64) {
        if let Some(counter) = self.counters.read().get(name) {
            counter.fetch_add(n, Ordering::Relaxed);
            return;
        }
        let counter = self
            .counters
            .write()
            .entry(name)
            .or_insert_with(|| Arc::new(AtomicU64::new(0)))
            .clone();
        counter.fetch_add(n, Ordering::Relaxed);
    }

    /// Current value of the named counter, or 0 if it has never been touched.
    pub fn get(&self, name: &'static str) -> u64 {
        self.counters.read().get(name).map(|c| c.load(Ordering::Relaxed)).unwrap_or(0)
    }

    /// Snapshot of all counters, for diagnostics or tests.
    pub fn snapshot(&self) -> HashMap<&'static str, u64> {
        self.counters.read().iter().map(|(k, v)| (*k, v.load(Ordering::Relaxed))).collect()
    }
}

pub mod names {
    pub const JOBS_ASSIGNED: &str = "jobs_assigned";
    pub const JOBS_REQUEUED: &str = "jobs_requeued";
    pub const JOBS_FAILED: &str = "jobs_failed";
    pub const JOBS_COMPLETED: &str = "jobs_completed";
    pub const WORKERS_MARKED_OFFLINE: &str = "workers_marked_offline";
    pub const WORKERS_MARKED_UNHEALTHY: &str = "workers_marked_unhealthy";
    pub const SWEEPS_RUN: &str = "sweeps_run";
}

#[cfg(test)]
#[path = "metrics_tests.rs"]
mod tests;
