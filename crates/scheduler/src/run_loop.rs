// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The scheduler's run loop: a periodic timer plus an event-driven wakeup,
//! mirroring the teacher's "spawn a background task with `tokio::time::
//! interval`" collector shape, generalized with a [`tokio_util::sync::
//! CancellationToken`] for graceful shutdown and a [`tokio::sync::Notify`]
//! so `forge-coordinatord`'s API handlers can trigger an out-of-band sweep
//! right after a job submission instead of waiting out the full period.

use std::sync::Arc;
use std::time::Duration;

use forge_core::{Clock, Metrics};
use forge_state::{Event, StateHandle};
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::config::SchedulerConfig;
use crate::sweep::{run_sweep, SweepReport};

/// Callback invoked with each event a sweep produced, in application order.
/// `forge-coordinatord` wires this to its write-ahead log so a sweep's
/// effects survive a crash between the in-memory mutation and the next
/// periodic snapshot.
pub type EventSink = Arc<dyn Fn(&Event) + Send + Sync>;

/// Owns the sweep cadence for one coordinator process.
pub struct Scheduler<C: Clock> {
    state: StateHandle,
    config: SchedulerConfig,
    metrics: Metrics,
    clock: C,
    notify: Arc<Notify>,
    on_event: Option<EventSink>,
}

impl<C: Clock> Scheduler<C> {
    pub fn new(state: StateHandle, config: SchedulerConfig, metrics: Metrics, clock: C) -> Self {
        Self { state, config, metrics, clock, notify: Arc::new(Notify::new()), on_event: None }
    }

    /// Install a callback fired with each event a sweep applies, most
    /// recently via [`Self::on_event`]. Intended for WAL persistence.
    pub fn with_event_sink(mut self, sink: EventSink) -> Self {
        self.on_event = Some(sink);
        self
    }

    /// A cloneable handle callers can use to wake the loop immediately
    /// instead of waiting for the next periodic tick (e.g. right after a
    /// job submission or a worker heartbeat that frees up capacity).
    pub fn notify_handle(&self) -> Arc<Notify> {
        Arc::clone(&self.notify)
    }

    /// Run one sweep synchronously and fan its events out to the sink.
    pub fn sweep_once(&self) -> SweepReport {
        let report = run_sweep(&self.state, self.clock.epoch_ms(), &self.config, &self.metrics);
        if let Some(sink) = &self.on_event {
            for event in &report.events {
                sink(event);
            }
        }
        report
    }

    /// Run until `shutdown` is cancelled, sweeping on every periodic tick
    /// and on every `notify_handle()` wakeup. Coalesces bursts of wakeups
    /// that arrive faster than a sweep can run, since `Notify::notified()`
    /// only guarantees at-least-one wakeup, not one per `notify_one()` call.
    pub async fn run(&self, shutdown: CancellationToken) {
        let mut interval = tokio::time::interval(Duration::from_millis(self.config.sweep_period_ms));
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        info!(sweep_period_ms = self.config.sweep_period_ms, "scheduler loop starting");

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    self.sweep_once();
                }
                _ = self.notify.notified() => {
                    self.sweep_once();
                }
                _ = shutdown.cancelled() => {
                    info!("scheduler loop shutting down");
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "run_loop_tests.rs"]
mod tests;
