// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Background sweep tasks.
//!
//! A sweeper holds only a weak reference to its target and exits once the
//! target is dropped. The returned [`SweepHandle`] aborts the task on drop.

use std::sync::{Arc, Weak};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, trace};

/// A shared map that can be swept for stale entries.
pub trait Sweepable: Send + Sync + 'static {
    /// Removes stale entries, returning how many were removed.
    fn sweep(&self) -> usize;

    /// Short name used in log output.
    fn label(&self) -> &'static str;
}

/// Spawns sweep tasks.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sweeper;

impl Sweeper {
    /// Sweeps `target` every `interval` until it is dropped or the handle is.
    ///
    /// The first sweep happens one full interval after spawning.
    pub fn spawn<T: Sweepable>(target: &Arc<T>, interval: Duration) -> SweepHandle {
        let weak: Weak<T> = Arc::downgrade(target);
        let label = target.label();

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            ticker.tick().await;

            loop {
                ticker.tick().await;
                let Some(target) = weak.upgrade() else {
                    trace!(sweeper = label, "Target dropped, stopping sweeper");
                    break;
                };
                let removed = target.sweep();
                if removed > 0 {
                    debug!(sweeper = label, removed, "Sweep removed stale entries");
                }
            }
        });

        debug!(sweeper = label, interval_ms = interval.as_millis() as u64, "Sweeper started");
        SweepHandle { label, task }
    }
}

/// Handle to a running sweeper. Dropping it stops the sweeper.
#[derive(Debug)]
pub struct SweepHandle {
    label: &'static str,
    task: JoinHandle<()>,
}

impl SweepHandle {
    /// Name of the swept target.
    pub fn label(&self) -> &'static str {
        self.label
    }

    /// Returns true if the task has exited.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Stops the sweeper.
    pub fn stop(self) {}
}

impl Drop for SweepHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

// =============================================================================
// Tests
// =============================================================================
