//! Rate limiting for workers.
//!
//! A global target throughput is split evenly across workers, each of which
//! owns an independent [`Pacer`]. There is no coordination between workers:
//! the per-worker rate is rounded up, so when the target does not divide
//! evenly by the worker count the achieved rate may overshoot the target
//! slightly. That approximation is accepted in exchange for zero contention.

use std::time::Duration;
use tokio::time::{interval, Interval, MissedTickBehavior};

/// Operations per second for one worker, or `None` when pacing is disabled
///
/// Uses integer ceiling division, so `per_worker_rate(100, 3)` is `Some(34)`.
pub fn per_worker_rate(target_rps: u64, parallelism: usize) -> Option<u64> {
    if target_rps == 0 || parallelism == 0 {
        return None;
    }
    let workers = parallelism as u64;
    Some(target_rps / workers + u64::from(target_rps % workers != 0))
}

/// Time between pacing ticks for a per-worker rate, never zero
pub fn tick_period(rate: u64) -> Duration {
    let nanos = 1_000_000_000 / rate.max(1);
    Duration::from_nanos(nanos.max(1))
}

/// Per-worker pacing clock
///
/// The first tick completes immediately. A worker that falls behind (an
/// invocation slower than the period) skips the missed ticks instead of
/// bursting to catch up.
pub struct Pacer {
    interval: Interval,
}

impl Pacer {
    /// Create a pacer for the given rate. Must be called within a Tokio runtime.
    pub fn new(rate: u64) -> Self {
        let mut interval = interval(tick_period(rate));
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        Self { interval }
    }

    /// Pacer for one worker of a run, `None` when the run is unpaced
    pub fn for_worker(target_rps: u64, parallelism: usize) -> Option<Self> {
        per_worker_rate(target_rps, parallelism).map(Self::new)
    }

    /// Wait for the next permitted start
    pub async fn tick(&mut self) {
        self.interval.tick().await;
    }

    pub fn period(&self) -> Duration {
        self.interval.period()
    }
}
