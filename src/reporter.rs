//! Periodic throughput reporting.
//!
//! Runs beside the workers and prints one line per tick with the throughput
//! since the previous tick and the cumulative throughput so far. It only reads
//! the shared counters and never affects the final report.

use crate::coordination::RunContext;
use crate::utils::rate;
use chrono::{DateTime, Local};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, MissedTickBehavior};
use tracing::debug;

/// One periodic report line
#[derive(Debug, Clone)]
pub struct ProgressSnapshot {
    pub at: DateTime<Local>,
    pub interval_ops_per_sec: f64,
    pub total_ops: u64,
    pub overall_ops_per_sec: f64,
}

impl std::fmt::Display for ProgressSnapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[{}] Current: {:.2} ops/s | Total Ops: {} | Overall Avg: {:.2} ops/s",
            self.at.format("%H:%M:%S"),
            self.interval_ops_per_sec,
            self.total_ops,
            self.overall_ops_per_sec
        )
    }
}

/// Tracks the previous tick so each snapshot can report an interval rate
#[derive(Debug)]
pub struct ProgressTracker {
    started_at: Instant,
    last_at: Instant,
    last_count: u64,
}

impl ProgressTracker {
    pub fn new(started_at: Instant) -> Self {
        Self {
            started_at,
            last_at: started_at,
            last_count: 0,
        }
    }

    pub fn sample(&mut self, now: Instant, collected: u64) -> ProgressSnapshot {
        let interval_ops = collected.saturating_sub(self.last_count);
        let snapshot = ProgressSnapshot {
            at: Local::now(),
            interval_ops_per_sec: rate(interval_ops, now.saturating_duration_since(self.last_at)),
            total_ops: collected,
            overall_ops_per_sec: rate(collected, now.saturating_duration_since(self.started_at)),
        };

        self.last_at = now;
        self.last_count = collected;
        snapshot
    }
}

/// Start the reporter; it exits once the run's stop signal trips
pub fn spawn(context: Arc<RunContext>, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval_at(tokio::time::Instant::now() + every, every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut tracker = ProgressTracker::new(context.started_at);

        println!("\n--- Periodic Reports ---");
        loop {
            tokio::select! {
                biased;
                _ = context.stop.cancelled() => break,
                _ = ticker.tick() => {
                    let snapshot = tracker.sample(Instant::now(), context.counters.collected());
                    println!("{}", snapshot);
                }
            }
        }
        debug!("Periodic reporter stopped");
    })
}
