//! # Run Coordination Module
//!
//! Shared state for a single benchmark run and the logic that decides when
//! the run ends.
//!
//! ## Key Components
//!
//! - **RunContext**: explicit value handed to every task (workers, aggregator,
//!   reporter, watchers) instead of any global state
//! - **AggregateCounters**: monotonically increasing atomic counters
//! - **StopSignal**: the single, idempotent, monotone cancellation token
//! - **WorkBudget**: ticket counter that caps started invocations in count mode
//! - **TerminationController**: arms the duration or operation-count watcher
//!
//! Readers of the counters (reporter, count watcher) may observe slightly
//! stale values; only the increments themselves are totally ordered.

use crate::config::Termination;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tokio_util::sync::{CancellationToken, WaitForCancellationFuture};
use tracing::{debug, info};

/// Why a run stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    DurationElapsed,
    OperationTargetReached,
    /// Every worker exited before either watcher fired
    WorkersFinished,
}

impl std::fmt::Display for StopReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StopReason::DurationElapsed => write!(f, "duration elapsed"),
            StopReason::OperationTargetReached => write!(f, "operation target reached"),
            StopReason::WorkersFinished => write!(f, "workers finished"),
        }
    }
}

/// Single-shot cancellation signal
///
/// Tripping is idempotent and safe from any number of tasks at once: the first
/// trip records its reason and cancels the token, later trips are no-ops.
/// Once tripped the signal stays tripped.
#[derive(Debug, Default)]
pub struct StopSignal {
    token: CancellationToken,
    reason: OnceLock<StopReason>,
}

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Trip the signal. Returns `true` only for the call that actually tripped it.
    pub(crate) fn trip(&self, reason: StopReason) -> bool {
        let first = self.reason.set(reason).is_ok();
        self.token.cancel();
        first
    }

    pub fn is_tripped(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Reason recorded by the first trip
    pub fn reason(&self) -> Option<StopReason> {
        self.reason.get().copied()
    }

    /// Completes once the signal is tripped
    pub fn cancelled(&self) -> WaitForCancellationFuture<'_> {
        self.token.cancelled()
    }
}

/// Point-in-time copy of the counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CounterSnapshot {
    pub collected: u64,
    pub successful: u64,
    pub failed: u64,
}

/// Run-wide outcome counters
///
/// Only ever incremented, never reset mid-run.
#[derive(Debug, Default)]
pub struct AggregateCounters {
    collected: AtomicU64,
    successful: AtomicU64,
    failed: AtomicU64,
}

impl AggregateCounters {
    /// Count one result and return the new `collected` total
    pub fn record(&self, success: bool) -> u64 {
        if success {
            self.successful.fetch_add(1, Ordering::Relaxed);
        } else {
            self.failed.fetch_add(1, Ordering::Relaxed);
        }
        self.collected.fetch_add(1, Ordering::AcqRel) + 1
    }

    pub fn collected(&self) -> u64 {
        self.collected.load(Ordering::Acquire)
    }

    pub fn snapshot(&self) -> CounterSnapshot {
        CounterSnapshot {
            collected: self.collected.load(Ordering::Acquire),
            successful: self.successful.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
        }
    }
}

/// Caps how many invocations may be started in count mode
///
/// Each worker claims a ticket before invoking; once `limit` tickets are out,
/// workers stop. Since every started invocation in count mode is collected,
/// the run ends with exactly `limit` results.
#[derive(Debug)]
pub struct WorkBudget {
    issued: AtomicU64,
    limit: Option<u64>,
}

impl WorkBudget {
    pub fn new(limit: Option<u64>) -> Self {
        Self {
            issued: AtomicU64::new(0),
            limit,
        }
    }

    /// Claim permission for one more invocation
    pub fn try_claim(&self) -> bool {
        match self.limit {
            None => true,
            Some(limit) => self
                .issued
                .fetch_update(Ordering::AcqRel, Ordering::Acquire, |issued| {
                    (issued < limit).then_some(issued + 1)
                })
                .is_ok(),
        }
    }

    pub fn issued(&self) -> u64 {
        self.issued.load(Ordering::Acquire)
    }
}

/// State shared by every task of one run
#[derive(Debug)]
pub struct RunContext {
    pub counters: AggregateCounters,
    pub stop: StopSignal,
    pub budget: WorkBudget,
    pub started_at: Instant,
}

impl RunContext {
    pub fn new(termination: Termination) -> Self {
        let limit = match termination {
            Termination::OperationCount(n) => Some(n),
            Termination::Duration(_) => None,
        };

        Self {
            counters: AggregateCounters::default(),
            stop: StopSignal::new(),
            budget: WorkBudget::new(limit),
            started_at: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }
}

/// Decides when a run ends and is the only component that trips the stop signal
///
/// Exactly one watcher is armed, depending on the termination mode: a timer
/// task for duration-capped runs, or a check after every aggregated result for
/// count-capped runs.
pub struct TerminationController {
    termination: Termination,
    context: Arc<RunContext>,
}

impl TerminationController {
    pub fn new(termination: Termination, context: Arc<RunContext>) -> Self {
        Self {
            termination,
            context,
        }
    }

    /// Start the duration watcher, if this run is duration-capped
    pub fn arm(&self) -> Option<JoinHandle<()>> {
        let Termination::Duration(duration) = self.termination else {
            return None;
        };

        let context = Arc::clone(&self.context);
        Some(tokio::spawn(async move {
            tokio::select! {
                biased;
                _ = context.stop.cancelled() => {}
                _ = tokio::time::sleep(duration) => {
                    if context.stop.trip(StopReason::DurationElapsed) {
                        info!("Benchmark duration reached. Signaling workers to stop...");
                    }
                }
            }
        }))
    }

    /// Operation-count watcher, called by the aggregator after every result
    pub fn observe_collected(&self, collected: u64) {
        if let Termination::OperationCount(target) = self.termination {
            if collected >= target && self.context.stop.trip(StopReason::OperationTargetReached) {
                info!("Target number of operations reached. Signaling workers to stop...");
            }
        }
    }

    /// Called once the intake has closed because every worker exited
    ///
    /// Makes sure the remaining side tasks observe a tripped signal even if
    /// no watcher fired first.
    pub fn on_workers_finished(&self) {
        if self.context.stop.trip(StopReason::WorkersFinished) {
            debug!("All workers exited before a stop condition was reached");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stop_signal_first_trip_wins() {
        let signal = StopSignal::new();
        assert!(!signal.is_tripped());
        assert_eq!(signal.reason(), None);

        assert!(signal.trip(StopReason::DurationElapsed));
        assert!(!signal.trip(StopReason::OperationTargetReached));

        assert!(signal.is_tripped());
        assert_eq!(signal.reason(), Some(StopReason::DurationElapsed));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_trips_have_one_winner() {
        let signal = Arc::new(StopSignal::new());
        let mut handles = Vec::new();
        for i in 0..16 {
            let signal = Arc::clone(&signal);
            handles.push(tokio::spawn(async move {
                let reason = if i % 2 == 0 {
                    StopReason::DurationElapsed
                } else {
                    StopReason::OperationTargetReached
                };
                signal.trip(reason)
            }));
        }

        let mut winners = 0;
        for handle in handles {
            if handle.await.unwrap() {
                winners += 1;
            }
        }
        assert_eq!(winners, 1);
        assert!(signal.reason().is_some());
    }

    #[tokio::test]
    async fn test_cancelled_future_resolves_after_trip() {
        let signal = Arc::new(StopSignal::new());
        let waiter = {
            let signal = Arc::clone(&signal);
            tokio::spawn(async move { signal.cancelled().await })
        };
        signal.trip(StopReason::WorkersFinished);
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("waiter should observe the trip")
            .unwrap();
    }

    #[test]
    fn test_counters_record() {
        let counters = AggregateCounters::default();
        assert_eq!(counters.record(true), 1);
        assert_eq!(counters.record(false), 2);
        assert_eq!(counters.record(true), 3);

        assert_eq!(
            counters.snapshot(),
            CounterSnapshot {
                collected: 3,
                successful: 2,
                failed: 1,
            }
        );
    }

    #[test]
    fn test_work_budget() {
        let unlimited = WorkBudget::new(None);
        assert!((0..1000).all(|_| unlimited.try_claim()));

        let budget = WorkBudget::new(Some(3));
        assert!(budget.try_claim());
        assert!(budget.try_claim());
        assert!(budget.try_claim());
        assert!(!budget.try_claim());
        assert_eq!(budget.issued(), 3);
    }

    #[tokio::test]
    async fn test_count_watcher_trips_at_target() {
        let context = Arc::new(RunContext::new(Termination::OperationCount(2)));
        let controller =
            TerminationController::new(Termination::OperationCount(2), Arc::clone(&context));
        assert!(controller.arm().is_none());

        controller.observe_collected(1);
        assert!(!context.stop.is_tripped());
        controller.observe_collected(2);
        controller.observe_collected(3);
        assert_eq!(
            context.stop.reason(),
            Some(StopReason::OperationTargetReached)
        );
    }

    #[tokio::test]
    async fn test_duration_watcher_trips_after_duration() {
        let termination = Termination::Duration(Duration::from_millis(50));
        let context = Arc::new(RunContext::new(termination));
        let controller = TerminationController::new(termination, Arc::clone(&context));

        let watcher = controller.arm().expect("duration watcher");
        controller.observe_collected(1_000_000);
        assert!(!context.stop.is_tripped());

        watcher.await.unwrap();
        assert_eq!(context.stop.reason(), Some(StopReason::DurationElapsed));
        assert!(context.elapsed() >= Duration::from_millis(50));
    }

    #[tokio::test]
    async fn test_duration_watcher_exits_when_already_stopped() {
        let termination = Termination::Duration(Duration::from_secs(60));
        let context = Arc::new(RunContext::new(termination));
        let controller = TerminationController::new(termination, Arc::clone(&context));

        let watcher = controller.arm().expect("duration watcher");
        controller.on_workers_finished();

        tokio::time::timeout(Duration::from_secs(1), watcher)
            .await
            .expect("watcher should exit on cancellation")
            .unwrap();
        assert_eq!(context.stop.reason(), Some(StopReason::WorkersFinished));
    }
}
