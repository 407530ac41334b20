//! # Benchmark Engine Module
//!
//! Orchestrates one benchmark run from start to report.
//!
//! ## Run Lifecycle
//!
//! 1. **Start**: spawn `parallelism` workers, the optional periodic reporter
//!    and, for duration-capped runs, the duration watcher
//! 2. **Measure**: workers pace, invoke the operation and push results into a
//!    bounded intake; the aggregator drains it, updating counters and samples
//!    and letting the termination controller check the operation target
//! 3. **Stop**: the termination controller trips the stop signal; workers
//!    exit, dropping their intake senders, which closes the intake
//! 4. **Drain**: the aggregator consumes whatever is still buffered, so no
//!    pushed result is lost
//! 5. **Report**: after a short grace period, latency statistics are computed
//!    and the final report is assembled
//!
//! ## Concurrency
//!
//! Every worker is its own task on the multi-threaded runtime. Every wait a
//! worker performs (pacing tick, invocation, push into a full intake) races the
//! stop signal, so a tripped signal always ends the run promptly. An invocation
//! still in flight when the signal trips is abandoned and not recorded.

use crate::{
    config::{ConfigError, RunConfig},
    coordination::{RunContext, TerminationController},
    metrics::LatencySamples,
    operation::{timed_invoke, Operation, OperationResult, Outcome},
    pacing::Pacer,
    reporter,
    results::BenchmarkReport,
};
use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

/// Drives a benchmark run for one operation
///
/// ```rust,no_run
/// # use std::sync::Arc;
/// # use cmdbench::{BenchmarkRunner, CommandOperation, RunConfig, Termination};
/// # use std::time::Duration;
/// # #[tokio::main]
/// # async fn main() -> anyhow::Result<()> {
/// let config = RunConfig::new("true", Termination::Duration(Duration::from_secs(5)));
/// let operation = Arc::new(CommandOperation::from_config(&config)?);
/// let report = BenchmarkRunner::new(config, operation)?.run().await?;
/// assert_eq!(
///     report.total_operations,
///     report.successful_operations + report.failed_operations
/// );
/// # Ok(())
/// # }
/// ```
pub struct BenchmarkRunner {
    config: RunConfig,
    operation: Arc<dyn Operation>,
}

impl BenchmarkRunner {
    /// Create a runner, rejecting an invalid configuration up front
    pub fn new(config: RunConfig, operation: Arc<dyn Operation>) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config, operation })
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Execute the run and return its report
    ///
    /// Individual operation failures never fail the run; they are counted.
    pub async fn run(&self) -> Result<BenchmarkReport> {
        let context = Arc::new(RunContext::new(self.config.termination));
        let controller = TerminationController::new(self.config.termination, Arc::clone(&context));
        let (intake_tx, intake_rx) = mpsc::channel(self.config.intake_capacity());

        info!(
            "Starting benchmark of `{}` with {} workers",
            self.operation.name(),
            self.config.parallelism
        );

        let reporter = self
            .config
            .report_interval
            .map(|every| reporter::spawn(Arc::clone(&context), every));

        let mut workers = JoinSet::new();
        for id in 0..self.config.parallelism {
            let worker = Worker {
                id,
                operation: Arc::clone(&self.operation),
                context: Arc::clone(&context),
                intake: intake_tx.clone(),
                target_rps: self.config.target_rps,
                pool_size: self.config.parallelism,
                timeout: self.config.op_timeout,
            };
            workers.spawn(worker.run());
        }
        // Only workers hold senders, so the intake closes when the last one exits
        drop(intake_tx);

        let watcher = controller.arm();

        let samples = aggregate(intake_rx, &context, &controller).await;
        let elapsed = context.elapsed();
        controller.on_workers_finished();

        while let Some(joined) = workers.join_next().await {
            match joined {
                Ok(invocations) => debug!("Worker finished after {} invocations", invocations),
                Err(e) => warn!("Worker task failed: {}", e),
            }
        }

        tokio::time::sleep(self.config.grace_period).await;

        for side_task in [watcher, reporter].into_iter().flatten() {
            if let Err(e) = side_task.await {
                warn!("Background task failed: {}", e);
            }
        }

        if samples.is_empty() {
            warn!("No results were collected; skipping latency statistics");
        }
        let latency = samples.stats(&self.config.percentiles);

        let report = BenchmarkReport::new(
            self.config.command.clone(),
            context.counters.snapshot(),
            elapsed,
            context.stop.reason(),
            latency,
        );
        info!(
            "Benchmark finished: {} collected in {:?}",
            report.total_operations, report.elapsed
        );
        Ok(report)
    }
}

/// One member of the worker pool
struct Worker {
    id: usize,
    operation: Arc<dyn Operation>,
    context: Arc<RunContext>,
    intake: mpsc::Sender<OperationResult>,
    /// Global target shared by the pool; 0 leaves the worker unpaced
    target_rps: u64,
    pool_size: usize,
    timeout: Option<Duration>,
}

impl Worker {
    /// Loop until stopped or out of budget; returns the number of results pushed
    async fn run(self) -> u64 {
        let stop = &self.context.stop;
        let mut pacer = Pacer::for_worker(self.target_rps, self.pool_size);
        let mut pushed = 0u64;

        loop {
            if let Some(pacer) = pacer.as_mut() {
                tokio::select! {
                    biased;
                    _ = stop.cancelled() => break,
                    _ = pacer.tick() => {}
                }
            }

            if stop.is_tripped() {
                break;
            }

            if !self.context.budget.try_claim() {
                debug!(
                    "Worker {} found the operation budget exhausted after {} claims",
                    self.id,
                    self.context.budget.issued()
                );
                break;
            }

            let result = tokio::select! {
                biased;
                _ = stop.cancelled() => {
                    debug!("Worker {} abandoned an in-flight invocation", self.id);
                    break;
                }
                result = timed_invoke(self.operation.as_ref(), self.timeout) => result,
            };

            // A free slot is taken immediately; a full intake waits, but not past a stop
            tokio::select! {
                biased;
                sent = self.intake.send(result) => {
                    if sent.is_err() {
                        break;
                    }
                }
                _ = stop.cancelled() => break,
            }
            pushed += 1;
        }

        debug!("Worker {} exiting", self.id);
        pushed
    }
}

/// Drain the intake until every worker has exited and the buffer is empty
async fn aggregate(
    mut intake: mpsc::Receiver<OperationResult>,
    context: &RunContext,
    controller: &TerminationController,
) -> LatencySamples {
    let mut samples = LatencySamples::new();
    let mut seen_failure = false;

    while let Some(result) = intake.recv().await {
        let collected = context.counters.record(result.outcome.is_success());
        samples.record(result.latency);

        if let Outcome::Failure(cause) = &result.outcome {
            if seen_failure {
                debug!("Operation failed: {}", cause);
            } else {
                warn!(
                    "Operation failed: {} (further failures are logged at debug level)",
                    cause
                );
                seen_failure = true;
            }
        }

        controller.observe_collected(collected);
    }

    samples
}
