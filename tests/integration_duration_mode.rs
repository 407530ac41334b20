use anyhow::Result;
use async_trait::async_trait;
use cmdbench::{BenchmarkRunner, Operation, RunConfig, StopReason, Termination};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Sleeps for a fixed time and succeeds.
struct SleepOp(Duration);

#[async_trait]
impl Operation for SleepOp {
    async fn invoke(&self) -> Result<()> {
        tokio::time::sleep(self.0).await;
        Ok(())
    }

    fn name(&self) -> &str {
        "sleep"
    }
}

fn duration_config(duration: Duration, parallelism: usize, target_rps: u64) -> RunConfig {
    let mut config = RunConfig::new("stub", Termination::Duration(duration));
    config.parallelism = parallelism;
    config.target_rps = target_rps;
    config
}

/// A paced duration run lands near rate * duration.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn paced_duration_run_tracks_target_rate() -> Result<()> {
    let config = duration_config(Duration::from_secs(2), 4, 100);
    let report = BenchmarkRunner::new(config, Arc::new(SleepOp(Duration::ZERO)))?
        .run()
        .await?;

    assert_eq!(report.stop_reason, Some(StopReason::DurationElapsed));
    // 200 expected; within 10%
    assert!(
        (180..=220).contains(&report.total_operations),
        "collected {}",
        report.total_operations
    );
    assert!(report.elapsed >= Duration::from_secs(2));
    Ok(())
}

/// A target that does not divide by the worker count rounds each worker up,
/// so the run may overshoot slightly but stays within tolerance.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn uneven_target_overshoots_within_tolerance() -> Result<()> {
    // ceil(100 / 3) = 34 per worker, about 102 ops/s in total
    let config = duration_config(Duration::from_secs(2), 3, 100);
    assert_eq!(config.per_worker_rps(), Some(34));

    let report = BenchmarkRunner::new(config, Arc::new(SleepOp(Duration::ZERO)))?
        .run()
        .await?;

    let collected = report.total_operations as f64;
    let target = 100.0 * 2.0;
    let paced = 102.0 * 2.0;
    assert!(collected >= target * 0.9, "collected {}", collected);
    assert!(collected <= paced * 1.1, "collected {}", collected);
    Ok(())
}

/// With pacing disabled the harness drives operations as fast as they return.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn unpaced_duration_run_is_not_throttled() -> Result<()> {
    let config = duration_config(Duration::from_millis(300), 2, 0);
    let report = BenchmarkRunner::new(config, Arc::new(SleepOp(Duration::from_millis(1))))?
        .run()
        .await?;

    // Two workers at ~1ms per invocation for 300ms
    assert!(report.total_operations > 100, "collected {}", report.total_operations);
    assert_eq!(
        report.total_operations,
        report.successful_operations + report.failed_operations
    );
    Ok(())
}

/// A worker waiting on a long pacing interval is released by the stop signal.
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn pacing_wait_is_preempted_by_stop() -> Result<()> {
    // One op per second: first tick fires immediately, the next would be at 1s
    let config = duration_config(Duration::from_millis(200), 1, 1);

    let start = Instant::now();
    let report = BenchmarkRunner::new(config, Arc::new(SleepOp(Duration::ZERO)))?
        .run()
        .await?;

    assert_eq!(report.total_operations, 1);
    assert!(start.elapsed() < Duration::from_millis(900), "{:?}", start.elapsed());
    Ok(())
}

/// An operation outliving the run is abandoned, leaving no samples.
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn in_flight_operation_is_abandoned() -> Result<()> {
    let config = duration_config(Duration::from_millis(100), 2, 0);

    let start = Instant::now();
    let report = BenchmarkRunner::new(config, Arc::new(SleepOp(Duration::from_secs(10))))?
        .run()
        .await?;

    assert_eq!(report.total_operations, 0);
    assert!(report.latency.is_none());
    assert_eq!(report.ops_per_second, 0.0);
    assert!(start.elapsed() < Duration::from_secs(2));
    assert!(report.to_string().contains("No latency data collected."));
    Ok(())
}

/// A per-operation timeout turns a hung operation into a recorded failure.
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn operation_timeout_records_failures() -> Result<()> {
    let mut config = duration_config(Duration::from_millis(300), 1, 0);
    config.op_timeout = Some(Duration::from_millis(40));

    let report = BenchmarkRunner::new(config, Arc::new(SleepOp(Duration::from_secs(10))))?
        .run()
        .await?;

    assert!(report.failed_operations >= 3, "{:?}", report.failed_operations);
    assert_eq!(report.successful_operations, 0);
    Ok(())
}

/// The periodic reporter runs beside the workers and stops with them.
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn run_with_periodic_reporter_completes() -> Result<()> {
    let mut config = duration_config(Duration::from_millis(250), 2, 0);
    config.report_interval = Some(Duration::from_millis(50));

    let report = BenchmarkRunner::new(config, Arc::new(SleepOp(Duration::from_millis(2))))?
        .run()
        .await?;

    assert_eq!(report.stop_reason, Some(StopReason::DurationElapsed));
    assert!(report.total_operations > 0);
    Ok(())
}
