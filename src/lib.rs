//! # cmdbench
//!
//! A generic benchmark harness that repeatedly executes an operation across a
//! pool of parallel workers, optionally paces it to a target throughput, stops
//! on either a wall-clock duration or a fixed operation count, and reports
//! throughput and latency percentiles.
//!
//! ## Architecture Overview
//!
//! - `config`: validated, immutable run parameters
//! - `operation`: the unit of work being measured (`Operation` trait)
//! - `pacing`: per-worker rate limiting toward a global target throughput
//! - `coordination`: shared run context, counters and the single stop signal
//! - `benchmark`: worker pool, result aggregation and the run lifecycle
//! - `reporter`: optional periodic throughput output while the run is live
//! - `metrics`: latency statistics computed once the run has drained
//! - `results`: the final report in text and JSON form
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use cmdbench::{BenchmarkRunner, CommandOperation, RunConfig, Termination};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let mut config = RunConfig::new("redis-cli PING", Termination::OperationCount(1000));
//!     config.parallelism = 8;
//!     config.target_rps = 500;
//!
//!     let operation = Arc::new(CommandOperation::from_config(&config)?);
//!     let runner = BenchmarkRunner::new(config, operation)?;
//!     let report = runner.run().await?;
//!
//!     println!("{}", report);
//!     Ok(())
//! }
//! ```

/// Run lifecycle: worker pool, result aggregation and finalization
pub mod benchmark;

/// Command-line interface parsing
pub mod cli;

/// Run configuration and validation
pub mod config;

/// Shared run state and termination control
///
/// Holds the atomic counters, the idempotent stop signal, the count-mode work
/// budget and the watchers that decide when a run ends.
pub mod coordination;

pub mod logging;

/// Latency statistics over the collected samples
pub mod metrics;

/// The unit of work under test
pub mod operation;

/// Per-worker pacing toward a target throughput
pub mod pacing;

pub mod reporter;

/// Final benchmark report and its renderings
pub mod results;

pub mod utils;

pub use benchmark::BenchmarkRunner;
pub use cli::Args;
pub use config::{ConfigError, RunConfig, Termination};
pub use coordination::{StopReason, StopSignal};
pub use metrics::{LatencyStats, StatsError};
pub use operation::{CommandOperation, Operation, OperationResult, Outcome};
pub use results::BenchmarkReport;

/// The current version of cmdbench
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default configuration values
pub mod defaults {
    use std::time::Duration;

    /// Default number of parallel workers
    pub const PARALLELISM: usize = 1;

    /// Default periodic report cadence, as accepted by `--report-interval`
    pub const REPORT_INTERVAL: &str = "5s";

    /// Intake slots per worker
    ///
    /// The intake is bounded at `parallelism * INTAKE_CAPACITY_PER_WORKER`
    /// results; a full intake blocks workers until the aggregator catches up.
    pub const INTAKE_CAPACITY_PER_WORKER: usize = 10;

    /// Pause between the stop signal and final statistics so in-flight pushes
    /// and the last reporter tick settle first.
    pub const GRACE_PERIOD: Duration = Duration::from_millis(150);

    /// Percentiles reported when none are requested
    pub const PERCENTILES: [f64; 4] = [50.0, 95.0, 99.0, 99.9];
}
