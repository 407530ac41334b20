//! # Run Configuration
//!
//! Converts parsed command-line arguments into the immutable [`RunConfig`]
//! that drives a benchmark run. Validation happens once, here, before any
//! work starts; every other failure during a run is non-fatal.
//!
//! The two ways a run can end are modelled as the [`Termination`] enum, so a
//! configuration can never carry both a duration cap and an operation cap.

use crate::{cli::Args, pacing, utils::format_duration};
use std::time::Duration;
use thiserror::Error;

/// Condition that ends a run
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Termination {
    /// Stop once this much wall-clock time has elapsed
    Duration(Duration),

    /// Stop once this many results have been collected
    OperationCount(u64),
}

/// Reasons a configuration is rejected
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("--cmd is required and cannot be empty")]
    EmptyCommand,

    #[error("exactly one of --duration or --total-ops must be specified (got neither)")]
    MissingTermination,

    #[error("exactly one of --duration or --total-ops must be specified (got both)")]
    ConflictingTermination,

    #[error("--duration must be greater than 0")]
    ZeroDuration,

    #[error("--total-ops must be greater than 0")]
    ZeroOperations,

    #[error("--parallel must be greater than 0")]
    ZeroParallelism,

    #[error("--timeout must be greater than 0 when given")]
    ZeroTimeout,

    #[error("at least one percentile must be requested")]
    NoPercentiles,

    #[error("percentile {0} is outside (0, 100]")]
    InvalidPercentile(f64),
}

/// Validated parameters for one benchmark run
///
/// Built once at startup and never mutated while the run is in progress.
#[derive(Clone, Debug)]
pub struct RunConfig {
    /// Command line executed by each invocation
    pub command: String,

    /// Global operations per second across all workers; 0 disables pacing
    pub target_rps: u64,

    /// When the run ends
    pub termination: Termination,

    /// Number of concurrent workers
    pub parallelism: usize,

    /// Periodic report cadence; `None` disables the reporter
    pub report_interval: Option<Duration>,

    /// Per-invocation timeout; an expired invocation counts as a failure
    pub op_timeout: Option<Duration>,

    /// Latency percentiles included in the report
    pub percentiles: Vec<f64>,

    /// Pause between the stop signal and final statistics
    pub grace_period: Duration,
}

impl RunConfig {
    /// Configuration with default pacing, parallelism and reporting
    pub fn new(command: impl Into<String>, termination: Termination) -> Self {
        Self {
            command: command.into(),
            target_rps: 0,
            termination,
            parallelism: crate::defaults::PARALLELISM,
            report_interval: None,
            op_timeout: None,
            percentiles: crate::defaults::PERCENTILES.to_vec(),
            grace_period: crate::defaults::GRACE_PERIOD,
        }
    }

    /// Create a validated configuration from CLI arguments
    pub fn from_args(args: &Args) -> Result<Self, ConfigError> {
        let termination = match (args.duration, args.total_ops) {
            (None, None) => return Err(ConfigError::MissingTermination),
            (Some(_), Some(_)) => return Err(ConfigError::ConflictingTermination),
            (Some(duration), None) => Termination::Duration(duration),
            (None, Some(count)) => Termination::OperationCount(count),
        };

        let config = Self {
            command: args.command.trim().to_string(),
            target_rps: args.rps,
            termination,
            parallelism: args.parallelism,
            report_interval: Some(args.report_interval).filter(|i| !i.is_zero()),
            op_timeout: args.timeout,
            percentiles: args.percentiles.clone(),
            grace_period: crate::defaults::GRACE_PERIOD,
        };

        config.validate()?;
        Ok(config)
    }

    /// Check every invariant a run relies on
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.command.split_whitespace().next().is_none() {
            return Err(ConfigError::EmptyCommand);
        }

        match self.termination {
            Termination::Duration(d) if d.is_zero() => return Err(ConfigError::ZeroDuration),
            Termination::OperationCount(0) => return Err(ConfigError::ZeroOperations),
            _ => {}
        }

        if self.parallelism == 0 {
            return Err(ConfigError::ZeroParallelism);
        }

        if matches!(self.op_timeout, Some(t) if t.is_zero()) {
            return Err(ConfigError::ZeroTimeout);
        }

        if self.percentiles.is_empty() {
            return Err(ConfigError::NoPercentiles);
        }
        if let Some(&p) = self
            .percentiles
            .iter()
            .find(|&&p| !(p > 0.0 && p <= 100.0))
        {
            return Err(ConfigError::InvalidPercentile(p));
        }

        Ok(())
    }

    /// Operations per second each worker is paced to, if pacing is enabled
    pub fn per_worker_rps(&self) -> Option<u64> {
        pacing::per_worker_rate(self.target_rps, self.parallelism)
    }

    /// Capacity of the bounded intake between workers and the aggregator
    pub fn intake_capacity(&self) -> usize {
        self.parallelism
            .saturating_mul(crate::defaults::INTAKE_CAPACITY_PER_WORKER)
            .max(1)
    }
}

impl std::fmt::Display for RunConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "--- Configuration ---")?;
        writeln!(f, "  Command:            {}", self.command)?;
        writeln!(
            f,
            "  Target RPS:         {} (0 means unlimited)",
            self.target_rps
        )?;
        match self.termination {
            Termination::Duration(d) => writeln!(f, "  Duration:           {}", format_duration(d))?,
            Termination::OperationCount(n) => writeln!(f, "  Total Operations:   {}", n)?,
        }
        writeln!(f, "  Parallel Workers:   {}", self.parallelism)?;
        match self.report_interval {
            Some(i) => writeln!(f, "  Report Interval:    {}", format_duration(i))?,
            None => writeln!(f, "  Report Interval:    Disabled")?,
        }
        if let Some(timeout) = self.op_timeout {
            writeln!(f, "  Operation Timeout:  {}", format_duration(timeout))?;
        }
        if let Some(rate) = self.per_worker_rps() {
            writeln!(f, "  RPS per worker:     ~{}", rate)?;
        }
        write!(f, "---------------------")
    }
}
