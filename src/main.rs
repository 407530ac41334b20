//! # cmdbench - Main Entry Point
//!
//! Runs a command repeatedly across parallel workers and reports throughput
//! and latency.
//!
//! ## Flow
//!
//! 1. **Parse arguments** and initialize logging
//! 2. **Validate configuration**: any error exits with a nonzero status
//!    before a single invocation runs
//! 3. **Run the benchmark** with periodic reports if enabled
//! 4. **Print the final report** as text or, with `--json`, as JSON
//!
//! Individual command failures are counted in the report and never change the
//! exit status.

use anyhow::{Context, Result};
use clap::Parser;
use cmdbench::{cli::Args, logging, BenchmarkRunner, CommandOperation, RunConfig};
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    logging::init(args.verbose, args.quiet);

    let mut config = RunConfig::from_args(&args).context("Invalid configuration")?;

    if args.json {
        // Keep stdout a single JSON document
        config.report_interval = None;
    }

    let operation = Arc::new(CommandOperation::from_config(&config)?);
    info!(
        "Executing `{}` with arguments {:?}",
        operation.program(),
        operation.args()
    );

    let runner = BenchmarkRunner::new(config, operation).context("Invalid configuration")?;
    if !args.json {
        println!("{}", runner.config());
        println!("Starting benchmark...");
    }

    let report = runner.run().await?;

    if args.json {
        println!("{}", report.to_json()?);
    } else {
        println!("\n{}", report);
        println!("Benchmark finished.");
    }

    Ok(())
}
