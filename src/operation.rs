//! # Operations
//!
//! An [`Operation`] is the opaque unit of work a benchmark invokes over and
//! over. The harness never inspects what an operation did: it only measures
//! how long the call took and whether it returned `Ok` or `Err`.
//!
//! [`CommandOperation`] is the built-in implementation used by the CLI. It
//! spawns an external program for every invocation.

use crate::config::RunConfig;
use crate::utils::format_duration;
use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::process::Command;

/// Outcome of a single invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Success,
    /// The invocation failed; the string describes the cause
    Failure(String),
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success)
    }
}

impl From<Result<()>> for Outcome {
    fn from(result: Result<()>) -> Self {
        match result {
            Ok(()) => Outcome::Success,
            Err(e) => Outcome::Failure(format!("{:#}", e)),
        }
    }
}

/// Latency and outcome of one invocation, handed from a worker to the aggregator
#[derive(Debug, Clone)]
pub struct OperationResult {
    pub latency: Duration,
    pub outcome: Outcome,
}

/// A unit of work the harness invokes repeatedly
///
/// Implementations must be shareable across workers. Returning an error marks
/// the invocation as failed; the harness records it and moves on without
/// retrying.
#[async_trait]
pub trait Operation: Send + Sync {
    /// Perform the work once
    async fn invoke(&self) -> Result<()>;

    /// Short human-readable description used in diagnostics
    fn name(&self) -> &str;
}

/// Invoke an operation once, measuring wall-clock latency around the call
///
/// When `timeout` is set and expires, the invocation is abandoned and recorded
/// as a failure whose latency is the time waited.
pub async fn timed_invoke(operation: &dyn Operation, timeout: Option<Duration>) -> OperationResult {
    let start = Instant::now();
    let outcome = match timeout {
        Some(limit) => match tokio::time::timeout(limit, operation.invoke()).await {
            Ok(result) => Outcome::from(result),
            Err(_) => Outcome::Failure(format!("timed out after {}", format_duration(limit))),
        },
        None => Outcome::from(operation.invoke().await),
    };

    OperationResult {
        latency: start.elapsed(),
        outcome,
    }
}

/// Runs an external command per invocation
///
/// The command line is split on whitespace into a program and its arguments
/// and executed directly, without a shell. Output is captured and discarded.
/// A non-zero exit status is a failure. Dropping an in-flight invocation kills
/// the child process.
#[derive(Debug, Clone)]
pub struct CommandOperation {
    command_line: String,
    program: String,
    args: Vec<String>,
}

impl CommandOperation {
    pub fn new(command_line: &str) -> Result<Self> {
        let mut parts = command_line.split_whitespace();
        let program = parts
            .next()
            .ok_or_else(|| anyhow!("Command string is empty after parsing"))?
            .to_string();

        Ok(Self {
            command_line: command_line.trim().to_string(),
            program,
            args: parts.map(str::to_string).collect(),
        })
    }

    pub fn from_config(config: &RunConfig) -> Result<Self> {
        Self::new(&config.command)
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }
}

#[async_trait]
impl Operation for CommandOperation {
    async fn invoke(&self) -> Result<()> {
        let output = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .with_context(|| format!("Failed to spawn `{}`", self.program))?;

        if output.status.success() {
            return Ok(());
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        match stderr.lines().map(str::trim).find(|line| !line.is_empty()) {
            Some(line) => bail!("`{}` {}: {}", self.program, output.status, line),
            None => bail!("`{}` {}", self.program, output.status),
        }
    }

    fn name(&self) -> &str {
        &self.command_line
    }
}
