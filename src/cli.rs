use clap::Parser;
use std::time::Duration;

/// cmdbench - Run a command repeatedly across parallel workers and measure it
#[derive(Parser, Debug, Clone, Default)]
#[clap(version, about, long_about = None)]
pub struct Args {
    /// The command to execute (e.g. "redis-cli SET key value")
    #[clap(short = 'c', long = "cmd", default_value = "", help_heading = "Core Options")]
    pub command: String,

    /// Target operations per second across all workers (0 for unlimited)
    #[clap(short = 'r', long, default_value_t = 0, help_heading = "Core Options")]
    pub rps: u64,

    /// Total time to run the benchmark (e.g. "10s", "1m"); excludes --total-ops
    #[clap(short = 'd', long, value_parser = parse_duration, help_heading = "Core Options")]
    pub duration: Option<Duration>,

    /// Total number of operations to perform; excludes --duration
    #[clap(short = 'n', long, help_heading = "Core Options")]
    pub total_ops: Option<u64>,

    /// Number of parallel workers
    #[clap(short = 'p', long = "parallel", default_value_t = crate::defaults::PARALLELISM, help_heading = "Core Options")]
    pub parallelism: usize,

    /// How often to print throughput during the run ("0" disables)
    #[clap(short = 'i', long, value_parser = parse_duration, default_value = crate::defaults::REPORT_INTERVAL, help_heading = "Output Options")]
    pub report_interval: Duration,

    /// Fail an invocation that runs longer than this
    #[clap(short = 't', long, value_parser = parse_duration, help_heading = "Core Options")]
    pub timeout: Option<Duration>,

    /// Percentiles to calculate for latency metrics
    #[clap(long, num_args = 1.., default_values_t = crate::defaults::PERCENTILES.to_vec(), help_heading = "Output Options")]
    pub percentiles: Vec<f64>,

    /// Print the final report as JSON instead of text
    #[clap(long, default_value_t = false, help_heading = "Output Options")]
    pub json: bool,

    /// Increase diagnostic verbosity (-v info, -vv debug, -vvv trace)
    #[clap(short = 'v', long, action = clap::ArgAction::Count, help_heading = "Output Options")]
    pub verbose: u8,

    /// Only log errors
    #[clap(short = 'q', long, default_value_t = false, help_heading = "Output Options")]
    pub quiet: bool,
}

/// Parse duration from string (e.g., "10s", "1.5s", "250ms", "5m", "1h")
///
/// Bare numbers are taken as seconds. Negative values are rejected so that
/// a "0" report interval is the only way to disable periodic output.
pub fn parse_duration(s: &str) -> Result<Duration, String> {
    let s = s.trim();

    if s.is_empty() {
        return Err("Duration cannot be empty".to_string());
    }

    let (num_str, scale) = if let Some(stripped) = s.strip_suffix("ms") {
        (stripped, 0.001)
    } else if let Some(stripped) = s.strip_suffix('s') {
        (stripped, 1.0)
    } else if let Some(stripped) = s.strip_suffix('m') {
        (stripped, 60.0)
    } else if let Some(stripped) = s.strip_suffix('h') {
        (stripped, 3600.0)
    } else {
        (s, 1.0) // Default to seconds
    };

    let num: f64 = num_str
        .trim()
        .parse()
        .map_err(|_| format!("Invalid number in duration: {}", num_str))?;

    if !num.is_finite() || num < 0.0 {
        return Err(format!("Duration cannot be negative: {}", s));
    }

    Duration::try_from_secs_f64(num * scale).map_err(|e| format!("Invalid duration {}: {}", s, e))
}
