use std::path::PathBuf;
use std::time::Duration;

use anyhow::{ensure, Context};
use clap::Parser;
use mrcpress_engine::{WatchConfig, DEFAULT_PATTERN, DEFAULT_POLL_INTERVAL, DEFAULT_WORKERS};

use crate::logging::LogDestination;

/// Watch a directory for raw micrographs and compress each new arrival
/// with the external `mrc2tif` converter.
#[derive(Debug, Parser)]
#[command(name = "mrcpress", version, about)]
pub struct Cli {
    /// Directory watched for incoming files.
    #[arg(short, long, value_name = "DIR")]
    pub input: PathBuf,

    /// Directory receiving converted outputs. Must already exist.
    #[arg(short, long, value_name = "DIR")]
    pub output: PathBuf,

    /// Filename glob incoming files must match.
    #[arg(short, long, default_value = DEFAULT_PATTERN)]
    pub pattern: String,

    /// Maximum number of conversions running at once.
    #[arg(short, long, default_value_t = DEFAULT_WORKERS, value_name = "N")]
    pub jobs: usize,

    /// Seconds to pause between scan cycles.
    #[arg(long, default_value_t = DEFAULT_POLL_INTERVAL.as_secs_f64(), value_name = "SECS")]
    pub interval: f64,

    /// Delete each source file once its conversion succeeded.
    #[arg(long)]
    pub delete: bool,

    /// Kill a conversion running longer than this many seconds.
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<f64>,

    /// Convert the current backlog in one cycle, then exit.
    #[arg(long)]
    pub once: bool,

    /// Where log lines go.
    #[arg(long, value_enum, default_value = "terminal")]
    pub log: LogDestination,

    /// Log at debug level instead of info.
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Builds the engine configuration, refusing interval and timeout
    /// values that are non-positive or not representable as a `Duration`
    /// (infinite, or beyond the duration range).
    pub fn watch_config(&self) -> anyhow::Result<WatchConfig> {
        ensure!(self.interval > 0.0, "--interval must be greater than zero");
        if let Some(timeout) = self.timeout {
            ensure!(timeout > 0.0, "--timeout must be greater than zero");
        }

        let poll_interval = Duration::try_from_secs_f64(self.interval)
            .with_context(|| format!("--interval {} is not a usable duration", self.interval))?;
        let command_timeout = match self.timeout {
            Some(timeout) => Some(
                Duration::try_from_secs_f64(timeout)
                    .with_context(|| format!("--timeout {timeout} is not a usable duration"))?,
            ),
            None => None,
        };

        let mut config = WatchConfig::new(&self.input, &self.output);
        config.pattern = self.pattern.clone();
        config.workers = self.jobs;
        config.poll_interval = poll_interval;
        config.delete_after_success = self.delete;
        config.command_timeout = command_timeout;
        Ok(config)
    }
}
