use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tempfile::NamedTempFile;
use thiserror::Error;

pub const DEFAULT_PATTERN: &str = "*.mrc";
pub const DEFAULT_WORKERS: usize = 6;
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(3);

/// Immutable settings for one watch session.
#[derive(Debug, Clone)]
pub struct WatchConfig {
    /// Directory scanned for incoming files.
    pub input_dir: PathBuf,
    /// Directory that receives converted outputs. Must already exist.
    pub output_dir: PathBuf,
    /// Filename glob candidates must match, e.g. `*.mrc`.
    pub pattern: String,
    /// Upper bound on conversions running at the same time.
    pub workers: usize,
    /// Pause between the end of one cycle and the next scan.
    pub poll_interval: Duration,
    /// Remove each source file once its conversion reported success.
    pub delete_after_success: bool,
    /// Kill a conversion that runs longer than this.
    pub command_timeout: Option<Duration>,
}

impl WatchConfig {
    pub fn new(input_dir: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            input_dir: input_dir.into(),
            output_dir: output_dir.into(),
            pattern: DEFAULT_PATTERN.to_string(),
            workers: DEFAULT_WORKERS,
            poll_interval: DEFAULT_POLL_INTERVAL,
            delete_after_success: false,
            command_timeout: None,
        }
    }

    /// Checks everything that must hold before the loop starts. Nothing
    /// here is retried later: a configuration that fails validation never
    /// reaches the first scan.
    pub fn validate(&self) -> Result<(), StartError> {
        if self.workers < 1 {
            return Err(StartError::Workers);
        }
        if self.poll_interval.is_zero() {
            return Err(StartError::PollInterval);
        }
        if matches!(self.command_timeout, Some(limit) if limit.is_zero()) {
            return Err(StartError::Timeout);
        }
        probe_input_dir(&self.input_dir)?;
        probe_output_dir(&self.output_dir)?;
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum StartError {
    #[error("input directory missing or not a directory: {0}")]
    InputDir(String),
    #[error("output directory missing or not writable: {0}")]
    OutputDir(String),
    #[error("worker count must be at least 1")]
    Workers,
    #[error("poll interval must be greater than zero")]
    PollInterval,
    #[error("command timeout must be greater than zero")]
    Timeout,
    #[error("invalid filename pattern: {0}")]
    Pattern(String),
}

fn probe_input_dir(dir: &Path) -> Result<(), StartError> {
    let meta =
        fs::metadata(dir).map_err(|e| StartError::InputDir(format!("{}: {e}", dir.display())))?;
    if !meta.is_dir() {
        return Err(StartError::InputDir(format!(
            "{}: not a directory",
            dir.display()
        )));
    }
    Ok(())
}

fn probe_output_dir(dir: &Path) -> Result<(), StartError> {
    let meta =
        fs::metadata(dir).map_err(|e| StartError::OutputDir(format!("{}: {e}", dir.display())))?;
    if !meta.is_dir() {
        return Err(StartError::OutputDir(format!(
            "{}: not a directory",
            dir.display()
        )));
    }
    // Basic writability probe: try creating a temp file.
    NamedTempFile::new_in(dir).map_err(|e| StartError::OutputDir(e.to_string()))?;
    Ok(())
}
