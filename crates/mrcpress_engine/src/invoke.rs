use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;

use crate::types::ConversionOutcome;

/// How the external conversion command is built.
#[derive(Debug, Clone)]
pub struct InvokerSettings {
    /// Program to invoke; resolved on `PATH` when not absolute.
    pub program: PathBuf,
    /// Fixed arguments placed before the source and output paths.
    pub args: Vec<String>,
    /// Extension given to computed output paths.
    pub target_ext: String,
    /// Kill the invocation when it runs longer than this.
    pub timeout: Option<Duration>,
}

impl Default for InvokerSettings {
    fn default() -> Self {
        Self {
            program: PathBuf::from("mrc2tif"),
            args: vec!["-s".to_string(), "-c".to_string(), "lzw".to_string()],
            target_ext: "tif".to_string(),
            timeout: None,
        }
    }
}

/// Seam for the conversion step, so the dispatcher and the watch loop can
/// be exercised without a real converter on `PATH`.
#[async_trait::async_trait]
pub trait Invoker: Send + Sync {
    async fn convert(&self, source: &Path) -> ConversionOutcome;
}

/// Runs the external conversion command, one child process per source file.
#[derive(Debug, Clone)]
pub struct CommandInvoker {
    settings: InvokerSettings,
    output_dir: PathBuf,
}

impl CommandInvoker {
    pub fn new(settings: InvokerSettings, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            settings,
            output_dir: output_dir.into(),
        }
    }

    /// Output path: the source base name moved to the output directory
    /// with the extension swapped.
    pub fn output_path(&self, source: &Path) -> PathBuf {
        let name = source.file_name().unwrap_or(source.as_os_str());
        self.output_dir
            .join(name)
            .with_extension(&self.settings.target_ext)
    }
}

#[async_trait::async_trait]
impl Invoker for CommandInvoker {
    async fn convert(&self, source: &Path) -> ConversionOutcome {
        let output_path = self.output_path(source);
        if output_path.exists() {
            return ConversionOutcome::Skipped {
                source: source.to_path_buf(),
                reason: format!("output {} already exists", output_path.display()),
            };
        }

        let mut command = Command::new(&self.settings.program);
        command
            .args(&self.settings.args)
            .arg(source)
            .arg(&output_path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            // Make sure an abandoned invocation cannot outlive us.
            .kill_on_drop(true);

        let waited = match self.settings.timeout {
            Some(limit) => match tokio::time::timeout(limit, command.output()).await {
                Ok(result) => result,
                Err(_) => {
                    return ConversionOutcome::Failed {
                        source: source.to_path_buf(),
                        message: format!("timed out after {:.1}s", limit.as_secs_f64()),
                    };
                }
            },
            None => command.output().await,
        };

        match waited {
            Ok(output) if output.status.success() => ConversionOutcome::Succeeded {
                source: source.to_path_buf(),
                output: output_path,
            },
            Ok(output) => ConversionOutcome::Failed {
                source: source.to_path_buf(),
                message: describe_exit(&output),
            },
            // A spawn failure (missing program and the like) is the same
            // category as a nonzero exit: this conversion failed.
            Err(err) => ConversionOutcome::Failed {
                source: source.to_path_buf(),
                message: format!("failed to run {}: {err}", self.settings.program.display()),
            },
        }
    }
}

fn describe_exit(output: &std::process::Output) -> String {
    let status = match output.status.code() {
        Some(code) => format!("exit code {code}"),
        None => "terminated by signal".to_string(),
    };
    let stderr = String::from_utf8_lossy(&output.stderr);
    let stderr = stderr.trim();
    if stderr.is_empty() {
        status
    } else {
        format!("{status}: {stderr}")
    }
}
