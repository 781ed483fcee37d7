use std::path::{Path, PathBuf};
use std::time::SystemTime;

pub type JobId = u64;

/// One candidate file produced by a scan pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileTask {
    pub source: PathBuf,
    /// Modification time observed at discovery; drives the watermark filter.
    pub modified: SystemTime,
}

/// Durable result of pushing one source file through the converter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversionOutcome {
    Succeeded { source: PathBuf, output: PathBuf },
    Failed { source: PathBuf, message: String },
    Skipped { source: PathBuf, reason: String },
}

impl ConversionOutcome {
    pub fn source(&self) -> &Path {
        match self {
            ConversionOutcome::Succeeded { source, .. }
            | ConversionOutcome::Failed { source, .. }
            | ConversionOutcome::Skipped { source, .. } => source,
        }
    }

    pub fn is_succeeded(&self) -> bool {
        matches!(self, ConversionOutcome::Succeeded { .. })
    }
}

/// Per-cycle tallies, reported with [`EngineEvent::CycleFinished`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CycleStats {
    pub discovered: usize,
    pub converted: usize,
    pub failed: usize,
    pub skipped: usize,
    pub deleted: usize,
    pub delete_failures: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// A scan pass finished and its batch is about to be dispatched.
    CycleStarted { cycle: u64, discovered: usize },
    /// A worker picked up one conversion.
    JobStarted { job_id: JobId, source: PathBuf },
    /// One conversion produced its outcome.
    JobCompleted {
        job_id: JobId,
        outcome: ConversionOutcome,
    },
    /// A source file was removed after verified success.
    SourceDeleted { source: PathBuf },
    /// A source file survived a requested removal.
    DeletionFailed { source: PathBuf, message: String },
    /// The directory listing failed; the cycle was abandoned and the
    /// watermark left untouched.
    ScanFailed { cycle: u64, message: String },
    /// The cycle ran to completion, deletions included.
    CycleFinished { cycle: u64, stats: CycleStats },
    /// The watch loop has exited.
    Stopped,
}

pub trait ProgressSink: Send + Sync {
    fn emit(&self, event: EngineEvent);
}

pub struct ChannelProgressSink {
    tx: std::sync::mpsc::Sender<EngineEvent>,
}

impl ChannelProgressSink {
    pub fn new(tx: std::sync::mpsc::Sender<EngineEvent>) -> Self {
        Self { tx }
    }
}

impl ProgressSink for ChannelProgressSink {
    fn emit(&self, event: EngineEvent) {
        let _ = self.tx.send(event);
    }
}
