#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// The engine accepted the configuration and the watch loop is live.
    SessionStarted,
    /// A scan pass finished and a batch of this size was dispatched.
    CycleStarted { cycle: u64, discovered: usize },
    /// A worker picked up one conversion.
    JobStarted { job_id: crate::JobId },
    /// A conversion produced its outcome.
    JobFinished {
        job_id: crate::JobId,
        result: JobResult,
    },
    /// A source file was removed after verified success.
    SourceDeleted,
    /// A source file could not be removed.
    DeletionFailed { message: String },
    /// The directory listing itself failed; the cycle was abandoned.
    ScanFailed { message: String },
    /// The cycle ran to completion, deletions included.
    CycleFinished { cycle: u64 },
    /// The operator asked to stop (Ctrl-C).
    StopRequested,
    /// The engine loop has exited.
    EngineStopped,
    /// Fallback for placeholder wiring.
    NoOp,
}

/// Outcome of one conversion, reduced to what the session model tracks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobResult {
    Converted,
    Skipped,
    Failed { source: String, message: String },
}
