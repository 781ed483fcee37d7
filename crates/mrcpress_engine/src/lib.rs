//! mrcpress engine: directory watching and bounded-parallel conversion
//! of raw micrographs through an external command.
mod config;
mod delete;
mod dispatch;
mod engine;
mod invoke;
mod scan;
mod types;

pub use config::{
    StartError, WatchConfig, DEFAULT_PATTERN, DEFAULT_POLL_INTERVAL, DEFAULT_WORKERS,
};
pub use delete::{apply_deletions, DeletionError, DeletionReport};
pub use dispatch::run_batch;
pub use engine::EngineHandle;
pub use invoke::{CommandInvoker, Invoker, InvokerSettings};
pub use scan::{ScanError, Scanner};
pub use types::{
    ChannelProgressSink, ConversionOutcome, CycleStats, EngineEvent, FileTask, JobId, ProgressSink,
};
