use std::sync::{mpsc, Arc};
use std::thread;
use std::time::{Duration, SystemTime};

use engine_logging::{engine_debug, engine_error, engine_info, engine_warn};
use tokio_util::sync::CancellationToken;

use crate::config::{StartError, WatchConfig};
use crate::delete::apply_deletions;
use crate::dispatch::run_batch;
use crate::invoke::{CommandInvoker, Invoker, InvokerSettings};
use crate::scan::Scanner;
use crate::types::{
    ChannelProgressSink, ConversionOutcome, CycleStats, EngineEvent, JobId, ProgressSink,
};

/// Handle to a running watch session.
///
/// Events stream out through a channel the front-end drains with
/// [`EngineHandle::try_recv`] or [`EngineHandle::recv_timeout`]. Dropping
/// the handle does not stop the loop; call [`EngineHandle::stop`] and then
/// [`EngineHandle::join`] for an orderly shutdown.
pub struct EngineHandle {
    event_rx: mpsc::Receiver<EngineEvent>,
    cancel: CancellationToken,
    thread: Option<thread::JoinHandle<()>>,
}

impl EngineHandle {
    /// Validates the configuration and starts the watch loop on a
    /// background thread, converting with the stock external command.
    pub fn start(config: WatchConfig) -> Result<Self, StartError> {
        let settings = InvokerSettings {
            timeout: config.command_timeout,
            ..InvokerSettings::default()
        };
        let invoker = Arc::new(CommandInvoker::new(settings, config.output_dir.clone()));
        Self::start_with_invoker(config, invoker)
    }

    /// Same as [`EngineHandle::start`], with a caller-provided invoker.
    pub fn start_with_invoker(
        config: WatchConfig,
        invoker: Arc<dyn Invoker>,
    ) -> Result<Self, StartError> {
        config.validate()?;
        let scanner = Scanner::new(config.input_dir.clone(), &config.pattern)
            .map_err(|err| StartError::Pattern(err.to_string()))?;

        let (event_tx, event_rx) = mpsc::channel();
        let cancel = CancellationToken::new();
        let loop_cancel = cancel.clone();
        let thread = thread::spawn(move || {
            let runtime = tokio::runtime::Runtime::new().expect("tokio runtime");
            let sink: Arc<dyn ProgressSink> = Arc::new(ChannelProgressSink::new(event_tx));
            runtime.block_on(watch_loop(config, scanner, invoker, sink, loop_cancel));
        });

        Ok(Self {
            event_rx,
            cancel,
            thread: Some(thread),
        })
    }

    /// Next event, if one is ready.
    pub fn try_recv(&self) -> Option<EngineEvent> {
        self.event_rx.try_recv().ok()
    }

    /// Next event, waiting up to `timeout` for one to arrive.
    pub fn recv_timeout(&self, timeout: Duration) -> Option<EngineEvent> {
        self.event_rx.recv_timeout(timeout).ok()
    }

    /// Requests a cooperative stop. The loop checks between cycles; an
    /// in-flight batch always runs to completion, deletions included.
    pub fn stop(&self) {
        self.cancel.cancel();
    }

    /// Whether the loop thread has exited.
    pub fn is_finished(&self) -> bool {
        self.thread
            .as_ref()
            .map(|thread| thread.is_finished())
            .unwrap_or(true)
    }

    /// Waits for the loop thread to finish.
    pub fn join(mut self) {
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

/// Drives scan, dispatch and delete cycles until cancelled.
///
/// The watermark is the sole resubmission gate: it starts out unset so the
/// first cycle picks up the whole backlog, and advances to each cycle's
/// scan start time only once that cycle has fully completed.
async fn watch_loop(
    config: WatchConfig,
    scanner: Scanner,
    invoker: Arc<dyn Invoker>,
    sink: Arc<dyn ProgressSink>,
    cancel: CancellationToken,
) {
    let mut watermark: Option<SystemTime> = None;
    let mut next_job_id: JobId = 1;
    let mut cycle: u64 = 0;

    loop {
        if cycle > 0 {
            // The pause between cycles doubles as the shutdown wait:
            // cancellation wakes it early and lands on the check below.
            let _ = tokio::time::timeout(config.poll_interval, cancel.cancelled()).await;
        }
        if cancel.is_cancelled() {
            break;
        }
        cycle += 1;
        engine_logging::set_cycle(cycle);

        // Taken before the listing so files that land mid-scan stay on the
        // next cycle's side of the watermark.
        let scan_started = SystemTime::now();
        let tasks = match scanner.scan(watermark) {
            Ok(tasks) => tasks,
            Err(err) => {
                // Watermark untouched: whatever arrived during the outage
                // is picked up once the directory is listable again.
                engine_error!("cycle {cycle}: scan failed: {err}");
                sink.emit(EngineEvent::ScanFailed {
                    cycle,
                    message: err.to_string(),
                });
                continue;
            }
        };

        engine_debug!("cycle {cycle}: {} candidate file(s)", tasks.len());
        sink.emit(EngineEvent::CycleStarted {
            cycle,
            discovered: tasks.len(),
        });

        let mut stats = CycleStats {
            discovered: tasks.len(),
            ..CycleStats::default()
        };
        let batch_len = tasks.len() as JobId;
        let outcomes = run_batch(
            invoker.clone(),
            tasks,
            config.workers,
            next_job_id,
            sink.clone(),
        )
        .await;
        next_job_id += batch_len;

        for outcome in &outcomes {
            match outcome {
                ConversionOutcome::Succeeded { .. } => stats.converted += 1,
                ConversionOutcome::Failed { .. } => stats.failed += 1,
                ConversionOutcome::Skipped { .. } => stats.skipped += 1,
            }
        }

        let report = apply_deletions(&outcomes, config.delete_after_success);
        stats.deleted = report.deleted.len();
        stats.delete_failures = report.failures.len();
        for path in report.deleted {
            sink.emit(EngineEvent::SourceDeleted { source: path });
        }
        for failure in report.failures {
            engine_warn!("cycle {cycle}: {failure}");
            sink.emit(EngineEvent::DeletionFailed {
                message: failure.source.to_string(),
                source: failure.path,
            });
        }

        watermark = Some(scan_started);
        sink.emit(EngineEvent::CycleFinished { cycle, stats });
    }

    engine_info!("watch loop stopped after {cycle} cycle(s)");
    sink.emit(EngineEvent::Stopped);
}
