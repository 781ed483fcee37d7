use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinHandle;

use crate::invoke::Invoker;
use crate::types::{ConversionOutcome, EngineEvent, FileTask, JobId, ProgressSink};

/// Runs one batch of conversions with at most `limit` running at the same
/// time. Job ids are assigned in task order starting at `first_job_id`.
///
/// Returns only after every task has produced an outcome; one slow, failed
/// or panicked conversion never blocks or cancels its siblings.
pub async fn run_batch(
    invoker: Arc<dyn Invoker>,
    tasks: Vec<FileTask>,
    limit: usize,
    first_job_id: JobId,
    sink: Arc<dyn ProgressSink>,
) -> Vec<ConversionOutcome> {
    // Semaphore::new panics above MAX_PERMITS, so oversized limits are
    // capped instead of passed through.
    let permits = Arc::new(Semaphore::new(limit.clamp(1, Semaphore::MAX_PERMITS)));
    let mut handles: Vec<(FileTask, JobId, JoinHandle<ConversionOutcome>)> =
        Vec::with_capacity(tasks.len());

    for (offset, task) in tasks.into_iter().enumerate() {
        let job_id = first_job_id + offset as JobId;
        let permits = permits.clone();
        let invoker = invoker.clone();
        let sink = sink.clone();
        let source = task.source.clone();
        let handle = tokio::spawn(async move {
            // The semaphore is never closed, so acquisition only waits.
            let _permit = permits
                .acquire_owned()
                .await
                .expect("conversion semaphore closed");
            sink.emit(EngineEvent::JobStarted {
                job_id,
                source: source.clone(),
            });
            let outcome = invoker.convert(&source).await;
            sink.emit(EngineEvent::JobCompleted {
                job_id,
                outcome: outcome.clone(),
            });
            outcome
        });
        handles.push((task, job_id, handle));
    }

    let mut outcomes = Vec::with_capacity(handles.len());
    for (task, job_id, handle) in handles {
        match handle.await {
            Ok(outcome) => outcomes.push(outcome),
            // A panicked worker still yields a durable outcome for its
            // file, reported through the sink like any other completion.
            Err(err) => {
                let outcome = ConversionOutcome::Failed {
                    source: task.source,
                    message: format!("conversion task aborted: {err}"),
                };
                sink.emit(EngineEvent::JobCompleted {
                    job_id,
                    outcome: outcome.clone(),
                });
                outcomes.push(outcome);
            }
        }
    }
    outcomes
}
