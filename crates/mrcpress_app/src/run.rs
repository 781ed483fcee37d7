use std::sync::mpsc;
use std::time::Duration;

use engine_logging::{engine_debug, engine_error, engine_info, engine_warn};
use mrcpress_core::{update, AppState, Effect, JobResult, Msg, SessionState, SessionView};
use mrcpress_engine::{ConversionOutcome, EngineEvent, EngineHandle, WatchConfig};

/// Upper bound on how long one wait for an engine event blocks the loop.
const EVENT_POLL: Duration = Duration::from_millis(20);

/// Drives one watch session to completion.
pub fn run(config: WatchConfig, once: bool) -> anyhow::Result<()> {
    engine_info!(
        "watching {} -> {} (pattern {}, {} worker(s), every {:.1}s{})",
        config.input_dir.display(),
        config.output_dir.display(),
        config.pattern,
        config.workers,
        config.poll_interval.as_secs_f64(),
        if config.delete_after_success {
            ", deleting sources"
        } else {
            ""
        },
    );

    let engine = EngineHandle::start(config)?;

    // Ctrl-C requests a cooperative stop; the in-flight cycle finishes.
    let (stop_tx, stop_rx) = mpsc::channel::<()>();
    ctrlc::set_handler(move || {
        let _ = stop_tx.send(());
    })?;

    let mut state = if once {
        AppState::single_cycle()
    } else {
        AppState::new()
    };
    state = apply(state, Msg::SessionStarted, &engine);

    loop {
        if stop_rx.try_recv().is_ok() {
            engine_info!("stop requested; letting the current cycle finish");
            state = apply(state, Msg::StopRequested, &engine);
        }
        if let Some(event) = engine.recv_timeout(EVENT_POLL) {
            report(&event);
            state = apply(state, map_event(event), &engine);
        } else if engine.is_finished() && state.session() != SessionState::Stopped {
            // Channel drained and the loop thread is gone: no Stopped
            // event will ever arrive.
            engine_error!("engine stopped unexpectedly");
            state = apply(state, Msg::EngineStopped, &engine);
        }
        if state.session() == SessionState::Stopped {
            break;
        }
    }

    engine.join();
    summarize(&state.view());
    Ok(())
}

/// Folds one message into the session model and executes its effects.
fn apply(state: AppState, msg: Msg, engine: &EngineHandle) -> AppState {
    let (next, effects) = update(state, msg);
    for effect in effects {
        match effect {
            Effect::StopEngine => engine.stop(),
        }
    }
    next
}

fn map_event(event: EngineEvent) -> Msg {
    match event {
        EngineEvent::CycleStarted { cycle, discovered } => Msg::CycleStarted { cycle, discovered },
        EngineEvent::JobStarted { job_id, .. } => Msg::JobStarted { job_id },
        EngineEvent::JobCompleted { job_id, outcome } => Msg::JobFinished {
            job_id,
            result: map_outcome(outcome),
        },
        EngineEvent::SourceDeleted { .. } => Msg::SourceDeleted,
        EngineEvent::DeletionFailed { message, .. } => Msg::DeletionFailed { message },
        EngineEvent::ScanFailed { message, .. } => Msg::ScanFailed { message },
        EngineEvent::CycleFinished { cycle, .. } => Msg::CycleFinished { cycle },
        EngineEvent::Stopped => Msg::EngineStopped,
    }
}

fn map_outcome(outcome: ConversionOutcome) -> JobResult {
    match outcome {
        ConversionOutcome::Succeeded { .. } => JobResult::Converted,
        ConversionOutcome::Skipped { .. } => JobResult::Skipped,
        ConversionOutcome::Failed { source, message } => JobResult::Failed {
            source: source.display().to_string(),
            message,
        },
    }
}

/// One log line per noteworthy engine event, in operator terms.
fn report(event: &EngineEvent) {
    match event {
        EngineEvent::CycleStarted { cycle, discovered } => {
            if *discovered > 0 {
                engine_info!("cycle {cycle}: found {discovered} new file(s)");
            } else {
                engine_debug!("cycle {cycle}: nothing new");
            }
        }
        EngineEvent::JobStarted { source, .. } => {
            engine_debug!("converting {}", source.display());
        }
        EngineEvent::JobCompleted { outcome, .. } => match outcome {
            ConversionOutcome::Succeeded { source, output } => {
                engine_info!("compressed {} -> {}", source.display(), output.display());
            }
            ConversionOutcome::Skipped { source, reason } => {
                engine_info!("skipping {}: {reason}", source.display());
            }
            ConversionOutcome::Failed { source, message } => {
                engine_error!("error compressing {}: {message}", source.display());
            }
        },
        EngineEvent::SourceDeleted { source } => {
            engine_info!("deleted source {}", source.display());
        }
        EngineEvent::DeletionFailed { source, message } => {
            engine_warn!("could not delete {}: {message}", source.display());
        }
        EngineEvent::ScanFailed { cycle, message } => {
            engine_error!("cycle {cycle}: scan failed: {message}");
        }
        EngineEvent::CycleFinished { cycle, stats } => {
            if stats.discovered > 0 {
                engine_info!(
                    "cycle {cycle}: {} compressed, {} skipped, {} failed",
                    stats.converted,
                    stats.skipped,
                    stats.failed,
                );
            }
        }
        EngineEvent::Stopped => {
            engine_info!("watch loop stopped");
        }
    }
}

fn summarize(view: &SessionView) {
    engine_info!(
        "done: {} cycle(s), {} file(s) seen, {} compressed, {} skipped, {} failed, {} deleted",
        view.cycles_finished,
        view.discovered,
        view.converted,
        view.skipped,
        view.failed,
        view.deleted,
    );
    if view.scan_failures > 0 {
        engine_warn!("{} scan pass(es) failed", view.scan_failures);
    }
    if view.delete_failures > 0 {
        engine_warn!("{} source file(s) could not be deleted", view.delete_failures);
    }
    for failure in &view.failures {
        engine_warn!("failed: {} ({})", failure.source, failure.message);
    }
}
