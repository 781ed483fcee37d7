use crate::{AppState, Effect, Msg, SessionState};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::SessionStarted => {
            if state.session() == SessionState::Idle {
                state.begin_session();
            }
            Vec::new()
        }
        Msg::CycleStarted { discovered, .. } => {
            state.record_cycle_started(discovered);
            Vec::new()
        }
        Msg::JobStarted { .. } => {
            state.record_job_started();
            Vec::new()
        }
        Msg::JobFinished { result, .. } => {
            state.record_job_finished(result);
            Vec::new()
        }
        Msg::SourceDeleted => {
            state.record_deleted();
            Vec::new()
        }
        Msg::DeletionFailed { .. } => {
            state.record_delete_failure();
            Vec::new()
        }
        Msg::ScanFailed { .. } => {
            state.record_scan_failure();
            Vec::new()
        }
        Msg::CycleFinished { .. } => {
            state.record_cycle_finished();
            // Single-cycle mode stops itself after the first full cycle.
            if state.run_once() && state.session() == SessionState::Running {
                state.request_stop();
                vec![Effect::StopEngine]
            } else {
                Vec::new()
            }
        }
        Msg::StopRequested => {
            // A second request while already stopping must not emit a
            // second effect.
            if state.session() == SessionState::Running {
                state.request_stop();
                vec![Effect::StopEngine]
            } else {
                Vec::new()
            }
        }
        Msg::EngineStopped => {
            state.finish_session();
            Vec::new()
        }
        Msg::NoOp => Vec::new(),
    };

    (state, effects)
}
