use std::sync::Once;

use mrcpress_core::{update, AppState, Effect, Msg, SessionState};

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(engine_logging::initialize_for_tests);
}

#[test]
fn session_starts_idle() {
    init_logging();
    let state = AppState::new();
    assert_eq!(state.view().session, SessionState::Idle);
}

#[test]
fn session_started_moves_idle_to_running() {
    init_logging();
    let state = AppState::new();

    let (next, effects) = update(state, Msg::SessionStarted);

    assert_eq!(next.view().session, SessionState::Running);
    assert!(effects.is_empty());
}

#[test]
fn stop_request_emits_stop_effect_once() {
    init_logging();
    let state = AppState::new();
    let (state, _effects) = update(state, Msg::SessionStarted);

    let (state, effects) = update(state, Msg::StopRequested);
    assert_eq!(state.view().session, SessionState::Stopping);
    assert_eq!(effects, vec![Effect::StopEngine]);

    // Mashing Ctrl-C while already stopping changes nothing.
    let (state, effects) = update(state, Msg::StopRequested);
    assert_eq!(state.view().session, SessionState::Stopping);
    assert!(effects.is_empty());
}

#[test]
fn stop_request_before_start_is_ignored() {
    init_logging();
    let state = AppState::new();

    let (next, effects) = update(state, Msg::StopRequested);

    assert_eq!(next.view().session, SessionState::Idle);
    assert!(effects.is_empty());
}

#[test]
fn engine_stopped_finishes_the_session() {
    init_logging();
    let state = AppState::new();
    let (state, _effects) = update(state, Msg::SessionStarted);
    let (state, _effects) = update(state, Msg::StopRequested);

    let (state, effects) = update(state, Msg::EngineStopped);

    assert_eq!(state.view().session, SessionState::Stopped);
    assert!(effects.is_empty());
}

#[test]
fn single_cycle_session_stops_after_first_cycle() {
    init_logging();
    let state = AppState::single_cycle();
    let (state, _effects) = update(state, Msg::SessionStarted);

    let (state, effects) = update(
        state,
        Msg::CycleFinished { cycle: 1 },
    );

    assert_eq!(state.view().session, SessionState::Stopping);
    assert_eq!(effects, vec![Effect::StopEngine]);
}

#[test]
fn continuous_session_keeps_running_between_cycles() {
    init_logging();
    let state = AppState::new();
    let (state, _effects) = update(state, Msg::SessionStarted);

    let (state, effects) = update(
        state,
        Msg::CycleFinished { cycle: 1 },
    );

    assert_eq!(state.view().session, SessionState::Running);
    assert!(effects.is_empty());
    assert_eq!(state.view().cycles_finished, 1);
}

#[test]
fn noop_changes_nothing() {
    init_logging();
    let mut state = AppState::new();
    state.consume_dirty();
    let before = state.view();

    let (mut next, effects) = update(state, Msg::NoOp);

    assert_eq!(next.view(), before);
    assert!(effects.is_empty());
    assert!(!next.consume_dirty());
}
