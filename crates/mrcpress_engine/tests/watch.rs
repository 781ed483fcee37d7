#![cfg(unix)]

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use mrcpress_engine::{
    CommandInvoker, ConversionOutcome, CycleStats, EngineEvent, EngineHandle, InvokerSettings,
    WatchConfig,
};
use tempfile::TempDir;

const EVENT_DEADLINE: Duration = Duration::from_secs(10);

/// A throwaway watch setup: input and output directories plus a shell
/// script standing in for the converter. Every invocation appends its
/// source path to `call.log` before copying, so tests can assert how
/// often each file was handed to the command.
struct TestEnv {
    _temp: TempDir,
    input: PathBuf,
    output: PathBuf,
    script: PathBuf,
    call_log: PathBuf,
}

impl TestEnv {
    fn new() -> Self {
        // `*bad*` sources fail, everything else copies through.
        Self::with_rule(r#"case "$1" in *bad*) echo 'corrupt stack' >&2; exit 2;; esac"#)
    }

    fn with_rule(rule: &str) -> Self {
        use std::os::unix::fs::PermissionsExt;

        let temp = TempDir::new().unwrap();
        let input = temp.path().join("incoming");
        let output = temp.path().join("converted");
        fs::create_dir(&input).unwrap();
        fs::create_dir(&output).unwrap();

        let call_log = temp.path().join("call.log");
        let script = temp.path().join("fake_mrc2tif.sh");
        fs::write(
            &script,
            format!(
                "#!/bin/sh\necho \"$1\" >> \"{}\"\n{rule}\ncp \"$1\" \"$2\"\n",
                call_log.display()
            ),
        )
        .unwrap();
        fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();

        Self {
            _temp: temp,
            input,
            output,
            script,
            call_log,
        }
    }

    fn config(&self) -> WatchConfig {
        let mut config = WatchConfig::new(&self.input, &self.output);
        config.poll_interval = Duration::from_millis(100);
        config
    }

    fn start(&self, config: WatchConfig) -> EngineHandle {
        let settings = InvokerSettings {
            program: self.script.clone(),
            args: Vec::new(),
            target_ext: "tif".to_string(),
            timeout: None,
        };
        let invoker = Arc::new(CommandInvoker::new(settings, &self.output));
        EngineHandle::start_with_invoker(config, invoker).unwrap()
    }

    fn add_source(&self, name: &str) -> PathBuf {
        let path = self.input.join(name);
        fs::write(&path, b"raw frame data").unwrap();
        path
    }

    fn output_of(&self, name: &str) -> PathBuf {
        self.output.join(name).with_extension("tif")
    }

    fn calls(&self) -> Vec<String> {
        match fs::read_to_string(&self.call_log) {
            Ok(text) => text.lines().map(ToOwned::to_owned).collect(),
            Err(_) => Vec::new(),
        }
    }
}

/// Drains events until `pred` matches one; panics past the deadline.
fn wait_for<F>(engine: &EngineHandle, mut pred: F) -> Vec<EngineEvent>
where
    F: FnMut(&EngineEvent) -> bool,
{
    let start = Instant::now();
    let mut events = Vec::new();
    while start.elapsed() < EVENT_DEADLINE {
        if let Some(event) = engine.recv_timeout(Duration::from_millis(50)) {
            let hit = pred(&event);
            events.push(event);
            if hit {
                return events;
            }
        }
    }
    panic!("deadline waiting for event; saw: {events:#?}");
}

fn cycle_finished(cycle: u64) -> impl FnMut(&EngineEvent) -> bool {
    move |event| matches!(event, EngineEvent::CycleFinished { cycle: c, .. } if *c == cycle)
}

fn stats_of(events: &[EngineEvent], cycle: u64) -> CycleStats {
    events
        .iter()
        .find_map(|event| match event {
            EngineEvent::CycleFinished { cycle: c, stats } if *c == cycle => Some(*stats),
            _ => None,
        })
        .unwrap()
}

#[test]
fn first_cycle_converts_the_whole_backlog_exactly_once() {
    let env = TestEnv::new();
    env.add_source("frame_001.mrc");
    env.add_source("frame_002.mrc");
    env.add_source("frame_003.mrc");
    env.add_source("ignored.txt");

    let engine = env.start(env.config());
    let events = wait_for(&engine, cycle_finished(1));

    let stats = stats_of(&events, 1);
    assert_eq!(stats.discovered, 3);
    assert_eq!(stats.converted, 3);
    assert_eq!(stats.failed, 0);
    assert!(env.output_of("frame_001.mrc").exists());
    assert!(env.output_of("frame_002.mrc").exists());
    assert!(env.output_of("frame_003.mrc").exists());

    // A quiet follow-up cycle must not resubmit anything.
    let tail = wait_for(&engine, cycle_finished(2));
    assert_eq!(stats_of(&tail, 2).discovered, 0);
    assert_eq!(env.calls().len(), 3);

    engine.stop();
    engine.join();
}

#[test]
fn files_arriving_later_are_picked_up_by_a_following_cycle() {
    let env = TestEnv::new();
    env.add_source("early.mrc");

    let engine = env.start(env.config());
    wait_for(&engine, cycle_finished(1));

    let late = env.add_source("late.mrc");
    wait_for(&engine, |event| {
        matches!(
            event,
            EngineEvent::JobCompleted {
                outcome: ConversionOutcome::Succeeded { source, .. },
                ..
            } if *source == late
        )
    });
    assert!(env.output_of("late.mrc").exists());

    engine.stop();
    engine.join();
}

#[test]
fn preexisting_output_skips_the_file_and_keeps_its_source() {
    let env = TestEnv::new();
    let kept = env.add_source("kept.mrc");
    env.add_source("fresh.mrc");
    fs::write(env.output_of("kept.mrc"), b"earlier run").unwrap();

    let mut config = env.config();
    config.delete_after_success = true;
    let engine = env.start(config);
    let events = wait_for(&engine, cycle_finished(1));

    let stats = stats_of(&events, 1);
    assert_eq!(stats.skipped, 1);
    assert_eq!(stats.converted, 1);
    assert_eq!(stats.deleted, 1);
    // The skipped source survives; its output keeps the earlier content.
    assert!(kept.exists());
    assert_eq!(fs::read(env.output_of("kept.mrc")).unwrap(), b"earlier run");
    assert!(!env.input.join("fresh.mrc").exists());

    engine.stop();
    engine.join();
}

#[test]
fn failed_conversion_keeps_its_source_when_deleting() {
    let env = TestEnv::new();
    let bad = env.add_source("bad_frame.mrc");
    env.add_source("good_frame.mrc");

    let mut config = env.config();
    config.delete_after_success = true;
    let engine = env.start(config);
    let events = wait_for(&engine, cycle_finished(1));

    let stats = stats_of(&events, 1);
    assert_eq!(stats.failed, 1);
    assert_eq!(stats.converted, 1);
    assert_eq!(stats.deleted, 1);
    assert!(bad.exists());
    assert!(!env.input.join("good_frame.mrc").exists());

    let failure = events
        .iter()
        .find_map(|event| match event {
            EngineEvent::JobCompleted {
                outcome: ConversionOutcome::Failed { source, message },
                ..
            } => Some((source.clone(), message.clone())),
            _ => None,
        })
        .unwrap();
    assert_eq!(failure.0, bad);
    assert!(failure.1.contains("exit code 2"), "message: {}", failure.1);

    engine.stop();
    engine.join();
}

#[test]
fn stop_request_lets_the_cycle_finish_then_halts() {
    let env = TestEnv::new();
    env.add_source("frame.mrc");

    let mut config = env.config();
    // A long pause so the stop request demonstrably cuts the wait short.
    config.poll_interval = Duration::from_secs(30);
    let engine = env.start(config);
    wait_for(&engine, cycle_finished(1));

    engine.stop();
    let started = Instant::now();
    let tail = wait_for(&engine, |event| matches!(event, EngineEvent::Stopped));

    assert!(started.elapsed() < Duration::from_secs(5));
    assert!(!tail
        .iter()
        .any(|event| matches!(event, EngineEvent::CycleStarted { .. })));

    engine.join();
}

#[test]
fn scan_failure_is_reported_and_the_loop_recovers() {
    let env = TestEnv::new();
    env.add_source("frame.mrc");

    let engine = env.start(env.config());
    wait_for(&engine, cycle_finished(1));

    // Yank the input directory out from under the scanner.
    fs::remove_dir_all(&env.input).unwrap();
    wait_for(&engine, |event| {
        matches!(event, EngineEvent::ScanFailed { .. })
    });

    // Once the directory is back, watching resumes on its own.
    fs::create_dir(&env.input).unwrap();
    let recovered = env.add_source("recovered.mrc");
    wait_for(&engine, |event| {
        matches!(
            event,
            EngineEvent::JobCompleted {
                outcome: ConversionOutcome::Succeeded { source, .. },
                ..
            } if *source == recovered
        )
    });

    engine.stop();
    engine.join();
}

#[test]
fn idle_cycles_keep_the_loop_alive() {
    let env = TestEnv::new();

    let engine = env.start(env.config());
    let events = wait_for(&engine, cycle_finished(2));

    assert_eq!(stats_of(&events, 1).discovered, 0);
    assert_eq!(stats_of(&events, 2).discovered, 0);
    assert!(env.calls().is_empty());

    engine.stop();
    engine.join();
}
