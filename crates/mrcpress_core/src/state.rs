use crate::msg::JobResult;
use crate::view_model::{FailureRowView, SessionView};

pub type JobId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Idle,
    Running,
    Stopping,
    Stopped,
}

/// Pure session model. The front-end folds engine events into it and
/// renders from [`AppState::view`]; no IO happens here.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppState {
    session: SessionState,
    run_once: bool,
    cycles_finished: u64,
    discovered: u64,
    converted: u64,
    failed: u64,
    skipped: u64,
    deleted: u64,
    delete_failures: u64,
    scan_failures: u64,
    active_jobs: u64,
    failures: Vec<FailureRowView>,
    dirty: bool,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    /// A session that stops itself after the first completed cycle.
    pub fn single_cycle() -> Self {
        Self {
            run_once: true,
            ..Self::default()
        }
    }

    pub fn view(&self) -> SessionView {
        SessionView {
            session: self.session,
            cycles_finished: self.cycles_finished,
            discovered: self.discovered,
            converted: self.converted,
            failed: self.failed,
            skipped: self.skipped,
            deleted: self.deleted,
            delete_failures: self.delete_failures,
            scan_failures: self.scan_failures,
            active_jobs: self.active_jobs,
            failures: self.failures.clone(),
        }
    }

    pub fn session(&self) -> SessionState {
        self.session
    }

    pub fn run_once(&self) -> bool {
        self.run_once
    }

    /// Returns whether the view changed since the last call and clears the flag.
    pub fn consume_dirty(&mut self) -> bool {
        let dirty = self.dirty;
        self.dirty = false;
        dirty
    }

    pub(crate) fn begin_session(&mut self) {
        self.session = SessionState::Running;
        self.mark_dirty();
    }

    pub(crate) fn request_stop(&mut self) {
        self.session = SessionState::Stopping;
        self.mark_dirty();
    }

    pub(crate) fn finish_session(&mut self) {
        self.session = SessionState::Stopped;
        self.mark_dirty();
    }

    pub(crate) fn record_cycle_started(&mut self, discovered: usize) {
        self.discovered += discovered as u64;
        self.mark_dirty();
    }

    pub(crate) fn record_cycle_finished(&mut self) {
        self.cycles_finished += 1;
        self.mark_dirty();
    }

    pub(crate) fn record_job_started(&mut self) {
        self.active_jobs += 1;
        self.mark_dirty();
    }

    pub(crate) fn record_job_finished(&mut self, result: JobResult) {
        self.active_jobs = self.active_jobs.saturating_sub(1);
        match result {
            JobResult::Converted => self.converted += 1,
            JobResult::Skipped => self.skipped += 1,
            JobResult::Failed { source, message } => {
                self.failed += 1;
                self.failures.push(FailureRowView { source, message });
            }
        }
        self.mark_dirty();
    }

    pub(crate) fn record_deleted(&mut self) {
        self.deleted += 1;
        self.mark_dirty();
    }

    pub(crate) fn record_delete_failure(&mut self) {
        self.delete_failures += 1;
        self.mark_dirty();
    }

    pub(crate) fn record_scan_failure(&mut self) {
        self.scan_failures += 1;
        self.mark_dirty();
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }
}
