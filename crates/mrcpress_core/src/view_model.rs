use crate::SessionState;

/// Snapshot of the session for the status line and end-of-run summary.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SessionView {
    pub session: SessionState,
    pub cycles_finished: u64,
    pub discovered: u64,
    pub converted: u64,
    pub failed: u64,
    pub skipped: u64,
    pub deleted: u64,
    pub delete_failures: u64,
    pub scan_failures: u64,
    pub active_jobs: u64,
    pub failures: Vec<FailureRowView>,
}

/// One failed conversion, kept for the end-of-run summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureRowView {
    pub source: String,
    pub message: String,
}
