use std::fs;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::types::ConversionOutcome;

/// One failed source removal. Never fatal to the session.
#[derive(Debug, Error)]
#[error("failed to delete {}: {source}", .path.display())]
pub struct DeletionError {
    pub path: PathBuf,
    #[source]
    pub source: io::Error,
}

/// What the deletion gate did with one batch of outcomes.
#[derive(Debug, Default)]
pub struct DeletionReport {
    pub deleted: Vec<PathBuf>,
    pub failures: Vec<DeletionError>,
}

/// Removes the source of every `Succeeded` outcome when deletion was
/// requested. Each removal stands alone: one failure never blocks the
/// rest, and `Failed` or `Skipped` sources are never touched.
pub fn apply_deletions(outcomes: &[ConversionOutcome], delete_after_success: bool) -> DeletionReport {
    let mut report = DeletionReport::default();
    if !delete_after_success {
        return report;
    }

    for outcome in outcomes {
        let source = match outcome {
            ConversionOutcome::Succeeded { source, .. } => source,
            ConversionOutcome::Failed { .. } | ConversionOutcome::Skipped { .. } => continue,
        };
        match fs::remove_file(source) {
            Ok(()) => report.deleted.push(source.clone()),
            Err(err) => report.failures.push(DeletionError {
                path: source.clone(),
                source: err,
            }),
        }
    }
    report
}
