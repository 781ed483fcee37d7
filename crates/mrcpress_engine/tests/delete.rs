use std::fs;
use std::path::PathBuf;

use mrcpress_engine::{apply_deletions, ConversionOutcome};
use tempfile::TempDir;

fn existing_file(dir: &TempDir, name: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, b"raw").unwrap();
    path
}

fn succeeded(source: PathBuf) -> ConversionOutcome {
    let output = source.with_extension("tif");
    ConversionOutcome::Succeeded { source, output }
}

#[test]
fn nothing_is_deleted_when_the_flag_is_off() {
    let dir = TempDir::new().unwrap();
    let source = existing_file(&dir, "keep.mrc");
    let outcomes = vec![succeeded(source.clone())];

    let report = apply_deletions(&outcomes, false);

    assert!(report.deleted.is_empty());
    assert!(report.failures.is_empty());
    assert!(source.exists());
}

#[test]
fn only_succeeded_sources_are_removed() {
    let dir = TempDir::new().unwrap();
    let converted = existing_file(&dir, "converted.mrc");
    let failed = existing_file(&dir, "failed.mrc");
    let skipped = existing_file(&dir, "skipped.mrc");

    let outcomes = vec![
        succeeded(converted.clone()),
        ConversionOutcome::Failed {
            source: failed.clone(),
            message: "exit code 1".to_string(),
        },
        ConversionOutcome::Skipped {
            source: skipped.clone(),
            reason: "output already exists".to_string(),
        },
    ];

    let report = apply_deletions(&outcomes, true);

    assert_eq!(report.deleted, vec![converted.clone()]);
    assert!(report.failures.is_empty());
    assert!(!converted.exists());
    assert!(failed.exists());
    assert!(skipped.exists());
}

#[test]
fn a_failed_removal_does_not_block_the_others() {
    let dir = TempDir::new().unwrap();
    let first = existing_file(&dir, "first.mrc");
    let ghost = dir.path().join("already_gone.mrc");
    let second = existing_file(&dir, "second.mrc");

    let outcomes = vec![
        succeeded(first.clone()),
        succeeded(ghost.clone()),
        succeeded(second.clone()),
    ];

    let report = apply_deletions(&outcomes, true);

    assert_eq!(report.deleted, vec![first.clone(), second.clone()]);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].path, ghost);
    assert!(!first.exists());
    assert!(!second.exists());
}

#[test]
fn empty_outcome_list_is_a_no_op() {
    let report = apply_deletions(&[], true);

    assert!(report.deleted.is_empty());
    assert!(report.failures.is_empty());
}
