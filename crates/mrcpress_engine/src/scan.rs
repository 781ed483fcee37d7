use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use globset::{Glob, GlobMatcher};
use thiserror::Error;

use crate::types::FileTask;

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("invalid filename pattern {pattern:?}: {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: globset::Error,
    },
    #[error("failed to read input directory {}: {source}", .dir.display())]
    ReadDir {
        dir: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Lists candidate files in one directory, filtered by a filename glob
/// and a modification-time watermark.
#[derive(Debug, Clone)]
pub struct Scanner {
    input_dir: PathBuf,
    matcher: GlobMatcher,
}

impl Scanner {
    /// Compiles the glob once up front; a pattern that does not compile is
    /// a configuration error, not a per-cycle one.
    pub fn new(input_dir: impl Into<PathBuf>, pattern: &str) -> Result<Self, ScanError> {
        let matcher = Glob::new(pattern)
            .map_err(|source| ScanError::Pattern {
                pattern: pattern.to_string(),
                source,
            })?
            .compile_matcher();
        Ok(Self {
            input_dir: input_dir.into(),
            matcher,
        })
    }

    /// Lists matching regular files, oldest modification first.
    ///
    /// `watermark == None` is the initial pass and matches regardless of
    /// age; afterwards only files modified strictly later than the
    /// watermark are returned. Entries that vanish or cannot be stat-ed
    /// between listing and inspection are silently skipped; only the
    /// directory listing itself can fail.
    pub fn scan(&self, watermark: Option<SystemTime>) -> Result<Vec<FileTask>, ScanError> {
        let entries = fs::read_dir(&self.input_dir).map_err(|source| ScanError::ReadDir {
            dir: self.input_dir.clone(),
            source,
        })?;

        let mut tasks = Vec::new();
        for entry in entries.filter_map(|entry| entry.ok()) {
            let path = entry.path();
            if !self.matches_name(&path) {
                continue;
            }
            let meta = match entry.metadata() {
                Ok(meta) => meta,
                Err(_) => continue,
            };
            if !meta.is_file() {
                continue;
            }
            let modified = match meta.modified() {
                Ok(modified) => modified,
                Err(_) => continue,
            };
            if let Some(mark) = watermark {
                if modified <= mark {
                    continue;
                }
            }
            tasks.push(FileTask {
                source: path,
                modified,
            });
        }
        tasks.sort_by_key(|task| task.modified);
        Ok(tasks)
    }

    /// The glob applies to the file name only, never the full path.
    fn matches_name(&self, path: &Path) -> bool {
        path.file_name()
            .map(|name| self.matcher.is_match(name))
            .unwrap_or(false)
    }
}
