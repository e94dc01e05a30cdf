//! Scratch download directory.
//!
//! A disposable directory shared by every request. Nothing in the streaming
//! path writes to it, but it is treated as transient and emptied after each
//! file download. Purges from overlapping requests may race; that is
//! accepted, the directory holds nothing that must survive.

pub mod cleanup;

pub use cleanup::{BestEffort, CleanupGuard};

use std::fs;
use std::path::{Path, PathBuf};

/// Outcome of a purge.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PurgeReport {
    pub removed: usize,
    pub failed: usize,
}

/// Handle to the scratch download directory.
#[derive(Debug, Clone)]
pub struct ScratchDir {
    path: PathBuf,
}

impl ScratchDir {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Delete every regular file directly inside the directory.
    ///
    /// Sub-directories are left alone. A missing directory, an unreadable
    /// listing and individual deletion failures are all tolerated.
    pub fn purge(&self) -> PurgeReport {
        let mut report = PurgeReport::default();

        let Some(entries) = fs::read_dir(&self.path).or_log("list scratch directory") else {
            return report;
        };

        for entry in entries.flatten() {
            let path = entry.path();
            let is_file = entry.file_type().map(|t| t.is_file()).unwrap_or(false);
            if !is_file {
                continue;
            }
            match fs::remove_file(&path).or_log("remove scratch file") {
                Some(()) => report.removed += 1,
                None => report.failed += 1,
            }
        }

        if report.removed > 0 || report.failed > 0 {
            tracing::debug!(
                dir = %self.path.display(),
                removed = report.removed,
                failed = report.failed,
                "Scratch directory purged"
            );
        }
        crate::observability::metrics::record_purge(report.removed);
        report
    }

    /// Purge without blocking the async reactor.
    ///
    /// Runs on the blocking pool when called inside a Tokio runtime, inline
    /// otherwise.
    pub fn purge_detached(&self) {
        let scratch = self.clone();
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn_blocking(move || scratch.purge());
            }
            Err(_) => {
                scratch.purge();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_purge_removes_files_only() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.mp4"), b"a").unwrap();
        fs::write(dir.path().join("b.part"), b"b").unwrap();
        fs::create_dir(dir.path().join("keep")).unwrap();
        fs::write(dir.path().join("keep").join("nested.mp4"), b"n").unwrap();

        let report = ScratchDir::new(dir.path()).purge();

        assert_eq!(report, PurgeReport { removed: 2, failed: 0 });
        let left: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(left, vec![std::ffi::OsString::from("keep")]);
        assert!(dir.path().join("keep").join("nested.mp4").exists());
    }

    #[test]
    fn test_purge_missing_dir() {
        let dir = tempfile::tempdir().unwrap();
        let scratch = ScratchDir::new(dir.path().join("does-not-exist"));
        assert_eq!(scratch.purge(), PurgeReport::default());
    }

    #[test]
    fn test_purge_detached_outside_runtime_runs_inline() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("x"), b"x").unwrap();
        ScratchDir::new(dir.path()).purge_detached();
        assert!(!dir.path().join("x").exists());
    }
}
