//! Progress and summary types for batch trashing.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// A file that was moved into a trash root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrashedFile {
    /// Where the file was.
    pub original: PathBuf,
    /// Where it is now, inside `files/`.
    pub trashed: PathBuf,
    /// Its `.trashinfo` sidecar.
    pub info: PathBuf,
    /// Size in bytes at the time of the move.
    pub size: u64,
}

/// A file that could not be trashed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrashFailure {
    pub path: PathBuf,
    pub message: String,
    /// The file left its original location but has no sidecar.
    pub moved: bool,
}

impl fmt::Display for TrashFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path.display(), self.message)
    }
}

/// Progress of an ongoing batch.
#[derive(Debug, Clone)]
pub struct TrashProgress {
    /// Number of files handled, moved or failed.
    pub files_completed: usize,
    /// Number of files in the batch.
    pub files_total: usize,
    /// Bytes moved so far.
    pub bytes_moved: u64,
    /// The file currently being processed.
    pub current_file: Option<PathBuf>,
    /// Failures so far.
    pub failures: usize,
}

impl TrashProgress {
    pub fn new(files_total: usize) -> Self {
        Self {
            files_completed: 0,
            files_total,
            bytes_moved: 0,
            current_file: None,
            failures: 0,
        }
    }

    /// Get the progress as a percentage (0.0 to 100.0).
    pub fn percentage(&self) -> f64 {
        if self.files_total > 0 {
            (self.files_completed as f64 / self.files_total as f64) * 100.0
        } else {
            0.0
        }
    }
}

/// Outcome of a batch, one entry per input path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrashSummary {
    pub moved: Vec<TrashedFile>,
    pub failed: Vec<TrashFailure>,
}

impl TrashSummary {
    pub fn moved_count(&self) -> usize {
        self.moved.len()
    }

    pub fn failed_count(&self) -> usize {
        self.failed.len()
    }

    /// Whether every file was moved.
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    /// Total size of the moved files.
    pub fn bytes_moved(&self) -> u64 {
        self.moved.iter().map(|f| f.size).sum()
    }

    /// User-facing result line.
    pub fn message(&self) -> String {
        if self.is_success() {
            format!("Success: {} files moved to trash.", self.moved_count())
        } else {
            format!(
                "WARNING: {} files moved, but {} files failed",
                self.moved_count(),
                self.failed_count()
            )
        }
    }
}

impl fmt::Display for TrashSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} moved, {} failed", self.moved_count(), self.failed_count())
    }
}

/// Message sent while a background batch runs.
#[derive(Debug, Clone)]
pub enum TrashEvent {
    Progress(TrashProgress),
    /// Terminal event.
    Complete(TrashSummary),
}
