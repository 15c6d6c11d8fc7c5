//! Error types for scanning and trash operations.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that stop a scan as a whole.
///
/// Problems with individual files never surface here; they become
/// [`ScanWarning`]s and the file is skipped.
#[derive(Debug, Error)]
pub enum ScanError {
    /// No directories were supplied.
    #[error("Please add at least one directory to scan")]
    NoDirectories,

    /// The background worker failed.
    #[error("{message}")]
    Other { message: String },
}

/// Kind of scan warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WarningKind {
    /// Error reading a directory.
    ReadError,
    /// Error reading metadata (permissions, race).
    MetadataError,
    /// Error reading file contents while hashing.
    HashError,
}

/// Non-fatal warning encountered during a scan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanWarning {
    /// Path where the warning occurred.
    pub path: PathBuf,
    /// Human-readable message.
    pub message: String,
    /// Kind of warning.
    pub kind: WarningKind,
}

impl ScanWarning {
    /// Create a new scan warning.
    pub fn new(path: impl Into<PathBuf>, message: impl Into<String>, kind: WarningKind) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
            kind,
        }
    }

    /// Create a metadata error warning.
    pub fn metadata(path: impl Into<PathBuf>, error: &std::io::Error) -> Self {
        Self::new(path, format!("Metadata error: {error}"), WarningKind::MetadataError)
    }

    /// Create a hashing error warning.
    pub fn hash(path: impl Into<PathBuf>, error: &std::io::Error) -> Self {
        Self::new(path, format!("Read error: {error}"), WarningKind::HashError)
    }
}

/// Errors that abort moving a single file to the trash.
#[derive(Debug, Error)]
pub enum TrashError {
    /// The path has no file name component.
    #[error("Not a file path: {path}")]
    InvalidPath { path: PathBuf },

    /// The source file does not exist.
    #[error("Path not found: {path}")]
    NotFound { path: PathBuf },

    /// Creating the trash directories failed.
    #[error("Cannot create trash directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Restricting the trash root permissions failed.
    #[error("Cannot set permissions on {path}: {source}")]
    Permissions {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Moving the file into the trash failed; the source is untouched.
    #[error("Cannot move {path} to trash: {source}")]
    Move {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file was moved but its `.trashinfo` could not be written.
    #[error("Moved to {trashed} but cannot write {path}: {source}")]
    WriteInfo {
        path: PathBuf,
        trashed: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl TrashError {
    /// Whether the file already left its original location.
    pub fn file_was_moved(&self) -> bool {
        matches!(self, Self::WriteInfo { .. })
    }
}
