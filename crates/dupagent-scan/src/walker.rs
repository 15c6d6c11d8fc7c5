//! Depth-first enumeration of candidate files.

use std::fs;
use std::path::Path;

use jwalk::{Parallelism, WalkDir};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use dupagent_core::{ExtensionFilter, FileRecord, ScanOptions, ScanWarning, WarningKind};

/// Counters collected while walking.
#[derive(Debug, Clone, Default)]
pub struct WalkStats {
    /// Files successfully stat'ed, before any filter.
    pub files_walked: u64,
    /// Files that passed every filter.
    pub files_checked: u64,
    /// Directories visited.
    pub dirs_walked: u64,
    /// Entries that could not be read.
    pub warnings: Vec<ScanWarning>,
}

/// How a walk ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkOutcome {
    Finished,
    Cancelled,
}

/// Enumerates regular files under a root and applies the exclusion rules.
///
/// Filters run in a fixed order: zero-byte, hidden name, extension
/// allow-list. Hidden directories are still descended; only file names are
/// tested. Symlinks are never followed and never reported, so a link is not
/// mistaken for a copy of its target.
#[derive(Debug, Clone)]
pub struct PathWalker {
    options: ScanOptions,
    filter: ExtensionFilter,
}

impl PathWalker {
    /// Create a walker for the given options.
    pub fn new(options: &ScanOptions) -> Self {
        Self {
            filter: options.extension_filter(),
            options: options.clone(),
        }
    }

    /// Walk `root`, handing every accepted file to `visit`.
    ///
    /// Cancellation is polled before each entry; once observed the walk
    /// stops without visiting anything further.
    pub fn walk(
        &self,
        root: &Path,
        cancel: &CancellationToken,
        stats: &mut WalkStats,
        mut visit: impl FnMut(FileRecord),
    ) -> WalkOutcome {
        match fs::metadata(root) {
            Ok(meta) if meta.is_dir() => {}
            Ok(_) => {
                debug!(root = %root.display(), "root is not a directory, skipping");
                stats.warnings.push(ScanWarning::new(
                    root,
                    "Not a directory",
                    WarningKind::ReadError,
                ));
                return WalkOutcome::Finished;
            }
            Err(err) => {
                debug!(root = %root.display(), error = %err, "cannot read root, skipping");
                stats.warnings.push(ScanWarning::new(
                    root,
                    err.to_string(),
                    WarningKind::ReadError,
                ));
                return WalkOutcome::Finished;
            }
        }

        let walker = WalkDir::new(root)
            .parallelism(Parallelism::Serial)
            .sort(true)
            .skip_hidden(false)
            .follow_links(false);

        for entry_result in walker {
            if cancel.is_cancelled() {
                debug!(root = %root.display(), "walk cancelled");
                return WalkOutcome::Cancelled;
            }

            let entry = match entry_result {
                Ok(e) => e,
                Err(err) => {
                    let path = err.path().map(|p| p.to_path_buf()).unwrap_or_default();
                    debug!(path = %path.display(), error = %err, "skipping unreadable entry");
                    stats
                        .warnings
                        .push(ScanWarning::new(path, err.to_string(), WarningKind::ReadError));
                    continue;
                }
            };

            let file_type = entry.file_type();
            if file_type.is_dir() {
                stats.dirs_walked += 1;
                continue;
            }
            if file_type.is_symlink() {
                continue;
            }

            let path = entry.path();
            // Races and permission problems end up here.
            let metadata = match fs::symlink_metadata(&path) {
                Ok(m) => m,
                Err(err) => {
                    debug!(path = %path.display(), error = %err, "stat failed");
                    stats.warnings.push(ScanWarning::metadata(&path, &err));
                    continue;
                }
            };
            if !metadata.is_file() {
                continue;
            }
            stats.files_walked += 1;

            let size = metadata.len();
            if self.options.should_skip_size(size) {
                continue;
            }
            let name = entry.file_name().to_string_lossy();
            if self.options.should_skip_hidden(&name) {
                continue;
            }
            if !self.filter.accepts(&name) {
                continue;
            }

            stats.files_checked += 1;
            visit(FileRecord::new(path, size));
        }

        WalkOutcome::Finished
    }
}
