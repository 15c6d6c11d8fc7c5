//! Debounced filesystem watching for triggering rescans.
//!
//! The watcher never touches scan state. It only reports which files changed
//! so that the caller can decide when to start a new scan.

use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use notify_debouncer_mini::{DebounceEventResult, Debouncer, new_debouncer};
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, warn};

use dupagent_core::{ExtensionFilter, ScanOptions};

/// Default quiet period before a batch of changes is delivered.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_secs(2);

/// What happened to a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FsChangeKind {
    /// Created or modified.
    Changed,
    /// No longer present.
    Removed,
}

/// A relevant change to a file under a watched root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FsChange {
    pub path: PathBuf,
    pub kind: FsChangeKind,
}

/// Watches roots recursively and delivers batches of [`FsChange`]s.
pub struct RescanWatcher {
    debouncer: Debouncer<RecommendedWatcher>,
    roots: Vec<PathBuf>,
}

impl RescanWatcher {
    /// Create a watcher with the default debounce window.
    pub fn new(options: &ScanOptions, tx: UnboundedSender<Vec<FsChange>>) -> notify::Result<Self> {
        Self::with_debounce(options, DEFAULT_DEBOUNCE, tx)
    }

    /// Create a watcher with a custom debounce window.
    pub fn with_debounce(
        options: &ScanOptions,
        debounce: Duration,
        tx: UnboundedSender<Vec<FsChange>>,
    ) -> notify::Result<Self> {
        let filter = options.extension_filter();
        let debouncer = new_debouncer(debounce, move |result: DebounceEventResult| match result {
            Ok(events) => {
                let changes: Vec<FsChange> = events
                    .iter()
                    .filter_map(|event| classify(&event.path, &filter))
                    .collect();
                if changes.is_empty() {
                    return;
                }
                debug!(changes = changes.len(), "filesystem changes");
                let _ = tx.send(changes);
            }
            Err(err) => warn!(error = %err, "watch error"),
        })?;

        Ok(Self {
            debouncer,
            roots: Vec::new(),
        })
    }

    /// Start watching `root` and everything below it.
    pub fn watch(&mut self, root: &Path) -> notify::Result<()> {
        self.debouncer
            .watcher()
            .watch(root, RecursiveMode::Recursive)?;
        self.roots.push(root.to_path_buf());
        Ok(())
    }

    /// Stop watching `root`.
    pub fn unwatch(&mut self, root: &Path) -> notify::Result<()> {
        self.debouncer.watcher().unwatch(root)?;
        self.roots.retain(|r| r != root);
        Ok(())
    }

    /// Roots currently watched.
    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }
}

/// Decide whether a raw event path matters for duplicate scanning.
///
/// Hidden files, directories and files outside the extension allow-list are
/// ignored.
pub fn classify(path: &Path, filter: &ExtensionFilter) -> Option<FsChange> {
    let name = path.file_name()?.to_string_lossy();
    if name.starts_with('.') || !filter.accepts(&name) {
        return None;
    }

    let kind = match path.metadata() {
        Ok(meta) if meta.is_dir() => return None,
        Ok(_) => FsChangeKind::Changed,
        Err(_) => FsChangeKind::Removed,
    };
    Some(FsChange {
        path: path.to_path_buf(),
        kind,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use dupagent_core::FileCategory;
    use std::fs;
    use tempfile::TempDir;
    use tokio::sync::mpsc;

    #[test]
    fn test_classify() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("song.mp3");
        fs::write(&file, "x").unwrap();
        fs::write(temp.path().join(".hidden"), "x").unwrap();

        let all = ExtensionFilter::default();
        assert_eq!(
            classify(&file, &all),
            Some(FsChange {
                path: file.clone(),
                kind: FsChangeKind::Changed
            })
        );
        assert_eq!(
            classify(&temp.path().join("gone.txt"), &all).map(|c| c.kind),
            Some(FsChangeKind::Removed)
        );
        assert_eq!(classify(&temp.path().join(".hidden"), &all), None);
        assert_eq!(classify(temp.path(), &all), None);

        let video = ExtensionFilter::new(FileCategory::Video, &[]);
        assert_eq!(classify(&file, &video), None);
    }

    #[test]
    fn test_watch_registers_root() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut watcher = RescanWatcher::new(&ScanOptions::default(), tx).unwrap();
        let temp = TempDir::new().unwrap();

        watcher.watch(temp.path()).unwrap();
        assert_eq!(watcher.roots(), &[temp.path().to_path_buf()]);

        watcher.unwatch(temp.path()).unwrap();
        assert!(watcher.roots().is_empty());
    }

    #[tokio::test]
    async fn test_detects_new_file() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut watcher =
            RescanWatcher::with_debounce(&ScanOptions::default(), Duration::from_millis(200), tx)
                .unwrap();
        let temp = TempDir::new().unwrap();
        watcher.watch(temp.path()).unwrap();

        fs::write(temp.path().join("new_file.txt"), "hello").unwrap();

        let batch = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("should receive a change batch")
            .unwrap();
        assert!(batch.iter().any(|c| c.path.ends_with("new_file.txt")));
    }
}
