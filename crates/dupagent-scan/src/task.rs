//! The scan pipeline as a single cancellable unit of work.

use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Instant;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use dupagent_analyze::{ContentFingerprinter, DuplicateGrouper, SizeBuckets};
use dupagent_core::{ScanError, ScanOptions, ScanWarning};

use crate::progress::{ScanEvent, ScanOutcome, ScanReport, ScanState, percent, status};
use crate::walker::{PathWalker, WalkOutcome, WalkStats};

/// Walks, buckets, fingerprints and groups the files under a set of roots.
///
/// ```text
/// Idle -> Walking -> Hashing -> Completed
///            |          |
///            +----------+-----> Cancelled
/// ```
///
/// With no size-sharing files the task goes from `Walking` straight to
/// `Completed`.
#[derive(Debug)]
pub struct ScanTask {
    roots: Vec<PathBuf>,
    options: ScanOptions,
    state: ScanState,
}

impl ScanTask {
    /// Create a task. Fails when `roots` is empty.
    ///
    /// Repeated roots and roots nested inside another root are dropped so
    /// that no file is walked twice.
    pub fn new(roots: Vec<PathBuf>, options: ScanOptions) -> Result<Self, ScanError> {
        if roots.is_empty() {
            return Err(ScanError::NoDirectories);
        }
        Ok(Self {
            roots: prune_nested_roots(roots),
            options,
            state: ScanState::Idle,
        })
    }

    /// The roots that will be walked, in walk order.
    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    /// The options this task was created with.
    pub fn options(&self) -> &ScanOptions {
        &self.options
    }

    /// Current pipeline state.
    pub fn state(&self) -> ScanState {
        self.state
    }

    /// Run the pipeline on the current thread.
    ///
    /// Events go to `emit` in order. Once cancellation is observed the run
    /// returns [`ScanOutcome::Cancelled`] without emitting anything else.
    pub fn run(&mut self, cancel: &CancellationToken, mut emit: impl FnMut(ScanEvent)) -> ScanOutcome {
        let start = Instant::now();
        if cancel.is_cancelled() {
            return self.cancelled();
        }

        self.state = ScanState::Walking;
        info!(roots = self.roots.len(), "scan started");
        emit(ScanEvent::Status(status::WALKING.to_string()));

        let walker = PathWalker::new(&self.options);
        let mut stats = WalkStats::default();
        let mut buckets = SizeBuckets::new();
        let mut seen = HashSet::new();
        for root in &self.roots {
            let outcome = walker.walk(root, cancel, &mut stats, |record| {
                if seen.insert(record.path.clone()) {
                    buckets.insert(record);
                }
            });
            if outcome == WalkOutcome::Cancelled {
                return self.cancelled();
            }
        }

        let candidates = buckets.into_candidates();
        debug!(
            files_walked = stats.files_walked,
            files_checked = stats.files_checked,
            candidates = candidates.len(),
            "walk finished"
        );

        let mut report = ScanReport {
            files_walked: stats.files_walked,
            files_checked: stats.files_checked,
            candidates: candidates.len(),
            warnings: stats.warnings,
            ..ScanReport::default()
        };

        if candidates.is_empty() {
            emit(ScanEvent::Status(status::no_duplicates(report.files_checked)));
            emit(ScanEvent::Completed(Vec::new()));
            return self.completed(report, start);
        }

        self.state = ScanState::Hashing;
        emit(ScanEvent::Status(status::hashing(candidates.len())));

        let fingerprinter = ContentFingerprinter::new(&self.options);
        let mut grouper = DuplicateGrouper::new();
        let total = candidates.len();

        for (index, record) in candidates.iter().enumerate() {
            if cancel.is_cancelled() {
                return self.cancelled();
            }

            emit(ScanEvent::Progress(percent(index + 1, total)));
            emit(ScanEvent::Status(status::hashing_file(&record.file_name())));

            match fingerprinter.fingerprint(&record) {
                Ok(key) => grouper.add(key, record.path),
                Err(err) => {
                    debug!(path = %record.path.display(), error = %err, "hash failed, dropping");
                    report.hash_failures += 1;
                    report.warnings.push(ScanWarning::hash(&record.path, &err));
                }
            }
        }

        report.groups = grouper.finish();

        emit(ScanEvent::Status(status::finished(report.groups.len())));
        emit(ScanEvent::Progress(100));
        emit(ScanEvent::Completed(report.groups.clone()));
        self.completed(report, start)
    }

    fn completed(&mut self, mut report: ScanReport, start: Instant) -> ScanOutcome {
        self.state = ScanState::Completed;
        report.elapsed = start.elapsed();
        info!(
            groups = report.groups.len(),
            files_checked = report.files_checked,
            elapsed_ms = report.elapsed.as_millis() as u64,
            "scan completed"
        );
        ScanOutcome::Completed(report)
    }

    fn cancelled(&mut self) -> ScanOutcome {
        self.state = ScanState::Cancelled;
        info!("scan cancelled");
        ScanOutcome::Cancelled
    }
}

/// Drop roots that equal or sit below an earlier or later root.
///
/// Keeps the first-seen order of the surviving roots.
fn prune_nested_roots(roots: Vec<PathBuf>) -> Vec<PathBuf> {
    let mut kept: Vec<PathBuf> = Vec::with_capacity(roots.len());
    for root in roots {
        if kept.iter().any(|outer| root.starts_with(outer)) {
            debug!(root = %root.display(), "root already covered, skipping");
            continue;
        }
        kept.retain(|inner| !inner.starts_with(&root));
        kept.push(root);
    }
    kept
}

/// A scan running on the blocking thread pool.
#[derive(Debug)]
pub struct ScanHandle {
    events: mpsc::UnboundedReceiver<ScanEvent>,
    cancel: CancellationToken,
    join: JoinHandle<ScanOutcome>,
}

impl ScanHandle {
    /// Next event; `None` once the worker has stopped.
    pub async fn recv(&mut self) -> Option<ScanEvent> {
        self.events.recv().await
    }

    /// Request cancellation. The worker stops sending once it sees the token.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// A token that cancels this scan.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Whether the worker has stopped.
    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }

    /// Wait for the worker and return how it ended.
    ///
    /// Events not yet received are discarded.
    pub async fn wait(self) -> Result<ScanOutcome, ScanError> {
        drop(self.events);
        self.join.await.map_err(|e| ScanError::Other {
            message: e.to_string(),
        })
    }

    pub(crate) fn into_parts(
        self,
    ) -> (
        mpsc::UnboundedReceiver<ScanEvent>,
        CancellationToken,
        JoinHandle<ScanOutcome>,
    ) {
        (self.events, self.cancel, self.join)
    }
}

/// Start a scan in the background.
///
/// Configuration errors are returned before any work is spawned. Must be
/// called from within a Tokio runtime.
pub fn start_scan(roots: Vec<PathBuf>, options: ScanOptions) -> Result<ScanHandle, ScanError> {
    let mut task = ScanTask::new(roots, options)?;
    let (tx, rx) = mpsc::unbounded_channel();
    let cancel = CancellationToken::new();
    let token = cancel.clone();

    let join = tokio::task::spawn_blocking(move || {
        task.run(&token, |event| {
            if !token.is_cancelled() {
                let _ = tx.send(event);
            }
        })
    });

    Ok(ScanHandle {
        events: rx,
        cancel,
        join,
    })
}
