//! Duplicate scan pipeline for dupagent.
//!
//! A scan walks the configured roots depth-first, buckets files by size,
//! fingerprints every file that shares its size with another one, and groups
//! equal fingerprints. It runs as a single cancellable unit of work that
//! reports progress through [`ScanEvent`]s.
//!
//! # Example
//!
//! ```rust,no_run
//! use dupagent_scan::{ScanEvent, ScanOptions, start_scan};
//!
//! # async fn run() -> Result<(), dupagent_scan::ScanError> {
//! let mut handle = start_scan(vec!["/data".into()], ScanOptions::default())?;
//!
//! while let Some(event) = handle.recv().await {
//!     match event {
//!         ScanEvent::Progress(p) => println!("{p}%"),
//!         ScanEvent::Status(line) => println!("{line}"),
//!         ScanEvent::Completed(groups) => println!("{} groups", groups.len()),
//!     }
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Restarting scans
//!
//! [`ScanController`] keeps at most one scan alive: starting a new scan
//! cancels the previous one and waits for it to stop first. Once a worker
//! observes cancellation it emits nothing further and no `Completed` event
//! is sent.
//!
//! # Triggering rescans
//!
//! [`ScanSchedule`] fires a rescan of fixed directories at a fixed period and
//! [`RescanWatcher`] reports debounced filesystem changes. Neither touches a
//! running scan; both leave the restart to a [`ScanController`].

mod controller;
mod progress;
mod schedule;
mod task;
mod walker;
mod watch;

pub use controller::ScanController;
pub use progress::{ScanEvent, ScanOutcome, ScanReport, ScanState, status};
pub use schedule::{MIN_PERIOD, ScanSchedule};
pub use task::{ScanHandle, ScanTask, start_scan};
pub use walker::{PathWalker, WalkOutcome, WalkStats};
pub use watch::{DEFAULT_DEBOUNCE, FsChange, FsChangeKind, RescanWatcher, classify};

// Re-export core types for convenience
pub use dupagent_core::{
    DuplicateGroup, FileCategory, FileRecord, ScanError, ScanOptions, ScanWarning, WarningKind,
};
pub use tokio_util::sync::CancellationToken;
