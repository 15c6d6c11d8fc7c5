//! Duplicate analysis for dupagent.
//!
//! Duplicate detection runs in two phases so that only files which can
//! possibly be duplicates are ever read:
//!
//! 1. [`SizeBuckets`] groups discovered files by exact size and drops every
//!    size seen only once.
//! 2. [`ContentFingerprinter`] streams each remaining candidate through
//!    BLAKE3 and builds its [`FingerprintKey`], optionally folding in the base
//!    name and the lowercased extension.
//!
//! [`DuplicateGrouper`] then collapses equal keys into [`DuplicateGroup`]s.
//!
//! ```rust,no_run
//! use dupagent_analyze::{ContentFingerprinter, DuplicateGrouper, SizeBuckets};
//! use dupagent_core::{FileRecord, ScanOptions};
//!
//! let records = vec![
//!     FileRecord::new("/data/a.txt", 10),
//!     FileRecord::new("/data/b.txt", 10),
//! ];
//! let candidates = records.into_iter().collect::<SizeBuckets>().into_candidates();
//!
//! let fingerprinter = ContentFingerprinter::new(&ScanOptions::default());
//! let mut grouper = DuplicateGrouper::new();
//! for record in candidates.iter() {
//!     if let Ok(key) = fingerprinter.fingerprint(&record) {
//!         grouper.add(key, record.path);
//!     }
//! }
//!
//! for group in grouper.finish() {
//!     println!("{} x{}", group.human_size, group.count());
//! }
//! ```

mod buckets;
mod fingerprint;
mod grouper;

pub use buckets::{Candidates, SizeBuckets};
pub use fingerprint::{CHUNK_SIZE, ContentFingerprinter, hash_file};
pub use grouper::{DuplicateGrouper, DuplicateSummary};

// Re-export core types
pub use dupagent_core::{ContentHash, DuplicateGroup, FileRecord, FingerprintKey};
