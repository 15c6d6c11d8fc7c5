//! Scan events, lifecycle state and the final report.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use dupagent_core::{DuplicateGroup, ScanWarning};

/// One-way notification from a running scan.
///
/// A scan emits zero or more `Progress`/`Status` events and, unless it was
/// cancelled, exactly one terminal `Completed`.
#[derive(Debug, Clone, PartialEq)]
pub enum ScanEvent {
    /// Hashing progress, 0 to 100.
    Progress(u8),
    /// Human-readable status line.
    Status(String),
    /// The final groups, in first-seen order.
    Completed(Vec<DuplicateGroup>),
}

/// Lifecycle of a [`ScanTask`](crate::ScanTask).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScanState {
    Idle,
    Walking,
    Hashing,
    Completed,
    Cancelled,
}

impl ScanState {
    /// Whether the state can no longer change.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }
}

/// Everything a completed scan produced.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScanReport {
    /// Duplicate groups, in first-seen order.
    pub groups: Vec<DuplicateGroup>,
    /// Files successfully stat'ed, before filtering.
    pub files_walked: u64,
    /// Files that passed every filter.
    pub files_checked: u64,
    /// Files sharing their size with another file.
    pub candidates: usize,
    /// Candidates dropped because they could not be read.
    pub hash_failures: u64,
    /// Non-fatal problems met along the way.
    pub warnings: Vec<ScanWarning>,
    /// Wall time of the run.
    pub elapsed: Duration,
}

impl ScanReport {
    /// Bytes freed by trashing every member except the first of each group.
    pub fn reclaimable_bytes(&self) -> u64 {
        self.groups.iter().map(DuplicateGroup::wasted_bytes).sum()
    }

    /// Total number of grouped files.
    pub fn duplicate_files(&self) -> usize {
        self.groups.iter().map(DuplicateGroup::count).sum()
    }
}

/// How a scan run ended.
#[derive(Debug, Clone)]
pub enum ScanOutcome {
    Completed(ScanReport),
    Cancelled,
}

impl ScanOutcome {
    /// The report, if the scan ran to completion.
    pub fn into_report(self) -> Option<ScanReport> {
        match self {
            Self::Completed(report) => Some(report),
            Self::Cancelled => None,
        }
    }

    /// Whether the scan stopped before completing.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

/// Status lines shown while scanning.
pub mod status {
    pub const WALKING: &str = "1/2: Scanning file system...";
    pub const CANCELLED: &str = "Scan Canceled. Restart.";

    pub fn hashing(candidates: usize) -> String {
        format!("2/2: Hashing {candidates} candidate files...")
    }

    pub fn hashing_file(name: &str) -> String {
        format!("Hashing: {name}")
    }

    pub fn no_duplicates(files_checked: u64) -> String {
        format!("Scan Completed. {files_checked} files checked, no duplicates found.")
    }

    pub fn finished(groups: usize) -> String {
        format!("Scan Completed. {groups} duplicate groups found.")
    }
}

/// Percentage of `processed` out of `total`, rounded down.
pub(crate) fn percent(processed: usize, total: usize) -> u8 {
    if total == 0 {
        return 100;
    }
    ((processed.min(total) as u64 * 100) / total as u64) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use dupagent_core::{ContentHash, FingerprintKey};
    use std::path::PathBuf;

    #[test]
    fn test_percent() {
        assert_eq!(percent(1, 3), 33);
        assert_eq!(percent(2, 3), 66);
        assert_eq!(percent(3, 3), 100);
        assert_eq!(percent(0, 0), 100);
    }

    #[test]
    fn test_report_totals() {
        let group = DuplicateGroup::new(
            FingerprintKey::new(100, Some(ContentHash::new([1; 32]))),
            100,
            vec![PathBuf::from("/a"), PathBuf::from("/b"), PathBuf::from("/c")],
        );
        let report = ScanReport {
            groups: vec![group],
            ..ScanReport::default()
        };

        assert_eq!(report.reclaimable_bytes(), 200);
        assert_eq!(report.duplicate_files(), 3);
    }

    #[test]
    fn test_terminal_states() {
        assert!(ScanState::Completed.is_terminal());
        assert!(ScanState::Cancelled.is_terminal());
        assert!(!ScanState::Hashing.is_terminal());
    }

    #[test]
    fn test_status_lines() {
        assert_eq!(status::finished(2), "Scan Completed. 2 duplicate groups found.");
        assert_eq!(
            status::no_duplicates(5),
            "Scan Completed. 5 files checked, no duplicates found."
        );
    }
}
