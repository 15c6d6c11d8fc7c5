//! Collapsing fingerprint keys into duplicate groups.

use std::path::PathBuf;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use dupagent_core::{DuplicateGroup, FingerprintKey};

/// Accumulates candidates by key, keeping first-seen key order.
#[derive(Debug, Default)]
pub struct DuplicateGrouper {
    groups: IndexMap<FingerprintKey, Vec<PathBuf>>,
}

impl DuplicateGrouper {
    /// Create an empty grouper.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a fingerprinted file.
    pub fn add(&mut self, key: FingerprintKey, path: PathBuf) {
        self.groups.entry(key).or_default().push(path);
    }

    /// Number of distinct keys seen.
    pub fn key_count(&self) -> usize {
        self.groups.len()
    }

    /// Drop singletons and build the final groups.
    ///
    /// Sizes come from the key: every member went through the same size
    /// bucket before it was fingerprinted.
    pub fn finish(self) -> Vec<DuplicateGroup> {
        self.groups
            .into_iter()
            .filter(|(_, paths)| paths.len() >= 2)
            .map(|(key, paths)| {
                let size = key.size;
                DuplicateGroup::new(key, size, paths)
            })
            .collect()
    }
}

/// Aggregate numbers for a list of duplicate groups.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuplicateSummary {
    /// Number of groups.
    pub group_count: usize,
    /// Number of files that belong to a group.
    pub files_with_duplicates: u64,
    /// Total size of all grouped files.
    pub total_duplicate_size: u64,
    /// Space reclaimable by keeping one copy per group.
    pub total_wasted_space: u64,
}

impl DuplicateSummary {
    /// Summarize a list of groups.
    pub fn from_groups(groups: &[DuplicateGroup]) -> Self {
        Self {
            group_count: groups.len(),
            files_with_duplicates: groups.iter().map(|g| g.paths.len() as u64).sum(),
            total_duplicate_size: groups.iter().map(|g| g.size * g.paths.len() as u64).sum(),
            total_wasted_space: groups.iter().map(DuplicateGroup::wasted_bytes).sum(),
        }
    }
}
