//! Duplicate groups and size formatting.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::node::FingerprintKey;

/// A set of files sharing the same fingerprint key.
///
/// Always holds at least two paths, in discovery order. The first path is the
/// copy that is kept by default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuplicateGroup {
    /// Key shared by all members.
    pub key: FingerprintKey,

    /// Size of each file in bytes.
    pub size: u64,

    /// Human-readable size, e.g. `"10.0 B"`.
    pub human_size: String,

    /// Paths to all duplicate files.
    pub paths: Vec<PathBuf>,
}

impl DuplicateGroup {
    /// Create a group, rendering the human-readable size.
    pub fn new(key: FingerprintKey, size: u64, paths: Vec<PathBuf>) -> Self {
        Self {
            key,
            size,
            human_size: format_size(size),
            paths,
        }
    }

    /// Get the number of duplicate files.
    pub fn count(&self) -> usize {
        self.paths.len()
    }

    /// The member kept by default.
    pub fn keep(&self) -> Option<&PathBuf> {
        self.paths.first()
    }

    /// Members pre-selected for removal (everything but the first).
    pub fn deletable(&self) -> &[PathBuf] {
        self.paths.get(1..).unwrap_or_default()
    }

    /// Wasted space: size * (count - 1).
    pub fn wasted_bytes(&self) -> u64 {
        self.size * self.deletable().len() as u64
    }
}

const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];

/// Format a byte count with binary (1024) steps and one decimal place.
///
/// `10` renders as `"10.0 B"`, `1536` as `"1.5 KB"`; anything past the
/// terabyte range is expressed in `PB`.
pub fn format_size(bytes: u64) -> String {
    let mut size = bytes as f64;
    for unit in UNITS {
        if size < 1024.0 {
            return format!("{size:.1} {unit}");
        }
        size /= 1024.0;
    }
    format!("{size:.1} PB")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::ContentHash;

    fn group(paths: &[&str]) -> DuplicateGroup {
        DuplicateGroup::new(
            FingerprintKey::new(4096, Some(ContentHash::new([0xaa; 32]))),
            4096,
            paths.iter().map(PathBuf::from).collect(),
        )
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(0), "0.0 B");
        assert_eq!(format_size(10), "10.0 B");
        assert_eq!(format_size(1023), "1023.0 B");
        assert_eq!(format_size(1024), "1.0 KB");
        assert_eq!(format_size(1536), "1.5 KB");
        assert_eq!(format_size(5 * 1024 * 1024), "5.0 MB");
        assert_eq!(format_size(3 * 1024u64.pow(4)), "3.0 TB");
        assert_eq!(format_size(2 * 1024u64.pow(5)), "2.0 PB");
    }

    #[test]
    fn test_group_keep_and_deletable() {
        let group = group(&["/a/1.txt", "/b/1.txt", "/c/1.txt"]);

        assert_eq!(group.count(), 3);
        assert_eq!(group.keep(), Some(&PathBuf::from("/a/1.txt")));
        assert_eq!(
            group.deletable(),
            &[PathBuf::from("/b/1.txt"), PathBuf::from("/c/1.txt")]
        );
        assert_eq!(group.wasted_bytes(), 8192);
        assert_eq!(group.human_size, "4.0 KB");
    }

    #[test]
    fn test_deletable_of_degenerate_group() {
        let group = group(&[]);
        assert!(group.keep().is_none());
        assert!(group.deletable().is_empty());
        assert_eq!(group.wasted_bytes(), 0);
    }
}
