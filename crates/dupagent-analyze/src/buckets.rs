//! Size bucketing, the cheap first phase of duplicate detection.

use std::path::PathBuf;

use indexmap::IndexMap;

use dupagent_core::FileRecord;

/// Files grouped by exact byte size, in discovery order.
#[derive(Debug, Default)]
pub struct SizeBuckets {
    buckets: IndexMap<u64, Vec<PathBuf>>,
    files: u64,
}

impl SizeBuckets {
    /// Create an empty bucket map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a discovered file.
    pub fn insert(&mut self, record: FileRecord) {
        self.buckets.entry(record.size).or_default().push(record.path);
        self.files += 1;
    }

    /// Number of files inserted so far.
    pub fn file_count(&self) -> u64 {
        self.files
    }

    /// Number of distinct sizes seen so far.
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// Drop sizes shared by fewer than two files and return the rest.
    pub fn into_candidates(mut self) -> Candidates {
        self.buckets.retain(|_, paths| paths.len() > 1);
        let total = self.buckets.values().map(Vec::len).sum();
        Candidates {
            buckets: self.buckets,
            total,
        }
    }
}

impl Extend<FileRecord> for SizeBuckets {
    fn extend<T: IntoIterator<Item = FileRecord>>(&mut self, iter: T) {
        for record in iter {
            self.insert(record);
        }
    }
}

impl FromIterator<FileRecord> for SizeBuckets {
    fn from_iter<T: IntoIterator<Item = FileRecord>>(iter: T) -> Self {
        let mut buckets = Self::new();
        buckets.extend(iter);
        buckets
    }
}

/// Files that share their size with at least one other file.
#[derive(Debug, Default)]
pub struct Candidates {
    buckets: IndexMap<u64, Vec<PathBuf>>,
    total: usize,
}

impl Candidates {
    /// Number of candidate files.
    pub fn len(&self) -> usize {
        self.total
    }

    /// Whether no file survived the size filter.
    pub fn is_empty(&self) -> bool {
        self.total == 0
    }

    /// Iterate over candidates as records, bucket by bucket.
    pub fn iter(&self) -> impl Iterator<Item = FileRecord> + '_ {
        self.buckets
            .iter()
            .flat_map(|(size, paths)| paths.iter().map(|p| FileRecord::new(p.clone(), *size)))
    }

    /// The surviving sizes and their files.
    pub fn buckets(&self) -> impl Iterator<Item = (u64, &[PathBuf])> {
        self.buckets.iter().map(|(size, paths)| (*size, paths.as_slice()))
    }
}
