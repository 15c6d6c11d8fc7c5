//! File records, content digests and grouping keys.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::category::lowercase_extension;

/// A file discovered by the walker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    /// Absolute path to the file.
    pub path: PathBuf,
    /// File size in bytes.
    pub size: u64,
}

impl FileRecord {
    /// Create a new file record.
    pub fn new(path: impl Into<PathBuf>, size: u64) -> Self {
        Self {
            path: path.into(),
            size,
        }
    }

    /// The file's base name, lossily converted.
    pub fn file_name(&self) -> String {
        base_name(&self.path)
    }
}

/// BLAKE3 content hash for duplicate detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentHash(pub [u8; 32]);

impl ContentHash {
    /// Create a new ContentHash from raw bytes.
    pub fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Get the hash as a hex string.
    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{b:02x}")).collect()
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Composite equality key for duplicate grouping.
///
/// Two candidates are duplicates iff their keys are equal. The size is always
/// part of the key; the digest is absent when content matching is disabled,
/// and the name and extension parts are only present when the corresponding
/// match flags are set.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FingerprintKey {
    /// File size in bytes.
    pub size: u64,
    /// Content digest.
    pub digest: Option<ContentHash>,
    /// Base file name.
    pub name: Option<String>,
    /// Lowercased extension including the dot (empty if the file has none).
    pub extension: Option<String>,
}

impl FingerprintKey {
    /// Key made of size and digest only.
    pub fn new(size: u64, digest: Option<ContentHash>) -> Self {
        Self {
            size,
            digest,
            name: None,
            extension: None,
        }
    }

    /// Fold the base name of `path` into the key.
    pub fn with_name(mut self, path: &Path) -> Self {
        self.name = Some(base_name(path));
        self
    }

    /// Fold the lowercased extension of `path` into the key.
    pub fn with_extension(mut self, path: &Path) -> Self {
        self.extension = Some(lowercase_extension(path).unwrap_or_default());
        self
    }
}

impl fmt::Display for FingerprintKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.digest {
            Some(digest) => write!(f, "{digest}")?,
            None => write!(f, "size:{}", self.size)?,
        }
        if let Some(name) = &self.name {
            write!(f, "-{name}")?;
        }
        if let Some(extension) = &self.extension {
            write!(f, "-{extension}")?;
        }
        Ok(())
    }
}

fn base_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}
