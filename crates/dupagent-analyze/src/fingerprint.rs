//! Streaming content digests and fingerprint keys.

use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use blake3::Hasher;
use tracing::trace;

use dupagent_core::{ContentHash, FileRecord, FingerprintKey, ScanOptions};

/// Read buffer size used while hashing.
pub const CHUNK_SIZE: usize = 64 * 1024;

/// Builds fingerprint keys according to the active match flags.
#[derive(Debug, Clone)]
pub struct ContentFingerprinter {
    match_content: bool,
    match_name: bool,
    match_extension: bool,
    chunk_size: usize,
}

impl ContentFingerprinter {
    /// Create a fingerprinter for the given options.
    pub fn new(options: &ScanOptions) -> Self {
        Self {
            match_content: options.match_content,
            match_name: options.match_name,
            match_extension: options.match_extension,
            chunk_size: CHUNK_SIZE,
        }
    }

    /// Override the read buffer size.
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    /// Compute the key for a candidate file.
    ///
    /// Fails only when content matching is on and the file cannot be read.
    pub fn fingerprint(&self, record: &FileRecord) -> io::Result<FingerprintKey> {
        trace!(path = %record.path.display(), size = record.size, "fingerprinting");
        let digest = if self.match_content {
            Some(hash_file(&record.path, self.chunk_size)?)
        } else {
            None
        };

        let mut key = FingerprintKey::new(record.size, digest);
        if self.match_name {
            key = key.with_name(&record.path);
        }
        if self.match_extension {
            key = key.with_extension(&record.path);
        }
        Ok(key)
    }
}

/// Compute the BLAKE3 hash of a file, reading `chunk_size` bytes at a time.
pub fn hash_file(path: &Path, chunk_size: usize) -> io::Result<ContentHash> {
    let mut file = File::open(path)?;
    let mut hasher = Hasher::new();
    let mut buffer = vec![0u8; chunk_size.max(1)];

    loop {
        let bytes_read = match file.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(ContentHash::new(*hasher.finalize().as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn create_test_files() -> TempDir {
        let temp = TempDir::new().unwrap();
        let root = temp.path();

        fs::write(root.join("file1.txt"), "duplicate content here").unwrap();
        fs::write(root.join("file2.txt"), "duplicate content here").unwrap();
        fs::write(root.join("file3.txt"), "unique content").unwrap();

        temp
    }

    fn record(temp: &TempDir, name: &str) -> FileRecord {
        let path = temp.path().join(name);
        let size = fs::metadata(&path).unwrap().len();
        FileRecord::new(path, size)
    }

    #[test]
    fn test_hash_file() {
        let temp = create_test_files();

        let hash1 = hash_file(&temp.path().join("file1.txt"), CHUNK_SIZE).unwrap();
        let hash2 = hash_file(&temp.path().join("file2.txt"), CHUNK_SIZE).unwrap();
        let hash3 = hash_file(&temp.path().join("file3.txt"), CHUNK_SIZE).unwrap();

        assert_eq!(hash1, hash2);
        assert_ne!(hash1, hash3);
    }

    #[test]
    fn test_chunk_size_does_not_change_digest() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("big.bin");
        let data: Vec<u8> = (0..200_000u32).map(|i| (i % 251) as u8).collect();
        fs::write(&path, &data).unwrap();

        let expected = ContentHash::new(*blake3::hash(&data).as_bytes());
        assert_eq!(hash_file(&path, 7).unwrap(), expected);
        assert_eq!(hash_file(&path, CHUNK_SIZE).unwrap(), expected);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let temp = TempDir::new().unwrap();
        assert!(hash_file(&temp.path().join("nope"), CHUNK_SIZE).is_err());
    }

    #[test]
    fn test_name_matching_narrows_keys() {
        let temp = create_test_files();
        let options = ScanOptions {
            match_name: true,
            ..ScanOptions::default()
        };
        let fingerprinter = ContentFingerprinter::new(&options);

        let key1 = fingerprinter.fingerprint(&record(&temp, "file1.txt")).unwrap();
        let key2 = fingerprinter.fingerprint(&record(&temp, "file2.txt")).unwrap();
        assert_eq!(key1.digest, key2.digest);
        assert_ne!(key1, key2);
    }

    #[test]
    fn test_without_content_matching_nothing_is_read() {
        let options = ScanOptions {
            match_content: false,
            ..ScanOptions::default()
        };
        let fingerprinter = ContentFingerprinter::new(&options);

        // The file does not exist; the key is built from the size alone.
        let key = fingerprinter
            .fingerprint(&FileRecord::new("/does/not/exist.bin", 12))
            .unwrap();
        assert_eq!(key, FingerprintKey::new(12, None));
    }
}
