//! `.trashinfo` sidecar files.

use std::ffi::OsString;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDateTime, Timelike};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, percent_decode_str, percent_encode};
use thiserror::Error;

use crate::locator::TrashKind;

/// Timestamp layout of `DeletionDate=`.
pub const DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

const HEADER: &str = "[Trash Info]";
const FILE_SCHEME: &str = "file://";

/// Everything except alphanumerics, `/`, `:` and the unreserved marks.
const PATH_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'/')
    .remove(b':')
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Problems reading a `.trashinfo` file back.
#[derive(Debug, Error)]
pub enum InfoParseError {
    #[error("missing [Trash Info] header")]
    MissingHeader,

    #[error("missing {0} key")]
    MissingKey(&'static str),

    #[error("invalid deletion date '{0}'")]
    InvalidDate(String),

    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Recovery metadata for one trashed file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrashInfo {
    /// Encoded original path, bare or with a `file://` prefix.
    pub path: String,
    /// Local time of deletion, second precision.
    pub deletion_date: NaiveDateTime,
}

impl TrashInfo {
    pub fn new(original: &Path, kind: TrashKind, deletion_date: NaiveDateTime) -> Self {
        Self {
            path: encode_path(original, kind),
            deletion_date,
        }
    }

    /// Metadata stamped with the current local time.
    pub fn now(original: &Path, kind: TrashKind) -> Self {
        let now = Local::now().naive_local();
        Self::new(original, kind, now.with_nanosecond(0).unwrap_or(now))
    }

    /// The decoded original location.
    pub fn original_path(&self) -> PathBuf {
        let encoded = self.path.strip_prefix(FILE_SCHEME).unwrap_or(&self.path);
        let bytes: Vec<u8> = percent_decode_str(encoded).collect();
        path_from_bytes(bytes)
    }

    /// Whether `Path=` carries the `file://` scheme.
    pub fn is_uri(&self) -> bool {
        self.path.starts_with(FILE_SCHEME)
    }

    pub fn parse(content: &str) -> Result<Self, InfoParseError> {
        let mut lines = content.lines().map(str::trim).filter(|l| !l.is_empty());
        if lines.next() != Some(HEADER) {
            return Err(InfoParseError::MissingHeader);
        }

        let mut path = None;
        let mut date = None;
        for line in lines {
            if let Some(value) = line.strip_prefix("Path=") {
                path = Some(value.to_string());
            } else if let Some(value) = line.strip_prefix("DeletionDate=") {
                date = Some(value.to_string());
            }
        }

        let path = path.ok_or(InfoParseError::MissingKey("Path"))?;
        let date = date.ok_or(InfoParseError::MissingKey("DeletionDate"))?;
        let deletion_date = NaiveDateTime::parse_from_str(&date, DATE_FORMAT)
            .map_err(|_| InfoParseError::InvalidDate(date))?;

        Ok(Self {
            path,
            deletion_date,
        })
    }

    /// Read and parse a sidecar file.
    pub fn read(path: &Path) -> Result<Self, InfoParseError> {
        let content = fs::read_to_string(path).map_err(|source| InfoParseError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content)
    }

    /// Write the sidecar, failing if it already exists.
    pub fn write_new(&self, path: &Path) -> io::Result<()> {
        use std::io::Write;

        let mut file = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)?;
        file.write_all(self.to_string().as_bytes())?;
        file.sync_all()
    }
}

impl fmt::Display for TrashInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{HEADER}\nPath={}\nDeletionDate={}",
            self.path,
            self.deletion_date.format(DATE_FORMAT)
        )
    }
}

/// Percent-encode an absolute path for `Path=`.
///
/// Home trash entries are written bare; volume trash entries get a
/// `file://` prefix.
pub fn encode_path(path: &Path, kind: TrashKind) -> String {
    let encoded = percent_encode(&path_bytes(path), PATH_ENCODE_SET).to_string();
    match kind {
        TrashKind::Home => encoded,
        TrashKind::Volume => format!("{FILE_SCHEME}{encoded}"),
    }
}

#[cfg(unix)]
fn path_bytes(path: &Path) -> Vec<u8> {
    use std::os::unix::ffi::OsStrExt;
    path.as_os_str().as_bytes().to_vec()
}

#[cfg(not(unix))]
fn path_bytes(path: &Path) -> Vec<u8> {
    path.to_string_lossy().into_owned().into_bytes()
}

#[cfg(unix)]
fn path_from_bytes(bytes: Vec<u8>) -> PathBuf {
    use std::os::unix::ffi::OsStringExt;
    PathBuf::from(OsString::from_vec(bytes))
}

#[cfg(not(unix))]
fn path_from_bytes(bytes: Vec<u8>) -> PathBuf {
    PathBuf::from(OsString::from(String::from_utf8_lossy(&bytes).into_owned()))
}
