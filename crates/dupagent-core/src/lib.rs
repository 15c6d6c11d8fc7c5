//! Core types for dupagent.
//!
//! This crate provides the data structures shared by the scanner, the
//! duplicate analysis and the trash operations: scan options, file records,
//! fingerprint keys, duplicate groups and error types.

mod category;
mod config;
mod error;
mod group;
mod node;

pub use category::{ExtensionFilter, FileCategory, lowercase_extension, parse_extension_list};
pub use config::{ScanOptions, ScanOptionsBuilder, ScanOptionsBuilderError};
pub use error::{ScanError, ScanWarning, TrashError, WarningKind};
pub use group::{DuplicateGroup, format_size};
pub use node::{ContentHash, FileRecord, FingerprintKey};
