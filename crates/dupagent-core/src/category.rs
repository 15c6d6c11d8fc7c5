//! File type categories and the extension allow-list.

use std::collections::BTreeSet;
use std::path::Path;

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};

/// A predefined group of file extensions a scan can be restricted to.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum FileCategory {
    /// No filtering.
    #[default]
    All,
    Audio,
    Video,
    Image,
    Text,
    Office,
    Pdf,
    Archive,
    /// User supplied extensions.
    Custom,
}

impl FileCategory {
    /// Extensions (lowercase, dot-prefixed) that belong to this category.
    ///
    /// `All` and `Custom` have no built-in list.
    pub fn extensions(self) -> &'static [&'static str] {
        match self {
            Self::All | Self::Custom => &[],
            Self::Audio => &[".mp3", ".wav", ".flac", ".ogg", ".m4a", ".aac"],
            Self::Video => &[".mp4", ".mkv", ".avi", ".mov", ".wmv", ".flv", ".webm", ".m4v"],
            Self::Image => &[
                ".jpg", ".jpeg", ".png", ".gif", ".bmp", ".tiff", ".webp", ".svg", ".ico", ".raw",
            ],
            Self::Text => &[
                ".txt", ".log", ".md", ".json", ".xml", ".ini", ".conf", ".cfg", ".sh", ".py",
                ".html", ".css", ".js",
            ],
            Self::Office => &[
                ".doc", ".docx", ".odt", ".xls", ".xlsx", ".ods", ".ppt", ".pptx", ".odp", ".rtf",
            ],
            Self::Pdf => &[".pdf"],
            Self::Archive => &[".zip", ".rar", ".7z", ".tar", ".gz", ".bz2", ".xz", ".tgz"],
        }
    }
}

/// Parse a comma separated extension list such as `"exe, .DAT,bin"`.
///
/// Whitespace is dropped, entries are lowercased and prefixed with `.` when
/// the prefix is missing. Empty entries are ignored.
pub fn parse_extension_list(raw: &str) -> Vec<String> {
    raw.to_lowercase()
        .replace(char::is_whitespace, "")
        .split(',')
        .filter(|ext| !ext.is_empty())
        .map(|ext| {
            if ext.starts_with('.') {
                ext.to_string()
            } else {
                format!(".{ext}")
            }
        })
        .collect()
}

/// Case-insensitive extension allow-list.
///
/// An empty filter accepts every file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtensionFilter {
    allowed: BTreeSet<String>,
}

impl ExtensionFilter {
    /// Build the filter for a category and the user's custom extensions.
    ///
    /// Custom extensions only apply to [`FileCategory::Custom`].
    pub fn new(category: FileCategory, custom: &[String]) -> Self {
        let allowed = match category {
            FileCategory::All => BTreeSet::new(),
            FileCategory::Custom => custom
                .iter()
                .flat_map(|ext| parse_extension_list(ext))
                .collect(),
            other => other.extensions().iter().map(|e| e.to_string()).collect(),
        };
        Self { allowed }
    }

    /// Whether any filtering takes place.
    pub fn is_active(&self) -> bool {
        !self.allowed.is_empty()
    }

    /// Check a file name against the allow-list.
    pub fn accepts(&self, name: &str) -> bool {
        if !self.is_active() {
            return true;
        }
        match lowercase_extension(Path::new(name)) {
            Some(ext) => self.allowed.contains(&ext),
            None => false,
        }
    }

    /// The allowed extensions, sorted.
    pub fn extensions(&self) -> impl Iterator<Item = &str> {
        self.allowed.iter().map(String::as_str)
    }
}

/// The last extension of a path, lowercased and dot-prefixed.
///
/// Returns `None` for names without an extension, including dotfiles such as
/// `.bashrc`.
pub fn lowercase_extension(path: &Path) -> Option<String> {
    path.extension()
        .map(|ext| format!(".{}", ext.to_string_lossy().to_lowercase()))
}
