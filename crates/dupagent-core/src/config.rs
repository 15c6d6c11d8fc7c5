//! Scan configuration types.

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

use crate::category::{ExtensionFilter, FileCategory, parse_extension_list};

/// Matching and exclusion rules for a duplicate scan.
///
/// Size matching is structural (files are always bucketed by size first), so
/// `match_size` is informational only.
#[derive(Debug, Clone, PartialEq, Eq, Builder, Serialize, Deserialize)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
#[serde(default)]
pub struct ScanOptions {
    /// Compare file contents by digest.
    #[builder(default = "true")]
    pub match_content: bool,

    /// Compare file sizes.
    #[builder(default = "true")]
    pub match_size: bool,

    /// Additionally require identical base names.
    #[builder(default = "false")]
    pub match_name: bool,

    /// Additionally require identical (lowercased) extensions.
    #[builder(default = "false")]
    pub match_extension: bool,

    /// Skip files of zero bytes.
    #[builder(default = "true")]
    pub skip_zero_byte: bool,

    /// Skip files whose name starts with `.`.
    #[builder(default = "true")]
    pub skip_hidden: bool,

    /// Restrict the scan to a file category.
    #[builder(default)]
    pub category: FileCategory,

    /// Extensions used when `category` is [`FileCategory::Custom`].
    #[builder(default)]
    pub custom_extensions: Vec<String>,
}

impl ScanOptionsBuilder {
    fn validate(&self) -> Result<(), String> {
        if let Some(ref custom) = self.custom_extensions {
            if let Some(bad) = custom.iter().find(|ext| ext.contains(['/', '\\'])) {
                return Err(format!("Invalid extension '{bad}'"));
            }
        }
        Ok(())
    }

    /// Set custom extensions from a comma separated list.
    pub fn custom_extension_list(&mut self, raw: &str) -> &mut Self {
        self.custom_extensions = Some(parse_extension_list(raw));
        self
    }
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            match_content: true,
            match_size: true,
            match_name: false,
            match_extension: false,
            skip_zero_byte: true,
            skip_hidden: true,
            category: FileCategory::All,
            custom_extensions: Vec::new(),
        }
    }
}

impl ScanOptions {
    /// Create a new options builder.
    pub fn builder() -> ScanOptionsBuilder {
        ScanOptionsBuilder::default()
    }

    /// Build the extension allow-list for these options.
    pub fn extension_filter(&self) -> ExtensionFilter {
        ExtensionFilter::new(self.category, &self.custom_extensions)
    }

    /// Check if a file name should be skipped as hidden.
    pub fn should_skip_hidden(&self, name: &str) -> bool {
        self.skip_hidden && name.starts_with('.')
    }

    /// Check if a file size should be skipped.
    pub fn should_skip_size(&self, size: u64) -> bool {
        self.skip_zero_byte && size == 0
    }
}
