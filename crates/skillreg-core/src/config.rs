//! Registry configuration
//!
//! Parsed from `skillreg.toml` (or any format `ConfigStore` understands).
//! Every field has a default, so an empty file is a valid configuration.

use serde::{Deserialize, Serialize};
use skillreg_fs::{ConfigStore, NormalizedPath};

use crate::Result;

fn default_max_slug_len() -> usize {
    64
}

fn default_max_category_len() -> usize {
    32
}

fn default_repo_segment_len() -> usize {
    20
}

fn default_true() -> bool {
    true
}

fn default_metadata_file() -> String {
    "metadata.json".to_string()
}

/// Slug and suffix bounds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamingSection {
    /// Maximum length of a slug before any conflict suffix
    #[serde(default = "default_max_slug_len")]
    pub max_slug_len: usize,

    /// Maximum length of a normalized category segment
    #[serde(default = "default_max_category_len")]
    pub max_category_len: usize,

    /// Maximum length of each of the owner and repo parts of a repo suffix
    #[serde(default = "default_repo_segment_len")]
    pub repo_segment_len: usize,
}

impl Default for NamingSection {
    fn default() -> Self {
        Self {
            max_slug_len: default_max_slug_len(),
            max_category_len: default_max_category_len(),
            repo_segment_len: default_repo_segment_len(),
        }
    }
}

/// Order in which a merge run applies records
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergeOrder {
    /// Sort by canonical key so output does not depend on crawl order
    #[default]
    Origin,
    /// Apply records exactly as supplied
    Input,
}

/// Merge run settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeSection {
    #[serde(default)]
    pub order: MergeOrder,

    /// Prepare records on the rayon thread pool
    #[serde(default = "default_true")]
    pub parallel: bool,
}

impl Default for MergeSection {
    fn default() -> Self {
        Self {
            order: MergeOrder::default(),
            parallel: true,
        }
    }
}

/// Directory layout settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutSection {
    /// Nest entry directories under their category segment
    #[serde(default = "default_true")]
    pub nest_by_category: bool,

    /// Name of the per-entry metadata file
    #[serde(default = "default_metadata_file")]
    pub metadata_file: String,
}

impl Default for LayoutSection {
    fn default() -> Self {
        Self {
            nest_by_category: true,
            metadata_file: default_metadata_file(),
        }
    }
}

/// Complete registry configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryConfig {
    #[serde(default)]
    pub naming: NamingSection,

    #[serde(default)]
    pub merge: MergeSection,

    #[serde(default)]
    pub layout: LayoutSection,
}

impl RegistryConfig {
    /// Parse a configuration from TOML content
    ///
    /// ```
    /// use skillreg_core::config::{MergeOrder, RegistryConfig};
    ///
    /// let config = RegistryConfig::parse(r#"
    /// [merge]
    /// order = "input"
    /// "#).unwrap();
    ///
    /// assert_eq!(config.merge.order, MergeOrder::Input);
    /// assert_eq!(config.naming.max_slug_len, 64);
    /// ```
    pub fn parse(content: &str) -> Result<Self> {
        let config: RegistryConfig = toml::from_str(content)?;
        Ok(config)
    }

    /// Load a configuration file, detecting the format from its extension.
    pub fn load(path: &NormalizedPath) -> Result<Self> {
        Ok(ConfigStore::new().load(path)?)
    }

    /// Load a configuration file if given, defaults otherwise.
    pub fn load_or_default(path: Option<&NormalizedPath>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }
}
