//! Display name to filesystem-safe slug normalization

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::key::CanonicalKey;
use crate::config::NamingSection;
use crate::layout::CATEGORIES_DIR;
use crate::record::DEFAULT_CATEGORY;

static NON_ALPHANUMERIC_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9]+").unwrap());

/// Device names that cannot be used as directory names on Windows.
const RESERVED_NAMES: &[&str] = &[
    "con", "prn", "aux", "nul", "com1", "com2", "com3", "com4", "com5", "com6", "com7", "com8",
    "com9", "lpt1", "lpt2", "lpt3", "lpt4", "lpt5", "lpt6", "lpt7", "lpt8", "lpt9",
];

/// Whether a lowercase token may not be used as a directory name: a Windows
/// device name, or the layout's category index directory.
pub fn is_reserved(token: &str) -> bool {
    token == CATEGORIES_DIR || RESERVED_NAMES.contains(&token)
}

/// Lowercase, separator-normalized candidate name. Not unique on its own.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Slug(String);

impl Slug {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for Slug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Maps display names and categories to filesystem-safe tokens.
#[derive(Debug, Clone)]
pub struct NameNormalizer {
    max_slug_len: usize,
    max_category_len: usize,
}

impl Default for NameNormalizer {
    fn default() -> Self {
        Self::new(&NamingSection::default())
    }
}

impl NameNormalizer {
    pub fn new(naming: &NamingSection) -> Self {
        Self {
            max_slug_len: naming.max_slug_len.max(1),
            max_category_len: naming.max_category_len.max(1),
        }
    }

    /// Normalize a display name into a slug.
    ///
    /// Never returns an empty slug: a name with no usable characters falls
    /// back to `skill-<short hash of key>`.
    pub fn normalize(&self, display_name: &str, key: &CanonicalKey) -> Slug {
        let token = sanitize(display_name, self.max_slug_len);
        if token.is_empty() {
            return Slug(format!("skill-{}", key.short_hash()));
        }
        if is_reserved(&token) {
            return Slug(format!("{}-skill", token));
        }
        Slug(token)
    }

    /// Normalize a category into a directory segment, `other` when empty.
    pub fn normalize_category(&self, category: &str) -> String {
        let token = sanitize(category, self.max_category_len);
        if token.is_empty() || is_reserved(&token) {
            DEFAULT_CATEGORY.to_string()
        } else {
            token
        }
    }

    /// Normalize one part (owner or repo) of a repository suffix.
    pub fn normalize_segment(&self, value: &str, max_len: usize) -> String {
        sanitize(value, max_len.max(1))
    }
}

/// Lowercase, collapse non-alphanumeric runs to `-`, trim `-`, truncate.
fn sanitize(value: &str, max_len: usize) -> String {
    let lowered = value.to_lowercase();
    let replaced = NON_ALPHANUMERIC_RUN.replace_all(&lowered, "-");
    let trimmed = replaced.trim_matches('-');
    // Only ASCII survives the replacement, so byte truncation is safe
    let truncated = &trimmed[..trimmed.len().min(max_len)];
    truncated.trim_end_matches('-').to_string()
}
