//! Raw discovered records and the metadata the registry keeps for them

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use skillreg_fs::NormalizedPath;

use crate::{Error, Result};

/// Category used when a record carries none.
pub const DEFAULT_CATEGORY: &str = "other";

fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// A record as produced by the external discovery step.
///
/// Field aliases accept the crawler's source files (`repo`, `path`, `name`)
/// as well as the canonical names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRecord {
    #[serde(default, alias = "repo", deserialize_with = "null_as_default")]
    pub origin_repo: String,

    #[serde(
        default,
        alias = "path",
        alias = "github_path",
        deserialize_with = "null_as_default"
    )]
    pub origin_path: String,

    #[serde(default, alias = "name", deserialize_with = "null_as_default")]
    pub display_name: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub category: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub tags: Vec<String>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub stars: u64,

    #[serde(default)]
    pub license: Option<String>,

    #[serde(default)]
    pub last_seen: Option<DateTime<Utc>>,
}

impl RawRecord {
    /// Reject records whose origin coordinates cannot identify anything.
    pub fn validate(&self) -> Result<()> {
        if self.origin_repo.trim().is_empty() {
            return Err(Error::malformed("empty origin_repo"));
        }
        if NormalizedPath::new(self.origin_path.trim()).segments().next().is_none() {
            return Err(Error::malformed(format!(
                "empty origin_path for {}",
                self.origin_repo.trim()
            )));
        }
        Ok(())
    }

    /// Name to derive the slug from.
    ///
    /// Falls back to the last path segment (without a `.md` extension),
    /// then to the repository name, when the source omits a display name.
    pub fn effective_name(&self) -> String {
        let name = self.display_name.trim();
        if !name.is_empty() {
            return name.to_string();
        }

        let path = NormalizedPath::new(self.origin_path.trim());
        if let Some(base) = path.segments().last() {
            let base = strip_suffix_ignore_case(base, ".md").unwrap_or(base);
            if !base.is_empty() {
                return base.to_string();
            }
        }

        NormalizedPath::new(self.origin_repo.trim())
            .segments()
            .last()
            .unwrap_or_default()
            .to_string()
    }

    /// Metadata snapshot carried into the registry entry.
    pub fn metadata(&self) -> SkillMetadata {
        let category = self.category.trim();
        SkillMetadata {
            display_name: self.effective_name(),
            description: self.description.trim().to_string(),
            category: if category.is_empty() {
                DEFAULT_CATEGORY.to_string()
            } else {
                category.to_string()
            },
            tags: self.tags.clone(),
            stars: self.stars,
            license: self.license.clone().filter(|l| !l.trim().is_empty()),
            origin_repo: self.origin_repo.trim().to_string(),
            origin_path: self.origin_path.trim().to_string(),
        }
    }
}

fn strip_suffix_ignore_case<'a>(value: &'a str, suffix: &str) -> Option<&'a str> {
    let split = value.len().checked_sub(suffix.len())?;
    let tail = value.get(split..)?;
    tail.eq_ignore_ascii_case(suffix).then(|| &value[..split])
}

/// Metadata fields of a registry entry.
///
/// Updated in place on every later sighting of the same identity; never
/// used to decide the assigned path after creation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillMetadata {
    pub display_name: String,
    #[serde(default)]
    pub description: String,
    pub category: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub stars: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license: Option<String>,
    pub origin_repo: String,
    pub origin_path: String,
}
