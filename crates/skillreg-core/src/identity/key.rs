//! Canonical identity keys derived from origin coordinates

use std::fmt;

use serde::{Deserialize, Serialize};
use skillreg_fs::{NormalizedPath, checksum};

use crate::record::RawRecord;

/// Length of the short hash used in fallback slugs and hash suffixes.
pub const SHORT_HASH_LEN: usize = 8;

const HOST_PREFIXES: &[&str] = &["github.com/", "www.github.com/"];
const SCHEME_PREFIXES: &[&str] = &["https://", "http://", "ssh://", "git://", "git@"];
const SKILL_FILE: &str = "skill.md";

/// Stable identity of one logical entity, rendered as `<repo>:<path>`.
///
/// Both halves are normalized to lowercase and forward slashes, so records
/// that differ only in case or separators collapse onto the same key. The
/// display name plays no part in it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CanonicalKey(String);

impl CanonicalKey {
    /// Build a key from raw origin coordinates.
    pub fn from_origin(origin_repo: &str, origin_path: &str) -> Self {
        let repo = normalize_repo(origin_repo);
        let path = normalize_origin_path(origin_path);
        Self(format!("{}:{}", repo, path))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Normalized repository half of the key.
    pub fn repo(&self) -> &str {
        self.0.split_once(':').map(|(repo, _)| repo).unwrap_or(&self.0)
    }

    /// Normalized path half of the key.
    pub fn path(&self) -> &str {
        self.0.split_once(':').map(|(_, path)| path).unwrap_or("")
    }

    /// `(owner, repo)` of the origin, when the repository has both parts.
    ///
    /// These are the last two segments, so a host kept in non-GitHub
    /// origins (`gitlab.com/group/proj`) is not mistaken for the owner.
    pub fn owner_repo(&self) -> Option<(&str, &str)> {
        let mut segments = self.repo().rsplit('/').filter(|s| !s.is_empty());
        let repo = segments.next()?;
        let owner = segments.next()?;
        Some((owner, repo))
    }

    /// Short, fixed-length hex digest of the key.
    pub fn short_hash(&self) -> String {
        let mut digest = checksum::hex_digest(self.0.as_bytes());
        digest.truncate(SHORT_HASH_LEN);
        digest
    }
}

impl fmt::Display for CanonicalKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for CanonicalKey {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Derive the canonical key of a raw record.
pub fn derive(raw: &RawRecord) -> CanonicalKey {
    CanonicalKey::from_origin(&raw.origin_repo, &raw.origin_path)
}

/// Normalize a repository reference to `owner/repo` form.
///
/// Accepts URLs (`https://github.com/Owner/Repo.git`), scp-style remotes
/// (`git@github.com:Owner/Repo`) and bare `Owner/Repo`.
pub fn normalize_repo(origin_repo: &str) -> String {
    let mut repo = origin_repo.trim().to_lowercase();

    for prefix in SCHEME_PREFIXES {
        if let Some(rest) = repo.strip_prefix(prefix) {
            repo = rest.to_string();
            break;
        }
    }
    repo = repo.replace(':', "/");
    for prefix in HOST_PREFIXES {
        if let Some(rest) = repo.strip_prefix(prefix) {
            repo = rest.to_string();
            break;
        }
    }

    let cleaned = NormalizedPath::new(&repo).clean();
    let cleaned = cleaned.as_str();
    cleaned.strip_suffix(".git").unwrap_or(cleaned).to_string()
}

/// Normalize an origin path: lowercase, forward slashes, no empty or `.`
/// segments, and no trailing `SKILL.md` file component.
pub fn normalize_origin_path(origin_path: &str) -> String {
    let lowered = origin_path.trim().to_lowercase();
    let path = NormalizedPath::new(&lowered);
    let mut segments: Vec<&str> = path.segments().collect();
    if segments.len() > 1 && segments.last() == Some(&SKILL_FILE) {
        segments.pop();
    }
    segments.join("/")
}
