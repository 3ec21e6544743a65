//! Conflict resolution for assigned paths
//!
//! Assigns every new entity a path segment that no other entity holds under a
//! case-insensitive comparison. Resolution only ever produces new, longer
//! names; a path that is already assigned is never freed or changed here.
//!
//! Candidates are tried in this order:
//!
//! 1. the slug itself
//! 2. `slug-<owner>-<repo>` when the origin repository is known
//! 3. `slug-<short hash of the canonical key>`
//! 4. `slug-2`, `slug-3`, ... until one is free

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::NamingSection;
use crate::identity::{CanonicalKey, NameNormalizer, Slug};

/// How an assigned path was derived from its slug.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuffixKind {
    /// The bare slug
    Base,
    /// `slug-<owner>-<repo>`
    Repo,
    /// `slug-<short hash>`
    Hash,
    /// `slug-<n>`, n >= 2
    Counter,
    /// Set by an explicit path migration
    Migrated,
}

/// Read access to the set of already-assigned paths.
pub trait PathClaims {
    /// Whether `candidate` is already assigned, compared case-insensitively.
    fn is_claimed(&self, candidate: &str) -> bool;
}

/// In-memory claim index keyed by lowercased path.
#[derive(Debug, Clone, Default)]
pub struct ClaimSet {
    claimed: HashSet<String>,
}

impl ClaimSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a claim. Returns `false` if the path was already claimed.
    pub fn claim(&mut self, path: &str) -> bool {
        self.claimed.insert(path.to_lowercase())
    }

    pub fn len(&self) -> usize {
        self.claimed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.claimed.is_empty()
    }
}

impl PathClaims for ClaimSet {
    fn is_claimed(&self, candidate: &str) -> bool {
        self.claimed.contains(&candidate.to_lowercase())
    }
}

/// Result of resolving a slug against the claim index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    pub assigned_path: String,
    pub suffix_kind: SuffixKind,
}

/// Deterministic suffix policy for new entities.
#[derive(Debug, Clone)]
pub struct ConflictResolver {
    normalizer: NameNormalizer,
    repo_segment_len: usize,
}

impl Default for ConflictResolver {
    fn default() -> Self {
        Self::new(&NamingSection::default())
    }
}

impl ConflictResolver {
    pub fn new(naming: &NamingSection) -> Self {
        Self {
            normalizer: NameNormalizer::new(naming),
            repo_segment_len: naming.repo_segment_len,
        }
    }

    /// The `owner-repo` suffix hint for a key, if its origin has both parts.
    pub fn repo_hint(&self, key: &CanonicalKey) -> Option<String> {
        let (owner, repo) = key.owner_repo()?;
        let owner = self.normalizer.normalize_segment(owner, self.repo_segment_len);
        let repo = self.normalizer.normalize_segment(repo, self.repo_segment_len);
        if owner.is_empty() || repo.is_empty() {
            return None;
        }
        Some(format!("{}-{}", owner, repo))
    }

    /// Pick the first free candidate for a new entity.
    ///
    /// The caller must claim the returned path before resolving the next
    /// record; checking and claiming form one critical section.
    pub fn assign(
        &self,
        slug: &Slug,
        key: &CanonicalKey,
        repo_hint: Option<&str>,
        claims: &impl PathClaims,
    ) -> Assignment {
        let base = slug.as_str();
        if !claims.is_claimed(base) {
            return Assignment {
                assigned_path: base.to_string(),
                suffix_kind: SuffixKind::Base,
            };
        }

        if let Some(hint) = repo_hint {
            let candidate = format!("{}-{}", base, hint);
            if !claims.is_claimed(&candidate) {
                debug!(%key, %candidate, "slug taken, using repo suffix");
                return Assignment {
                    assigned_path: candidate,
                    suffix_kind: SuffixKind::Repo,
                };
            }
        }

        let candidate = format!("{}-{}", base, key.short_hash());
        if !claims.is_claimed(&candidate) {
            debug!(%key, %candidate, "slug taken, using hash suffix");
            return Assignment {
                assigned_path: candidate,
                suffix_kind: SuffixKind::Hash,
            };
        }

        let mut counter: u64 = 2;
        loop {
            let candidate = format!("{}-{}", base, counter);
            if !claims.is_claimed(&candidate) {
                debug!(%key, %candidate, "slug taken, using counter suffix");
                return Assignment {
                    assigned_path: candidate,
                    suffix_kind: SuffixKind::Counter,
                };
            }
            counter += 1;
        }
    }
}
