//! Registry store
//!
//! Owns every [`RegistryEntry`] and keeps two indices in lockstep:
//!
//! - canonical key -> entry
//! - lowercased assigned path -> canonical key
//!
//! Every mutation validates against both indices before touching either, so
//! a failed call leaves the store exactly as it was.

mod entry;
mod snapshot;

pub use entry::RegistryEntry;
pub use snapshot::{RegistrySnapshot, SNAPSHOT_VERSION};

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::identity::{CanonicalKey, slug};
use crate::resolver::{PathClaims, SuffixKind};
use crate::{Error, Result};

/// What an upsert did to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    /// New key, new path claimed
    Inserted,
    /// Existing key, metadata changed
    Updated,
    /// Existing key, metadata identical (only `last_seen` may have moved)
    Unchanged,
}

/// The canonical registry with its case-insensitive path index.
#[derive(Debug, Clone, Default)]
pub struct RegistryStore {
    entries: BTreeMap<CanonicalKey, RegistryEntry>,
    paths: HashMap<String, CanonicalKey>,
}

impl RegistryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Look up an entry by its canonical key.
    pub fn lookup_by_key(&self, key: &CanonicalKey) -> Option<&RegistryEntry> {
        self.entries.get(key)
    }

    /// Look up the entry holding `path`, compared case-insensitively.
    pub fn lookup_path_owner(&self, path: &str) -> Option<&RegistryEntry> {
        self.paths
            .get(&path.to_lowercase())
            .and_then(|key| self.entries.get(key))
    }

    /// All entries, ordered by canonical key.
    pub fn all(&self) -> impl Iterator<Item = &RegistryEntry> {
        self.entries.values()
    }

    /// Insert a new entry or update the metadata of an existing one.
    ///
    /// # Errors
    ///
    /// - [`Error::PathImmutableViolation`] if the key exists with a different
    ///   assigned path
    /// - [`Error::IndexInconsistency`] if the key is new but its path is
    ///   already held by another key
    pub fn upsert(&mut self, entry: RegistryEntry) -> Result<UpsertOutcome> {
        if let Some(existing) = self.entries.get_mut(&entry.canonical_key) {
            if existing.assigned_path != entry.assigned_path {
                return Err(Error::PathImmutableViolation {
                    key: entry.canonical_key.to_string(),
                    current: existing.assigned_path.clone(),
                    attempted: entry.assigned_path,
                });
            }

            if existing.metadata == entry.metadata {
                if entry.last_seen.is_some() {
                    existing.last_seen = entry.last_seen;
                }
                return Ok(UpsertOutcome::Unchanged);
            }

            existing.metadata = entry.metadata;
            existing.updated_at = entry.updated_at;
            if entry.last_seen.is_some() {
                existing.last_seen = entry.last_seen;
            }
            return Ok(UpsertOutcome::Updated);
        }

        let path_key = entry.path_key();
        if let Some(owner) = self.paths.get(&path_key) {
            return Err(Error::IndexInconsistency {
                path: entry.assigned_path,
                existing: owner.to_string(),
                incoming: entry.canonical_key.to_string(),
            });
        }

        self.paths.insert(path_key, entry.canonical_key.clone());
        self.entries.insert(entry.canonical_key.clone(), entry);
        Ok(UpsertOutcome::Inserted)
    }

    /// Explicitly move an entry to a new assigned path.
    ///
    /// This is the only operation that changes an existing assigned path.
    /// The new path must be a single segment and must not be held by another
    /// key; changing only the case of the entry's own path is allowed.
    /// Returns the previous path.
    pub fn migrate_path(
        &mut self,
        key: &CanonicalKey,
        new_path: &str,
        at: DateTime<Utc>,
    ) -> Result<String> {
        validate_segment(new_path)?;

        let current = self
            .entries
            .get(key)
            .ok_or_else(|| Error::UnknownKey {
                key: key.to_string(),
            })?
            .assigned_path
            .clone();

        let new_key = new_path.to_lowercase();
        if let Some(owner) = self.paths.get(&new_key)
            && owner != key
        {
            return Err(Error::IndexInconsistency {
                path: new_path.to_string(),
                existing: owner.to_string(),
                incoming: key.to_string(),
            });
        }

        self.paths.remove(&current.to_lowercase());
        self.paths.insert(new_key, key.clone());
        if let Some(entry) = self.entries.get_mut(key) {
            entry.assigned_path = new_path.to_string();
            entry.suffix_kind = SuffixKind::Migrated;
            entry.updated_at = at;
        }

        info!(%key, from = %current, to = %new_path, "assigned path migrated");
        Ok(current)
    }

    /// Check that the path index matches the entries exactly.
    ///
    /// # Errors
    ///
    /// [`Error::IndexInconsistency`] naming the first conflicting path.
    pub fn verify(&self) -> Result<()> {
        let mut rebuilt: HashMap<String, &CanonicalKey> = HashMap::with_capacity(self.entries.len());
        for entry in self.entries.values() {
            if let Some(existing) = rebuilt.insert(entry.path_key(), &entry.canonical_key) {
                return Err(Error::IndexInconsistency {
                    path: entry.assigned_path.clone(),
                    existing: existing.to_string(),
                    incoming: entry.canonical_key.to_string(),
                });
            }
        }

        for (path, owner) in &self.paths {
            match rebuilt.get(path) {
                Some(expected) if *expected == owner => {}
                Some(expected) => {
                    return Err(Error::IndexInconsistency {
                        path: path.clone(),
                        existing: expected.to_string(),
                        incoming: owner.to_string(),
                    });
                }
                None => {
                    return Err(Error::IndexInconsistency {
                        path: path.clone(),
                        existing: "<no entry>".to_string(),
                        incoming: owner.to_string(),
                    });
                }
            }
        }

        if rebuilt.len() != self.paths.len() {
            let missing = rebuilt
                .iter()
                .find(|(path, _)| !self.paths.contains_key(*path))
                .map(|(path, key)| (path.clone(), key.to_string()))
                .unwrap_or_default();
            return Err(Error::IndexInconsistency {
                path: missing.0,
                existing: "<unindexed>".to_string(),
                incoming: missing.1,
            });
        }

        debug!(entries = self.entries.len(), "registry indices consistent");
        Ok(())
    }
}

impl PathClaims for RegistryStore {
    fn is_claimed(&self, candidate: &str) -> bool {
        self.paths.contains_key(&candidate.to_lowercase())
    }
}

/// Reject paths that are not one filesystem-safe segment.
fn validate_segment(path: &str) -> Result<()> {
    let reason = if path.trim().is_empty() {
        Some("path is empty")
    } else if path != path.trim() {
        Some("path has surrounding whitespace")
    } else if path.contains(['/', '\\']) {
        Some("path must be a single segment")
    } else if path.starts_with('.') {
        Some("path must not start with '.'")
    } else if path.chars().any(|c| c.is_control() || ":*?\"<>|".contains(c)) {
        Some("path contains characters that are not filesystem-safe")
    } else if slug::is_reserved(&path.to_lowercase()) {
        Some("path is reserved")
    } else {
        None
    };

    match reason {
        Some(reason) => Err(Error::InvalidPath {
            path: path.to_string(),
            reason: reason.to_string(),
        }),
        None => Ok(()),
    }
}
