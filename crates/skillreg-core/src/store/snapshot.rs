//! Registry snapshot persistence
//!
//! The snapshot is the single structured document consumed by downstream
//! index builders. It is written atomically with the previous version kept
//! as `<file>.bak`, and read under a shared lock.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use skillreg_fs::{NormalizedPath, io};
use tracing::{debug, info};

use super::{RegistryEntry, RegistryStore};
use crate::{Error, Result};

/// Snapshot format version
pub const SNAPSHOT_VERSION: &str = "2.0.0";

const BACKUP_SUFFIX: &str = ".bak";

/// Serialized form of the whole registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrySnapshot {
    pub version: String,
    /// Latest `updated_at` of any entry, `None` for an empty registry
    pub updated_at: Option<DateTime<Utc>>,
    pub total_count: usize,
    pub skills: Vec<RegistryEntry>,
}

impl RegistrySnapshot {
    /// Serialize to pretty JSON.
    ///
    /// The output depends only on registry content, so the same registry
    /// always produces the same bytes.
    pub fn to_json_bytes(&self) -> Result<Vec<u8>> {
        let mut bytes = serde_json::to_vec_pretty(self)?;
        bytes.push(b'\n');
        Ok(bytes)
    }

    pub fn from_json_bytes(bytes: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

impl RegistryStore {
    /// Build the snapshot document, entries sorted by assigned path.
    pub fn to_snapshot(&self) -> RegistrySnapshot {
        let mut skills: Vec<RegistryEntry> = self.all().cloned().collect();
        skills.sort_by(|a, b| {
            a.path_key()
                .cmp(&b.path_key())
                .then_with(|| a.canonical_key.cmp(&b.canonical_key))
        });

        RegistrySnapshot {
            version: SNAPSHOT_VERSION.to_string(),
            updated_at: skills.iter().map(|e| e.updated_at).max(),
            total_count: skills.len(),
            skills,
        }
    }

    /// Rebuild a store from a snapshot, re-deriving the path index.
    ///
    /// # Errors
    ///
    /// [`Error::IndexInconsistency`] if two entries share a key or a path.
    pub fn from_snapshot(snapshot: RegistrySnapshot) -> Result<Self> {
        let mut store = RegistryStore::new();
        for entry in snapshot.skills {
            if let Some(existing) = store.lookup_by_key(&entry.canonical_key) {
                return Err(Error::IndexInconsistency {
                    path: entry.assigned_path.clone(),
                    existing: existing.canonical_key.to_string(),
                    incoming: entry.canonical_key.to_string(),
                });
            }
            store.upsert(entry)?;
        }
        Ok(store)
    }

    /// Load a store from a snapshot file.
    pub fn load(path: &NormalizedPath) -> Result<Self> {
        let bytes = io::read_locked(path)?;
        let snapshot = RegistrySnapshot::from_json_bytes(&bytes)?;
        let store = Self::from_snapshot(snapshot)?;
        debug!(path = %path, entries = store.len(), "registry loaded");
        Ok(store)
    }

    /// Load a store, or start empty when the file does not exist yet.
    pub fn load_or_empty(path: &NormalizedPath) -> Result<Self> {
        match Self::load(path) {
            Ok(store) => Ok(store),
            Err(Error::StoreIo(e)) if e.is_not_found() => {
                info!(path = %path, "no registry yet, starting empty");
                Ok(Self::new())
            }
            Err(e) => Err(e),
        }
    }

    /// Persist the store atomically, keeping the previous file as `.bak`.
    ///
    /// Refuses to write a store whose indices disagree.
    pub fn save(&self, path: &NormalizedPath) -> Result<()> {
        self.verify()?;
        let bytes = self.to_snapshot().to_json_bytes()?;
        io::backup_existing(path, BACKUP_SUFFIX)?;
        io::write_atomic(path, &bytes)?;
        info!(path = %path, entries = self.len(), "registry saved");
        Ok(())
    }
}
