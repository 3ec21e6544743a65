//! Registry entries

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::identity::CanonicalKey;
use crate::record::SkillMetadata;
use crate::resolver::SuffixKind;

/// One canonical entity in the registry.
///
/// `assigned_path` is fixed at creation. Later sightings of the same key only
/// touch `metadata`, `updated_at` and `last_seen`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryEntry {
    pub canonical_key: CanonicalKey,
    pub assigned_path: String,
    pub slug_base: String,
    pub suffix_kind: SuffixKind,
    pub metadata: SkillMetadata,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_seen: Option<DateTime<Utc>>,
}

impl RegistryEntry {
    /// Lowercased form of the assigned path, as held in the path index.
    pub fn path_key(&self) -> String {
        self.assigned_path.to_lowercase()
    }
}
