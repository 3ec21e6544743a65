//! Merge run diff report

use serde::{Deserialize, Serialize};

use crate::identity::CanonicalKey;
use crate::record::SkillMetadata;

/// What a merge run did with one record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiffKind {
    Created,
    Updated,
    Unchanged,
    Skipped,
}

/// Per-record outcome of a merge run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffEntry {
    pub kind: DiffKind,
    /// Canonical key, absent when the record could not be identified
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<CanonicalKey>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_path: Option<String>,
    /// Where the record came from, for skipped records without a key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old: Option<SkillMetadata>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new: Option<SkillMetadata>,
}

/// Counts per diff kind
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffCounts {
    pub created: usize,
    pub updated: usize,
    pub unchanged: usize,
    pub skipped: usize,
}

impl DiffCounts {
    pub fn total(&self) -> usize {
        self.created + self.updated + self.unchanged + self.skipped
    }
}

/// Diff produced by a merge run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeReport {
    pub counts: DiffCounts,
    pub entries: Vec<DiffEntry>,
}

impl MergeReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entry and bump its count.
    pub fn push(&mut self, entry: DiffEntry) {
        match entry.kind {
            DiffKind::Created => self.counts.created += 1,
            DiffKind::Updated => self.counts.updated += 1,
            DiffKind::Unchanged => self.counts.unchanged += 1,
            DiffKind::Skipped => self.counts.skipped += 1,
        }
        self.entries.push(entry);
    }

    /// Record a record that was dropped before or during apply.
    pub fn record_skipped(
        &mut self,
        key: Option<CanonicalKey>,
        origin: impl Into<String>,
        reason: impl Into<String>,
    ) {
        self.push(DiffEntry {
            kind: DiffKind::Skipped,
            key,
            assigned_path: None,
            origin: Some(origin.into()),
            reason: Some(reason.into()),
            old: None,
            new: None,
        });
    }

    /// Entries that changed the registry, for downstream publication.
    pub fn changed(&self) -> impl Iterator<Item = &DiffEntry> {
        self.entries
            .iter()
            .filter(|e| matches!(e.kind, DiffKind::Created | DiffKind::Updated))
    }

    /// Whether the run changed anything.
    pub fn has_changes(&self) -> bool {
        self.counts.created + self.counts.updated > 0
    }

    pub fn skipped(&self) -> impl Iterator<Item = &DiffEntry> {
        self.entries.iter().filter(|e| e.kind == DiffKind::Skipped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(kind: DiffKind) -> DiffEntry {
        DiffEntry {
            kind,
            key: Some(CanonicalKey::from_origin("a/x", "s")),
            assigned_path: Some("s".into()),
            origin: None,
            reason: None,
            old: None,
            new: None,
        }
    }

    #[test]
    fn counts_follow_pushes() {
        let mut report = MergeReport::new();
        report.push(entry(DiffKind::Created));
        report.push(entry(DiffKind::Unchanged));
        report.push(entry(DiffKind::Updated));
        report.record_skipped(None, "input.json#3", "empty origin_repo");

        assert_eq!(
            report.counts,
            DiffCounts {
                created: 1,
                updated: 1,
                unchanged: 1,
                skipped: 1
            }
        );
        assert_eq!(report.counts.total(), 4);
        assert_eq!(report.changed().count(), 2);
        assert!(report.has_changes());
        assert_eq!(report.skipped().next().unwrap().origin.as_deref(), Some("input.json#3"));
    }

    #[test]
    fn serializes_kinds_in_snake_case_and_omits_empty_fields() {
        let json = serde_json::to_value(entry(DiffKind::Unchanged)).unwrap();
        assert_eq!(json["kind"], "unchanged");
        assert!(json.get("reason").is_none());
        assert!(json.get("old").is_none());
    }
}
