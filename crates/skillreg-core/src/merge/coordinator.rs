//! MergeCoordinator implementation

use chrono::{DateTime, Utc};
use rayon::prelude::*;
use tracing::{debug, info, warn};

use super::report::{DiffEntry, DiffKind, MergeReport};
use crate::config::{MergeOrder, MergeSection, RegistryConfig};
use crate::identity::{self, CanonicalKey, NameNormalizer, Slug};
use crate::record::{RawRecord, SkillMetadata};
use crate::resolver::ConflictResolver;
use crate::source::IngestBatch;
use crate::store::{RegistryEntry, RegistryStore, UpsertOutcome};
use crate::{Error, Result};

/// Options for one merge run
#[derive(Debug, Clone)]
pub struct MergeOptions {
    /// Timestamp written to `created_at`/`updated_at` of touched entries
    pub run_at: DateTime<Utc>,
    pub order: MergeOrder,
    /// Prepare records on the rayon pool
    pub parallel: bool,
}

impl MergeOptions {
    pub fn new(run_at: DateTime<Utc>) -> Self {
        Self::from_config(&MergeSection::default(), run_at)
    }

    pub fn from_config(merge: &MergeSection, run_at: DateTime<Utc>) -> Self {
        Self {
            run_at,
            order: merge.order,
            parallel: merge.parallel,
        }
    }
}

/// Identity work done for one record before the apply phase.
#[derive(Debug)]
struct Candidate {
    key: CanonicalKey,
    slug: Slug,
    repo_hint: Option<String>,
    metadata: SkillMetadata,
    last_seen: Option<DateTime<Utc>>,
}

#[derive(Debug)]
struct Prepared {
    origin: String,
    outcome: std::result::Result<Candidate, Error>,
}

impl Prepared {
    fn key(&self) -> Option<&CanonicalKey> {
        self.outcome.as_ref().ok().map(|c| &c.key)
    }
}

/// Orchestrates a batch of raw records into the registry.
///
/// A run has two phases:
/// - **prepare**: validate and derive key, slug and repo hint for every
///   record. Pure, so it runs in parallel.
/// - **apply**: a single writer walks the prepared records in a stable
///   order and updates a staging copy of the store.
///
/// The staging copy replaces the caller's store only after its indices
/// verify, so a fatal error leaves the caller's store untouched.
#[derive(Debug, Clone, Default)]
pub struct MergeCoordinator {
    normalizer: NameNormalizer,
    resolver: ConflictResolver,
}

impl MergeCoordinator {
    pub fn new(config: &RegistryConfig) -> Self {
        Self {
            normalizer: NameNormalizer::new(&config.naming),
            resolver: ConflictResolver::new(&config.naming),
        }
    }

    /// Merge records into `store`, labelling them by position.
    pub fn run(
        &self,
        store: &mut RegistryStore,
        records: &[RawRecord],
        options: &MergeOptions,
    ) -> Result<MergeReport> {
        let items: Vec<(String, &RawRecord)> = records
            .iter()
            .enumerate()
            .map(|(i, record)| (format!("#{}", i), record))
            .collect();
        self.merge(store, &items, MergeReport::new(), options)
    }

    /// Merge an ingested batch, reporting undecodable records as skipped.
    pub fn run_batch(
        &self,
        store: &mut RegistryStore,
        batch: &IngestBatch,
        options: &MergeOptions,
    ) -> Result<MergeReport> {
        let mut report = MergeReport::new();
        for rejected in &batch.rejected {
            report.record_skipped(None, rejected.origin.clone(), rejected.reason.clone());
        }
        let items: Vec<(String, &RawRecord)> = batch
            .records
            .iter()
            .map(|sourced| (sourced.origin.clone(), &sourced.record))
            .collect();
        self.merge(store, &items, report, options)
    }

    fn merge(
        &self,
        store: &mut RegistryStore,
        items: &[(String, &RawRecord)],
        mut report: MergeReport,
        options: &MergeOptions,
    ) -> Result<MergeReport> {
        let mut prepared: Vec<Prepared> = if options.parallel {
            items
                .par_iter()
                .map(|(origin, record)| self.prepare(origin, record))
                .collect()
        } else {
            items
                .iter()
                .map(|(origin, record)| self.prepare(origin, record))
                .collect()
        };
        debug!(records = prepared.len(), parallel = options.parallel, "records prepared");

        if options.order == MergeOrder::Origin {
            // Stable: duplicates of one key keep their input order
            prepared.sort_by(|a, b| a.key().cmp(&b.key()));
        }

        let mut staging = store.clone();
        for item in prepared {
            let candidate = match item.outcome {
                Ok(candidate) => candidate,
                Err(e) => {
                    warn!(origin = %item.origin, error = %e, "record skipped");
                    report.record_skipped(None, item.origin, e.to_string());
                    continue;
                }
            };
            let key = candidate.key.clone();
            match self.apply(&mut staging, candidate, options.run_at) {
                Ok(entry) => report.push(entry),
                Err(e) if e.is_record_level() => {
                    warn!(origin = %item.origin, %key, error = %e, "record skipped");
                    report.record_skipped(Some(key), item.origin, e.to_string());
                }
                Err(e) => return Err(e),
            }
        }

        staging.verify()?;
        *store = staging;

        info!(
            created = report.counts.created,
            updated = report.counts.updated,
            unchanged = report.counts.unchanged,
            skipped = report.counts.skipped,
            "merge complete"
        );
        Ok(report)
    }

    fn prepare(&self, origin: &str, record: &RawRecord) -> Prepared {
        let outcome = record.validate().map(|()| {
            let key = identity::derive(record);
            let mut metadata = record.metadata();
            metadata.category = self.normalizer.normalize_category(&metadata.category);
            Candidate {
                slug: self.normalizer.normalize(&metadata.display_name, &key),
                repo_hint: self.resolver.repo_hint(&key),
                key,
                metadata,
                last_seen: record.last_seen,
            }
        });
        Prepared {
            origin: origin.to_string(),
            outcome,
        }
    }

    /// Apply one prepared record to the store.
    ///
    /// Resolution and insertion happen back to back on the same store, so
    /// the next record always sees this record's claim.
    fn apply(
        &self,
        store: &mut RegistryStore,
        candidate: Candidate,
        run_at: DateTime<Utc>,
    ) -> Result<DiffEntry> {
        let last_seen = Some(candidate.last_seen.unwrap_or(run_at));

        if let Some(existing) = store.lookup_by_key(&candidate.key) {
            let old = existing.metadata.clone();
            let entry = RegistryEntry {
                canonical_key: candidate.key.clone(),
                assigned_path: existing.assigned_path.clone(),
                slug_base: existing.slug_base.clone(),
                suffix_kind: existing.suffix_kind,
                metadata: candidate.metadata.clone(),
                created_at: existing.created_at,
                updated_at: run_at,
                last_seen,
            };
            let assigned_path = entry.assigned_path.clone();
            let kind = match store.upsert(entry)? {
                UpsertOutcome::Unchanged => DiffKind::Unchanged,
                _ => DiffKind::Updated,
            };
            let (old, new) = match kind {
                DiffKind::Updated => (Some(old), Some(candidate.metadata)),
                _ => (None, None),
            };
            return Ok(DiffEntry {
                kind,
                key: Some(candidate.key),
                assigned_path: Some(assigned_path),
                origin: None,
                reason: None,
                old,
                new,
            });
        }

        let assignment = self.resolver.assign(
            &candidate.slug,
            &candidate.key,
            candidate.repo_hint.as_deref(),
            &*store,
        );
        let entry = RegistryEntry {
            canonical_key: candidate.key.clone(),
            assigned_path: assignment.assigned_path.clone(),
            slug_base: candidate.slug.into_string(),
            suffix_kind: assignment.suffix_kind,
            metadata: candidate.metadata.clone(),
            created_at: run_at,
            updated_at: run_at,
            last_seen,
        };
        store.upsert(entry)?;
        debug!(key = %candidate.key, path = %assignment.assigned_path, "entry created");

        Ok(DiffEntry {
            kind: DiffKind::Created,
            key: Some(candidate.key),
            assigned_path: Some(assignment.assigned_path),
            origin: None,
            reason: None,
            old: None,
            new: Some(candidate.metadata),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::SuffixKind;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn at(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, day, 6, 0, 0).unwrap()
    }

    fn record(repo: &str, path: &str, name: &str) -> RawRecord {
        RawRecord {
            origin_repo: repo.into(),
            origin_path: path.into(),
            display_name: name.into(),
            ..Default::default()
        }
    }

    #[test]
    fn same_name_from_two_repos_gets_repo_suffix() {
        let coordinator = MergeCoordinator::default();
        let mut store = RegistryStore::new();
        let records = vec![
            record("a/x", "skills/pdf", "PDF Tools"),
            record("b/y", "skills/pdf", "PDF Tools"),
        ];

        let report = coordinator
            .run(&mut store, &records, &MergeOptions::new(at(1)))
            .unwrap();

        assert_eq!(report.counts.created, 2);
        let first = store.lookup_path_owner("pdf-tools").unwrap();
        assert_eq!(first.metadata.origin_repo, "a/x");
        let second = store.lookup_path_owner("pdf-tools-b-y").unwrap();
        assert_eq!(second.suffix_kind, SuffixKind::Repo);
    }

    #[test]
    fn repeat_sighting_updates_in_place() {
        let coordinator = MergeCoordinator::default();
        let mut store = RegistryStore::new();
        let mut raw = record("a/x", "skills/pdf", "PDF Tools");
        raw.stars = 10;
        coordinator
            .run(&mut store, &[raw.clone()], &MergeOptions::new(at(1)))
            .unwrap();

        raw.stars = 50;
        raw.display_name = "PDF Toolkit".into();
        let report = coordinator
            .run(&mut store, &[raw], &MergeOptions::new(at(2)))
            .unwrap();

        assert_eq!(report.counts.updated, 1);
        let diff = &report.entries[0];
        assert_eq!(diff.old.as_ref().unwrap().stars, 10);
        assert_eq!(diff.new.as_ref().unwrap().stars, 50);

        let entry = store.all().next().unwrap();
        assert_eq!(entry.assigned_path, "pdf-tools");
        assert_eq!(entry.metadata.display_name, "PDF Toolkit");
        assert_eq!(entry.created_at, at(1));
        assert_eq!(entry.updated_at, at(2));
    }

    #[test]
    fn malformed_record_is_skipped_and_batch_continues() {
        let coordinator = MergeCoordinator::default();
        let mut store = RegistryStore::new();
        let records = vec![record("a/x", "", "Broken"), record("a/x", "ok", "Fine")];

        let report = coordinator
            .run(&mut store, &records, &MergeOptions::new(at(1)))
            .unwrap();

        assert_eq!(report.counts.skipped, 1);
        assert_eq!(report.counts.created, 1);
        let skipped = report.skipped().next().unwrap();
        assert_eq!(skipped.origin.as_deref(), Some("#0"));
        assert!(skipped.reason.as_deref().unwrap().contains("empty origin_path"));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn rerun_of_same_batch_is_unchanged() {
        let coordinator = MergeCoordinator::default();
        let mut store = RegistryStore::new();
        let records = vec![record("a/x", "s", "PDF"), record("b/y", "s", "PDF")];
        coordinator.run(&mut store, &records, &MergeOptions::new(at(1))).unwrap();
        let before = store.to_snapshot();

        let report = coordinator
            .run(&mut store, &records, &MergeOptions::new(at(2)))
            .unwrap();

        assert_eq!(report.counts.unchanged, 2);
        assert!(!report.has_changes());
        assert_eq!(store.to_snapshot().skills.len(), before.skills.len());
        for (after, before) in store.to_snapshot().skills.iter().zip(&before.skills) {
            assert_eq!(after.assigned_path, before.assigned_path);
            assert_eq!(after.updated_at, before.updated_at);
            assert_eq!(after.last_seen, Some(at(2)));
        }
    }

    #[test]
    fn sequential_and_parallel_preparation_agree() {
        let coordinator = MergeCoordinator::default();
        let records: Vec<RawRecord> = (0..50)
            .map(|i| record(&format!("owner{}/repo", i % 7), &format!("s{}", i), "Same Name"))
            .collect();

        let mut parallel = RegistryStore::new();
        let mut sequential = RegistryStore::new();
        let mut options = MergeOptions::new(at(1));
        coordinator.run(&mut parallel, &records, &options).unwrap();
        options.parallel = false;
        coordinator.run(&mut sequential, &records, &options).unwrap();

        assert_eq!(parallel.to_snapshot(), sequential.to_snapshot());
    }

    #[test]
    fn origin_order_ignores_input_order() {
        let coordinator = MergeCoordinator::default();
        let records = vec![record("b/y", "s", "PDF"), record("a/x", "s", "PDF")];
        let mut reversed = records.clone();
        reversed.reverse();

        let mut first = RegistryStore::new();
        let mut second = RegistryStore::new();
        coordinator.run(&mut first, &records, &MergeOptions::new(at(1))).unwrap();
        coordinator.run(&mut second, &reversed, &MergeOptions::new(at(1))).unwrap();

        assert_eq!(first.to_snapshot(), second.to_snapshot());
        assert_eq!(
            first.lookup_path_owner("pdf").unwrap().metadata.origin_repo,
            "a/x"
        );
    }

    #[test]
    fn input_order_lets_first_record_win() {
        let coordinator = MergeCoordinator::default();
        let records = vec![record("b/y", "s", "PDF"), record("a/x", "s", "PDF")];
        let mut options = MergeOptions::new(at(1));
        options.order = MergeOrder::Input;

        let mut store = RegistryStore::new();
        coordinator.run(&mut store, &records, &options).unwrap();
        assert_eq!(
            store.lookup_path_owner("pdf").unwrap().metadata.origin_repo,
            "b/y"
        );
    }

    #[test]
    fn category_is_normalized() {
        let coordinator = MergeCoordinator::default();
        let mut raw = record("a/x", "s", "S");
        raw.category = "Dev Ops".into();
        let mut store = RegistryStore::new();
        coordinator.run(&mut store, &[raw], &MergeOptions::new(at(1))).unwrap();
        assert_eq!(store.all().next().unwrap().metadata.category, "dev-ops");
    }
}
