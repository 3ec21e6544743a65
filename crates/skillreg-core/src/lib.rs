//! Identity normalization and conflict resolution for the skill registry
//!
//! This crate turns raw discovered records into a deduplicated registry in
//! which every entry owns a directory name no other entry shares, even on a
//! case-insensitive filesystem. It implements:
//!
//! - **Identity**: canonical keys from origin coordinates, slugs from names
//! - **Conflict resolution**: deterministic suffixes for colliding slugs
//! - **RegistryStore**: key and path indices kept in lockstep, persisted
//!   atomically
//! - **MergeCoordinator**: batch runs with a created/updated/unchanged/skipped
//!   diff
//! - **Publisher**: paired logic and archive snapshots behind a single pin
//!
//! # Architecture
//!
//! ```text
//!   source ──> merge ──> store ──> layout ──> publish
//!                │         ▲
//!                ▼         │
//!            identity ─> resolver
//! ```
//!
//! # Example
//!
//! ```
//! use chrono::Utc;
//! use skillreg_core::{MergeCoordinator, MergeOptions, RawRecord, RegistryStore};
//!
//! let records = vec![
//!     RawRecord {
//!         origin_repo: "a/x".into(),
//!         origin_path: "skills/pdf".into(),
//!         display_name: "PDF Tools".into(),
//!         ..Default::default()
//!     },
//!     RawRecord {
//!         origin_repo: "b/y".into(),
//!         origin_path: "skills/pdf".into(),
//!         display_name: "PDF Tools".into(),
//!         ..Default::default()
//!     },
//! ];
//!
//! let mut store = RegistryStore::new();
//! let report = MergeCoordinator::default()
//!     .run(&mut store, &records, &MergeOptions::new(Utc::now()))
//!     .unwrap();
//!
//! assert_eq!(report.counts.created, 2);
//! assert!(store.lookup_path_owner("pdf-tools").is_some());
//! assert!(store.lookup_path_owner("pdf-tools-b-y").is_some());
//! ```

pub mod audit;
pub mod config;
pub mod error;
pub mod identity;
pub mod layout;
pub mod merge;
pub mod publish;
pub mod record;
pub mod resolver;
pub mod source;
pub mod store;

pub use audit::{CaseConflict, find_case_conflicts};
pub use config::{MergeOrder, RegistryConfig};
pub use error::{Error, Result};
pub use identity::{CanonicalKey, NameNormalizer, Slug};
pub use layout::{ArchiveManifest, Layout, MaterializeReport};
pub use merge::{DiffCounts, DiffEntry, DiffKind, MergeCoordinator, MergeOptions, MergeReport};
pub use publish::{ContentRef, ContentStore, DirContentStore, PinFile, PinnedPair, PublishPin, Publisher};
pub use record::{RawRecord, SkillMetadata};
pub use resolver::{Assignment, ClaimSet, ConflictResolver, PathClaims, SuffixKind};
pub use source::{IngestBatch, RejectedRecord, SourcedRecord, load_records};
pub use store::{RegistryEntry, RegistrySnapshot, RegistryStore, UpsertOutcome};
