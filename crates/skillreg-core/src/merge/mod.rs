//! Batch merge of raw records into the registry
//!
//! For every incoming record the coordinator decides whether it is a new
//! entity, an update to an existing one, or a record to skip, and reports
//! the decision in a [`MergeReport`].

mod coordinator;
mod report;

pub use coordinator::{MergeCoordinator, MergeOptions};
pub use report::{DiffCounts, DiffEntry, DiffKind, MergeReport};
