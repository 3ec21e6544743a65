//! Shared test utilities for the skillreg workspace.
//!
//! Dev-dependency only, never published.
//!
//! # Modules
//!
//! - [`records`]: [`RecordBuilder`] and fixed timestamps for merge scenarios
//! - [`workspace`]: [`TestWorkspace`], a temporary directory laid out like a
//!   registry checkout

pub mod records;
pub mod workspace;

pub use records::{RecordBuilder, day, record};
pub use workspace::TestWorkspace;
