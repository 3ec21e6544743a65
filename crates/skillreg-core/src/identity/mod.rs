//! Identity derivation: canonical keys and slugs
//!
//! Both steps are pure functions of their input, so a merge run computes them
//! for all records in parallel before entering the single-writer phase.

pub mod key;
pub mod slug;

pub use key::{CanonicalKey, SHORT_HASH_LEN, derive, normalize_origin_path, normalize_repo};
pub use slug::{NameNormalizer, Slug};
