//! Filesystem primitives for the skill registry
//!
//! Provides normalized path handling, atomic locked I/O, content checksums
//! and format-agnostic configuration loading.

pub mod checksum;
pub mod config;
pub mod error;
pub mod io;
pub mod path;

pub use config::{ConfigFormat, ConfigStore};
pub use error::{Error, Result};
pub use path::NormalizedPath;
