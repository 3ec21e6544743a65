//! Content-addressed object stores

use std::fmt;

use serde::{Deserialize, Serialize};
use skillreg_fs::{NormalizedPath, checksum, io};
use tracing::debug;

use crate::{Error, Result};

const OBJECTS_DIR: &str = "objects";

/// Reference to immutable content, `sha256:<64 hex>`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ContentRef(String);

impl ContentRef {
    /// Reference for the given bytes.
    pub fn of(bytes: &[u8]) -> Self {
        Self(checksum::compute_bytes_checksum(bytes))
    }

    pub fn parse(reference: &str) -> Result<Self> {
        checksum::parse_checksum(reference)
            .map(|_| Self(reference.to_string()))
            .ok_or_else(|| Error::InvalidReference {
                reference: reference.to_string(),
            })
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Hex digest without the `sha256:` prefix
    pub fn hex(&self) -> &str {
        self.0.strip_prefix(checksum::PREFIX).unwrap_or(&self.0)
    }
}

impl fmt::Display for ContentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for ContentRef {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<ContentRef> for String {
    fn from(value: ContentRef) -> Self {
        value.0
    }
}

/// Append-only store of immutable blobs addressed by their digest.
pub trait ContentStore {
    /// Store `bytes` and return their reference. Storing content that is
    /// already present is a no-op.
    fn put(&self, bytes: &[u8]) -> Result<ContentRef>;

    /// Fetch content, verifying it against its reference.
    fn get(&self, reference: &ContentRef) -> Result<Vec<u8>>;

    fn contains(&self, reference: &ContentRef) -> bool;
}

/// [`ContentStore`] backed by a directory: `<root>/objects/<2 hex>/<62 hex>.json`
#[derive(Debug, Clone)]
pub struct DirContentStore {
    root: NormalizedPath,
}

impl DirContentStore {
    pub fn new(root: impl Into<NormalizedPath>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &NormalizedPath {
        &self.root
    }

    fn object_path(&self, reference: &ContentRef) -> NormalizedPath {
        let hex = reference.hex();
        let (fanout, rest) = hex.split_at(2.min(hex.len()));
        self.root
            .join(OBJECTS_DIR)
            .join(fanout)
            .join(&format!("{}.json", rest))
    }
}

impl ContentStore for DirContentStore {
    fn put(&self, bytes: &[u8]) -> Result<ContentRef> {
        let reference = ContentRef::of(bytes);
        let path = self.object_path(&reference);
        if path.is_file() {
            debug!(%reference, "object already stored");
            return Ok(reference);
        }
        io::write_atomic(&path, bytes)?;
        debug!(%reference, bytes = bytes.len(), "object stored");
        Ok(reference)
    }

    fn get(&self, reference: &ContentRef) -> Result<Vec<u8>> {
        let bytes = io::read_locked(&self.object_path(reference))?;
        let actual = ContentRef::of(&bytes);
        if &actual != reference {
            return Err(Error::ContentMismatch {
                reference: reference.to_string(),
                actual: actual.to_string(),
            });
        }
        Ok(bytes)
    }

    fn contains(&self, reference: &ContentRef) -> bool {
        self.object_path(reference).is_file()
    }
}
