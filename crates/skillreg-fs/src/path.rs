//! Separator-normalized paths

use std::path::{Path, PathBuf};

/// A forward-slash path used for every registry and layout location.
///
/// Origin paths arrive from upstream sources in either separator style.
/// Keeping one form means equal locations compare equal; the native
/// `PathBuf` is produced only when touching the disk.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NormalizedPath {
    repr: String,
}

impl NormalizedPath {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            repr: path.as_ref().to_string_lossy().replace('\\', "/"),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.repr
    }

    pub fn to_native(&self) -> PathBuf {
        PathBuf::from(&self.repr)
    }

    /// Append `segment`, inserting a separator only where one is missing.
    pub fn join(&self, segment: &str) -> Self {
        let segment = segment.replace('\\', "/");
        let repr = match self.repr.as_str() {
            "" => segment,
            base if base.ends_with('/') => format!("{base}{segment}"),
            base => format!("{base}/{segment}"),
        };
        Self { repr }
    }

    /// Segments that carry meaning: no empty pieces from doubled or
    /// trailing slashes, and no `.`.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.repr
            .split('/')
            .filter(|segment| !segment.is_empty() && *segment != ".")
    }

    /// The relative path made of [`segments`](Self::segments).
    pub fn clean(&self) -> Self {
        Self {
            repr: self.segments().collect::<Vec<_>>().join("/"),
        }
    }

    pub fn file_name(&self) -> Option<&str> {
        self.repr
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .filter(|name| !name.is_empty())
    }

    /// Text after the last dot of the file name. Dotfiles have none.
    pub fn extension(&self) -> Option<&str> {
        let name = self.file_name()?;
        match name.rfind('.') {
            Some(0) | None => None,
            Some(idx) => Some(&name[idx + 1..]),
        }
    }

    pub fn is_dir(&self) -> bool {
        self.to_native().is_dir()
    }

    pub fn is_file(&self) -> bool {
        self.to_native().is_file()
    }

    /// `registry.json` with suffix `.bak` becomes `registry.json.bak`.
    pub fn with_appended_suffix(&self, suffix: &str) -> Self {
        Self {
            repr: format!("{}{}", self.repr.trim_end_matches('/'), suffix),
        }
    }
}

impl AsRef<Path> for NormalizedPath {
    fn as_ref(&self) -> &Path {
        Path::new(&self.repr)
    }
}

impl std::fmt::Display for NormalizedPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.repr)
    }
}

macro_rules! from_path_like {
    ($($source:ty),*) => {
        $(
            impl From<$source> for NormalizedPath {
                fn from(value: $source) -> Self {
                    Self::new(value)
                }
            }
        )*
    };
}

from_path_like!(&str, String, PathBuf, &Path);
