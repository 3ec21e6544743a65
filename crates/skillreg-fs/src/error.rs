//! Error types for skillreg-fs

use std::io;
use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

/// Filesystem and config failures. Every variant names the file involved.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The file was read but is not valid `format`.
    #[error("{}: invalid {format}: {message}", path.display())]
    ConfigParse {
        path: PathBuf,
        format: String,
        message: String,
    },

    #[error("{}: cannot encode as {format}: {message}", path.display())]
    ConfigSerialize {
        path: PathBuf,
        format: String,
        message: String,
    },

    #[error("No config format for extension '{extension}' (expected toml, json, yaml or yml)")]
    UnsupportedFormat { extension: String },

    #[error("{}: could not acquire file lock", path.display())]
    LockFailed { path: PathBuf },
}

impl Error {
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn is_not_found(&self) -> bool {
        match self {
            Self::Io { source, .. } => source.kind() == io::ErrorKind::NotFound,
            _ => false,
        }
    }
}
