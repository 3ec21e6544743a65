//! Error types for skillreg-core

/// Result type for skillreg-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in skillreg-core operations
///
/// `MalformedRecord` and `PathImmutableViolation` are per-record: a merge run
/// reports them as skipped entries and carries on. Everything else aborts the
/// run before anything is committed or published.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Raw input is missing the coordinates needed to derive an identity
    #[error("Malformed record: {reason}")]
    MalformedRecord { reason: String },

    /// Attempt to change the assigned path of an existing entry
    #[error("Assigned path of {key} is immutable ({current} -> {attempted})")]
    PathImmutableViolation {
        key: String,
        current: String,
        attempted: String,
    },

    /// A path is claimed by two keys; the uniqueness guarantee is broken
    #[error("Index inconsistency: path '{path}' claimed by both {existing} and {incoming}")]
    IndexInconsistency {
        path: String,
        existing: String,
        incoming: String,
    },

    /// Migration or lookup target does not exist
    #[error("Unknown canonical key: {key}")]
    UnknownKey { key: String },

    /// Requested path is not a single filesystem-safe segment
    #[error("Invalid assigned path '{path}': {reason}")]
    InvalidPath { path: String, reason: String },

    /// Stored content does not match its content reference
    #[error("Content mismatch for {reference}: found {actual}")]
    ContentMismatch { reference: String, actual: String },

    /// Text that is not a `sha256:<hex>` content reference
    #[error("Invalid content reference: {reference}")]
    InvalidReference { reference: String },

    /// Pin file has no current publication
    #[error("Nothing has been published to {path}")]
    NotPublished { path: String },

    /// Archive snapshot is not paired with the pinned logic snapshot
    #[error("Pinned archive {archive} was built from {paired}, not {logic}")]
    PinMismatch {
        logic: String,
        archive: String,
        paired: String,
    },

    /// Underlying persistence failure
    #[error(transparent)]
    StoreIo(#[from] skillreg_fs::Error),

    /// JSON serialization/deserialization error
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// TOML deserialization error
    #[error(transparent)]
    TomlDe(#[from] toml::de::Error),
}

impl Error {
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedRecord {
            reason: reason.into(),
        }
    }

    /// Whether the error only affects the record being processed.
    pub fn is_record_level(&self) -> bool {
        matches!(
            self,
            Self::MalformedRecord { .. } | Self::PathImmutableViolation { .. }
        )
    }
}
