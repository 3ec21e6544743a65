//! Error types for skillreg-cli

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;

/// Errors that can occur in CLI operations
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Error from skillreg-core
    #[error(transparent)]
    Core(#[from] skillreg_core::Error),

    /// Error from skillreg-fs
    #[error(transparent)]
    Fs(#[from] skillreg_fs::Error),

    /// Report serialization error
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// User-facing error with a message
    #[error("{message}")]
    User { message: String },
}

impl CliError {
    /// Create a new user error with the given message
    pub fn user(message: impl Into<String>) -> Self {
        Self::User {
            message: message.into(),
        }
    }
}
