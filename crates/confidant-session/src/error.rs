//! Error types for session memory operations.

/// Error type for session memory operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A configuration value was rejected; the previous configuration stays in effect.
    #[error("invalid config value for '{field}': {reason}")]
    InvalidConfig {
        field: &'static str,
        reason: String,
    },

    /// Failed to read a settings file.
    #[error("failed to read settings file '{path}': {source}")]
    ReadFile {
        path: String,
        source: std::io::Error,
    },

    /// Failed to parse TOML settings.
    #[error("failed to parse settings: {0}")]
    Parse(#[from] toml::de::Error),

    /// The cleanup task needs a tokio runtime and none is running.
    #[error("no tokio runtime available to run the cleanup task")]
    NoRuntime,

    /// A sweep aborted before completing.
    #[error("sweep failed: {0}")]
    SweepFailed(String),

    /// A monitoring hook panicked. The sweep it was notified about still completed.
    #[error("sweep hook failed: {0}")]
    HookFailed(String),
}

impl Error {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            field,
            reason: reason.into(),
        }
    }
}

/// Result type for session memory operations.
pub type Result<T> = std::result::Result<T, Error>;
