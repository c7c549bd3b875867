//! Error handling and custom error types
//!
//! Upload-time failures are always surfaced to the host; configuration
//! problems are reported through [`ConfigError`] and degrade the plugin to
//! "feature off" instead.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Upload aborted")]
    Aborted,

    #[error("An upload is already in progress for this adapter")]
    UploadInProgress,

    #[error("This adapter has already completed its upload")]
    AlreadySettled,
}

impl Error {
    /// True when the upload was cancelled through `abort()`.
    pub fn is_aborted(&self) -> bool {
        matches!(self, Error::Aborted)
    }

    pub fn is_upload_failed(&self) -> bool {
        matches!(self, Error::UploadFailed(_))
    }
}

/// Reason a present configuration block could not be used.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required field `{0}`")]
    MissingField(&'static str),

    #[error("malformed configuration: {0}")]
    Malformed(String),
}

pub type Result<T> = std::result::Result<T, Error>;
