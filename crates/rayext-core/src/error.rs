//! Error types for rayext-core

use std::path::{Path, PathBuf};

/// Result type for lifecycle operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur resolving, installing, updating or removing an
/// extension.
///
/// Batch drivers report these per target; none of them stops sibling
/// targets.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Remote access failed after every retry.
    #[error("network error: {0}")]
    Network(#[from] rayext_github::Error),

    /// The requested tag or branch does not exist remotely.
    #[error("{repository} has no version '{version}'")]
    VersionNotFound { repository: String, version: String },

    /// A name matched several installed extensions and no choice was made.
    #[error("'{name}' matches several extensions: {}", .candidates.join(", "))]
    Ambiguous {
        name: String,
        candidates: Vec<String>,
    },

    /// The user declined or aborted a prompt.
    #[error("aborted")]
    Cancelled,

    /// A filesystem operation failed.
    #[error("failed to {operation} {path}: {source}")]
    Filesystem {
        path: PathBuf,
        operation: &'static str,
        #[source]
        source: std::io::Error,
    },

    /// Filesystem primitive or identifier validation failure.
    #[error(transparent)]
    Fs(#[from] rayext_fs::Error),

    /// Manifest could not be read or written.
    #[error(transparent)]
    Manifest(#[from] rayext_manifest::Error),

    /// No installed extension matches the name.
    #[error("extension '{0}' is not installed")]
    NotInstalled(String),

    /// The downloaded extension has an unusable package descriptor.
    #[error("invalid package metadata at {path}: {message}")]
    PackageMetadata { path: PathBuf, message: String },

    /// The downloaded archive could not be unpacked.
    #[error("invalid archive: {0}")]
    Archive(String),

    /// The package manager failed.
    #[error("`{command}` failed: {message}")]
    Runner { command: String, message: String },

    /// A background task panicked or was cancelled.
    #[error("background task failed: {0}")]
    Task(String),
}

impl Error {
    pub fn filesystem(path: impl AsRef<Path>, operation: &'static str, source: std::io::Error) -> Self {
        Self::Filesystem {
            path: path.as_ref().to_path_buf(),
            operation,
            source,
        }
    }

    /// Whether this is a user abort rather than a failure.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

impl From<tokio::task::JoinError> for Error {
    fn from(e: tokio::task::JoinError) -> Self {
        Self::Task(e.to_string())
    }
}
