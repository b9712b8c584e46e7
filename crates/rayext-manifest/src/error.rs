use std::path::PathBuf;

/// Errors that can occur reading or writing manifest data.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Filesystem failure while reading, writing or locking.
    #[error(transparent)]
    Fs(#[from] rayext_fs::Error),

    /// Failed to serialize the manifest document.
    #[error("failed to serialize manifest: {0}")]
    Serialize(#[from] serde_json::Error),

    /// The extension ships no package descriptor where one is expected.
    #[error("package descriptor not found: {0}")]
    PackageNotFound(PathBuf),

    /// The extension's package descriptor could not be parsed.
    #[error("invalid package descriptor at {path}: {message}")]
    PackageParse { path: PathBuf, message: String },
}

pub type Result<T> = std::result::Result<T, Error>;
