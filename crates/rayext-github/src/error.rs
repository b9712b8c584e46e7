//! Error types for rayext-github

/// Result type for remote repository operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur talking to the remote host
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Transport failure that survived every retry.
    #[error("request to {url} failed after {attempts} attempt(s): {message}")]
    Network {
        url: String,
        attempts: u32,
        message: String,
    },

    /// The remote answered with a non-success status.
    #[error("request to {url} returned HTTP {status}")]
    Http { url: String, status: u16 },

    /// The requested repository, tag or branch does not exist.
    #[error("not found: {url}")]
    NotFound { url: String },

    /// The response body could not be decoded.
    #[error("failed to decode response from {url}: {message}")]
    Decode { url: String, message: String },

    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client: {0}")]
    Client(String),
}

impl Error {
    /// Whether the failure is a missing resource rather than a transport problem.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
