//! Remote repository access for rayext.
//!
//! [`RemoteRepository`] is the seam the version resolver and lifecycle talk
//! to; [`GithubClient`] is the HTTP implementation backed by the GitHub REST
//! API with bounded retries.

pub mod client;
pub mod error;
pub mod types;

pub use client::{DEFAULT_API_BASE, GithubClient, USER_AGENT};
pub use error::{Error, Result};
pub use types::{GithubBranch, GithubCommit, GithubTag};

use async_trait::async_trait;

/// Read access to a source repository host.
#[async_trait]
pub trait RemoteRepository: Send + Sync {
    /// All tags of `repo`, in the order the host returns them.
    async fn tags(&self, repo: &str) -> Result<Vec<GithubTag>>;

    /// All branches of `repo`.
    async fn branches(&self, repo: &str) -> Result<Vec<GithubBranch>>;

    /// Name of the default branch of `repo`.
    async fn default_branch(&self, repo: &str) -> Result<String>;

    /// Download an archive.
    async fn download(&self, url: &str) -> Result<Vec<u8>>;

    /// Archive URL for the tip of `branch`.
    fn branch_archive_url(&self, repo: &str, branch: &str) -> String;
}
