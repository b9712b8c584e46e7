//! Wire types of the remote repository API

use serde::{Deserialize, Serialize};

/// A commit reference as returned inside tag and branch listings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GithubCommit {
    pub sha: String,
    pub url: String,
}

/// One entry of `GET /repos/{repo}/tags`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GithubTag {
    pub name: String,
    pub commit: GithubCommit,
    pub zipball_url: String,
    #[serde(default)]
    pub tarball_url: String,
    #[serde(default)]
    pub node_id: String,
}

/// One entry of `GET /repos/{repo}/branches`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GithubBranch {
    pub name: String,
    pub commit: GithubCommit,
    #[serde(default)]
    pub protected: bool,
}

/// The subset of `GET /repos/{repo}` that rayext reads.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RepositoryInfo {
    pub default_branch: String,
}
