//! Version resolution
//!
//! Tags win over branches. A repository without tags falls back to its
//! branches, defaulting to the default branch. Remote listings are cached
//! for the lifetime of the resolver, which is one command invocation.

use std::cmp::Reverse;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use rayext_github::{GithubBranch, GithubCommit, GithubTag, RemoteRepository};
use rayext_manifest::VersionRef;
use semver::Version;

use crate::decision::Decider;
use crate::error::{Error, Result};

/// What the user asked for. Both fields empty means "latest".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VersionHint {
    pub tag: Option<String>,
    pub branch: Option<String>,
}

impl VersionHint {
    pub fn tag(name: impl Into<String>) -> Self {
        Self {
            tag: Some(name.into()),
            branch: None,
        }
    }

    pub fn branch(name: impl Into<String>) -> Self {
        Self {
            tag: None,
            branch: Some(name.into()),
        }
    }
}

/// A concrete version ready to download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedVersion {
    pub version: VersionRef,
    /// Commit the version points at, when the listing reported one.
    pub commit: Option<GithubCommit>,
    pub archive_url: String,
}

#[derive(Debug, Default)]
struct Listing {
    tags: Option<Vec<GithubTag>>,
    branches: Option<Vec<GithubBranch>>,
    default_branch: Option<String>,
}

/// Resolves version hints against a [`RemoteRepository`].
pub struct VersionResolver {
    remote: Arc<dyn RemoteRepository>,
    decider: Arc<dyn Decider>,
    cache: Mutex<HashMap<String, Listing>>,
}

impl VersionResolver {
    pub fn new(remote: Arc<dyn RemoteRepository>, decider: Arc<dyn Decider>) -> Self {
        Self {
            remote,
            decider,
            cache: Mutex::new(HashMap::new()),
        }
    }

    fn cache(&self) -> MutexGuard<'_, HashMap<String, Listing>> {
        self.cache.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// All tags of `repo`, newest first.
    pub async fn tags(&self, repo: &str) -> Result<Vec<GithubTag>> {
        if let Some(tags) = self.cache().get(repo).and_then(|l| l.tags.clone()) {
            return Ok(tags);
        }
        let tags = order_tags(self.remote.tags(repo).await?);
        tracing::debug!(repo, count = tags.len(), "tags fetched");
        self.cache().entry(repo.to_string()).or_default().tags = Some(tags.clone());
        Ok(tags)
    }

    /// All branches of `repo`, in remote order.
    pub async fn branches(&self, repo: &str) -> Result<Vec<GithubBranch>> {
        if let Some(branches) = self.cache().get(repo).and_then(|l| l.branches.clone()) {
            return Ok(branches);
        }
        let branches = self.remote.branches(repo).await?;
        tracing::debug!(repo, count = branches.len(), "branches fetched");
        self.cache().entry(repo.to_string()).or_default().branches = Some(branches.clone());
        Ok(branches)
    }

    pub async fn default_branch(&self, repo: &str) -> Result<String> {
        if let Some(branch) = self.cache().get(repo).and_then(|l| l.default_branch.clone()) {
            return Ok(branch);
        }
        let branch = self.remote.default_branch(repo).await?;
        self.cache().entry(repo.to_string()).or_default().default_branch = Some(branch.clone());
        Ok(branch)
    }

    /// Archive URL for the tip of `branch`.
    pub fn branch_archive_url(&self, repo: &str, branch: &str) -> String {
        self.remote.branch_archive_url(repo, branch)
    }

    /// Decide which version of `repo` to install.
    ///
    /// A tag hint that matches exactly is taken as-is. Otherwise, if the
    /// repository has tags, the decider picks one (defaulting to the newest)
    /// unless there is exactly one and no hint was given. A branch hint with
    /// no tag hint skips tags entirely.
    ///
    /// A branch hint naming an existing branch is used without offering the
    /// other branches. Only a missing or unknown branch hint prompts, with the
    /// default branch preselected.
    pub async fn pick_version(&self, repo: &str, hint: &VersionHint) -> Result<ResolvedVersion> {
        if hint.tag.is_some() || hint.branch.is_none() {
            let tags = self.tags(repo).await?;
            if !tags.is_empty() {
                return self.pick_tag(repo, hint.tag.as_deref(), &tags).await;
            }
            if let Some(tag) = &hint.tag {
                tracing::warn!(repo, tag, "repository has no tags, falling back to branches");
            }
        }
        self.pick_branch(repo, hint.branch.as_deref()).await
    }

    async fn pick_tag(
        &self,
        repo: &str,
        hint: Option<&str>,
        tags: &[GithubTag],
    ) -> Result<ResolvedVersion> {
        let index = match hint {
            Some(name) => match tags.iter().position(|t| t.name == name) {
                Some(index) => index,
                None => {
                    let prompt = format!("{repo}@{name} not found, select a tag");
                    self.decider.select(&prompt, &tag_names(tags), 0).await?
                }
            },
            None if tags.len() == 1 => 0,
            None => {
                let prompt = format!("select a tag for {repo}");
                self.decider.select(&prompt, &tag_names(tags), 0).await?
            }
        };
        let tag = tags.get(index).ok_or_else(|| Error::VersionNotFound {
            repository: repo.to_string(),
            version: hint.unwrap_or_default().to_string(),
        })?;
        tracing::debug!(repo, tag = %tag.name, "tag resolved");
        Ok(ResolvedVersion {
            version: VersionRef::Tag(tag.name.clone()),
            commit: Some(tag.commit.clone()),
            archive_url: tag.zipball_url.clone(),
        })
    }

    async fn pick_branch(&self, repo: &str, hint: Option<&str>) -> Result<ResolvedVersion> {
        let branches = self.branches(repo).await?;
        let names: Vec<String> = branches.iter().map(|b| b.name.clone()).collect();

        let name = match hint.filter(|h| names.iter().any(|n| n.as_str() == *h)) {
            Some(name) => name.to_string(),
            None => {
                if let Some(hint) = hint {
                    tracing::warn!(repo, branch = hint, "branch not found, using default branch");
                }
                let default_branch = self.default_branch(repo).await?;
                if branches.len() > 1 {
                    let default = names.iter().position(|n| *n == default_branch).unwrap_or(0);
                    let prompt = format!("select a branch for {repo}");
                    let index = self.decider.select(&prompt, &names, default).await?;
                    names.get(index).cloned().ok_or_else(|| Error::VersionNotFound {
                        repository: repo.to_string(),
                        version: default_branch.clone(),
                    })?
                } else {
                    default_branch
                }
            }
        };

        let commit = branches
            .iter()
            .find(|b| b.name == name)
            .map(|b| b.commit.clone());
        tracing::debug!(repo, branch = %name, "branch resolved");
        Ok(ResolvedVersion {
            archive_url: self.remote.branch_archive_url(repo, &name),
            version: VersionRef::Branch(name),
            commit,
        })
    }
}

fn tag_names(tags: &[GithubTag]) -> Vec<String> {
    tags.iter().map(|t| t.name.clone()).collect()
}

/// Parse a tag name as a version: optional `v` prefix, missing minor and
/// patch components count as zero.
pub fn parse_tag_version(name: &str) -> Option<Version> {
    let trimmed = name.strip_prefix(['v', 'V']).unwrap_or(name);
    let split = trimmed.find(['-', '+']).unwrap_or(trimmed.len());
    let (core, suffix) = trimmed.split_at(split);

    let parts: Vec<&str> = core.split('.').collect();
    if parts.is_empty() || parts.len() > 3 {
        return None;
    }
    let mut numbers = [0u64; 3];
    for (slot, part) in numbers.iter_mut().zip(&parts) {
        *slot = part.parse().ok()?;
    }
    let [major, minor, patch] = numbers;
    Version::parse(&format!("{major}.{minor}.{patch}{suffix}")).ok()
}

/// Newest first when every tag parses as a version; remote order otherwise.
pub fn order_tags(mut tags: Vec<GithubTag>) -> Vec<GithubTag> {
    let versions: Option<Vec<Version>> = tags.iter().map(|t| parse_tag_version(&t.name)).collect();
    let Some(versions) = versions else {
        return tags;
    };
    let mut keyed: Vec<(Version, GithubTag)> = versions.into_iter().zip(tags.drain(..)).collect();
    keyed.sort_by_key(|(version, _)| Reverse(version.clone()));
    keyed.into_iter().map(|(_, tag)| tag).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn tag(name: &str) -> GithubTag {
        GithubTag {
            name: name.into(),
            commit: GithubCommit {
                sha: format!("sha-{name}"),
                url: String::new(),
            },
            zipball_url: format!("https://example.test/zipball/{name}"),
            tarball_url: String::new(),
            node_id: String::new(),
        }
    }

    fn names(tags: &[GithubTag]) -> Vec<&str> {
        tags.iter().map(|t| t.name.as_str()).collect()
    }

    #[rstest]
    #[case("v1.2.3", Some("1.2.3"))]
    #[case("2.0", Some("2.0.0"))]
    #[case("v3", Some("3.0.0"))]
    #[case("v1.0.0-beta.1", Some("1.0.0-beta.1"))]
    #[case("release-2024", None)]
    #[case("v1.2.3.4", None)]
    #[case("", None)]
    fn test_parse_tag_version(#[case] name: &str, #[case] expected: Option<&str>) {
        assert_eq!(
            parse_tag_version(name).map(|v| v.to_string()),
            expected.map(str::to_string)
        );
    }

    #[test]
    fn test_order_tags_by_version() {
        let ordered = order_tags(vec![tag("v1.0"), tag("v2.0"), tag("v1.10"), tag("v1.2")]);
        assert_eq!(names(&ordered), vec!["v2.0", "v1.10", "v1.2", "v1.0"]);
    }

    #[test]
    fn test_order_tags_keeps_remote_order_when_unparseable() {
        let ordered = order_tags(vec![tag("nightly"), tag("v2.0"), tag("v1.0")]);
        assert_eq!(names(&ordered), vec!["nightly", "v2.0", "v1.0"]);
    }

    #[test]
    fn test_prerelease_sorts_below_release() {
        let ordered = order_tags(vec![tag("v2.0.0-rc.1"), tag("v2.0.0"), tag("v1.9.0")]);
        assert_eq!(names(&ordered), vec!["v2.0.0", "v2.0.0-rc.1", "v1.9.0"]);
    }
}
