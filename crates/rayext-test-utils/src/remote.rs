//! In-memory [`RemoteRepository`]

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use rayext_github::{Error, GithubBranch, GithubCommit, GithubTag, RemoteRepository, Result};

/// One call made against a [`FakeRemote`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteCall {
    Tags(String),
    Branches(String),
    DefaultBranch(String),
    Download(String),
}

#[derive(Debug, Default)]
struct FakeRepo {
    tags: Vec<GithubTag>,
    branches: Vec<GithubBranch>,
    default_branch: Option<String>,
    failing: bool,
}

#[derive(Debug, Default)]
struct State {
    repos: HashMap<String, FakeRepo>,
    archives: HashMap<String, Vec<u8>>,
    failing_downloads: bool,
    calls: Vec<RemoteCall>,
}

/// Remote host backed by maps. Unknown repositories answer `NotFound`.
///
/// ```rust,no_run
/// use rayext_test_utils::{FakeRemote, extension_zipball};
///
/// let remote = FakeRemote::new()
///     .with_tag("owner/demo", "v2.0", "sha2", extension_zipball("demo", "Demo"))
///     .with_tag("owner/demo", "v1.0", "sha1", extension_zipball("demo", "Demo"));
/// ```
#[derive(Debug, Default)]
pub struct FakeRemote {
    state: Mutex<State>,
}

pub const FAKE_BASE: &str = "https://fake.test";

fn commit(repo: &str, sha: &str) -> GithubCommit {
    GithubCommit {
        sha: sha.to_string(),
        url: format!("{FAKE_BASE}/repos/{repo}/commits/{sha}"),
    }
}

impl FakeRemote {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }

    /// Append a tag (listing order is insertion order) with its archive.
    pub fn with_tag(self, repo: &str, name: &str, sha: &str, archive: Vec<u8>) -> Self {
        {
            let mut state = self.state();
            let url = format!("{FAKE_BASE}/repos/{repo}/zipball/refs/tags/{name}");
            state.archives.insert(url.clone(), archive);
            state.repos.entry(repo.to_string()).or_default().tags.push(GithubTag {
                name: name.to_string(),
                commit: commit(repo, sha),
                zipball_url: url,
                tarball_url: String::new(),
                node_id: String::new(),
            });
        }
        self
    }

    /// Add or move a branch and set the archive served for its tip.
    pub fn with_branch(self, repo: &str, name: &str, sha: &str, archive: Vec<u8>) -> Self {
        self.set_branch(repo, name, sha, archive);
        self
    }

    pub fn with_default_branch(self, repo: &str, name: &str) -> Self {
        self.state()
            .repos
            .entry(repo.to_string())
            .or_default()
            .default_branch = Some(name.to_string());
        self
    }

    /// Point `name` at a new commit, as if someone pushed.
    pub fn set_branch(&self, repo: &str, name: &str, sha: &str, archive: Vec<u8>) {
        let mut state = self.state();
        state.archives.insert(self.branch_archive_url(repo, name), archive);
        let branches = &mut state.repos.entry(repo.to_string()).or_default().branches;
        let branch = GithubBranch {
            name: name.to_string(),
            commit: commit(repo, sha),
            protected: false,
        };
        match branches.iter().position(|b| b.name == name) {
            Some(index) => branches[index] = branch,
            None => branches.push(branch),
        }
    }

    pub fn remove_branch(&self, repo: &str, name: &str) {
        if let Some(fake) = self.state().repos.get_mut(repo) {
            fake.branches.retain(|b| b.name != name);
        }
    }

    /// Every subsequent call for `repo` fails like an exhausted retry loop.
    pub fn fail_repository(&self, repo: &str) {
        self.state().repos.entry(repo.to_string()).or_default().failing = true;
    }

    /// Every subsequent archive download fails. Listings keep working.
    pub fn fail_downloads(&self) {
        self.state().failing_downloads = true;
    }

    pub fn calls(&self) -> Vec<RemoteCall> {
        self.state().calls.clone()
    }

    pub fn downloads(&self) -> usize {
        self.count(|c| matches!(c, RemoteCall::Download(_)))
    }

    pub fn branch_calls(&self) -> usize {
        self.count(|c| matches!(c, RemoteCall::Branches(_) | RemoteCall::DefaultBranch(_)))
    }

    pub fn count(&self, predicate: impl Fn(&RemoteCall) -> bool) -> usize {
        self.state().calls.iter().filter(|c| predicate(c)).count()
    }

    fn lookup<T>(&self, repo: &str, call: RemoteCall, f: impl FnOnce(&FakeRepo) -> T) -> Result<T> {
        let mut state = self.state();
        state.calls.push(call);
        let url = format!("{FAKE_BASE}/repos/{repo}");
        match state.repos.get(repo) {
            Some(fake) if fake.failing => Err(Error::Network {
                url,
                attempts: 1,
                message: "connection refused".into(),
            }),
            Some(fake) => Ok(f(fake)),
            None => Err(Error::NotFound { url }),
        }
    }
}

#[async_trait]
impl RemoteRepository for FakeRemote {
    async fn tags(&self, repo: &str) -> Result<Vec<GithubTag>> {
        self.lookup(repo, RemoteCall::Tags(repo.to_string()), |r| r.tags.clone())
    }

    async fn branches(&self, repo: &str) -> Result<Vec<GithubBranch>> {
        self.lookup(repo, RemoteCall::Branches(repo.to_string()), |r| {
            r.branches.clone()
        })
    }

    async fn default_branch(&self, repo: &str) -> Result<String> {
        self.lookup(repo, RemoteCall::DefaultBranch(repo.to_string()), |r| {
            r.default_branch
                .clone()
                .or_else(|| r.branches.first().map(|b| b.name.clone()))
                .unwrap_or_else(|| "main".to_string())
        })
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>> {
        let mut state = self.state();
        state.calls.push(RemoteCall::Download(url.to_string()));
        if state.failing_downloads {
            return Err(Error::Network {
                url: url.to_string(),
                attempts: 6,
                message: "connection reset".into(),
            });
        }
        state
            .archives
            .get(url)
            .cloned()
            .ok_or_else(|| Error::NotFound {
                url: url.to_string(),
            })
    }

    fn branch_archive_url(&self, repo: &str, branch: &str) -> String {
        format!("{FAKE_BASE}/repos/{repo}/zipball/{branch}")
    }
}
