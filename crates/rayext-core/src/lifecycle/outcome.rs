//! Lifecycle states, per-target outcomes and batch reports

use std::fmt;
use std::path::PathBuf;

use rayext_manifest::VersionRef;

use crate::error::Error;
use crate::resolver::VersionHint;

/// Where one target is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Unresolved,
    Resolved,
    Downloaded,
    ConfigUpdated,
    Ready,
    Updated,
    Removed,
    Aborted,
}

impl LifecycleState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unresolved => "unresolved",
            Self::Resolved => "resolved",
            Self::Downloaded => "downloaded",
            Self::ConfigUpdated => "config-updated",
            Self::Ready => "ready",
            Self::Updated => "updated",
            Self::Removed => "removed",
            Self::Aborted => "aborted",
        }
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub(crate) fn transition(repository: &str, state: LifecycleState) {
    tracing::debug!(extension = repository, %state, "lifecycle transition");
}

/// One repository to install.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallTarget {
    pub repository: String,
    pub hint: VersionHint,
    /// Monorepo sub-package paths. Empty means the archive root.
    pub packages: Vec<String>,
}

impl InstallTarget {
    pub fn new(repository: impl Into<String>) -> Self {
        Self {
            repository: repository.into(),
            hint: VersionHint::default(),
            packages: Vec::new(),
        }
    }

    pub fn with_hint(mut self, hint: VersionHint) -> Self {
        self.hint = hint;
        self
    }

    pub fn with_packages(mut self, packages: Vec<String>) -> Self {
        self.packages = packages;
        self
    }
}

/// A completed install.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallOutcome {
    pub repository: String,
    pub version: VersionRef,
    /// Manifest keys written, one per package.
    pub keys: Vec<String>,
    /// Stale version directories that could not be removed.
    pub stale_left: Vec<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    AlreadyLatest {
        repository: String,
        version: VersionRef,
    },
    Updated {
        from: Option<VersionRef>,
        install: InstallOutcome,
    },
}

impl UpdateOutcome {
    pub fn repository(&self) -> &str {
        match self {
            Self::AlreadyLatest { repository, .. } => repository,
            Self::Updated { install, .. } => &install.repository,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UninstallOutcome {
    Removed {
        repository: String,
        keys: Vec<String>,
        titles: Vec<String>,
    },
    NotInstalled {
        name: String,
    },
}

/// Per-target results of a batch operation.
///
/// A failed or aborted target never affects its siblings.
#[derive(Debug)]
pub struct BatchReport<T> {
    pub completed: Vec<T>,
    pub failed: Vec<(String, Error)>,
    pub aborted: Vec<String>,
}

impl<T> Default for BatchReport<T> {
    fn default() -> Self {
        Self {
            completed: Vec::new(),
            failed: Vec::new(),
            aborted: Vec::new(),
        }
    }
}

impl<T> BatchReport<T> {
    pub fn record(&mut self, target: impl Into<String>, result: crate::Result<T>) {
        match result {
            Ok(outcome) => self.completed.push(outcome),
            Err(e) if e.is_cancelled() => self.aborted.push(target.into()),
            Err(e) => self.failed.push((target.into(), e)),
        }
    }

    /// Every target completed.
    pub fn is_success(&self) -> bool {
        self.failed.is_empty() && self.aborted.is_empty()
    }

    pub fn len(&self) -> usize {
        self.completed.len() + self.failed.len() + self.aborted.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
