//! Install, update and uninstall
//!
//! Each target walks `Unresolved → Resolved → Downloaded → ConfigUpdated →
//! Ready`. The manifest is only written once the archive is unpacked, so an
//! aborted target never leaves a record behind. Batch operations run targets
//! concurrently; manifest writes are serialized by [`ManifestStore`].

mod outcome;

pub use outcome::{
    BatchReport, InstallOutcome, InstallTarget, LifecycleState, UninstallOutcome, UpdateOutcome,
};

use std::collections::{BTreeMap, HashSet};
use std::path::PathBuf;
use std::sync::Arc;

use futures::future::join_all;
use rayext_fs::validate_repository_id;
use rayext_github::RemoteRepository;
use rayext_manifest::{
    ExtensionRecord, ManifestStore, PACKAGE_FILENAME, PackageMetadata, VersionRef, record_key,
};

use crate::archive;
use crate::config::Settings;
use crate::decision::{Decider, require};
use crate::error::{Error, Result};
use crate::layout::ExtensionLayout;
use crate::resolver::{ResolvedVersion, VersionHint, VersionResolver};
use crate::runner::PackageRunner;
use outcome::transition;

/// A resolved uninstall, ready to execute.
#[derive(Debug)]
struct UninstallPlan {
    name: String,
    repository: Option<String>,
    keys: Vec<String>,
    titles: Vec<String>,
}

/// Drives extension lifecycles against one extensions root.
pub struct ExtensionManager {
    settings: Settings,
    store: ManifestStore,
    layout: ExtensionLayout,
    resolver: VersionResolver,
    remote: Arc<dyn RemoteRepository>,
    decider: Arc<dyn Decider>,
    runner: Arc<dyn PackageRunner>,
}

impl ExtensionManager {
    pub fn new(
        settings: Settings,
        remote: Arc<dyn RemoteRepository>,
        decider: Arc<dyn Decider>,
        runner: Arc<dyn PackageRunner>,
    ) -> Self {
        Self {
            store: ManifestStore::new(&settings.root),
            layout: ExtensionLayout::new(&settings.root),
            resolver: VersionResolver::new(remote.clone(), decider.clone()),
            settings,
            remote,
            decider,
            runner,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn store(&self) -> &ManifestStore {
        &self.store
    }

    pub fn layout(&self) -> &ExtensionLayout {
        &self.layout
    }

    pub fn resolver(&self) -> &VersionResolver {
        &self.resolver
    }

    // ------------------------------------------------------------------
    // install
    // ------------------------------------------------------------------

    /// Resolve, download, record and build one extension.
    pub async fn install(&self, target: &InstallTarget) -> Result<InstallOutcome> {
        let repository = target.repository.as_str();
        transition(repository, LifecycleState::Unresolved);
        let result = async {
            validate_repository_id(repository)?;
            let resolved = self.resolver.pick_version(repository, &target.hint).await?;
            self.install_resolved(target, resolved, self.settings.assume_yes)
                .await
        }
        .await;
        if let Err(e) = &result {
            abort(repository, e);
        }
        result
    }

    /// Install several targets concurrently. Duplicate repositories are
    /// installed once.
    pub async fn install_all(&self, targets: Vec<InstallTarget>) -> BatchReport<InstallOutcome> {
        let mut seen = HashSet::new();
        let targets: Vec<InstallTarget> = targets
            .into_iter()
            .filter(|t| seen.insert(t.repository.clone()))
            .collect();

        let results = join_all(targets.iter().map(|t| self.install(t))).await;

        let mut report = BatchReport::default();
        for (target, result) in targets.iter().zip(results) {
            report.record(&target.repository, result);
        }
        report
    }

    async fn install_resolved(
        &self,
        target: &InstallTarget,
        resolved: ResolvedVersion,
        overwrite: bool,
    ) -> Result<InstallOutcome> {
        let repository = target.repository.as_str();
        let version = resolved.version.clone();
        transition(repository, LifecycleState::Resolved);
        tracing::info!(repository, %version, "installing");

        self.layout.ensure_root()?;
        let dest = self.layout.version_path(repository, version.name())?;
        if dest.exists() && !overwrite {
            let prompt = format!("{repository}@{} already exists, overwrite it?", version.name());
            require(self.decider.as_ref(), &prompt, false).await?;
        }

        // the installed copy stays in place until the new one is unpacked
        let bytes = self.remote.download(&resolved.archive_url).await?;
        let staged = self.layout.stage(repository)?;
        let files = archive::extract(bytes, staged.path()).await?;
        self.layout.commit(staged, &dest)?;
        tracing::debug!(repository, files, dest = %dest.display(), "archive unpacked");
        transition(repository, LifecycleState::Downloaded);

        let prune = self.layout.prune_stale_versions(repository, version.name())?;
        let stale_left: Vec<PathBuf> = prune.failed.into_iter().map(|(path, _)| path).collect();

        let packages: Vec<Option<&str>> = if target.packages.is_empty() {
            vec![None]
        } else {
            target.packages.iter().map(|p| Some(p.trim_matches('/'))).collect()
        };

        // read every descriptor before writing any record
        let mut patches = Vec::with_capacity(packages.len());
        for package in &packages {
            let dir = match package {
                Some(package) => dest.join(package),
                None => dest.clone(),
            };
            let path = dir.join(PACKAGE_FILENAME);
            let metadata = PackageMetadata::from_path(&path).map_err(|e| Error::PackageMetadata {
                path: path.clone(),
                message: e.to_string(),
            })?;
            let key = record_key(repository, *package);
            let patch =
                metadata.to_patch(repository, *package, version.clone(), resolved.commit.clone());
            patches.push((key, dir, patch));
        }

        let mut keys = Vec::with_capacity(patches.len());
        let mut build_dirs = Vec::with_capacity(patches.len());
        for (key, dir, patch) in patches {
            self.store.upsert(&key, patch)?;
            keys.push(key);
            build_dirs.push(dir);
        }
        transition(repository, LifecycleState::ConfigUpdated);

        if self.settings.run_build {
            self.runner.install(&dest).await?;
            for dir in &build_dirs {
                self.runner.build(dir).await?;
            }
        }
        transition(repository, LifecycleState::Ready);
        tracing::info!(repository, %version, "installed");

        Ok(InstallOutcome {
            repository: repository.to_string(),
            version,
            keys,
            stale_left,
        })
    }

    // ------------------------------------------------------------------
    // update
    // ------------------------------------------------------------------

    /// Update the extension installed under `name` (key, repository or
    /// title) to the latest version of what it tracks.
    pub async fn update(&self, name: &str) -> Result<UpdateOutcome> {
        let (repository, records) = self.tracked_records(name).await?;
        self.update_repository(&repository, &records).await
    }

    /// Repository behind `name` and every record installed from it.
    async fn tracked_records(&self, name: &str) -> Result<(String, Vec<ExtensionRecord>)> {
        let key = self.choose_key(name, true).await?;
        let Some(record) = self.store.get(&key)? else {
            return Err(Error::NotInstalled(name.to_string()));
        };
        let repository = record.repository;
        let records = self
            .store
            .find_by_repository(&repository)?
            .into_iter()
            .map(|(_, record)| record)
            .collect();
        Ok((repository, records))
    }

    /// Update several installed extensions concurrently.
    ///
    /// Names that resolve to the same repository are updated once, under the
    /// first name given.
    pub async fn update_many(&self, names: &[String]) -> BatchReport<UpdateOutcome> {
        let mut report = BatchReport::default();
        let mut seen = HashSet::new();
        let mut groups = Vec::new();
        for name in names {
            match self.tracked_records(name).await {
                Ok((repository, records)) => {
                    if seen.insert(repository.clone()) {
                        groups.push((name.as_str(), repository, records));
                    } else {
                        tracing::debug!(name = %name, repository = %repository, "already queued for update");
                    }
                }
                Err(e) => report.record(name.as_str(), Err(e)),
            }
        }

        let results = join_all(
            groups
                .iter()
                .map(|(_, repository, records)| self.update_repository(repository, records)),
        )
        .await;

        for ((name, _, _), result) in groups.iter().zip(results) {
            report.record(*name, result);
        }
        report
    }

    /// Update every installed extension, once per repository.
    pub async fn update_all(&self) -> Result<BatchReport<UpdateOutcome>> {
        let mut groups: BTreeMap<String, Vec<ExtensionRecord>> = BTreeMap::new();
        for (_, record) in self.store.records()? {
            groups.entry(record.repository.clone()).or_default().push(record);
        }

        let results = join_all(
            groups
                .iter()
                .map(|(repository, records)| self.update_repository(repository, records)),
        )
        .await;

        let mut report = BatchReport::default();
        for (repository, result) in groups.keys().zip(results) {
            report.record(repository.as_str(), result);
        }
        Ok(report)
    }

    async fn update_repository(
        &self,
        repository: &str,
        records: &[ExtensionRecord],
    ) -> Result<UpdateOutcome> {
        let result = self.update_records(repository, records).await;
        match &result {
            Ok(UpdateOutcome::Updated { .. }) => transition(repository, LifecycleState::Updated),
            Ok(UpdateOutcome::AlreadyLatest { .. }) => {}
            Err(e) => abort(repository, e),
        }
        result
    }

    async fn update_records(
        &self,
        repository: &str,
        records: &[ExtensionRecord],
    ) -> Result<UpdateOutcome> {
        let Some(record) = records.first() else {
            return Err(Error::NotInstalled(repository.to_string()));
        };
        let packages: Vec<String> = records.iter().filter_map(|r| r.package.clone()).collect();
        let target = InstallTarget::new(repository).with_packages(packages);
        let current = record.version();

        match &current {
            Some(VersionRef::Branch(branch)) => {
                let branches = self.resolver.branches(repository).await?;
                let Some(remote) = branches.iter().find(|b| b.name == *branch) else {
                    let prompt =
                        format!("branch {branch} no longer exists on {repository}, reinstall it?");
                    return self.reinstall(&target, current.clone(), &prompt).await;
                };

                let installed_sha = record.commit.as_ref().map(|c| c.sha.as_str());
                if installed_sha == Some(remote.commit.sha.as_str()) {
                    tracing::info!(repository, branch = %branch, "already on the latest commit");
                    return Ok(UpdateOutcome::AlreadyLatest {
                        repository: repository.to_string(),
                        version: VersionRef::Branch(branch.clone()),
                    });
                }

                let resolved = ResolvedVersion {
                    version: VersionRef::Branch(branch.clone()),
                    commit: Some(remote.commit.clone()),
                    archive_url: self.resolver.branch_archive_url(repository, branch),
                };
                let install = self.install_resolved(&target, resolved, true).await?;
                Ok(UpdateOutcome::Updated {
                    from: current,
                    install,
                })
            }
            Some(VersionRef::Tag(tag)) => {
                let tags = self.resolver.tags(repository).await?;
                let Some(newest) = tags.first() else {
                    tracing::warn!(repository, "repository no longer has tags, keeping installed tag");
                    return Ok(UpdateOutcome::AlreadyLatest {
                        repository: repository.to_string(),
                        version: VersionRef::Tag(tag.clone()),
                    });
                };
                if newest.name == *tag {
                    tracing::info!(repository, tag = %tag, "already on the latest tag");
                    return Ok(UpdateOutcome::AlreadyLatest {
                        repository: repository.to_string(),
                        version: VersionRef::Tag(tag.clone()),
                    });
                }

                tracing::info!(repository, from = %tag, to = %newest.name, "updating");
                let resolved = ResolvedVersion {
                    version: VersionRef::Tag(newest.name.clone()),
                    commit: Some(newest.commit.clone()),
                    archive_url: newest.zipball_url.clone(),
                };
                let install = self.install_resolved(&target, resolved, true).await?;
                Ok(UpdateOutcome::Updated {
                    from: current,
                    install,
                })
            }
            None => {
                let prompt = format!("{repository} has no recorded version, reinstall it?");
                self.reinstall(&target, None, &prompt).await
            }
        }
    }

    /// Confirm, then run a full install from scratch.
    async fn reinstall(
        &self,
        target: &InstallTarget,
        from: Option<VersionRef>,
        prompt: &str,
    ) -> Result<UpdateOutcome> {
        require(self.decider.as_ref(), prompt, true).await?;
        let resolved = self
            .resolver
            .pick_version(&target.repository, &VersionHint::default())
            .await?;
        let install = self.install_resolved(target, resolved, true).await?;
        Ok(UpdateOutcome::Updated { from, install })
    }

    // ------------------------------------------------------------------
    // uninstall
    // ------------------------------------------------------------------

    /// Remove an extension's files and every manifest record of its
    /// repository. Removing something not installed is not an error.
    pub async fn uninstall(&self, name: &str) -> Result<UninstallOutcome> {
        let plan = self.plan_uninstall(name).await?;
        self.execute_uninstall(plan)
    }

    /// Uninstall several extensions. Every confirmation is asked before
    /// anything is deleted; declining one aborts the whole batch.
    pub async fn uninstall_all(&self, names: &[String]) -> Result<BatchReport<UninstallOutcome>> {
        let mut report = BatchReport::default();
        let mut plans = Vec::new();
        let mut seen = HashSet::new();

        for name in names {
            match self.plan_uninstall(name).await {
                Ok(plan) => {
                    let id = plan.repository.clone().unwrap_or_else(|| plan.name.clone());
                    if seen.insert(id) {
                        plans.push(plan);
                    }
                }
                Err(e) if e.is_cancelled() => {
                    tracing::info!(name = %name, "uninstall declined, nothing removed");
                    return Err(e);
                }
                Err(e) => report.record(name.as_str(), Err(e)),
            }
        }

        for plan in plans {
            let name = plan.name.clone();
            report.record(name, self.execute_uninstall(plan));
        }
        Ok(report)
    }

    async fn plan_uninstall(&self, name: &str) -> Result<UninstallPlan> {
        let keys = self.store.resolve(name)?;
        let mut repositories: Vec<String> = Vec::new();
        for key in &keys {
            if let Some(record) = self.store.get(key)? {
                if !repositories.contains(&record.repository) {
                    repositories.push(record.repository);
                }
            }
        }

        let repository = match repositories.len() {
            0 => {
                // nothing recorded; the name may still be a leftover directory
                return Ok(UninstallPlan {
                    name: name.to_string(),
                    repository: validate_repository_id(name).ok().map(|_| name.to_string()),
                    keys: Vec::new(),
                    titles: Vec::new(),
                });
            }
            1 => repositories.remove(0),
            _ => {
                if !self.settings.interactive {
                    return Err(Error::Ambiguous {
                        name: name.to_string(),
                        candidates: repositories,
                    });
                }
                let prompt = format!("several extensions match {name}, select one");
                let index = self.decider.select(&prompt, &repositories, 0).await?;
                repositories.get(index).cloned().ok_or(Error::Cancelled)?
            }
        };

        let records = self.store.find_by_repository(&repository)?;
        let titles: Vec<String> = records.iter().map(|(_, r)| r.title.clone()).collect();
        if records.len() > 1 {
            let prompt = format!("{} will be uninstalled, continue?", titles.join(", "));
            require(self.decider.as_ref(), &prompt, false).await?;
        }

        Ok(UninstallPlan {
            name: name.to_string(),
            keys: records.into_iter().map(|(key, _)| key).collect(),
            repository: Some(repository),
            titles,
        })
    }

    fn execute_uninstall(&self, plan: UninstallPlan) -> Result<UninstallOutcome> {
        let Some(repository) = plan.repository else {
            tracing::info!(name = %plan.name, "not installed");
            return Ok(UninstallOutcome::NotInstalled { name: plan.name });
        };

        match self.remove_repository(&repository) {
            Ok((false, keys)) if keys.is_empty() => {
                tracing::info!(name = %plan.name, "not installed");
                Ok(UninstallOutcome::NotInstalled { name: plan.name })
            }
            Ok((_, keys)) => {
                transition(&repository, LifecycleState::Removed);
                Ok(UninstallOutcome::Removed {
                    repository,
                    keys,
                    titles: plan.titles,
                })
            }
            Err(e) => {
                abort(&repository, &e);
                Err(e)
            }
        }
    }

    /// Files first, then records, so a failed delete keeps the record.
    fn remove_repository(&self, repository: &str) -> Result<(bool, Vec<String>)> {
        let removed_dir = self.layout.remove_extension(repository)?;
        let removed_keys = self.store.remove_repository(repository)?;
        Ok((removed_dir, removed_keys))
    }

    // ------------------------------------------------------------------
    // queries
    // ------------------------------------------------------------------

    /// Every installed record, ordered by key.
    pub fn list(&self) -> Result<Vec<(String, ExtensionRecord)>> {
        Ok(self.store.records()?)
    }

    /// The record installed under `name`, asking which one when several
    /// match.
    pub async fn view(&self, name: &str) -> Result<(String, ExtensionRecord)> {
        let key = self.choose_key(name, false).await?;
        match self.store.get(&key)? {
            Some(record) => Ok((key, record)),
            None => Err(Error::NotInstalled(name.to_string())),
        }
    }

    /// Resolve `name` to one manifest key.
    ///
    /// When several keys match, the decider chooses. Without a terminal, a
    /// `destructive` caller refuses to guess between different repositories.
    async fn choose_key(&self, name: &str, destructive: bool) -> Result<String> {
        let keys = self.store.resolve(name)?;
        match keys.len() {
            0 => Err(Error::NotInstalled(name.to_string())),
            1 => Ok(keys[0].clone()),
            _ => {
                if destructive && !self.settings.interactive && !self.same_repository(&keys)? {
                    return Err(Error::Ambiguous {
                        name: name.to_string(),
                        candidates: keys,
                    });
                }
                let default = keys.iter().position(|k| k == name).unwrap_or(0);
                let prompt = format!("several extensions match {name}, select one");
                let index = self.decider.select(&prompt, &keys, default).await?;
                keys.get(index).cloned().ok_or(Error::Cancelled)
            }
        }
    }

    fn same_repository(&self, keys: &[String]) -> Result<bool> {
        let mut repositories = HashSet::new();
        for key in keys {
            if let Some(record) = self.store.get(key)? {
                repositories.insert(record.repository);
            }
        }
        Ok(repositories.len() <= 1)
    }
}

fn abort(repository: &str, error: &Error) {
    transition(repository, LifecycleState::Aborted);
    if error.is_cancelled() {
        tracing::info!(repository, "aborted by user");
    } else {
        tracing::warn!(repository, error = %error, "failed");
    }
}
