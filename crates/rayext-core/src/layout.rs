//! On-disk extension layout
//!
//! ```text
//! <root>/
//!   manifest.json
//!   <owner>/<name>/          base path, removed on uninstall
//!     <version>/             one per installed tag or branch
//!     .staging-*/            in-flight unpack, swapped in by rename
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use rayext_fs::{decode_version_dir, encode_version_dir, validate_repository_id};
use tempfile::TempDir;

use crate::error::{Error, Result};

/// Version directories removed, and those that could not be removed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PruneReport {
    pub removed: Vec<PathBuf>,
    pub failed: Vec<(PathBuf, String)>,
}

impl PruneReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

const STAGING_PREFIX: &str = ".staging-";

/// Scratch directory beside the version directories of one repository.
///
/// Dropping it removes whatever is left inside, including a replaced version.
#[derive(Debug)]
pub struct StagedVersion {
    dir: TempDir,
}

impl StagedVersion {
    /// Where the new version is unpacked.
    pub fn path(&self) -> PathBuf {
        self.dir.path().join("new")
    }

    fn retired(&self) -> PathBuf {
        self.dir.path().join("old")
    }
}

/// Computes and maintains `<root>/<owner>/<name>/<version>`.
#[derive(Debug, Clone)]
pub struct ExtensionLayout {
    root: PathBuf,
}

impl ExtensionLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the root directory if missing.
    pub fn ensure_root(&self) -> Result<()> {
        fs::create_dir_all(&self.root).map_err(|e| Error::filesystem(&self.root, "create", e))
    }

    /// `<root>/<owner>/<name>`. Fails for malformed repository ids.
    pub fn base_path(&self, repository: &str) -> Result<PathBuf> {
        validate_repository_id(repository)?;
        Ok(self.root.join(repository))
    }

    /// `<root>/<owner>/<name>/<version>` with the version name encoded as a
    /// single path component.
    pub fn version_path(&self, repository: &str, version: &str) -> Result<PathBuf> {
        Ok(self.base_path(repository)?.join(encode_version_dir(version)))
    }

    /// Decoded names of the version directories present for `repository`.
    pub fn installed_versions(&self, repository: &str) -> Result<Vec<String>> {
        let mut versions: Vec<String> = self
            .version_dirs(repository)?
            .iter()
            .filter_map(|path| path.file_name())
            .map(|name| decode_version_dir(&name.to_string_lossy()))
            .collect();
        versions.sort();
        Ok(versions)
    }

    fn version_dirs(&self, repository: &str) -> Result<Vec<PathBuf>> {
        let base = self.base_path(repository)?;
        let entries = match fs::read_dir(&base) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(Error::filesystem(&base, "read", e)),
        };

        let mut dirs = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| Error::filesystem(&base, "read", e))?;
            let staging = entry.file_name().to_string_lossy().starts_with(STAGING_PREFIX);
            if !staging && entry.file_type().map(|t| t.is_dir()).unwrap_or(false) {
                dirs.push(entry.path());
            }
        }
        Ok(dirs)
    }

    /// Create a staging directory under the base path of `repository`.
    pub fn stage(&self, repository: &str) -> Result<StagedVersion> {
        let base = self.base_path(repository)?;
        fs::create_dir_all(&base).map_err(|e| Error::filesystem(&base, "create", e))?;
        let dir = tempfile::Builder::new()
            .prefix(STAGING_PREFIX)
            .tempdir_in(&base)
            .map_err(|e| Error::filesystem(&base, "create", e))?;
        Ok(StagedVersion { dir })
    }

    /// Move a staged version into `dest`, replacing any existing directory.
    ///
    /// The old directory is renamed aside first and restored if the new one
    /// cannot be moved in, so `dest` is never left missing on failure.
    pub fn commit(&self, staged: StagedVersion, dest: &Path) -> Result<()> {
        let retired = staged.retired();
        let replacing = dest.exists();
        if replacing {
            fs::rename(dest, &retired).map_err(|e| Error::filesystem(dest, "replace", e))?;
        }
        if let Err(e) = fs::rename(staged.path(), dest) {
            if replacing {
                if let Err(restore) = fs::rename(&retired, dest) {
                    tracing::warn!(path = %dest.display(), error = %restore, "failed to restore previous version");
                }
            }
            return Err(Error::filesystem(dest, "replace", e));
        }
        tracing::debug!(path = %dest.display(), replacing, "staged version committed");
        Ok(())
    }

    /// Delete every version directory of `repository` other than `keep`.
    ///
    /// A missing base path is a no-op. Individual removal failures are
    /// collected in the report instead of failing the call.
    pub fn prune_stale_versions(&self, repository: &str, keep: &str) -> Result<PruneReport> {
        let keep = encode_version_dir(keep);
        let mut report = PruneReport::default();

        for dir in self.version_dirs(repository)? {
            if dir.file_name().is_some_and(|name| name.to_string_lossy() == keep) {
                continue;
            }
            match fs::remove_dir_all(&dir) {
                Ok(()) => {
                    tracing::debug!(path = %dir.display(), "stale version removed");
                    report.removed.push(dir);
                }
                Err(e) => {
                    tracing::warn!(path = %dir.display(), error = %e, "failed to remove stale version");
                    report.failed.push((dir, e.to_string()));
                }
            }
        }
        Ok(report)
    }

    /// Remove `<root>/<owner>/<name>` and, when it is left empty, the owner
    /// directory. Returns `false` when nothing was installed.
    pub fn remove_extension(&self, repository: &str) -> Result<bool> {
        let base = self.base_path(repository)?;
        let removed = rayext_fs::io::remove_dir_all_if_exists(&base)?;
        if let Some(owner) = base.parent().filter(|p| *p != self.root.as_path()) {
            // only succeeds when empty
            let _ = fs::remove_dir(owner);
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn layout() -> (TempDir, ExtensionLayout) {
        let temp = TempDir::new().unwrap();
        let layout = ExtensionLayout::new(temp.path().join("root"));
        (temp, layout)
    }

    #[test]
    fn test_paths() {
        let (_temp, layout) = layout();
        assert_eq!(
            layout.version_path("owner/demo", "feature/x").unwrap(),
            layout.root().join("owner").join("demo").join("feature%2Fx")
        );
        assert!(layout.base_path("../escape").is_err());
        assert!(layout.version_path("owner/demo/extra", "v1").is_err());
    }

    #[test]
    fn test_ensure_root_is_idempotent() {
        let (_temp, layout) = layout();
        layout.ensure_root().unwrap();
        layout.ensure_root().unwrap();
        assert!(layout.root().is_dir());
    }

    #[test]
    fn test_prune_missing_base_is_noop() {
        let (_temp, layout) = layout();
        let report = layout.prune_stale_versions("owner/demo", "v1.0").unwrap();
        assert_eq!(report, PruneReport::default());
    }

    #[test]
    fn test_prune_keeps_only_current_version() {
        let (_temp, layout) = layout();
        for version in ["v1.0", "v1.1", "feature/x", "v2.0"] {
            fs::create_dir_all(layout.version_path("owner/demo", version).unwrap()).unwrap();
        }
        let stray_file = layout.base_path("owner/demo").unwrap().join("notes.txt");
        fs::write(&stray_file, "kept").unwrap();

        let report = layout.prune_stale_versions("owner/demo", "v2.0").unwrap();

        assert_eq!(report.removed.len(), 3);
        assert!(report.is_clean());
        assert_eq!(layout.installed_versions("owner/demo").unwrap(), vec!["v2.0"]);
        assert!(stray_file.exists());
    }

    #[test]
    fn test_prune_keeps_encoded_branch() {
        let (_temp, layout) = layout();
        for version in ["main", "feature/x"] {
            fs::create_dir_all(layout.version_path("owner/demo", version).unwrap()).unwrap();
        }

        layout.prune_stale_versions("owner/demo", "feature/x").unwrap();

        assert_eq!(
            layout.installed_versions("owner/demo").unwrap(),
            vec!["feature/x"]
        );
    }

    #[test]
    fn test_commit_replaces_existing_version() {
        let (_temp, layout) = layout();
        let dest = layout.version_path("owner/demo", "main").unwrap();
        fs::create_dir_all(&dest).unwrap();
        fs::write(dest.join("old.txt"), "old").unwrap();

        let staged = layout.stage("owner/demo").unwrap();
        fs::create_dir_all(staged.path()).unwrap();
        fs::write(staged.path().join("new.txt"), "new").unwrap();
        assert_eq!(layout.installed_versions("owner/demo").unwrap(), vec!["main"]);

        layout.commit(staged, &dest).unwrap();

        assert!(dest.join("new.txt").exists());
        assert!(!dest.join("old.txt").exists());
        assert_eq!(
            fs::read_dir(layout.base_path("owner/demo").unwrap()).unwrap().count(),
            1
        );
    }

    #[test]
    fn test_dropped_stage_leaves_version_untouched() {
        let (_temp, layout) = layout();
        let dest = layout.version_path("owner/demo", "main").unwrap();
        fs::create_dir_all(&dest).unwrap();
        fs::write(dest.join("package.json"), "{}").unwrap();

        let staged = layout.stage("owner/demo").unwrap();
        fs::create_dir_all(staged.path()).unwrap();
        drop(staged);

        assert!(dest.join("package.json").exists());
        assert_eq!(
            fs::read_dir(layout.base_path("owner/demo").unwrap()).unwrap().count(),
            1
        );
    }

    #[test]
    fn test_remove_extension() {
        let (_temp, layout) = layout();
        fs::create_dir_all(layout.version_path("owner/demo", "v1.0").unwrap()).unwrap();
        fs::create_dir_all(layout.version_path("owner/other", "v1.0").unwrap()).unwrap();

        assert!(layout.remove_extension("owner/demo").unwrap());
        assert!(!layout.base_path("owner/demo").unwrap().exists());
        assert!(layout.root().join("owner").is_dir());

        assert!(layout.remove_extension("owner/other").unwrap());
        assert!(!layout.root().join("owner").exists());

        assert!(!layout.remove_extension("owner/demo").unwrap());
    }
}
