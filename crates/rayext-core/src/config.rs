//! Runtime settings
//!
//! Precedence is built-in defaults, then a project config file, then
//! whatever the caller overrides (command-line flags).

use std::path::{Path, PathBuf};

use rayext_fs::ConfigStore;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Config file names looked up in the working directory, in order.
pub const CONFIG_FILENAMES: &[&str] = &["rayext.toml", "rayext.json", "rayext.yaml", "rayext.yml"];

/// Default number of retries for each remote request.
pub const DEFAULT_RETRIES: u32 = 5;

/// Directory under the home directory used when no root is configured.
pub const DEFAULT_ROOT_DIR: &str = ".rayext";

/// Settings threaded through every component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Extensions root: holds `manifest.json` and one directory per extension.
    pub root: PathBuf,
    /// Additional attempts for each remote request.
    pub retries: u32,
    pub token: Option<String>,
    /// Pre-authorize overwrites and confirmations.
    pub assume_yes: bool,
    /// Monorepo sub-package paths, relative to the version root.
    pub packages: Vec<String>,
    /// Whether a human can answer prompts.
    pub interactive: bool,
    /// Run the package install and develop build after unpacking.
    pub run_build: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            root: default_root(),
            retries: DEFAULT_RETRIES,
            token: None,
            assume_yes: false,
            packages: Vec::new(),
            interactive: true,
            run_build: true,
        }
    }
}

/// `~/.rayext`, or `./.rayext` when no home directory is known.
pub fn default_root() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(DEFAULT_ROOT_DIR)
}

/// On-disk form: every field optional so a file only overrides what it sets.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
struct SettingsFile {
    root: Option<String>,
    retries: Option<u32>,
    token: Option<String>,
    yes: Option<bool>,
    packages: Option<Vec<String>>,
    interactive: Option<bool>,
    build: Option<bool>,
}

impl Settings {
    /// Defaults merged with the config file at `explicit`, or the first of
    /// [`CONFIG_FILENAMES`] found in `dir`.
    pub fn load(dir: &Path, explicit: Option<&Path>) -> Result<Self> {
        let mut settings = Self::default();
        let path = match explicit {
            Some(path) => Some(path.to_path_buf()),
            None => find_config_file(dir),
        };
        if let Some(path) = path {
            tracing::debug!(path = %path.display(), "loading config file");
            let file: SettingsFile = ConfigStore::new().load(&path)?;
            settings.merge(file);
        }
        Ok(settings)
    }

    fn merge(&mut self, file: SettingsFile) {
        if let Some(root) = file.root {
            self.root = expand_home(&root);
        }
        if let Some(retries) = file.retries {
            self.retries = retries;
        }
        if file.token.is_some() {
            self.token = file.token;
        }
        if let Some(yes) = file.yes {
            self.assume_yes = yes;
        }
        if let Some(packages) = file.packages {
            self.packages = packages;
        }
        if let Some(interactive) = file.interactive {
            self.interactive = interactive;
        }
        if let Some(build) = file.build {
            self.run_build = build;
        }
    }
}

fn find_config_file(dir: &Path) -> Option<PathBuf> {
    CONFIG_FILENAMES
        .iter()
        .map(|name| dir.join(name))
        .find(|path| path.is_file())
}

fn expand_home(path: &str) -> PathBuf {
    match (path.strip_prefix("~/"), dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest),
        _ if path == "~" => dirs::home_dir().unwrap_or_else(|| PathBuf::from(path)),
        _ => PathBuf::from(path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_without_file() {
        let temp = TempDir::new().unwrap();
        let settings = Settings::load(temp.path(), None).unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.retries, 5);
        assert!(settings.root.ends_with(".rayext"));
    }

    #[test]
    fn test_file_overrides_defaults() {
        let temp = TempDir::new().unwrap();
        fs::write(
            temp.path().join("rayext.toml"),
            "root = \"/opt/ext\"\nretries = 2\npackages = [\"packages/a\"]\nbuild = false\n",
        )
        .unwrap();

        let settings = Settings::load(temp.path(), None).unwrap();

        assert_eq!(settings.root, PathBuf::from("/opt/ext"));
        assert_eq!(settings.retries, 2);
        assert_eq!(settings.packages, vec!["packages/a"]);
        assert!(!settings.run_build);
        assert!(settings.interactive);
    }

    #[test]
    fn test_first_config_file_wins() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("rayext.json"), r#"{"retries": 9}"#).unwrap();
        fs::write(temp.path().join("rayext.yml"), "retries: 1\n").unwrap();

        let settings = Settings::load(temp.path(), None).unwrap();
        assert_eq!(settings.retries, 9);
    }

    #[test]
    fn test_explicit_config_path() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("custom.yaml");
        fs::write(&path, "yes: true\ninteractive: false\n").unwrap();

        let settings = Settings::load(Path::new("/nonexistent"), Some(&path)).unwrap();
        assert!(settings.assume_yes);
        assert!(!settings.interactive);
    }

    #[test]
    fn test_expand_home() {
        assert_eq!(expand_home("/abs/path"), PathBuf::from("/abs/path"));
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_home("~/ext"), home.join("ext"));
        }
    }
}
