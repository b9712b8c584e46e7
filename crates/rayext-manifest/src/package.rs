//! Extension package descriptor (`package.json`)

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use rayext_github::GithubCommit;
use serde::Deserialize;
use serde_json::Value;

use crate::error::{Error, Result};
use crate::record::{CommandDescriptor, Person, PreferenceDescriptor, RecordPatch, VersionRef};

/// The fields of an extension's `package.json` that rayext reads.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageMetadata {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub license: Option<String>,
    #[serde(default)]
    pub author: Option<Person>,
    #[serde(default)]
    pub categories: BTreeSet<String>,
    #[serde(default)]
    pub contributors: Vec<Person>,
    #[serde(default)]
    pub commands: Vec<CommandDescriptor>,
    #[serde(default)]
    pub preferences: Vec<PreferenceDescriptor>,
    #[serde(default)]
    pub dependencies: BTreeMap<String, String>,
    #[serde(default)]
    pub dev_dependencies: BTreeMap<String, String>,
    #[serde(default)]
    pub optional_dependencies: BTreeMap<String, String>,
    #[serde(default)]
    pub peer_dependencies: BTreeMap<String, String>,
    /// Corepack-style `name@version` pin, e.g. `pnpm@9.1.0`.
    #[serde(default)]
    pub package_manager: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl PackageMetadata {
    /// Read `package.json` from `path`.
    pub fn from_path(path: &Path) -> Result<Self> {
        let content = match rayext_fs::io::read_text(path) {
            Ok(content) => content,
            Err(e) if e.is_not_found() => return Err(Error::PackageNotFound(path.to_path_buf())),
            Err(e) => return Err(e.into()),
        };
        Self::from_json(&content).map_err(|message| Error::PackageParse {
            path: path.to_path_buf(),
            message,
        })
    }

    /// Parse package metadata from a JSON string.
    pub fn from_json(content: &str) -> std::result::Result<Self, String> {
        serde_json::from_str(content).map_err(|e| e.to_string())
    }

    /// Display title: `title`, then `name`, then `fallback`.
    pub fn display_title(&self, fallback: &str) -> String {
        let present = |t: &&str| !t.trim().is_empty();
        self.title
            .as_deref()
            .filter(present)
            .or(self.name.as_deref().filter(present))
            .unwrap_or(fallback)
            .to_string()
    }

    /// Package manager name from the `packageManager` pin, if any.
    pub fn package_manager_name(&self) -> Option<&str> {
        let pin = self.package_manager.as_deref()?.trim();
        let name = match pin.strip_prefix('@') {
            Some(_) => pin,
            None => pin.split('@').next().unwrap_or(pin),
        };
        (!name.is_empty()).then_some(name)
    }

    /// Record fields derived from this package for an install of `repository`.
    pub fn to_patch(
        &self,
        repository: &str,
        package: Option<&str>,
        version: VersionRef,
        commit: Option<GithubCommit>,
    ) -> RecordPatch {
        RecordPatch {
            repository: Some(repository.to_string()),
            package: package.map(str::to_string),
            title: Some(self.display_title(repository)),
            url: Some(format!("https://github.com/{repository}")),
            description: self.description.clone(),
            license: self.license.clone(),
            author: self.author.clone(),
            categories: Some(self.categories.clone()),
            contributors: Some(self.contributors.clone()),
            commands: Some(self.commands.clone()),
            preferences: Some(self.preferences.clone()),
            dependencies: Some(self.dependencies.clone()),
            dev_dependencies: Some(self.dev_dependencies.clone()),
            optional_dependencies: Some(self.optional_dependencies.clone()),
            peer_dependencies: Some(self.peer_dependencies.clone()),
            version: Some(version),
            commit,
            extra: Default::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::TempDir;

    const PACKAGE: &str = r#"{
        "name": "demo",
        "title": "Demo Extension",
        "description": "Does demo things",
        "license": "MIT",
        "author": "jane",
        "categories": ["Productivity", "Developer Tools"],
        "commands": [{"name": "index", "title": "Open Demo", "mode": "view"}],
        "preferences": [{"name": "token", "type": "password", "required": true, "title": "Token"}],
        "dependencies": {"@raycast/api": "^1.70.0"},
        "devDependencies": {"typescript": "^5.0.0"},
        "packageManager": "pnpm@9.1.0",
        "scripts": {"build": "ray build"}
    }"#;

    #[test]
    fn test_from_json_reads_known_fields() {
        let package = PackageMetadata::from_json(PACKAGE).unwrap();

        assert_eq!(package.display_title("owner/demo"), "Demo Extension");
        assert_eq!(package.commands[0].display_name(), "Open Demo");
        assert!(package.preferences[0].required);
        assert_eq!(package.package_manager_name(), Some("pnpm"));
        assert!(package.extra.contains_key("scripts"));
    }

    #[test]
    fn test_title_falls_back_to_name_then_repository() {
        let named = PackageMetadata::from_json(r#"{"name": "demo"}"#).unwrap();
        let anonymous = PackageMetadata::from_json("{}").unwrap();
        assert_eq!(named.display_title("owner/demo"), "demo");
        assert_eq!(anonymous.display_title("owner/demo"), "owner/demo");
    }

    #[test]
    fn test_blank_title_falls_back_to_name() {
        let blank = PackageMetadata::from_json(r#"{"name": "demo", "title": ""}"#).unwrap();
        let both_blank = PackageMetadata::from_json(r#"{"name": " ", "title": ""}"#).unwrap();
        assert_eq!(blank.display_title("owner/demo"), "demo");
        assert_eq!(both_blank.display_title("owner/demo"), "owner/demo");
    }

    #[test]
    fn test_to_patch() {
        let package = PackageMetadata::from_json(PACKAGE).unwrap();
        let patch = package.to_patch(
            "owner/demo",
            Some("packages/a"),
            VersionRef::Tag("v1.0".into()),
            None,
        );

        assert_eq!(patch.url.as_deref(), Some("https://github.com/owner/demo"));
        assert_eq!(patch.package.as_deref(), Some("packages/a"));
        assert_eq!(patch.version, Some(VersionRef::Tag("v1.0".into())));
        assert_eq!(
            patch.dependencies.unwrap().get("@raycast/api").map(String::as_str),
            Some("^1.70.0")
        );
    }

    #[test]
    fn test_from_path_missing_and_malformed() {
        let temp = TempDir::new().unwrap();
        let missing = temp.path().join("package.json");
        assert!(matches!(
            PackageMetadata::from_path(&missing),
            Err(Error::PackageNotFound(_))
        ));

        fs::write(&missing, "{ nope").unwrap();
        assert!(matches!(
            PackageMetadata::from_path(&missing),
            Err(Error::PackageParse { .. })
        ));
    }
}
