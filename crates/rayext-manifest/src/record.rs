//! Installed extension records.
//!
//! Known fields are modeled explicitly; anything else found in a stored
//! record is kept in an open map and written back untouched.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use rayext_github::GithubCommit;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Manifest key for a repository, optionally suffixed with a monorepo
/// sub-package path.
pub fn record_key(repository: &str, package: Option<&str>) -> String {
    match package.map(|p| p.trim_matches('/')).filter(|p| !p.is_empty()) {
        Some(package) => format!("{repository}/{package}"),
        None => repository.to_string(),
    }
}

/// Which published version an installed extension tracks.
///
/// Tags are stable; branches float and are compared by commit on update.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum VersionRef {
    Tag(String),
    Branch(String),
}

impl VersionRef {
    /// The tag or branch name.
    pub fn name(&self) -> &str {
        match self {
            Self::Tag(name) | Self::Branch(name) => name,
        }
    }

    pub fn is_branch(&self) -> bool {
        matches!(self, Self::Branch(_))
    }
}

impl fmt::Display for VersionRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tag(name) => write!(f, "tag {name}"),
            Self::Branch(name) => write!(f, "branch {name}"),
        }
    }
}

/// An author or contributor: either a bare string or a structured entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Person {
    Name(String),
    Detailed {
        name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        email: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        url: Option<String>,
    },
}

impl Person {
    pub fn name(&self) -> &str {
        match self {
            Self::Name(name) => name,
            Self::Detailed { name, .. } => name,
        }
    }
}

/// A command declared by the extension, copied verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandDescriptor {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl CommandDescriptor {
    /// Title if present, else the command name.
    pub fn display_name(&self) -> &str {
        self.title.as_deref().unwrap_or(&self.name)
    }
}

/// A preference declared by the extension. `required` is always a boolean.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreferenceDescriptor {
    pub name: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl PreferenceDescriptor {
    /// Label, then title, then name.
    pub fn display_name(&self) -> &str {
        self.label
            .as_deref()
            .or(self.title.as_deref())
            .unwrap_or(&self.name)
    }
}

/// One installed extension, or one package of a monorepo-style extension.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtensionRecord {
    /// Source repository id (`owner/name`).
    #[serde(default)]
    pub repository: String,
    /// Monorepo sub-package path, relative to the version root.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package: Option<String>,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<Person>,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub categories: BTreeSet<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub contributors: Vec<Person>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub commands: Vec<CommandDescriptor>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub preferences: Vec<PreferenceDescriptor>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub dependencies: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub dev_dependencies: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub optional_dependencies: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub peer_dependencies: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commit: Option<GithubCommit>,
    /// Fields this version of rayext does not model.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl ExtensionRecord {
    /// The tracked version. A tag wins if a hand-edited record carries both.
    pub fn version(&self) -> Option<VersionRef> {
        match (&self.tag, &self.branch) {
            (Some(tag), _) => Some(VersionRef::Tag(tag.clone())),
            (None, Some(branch)) => Some(VersionRef::Branch(branch.clone())),
            (None, None) => None,
        }
    }

    /// Tag or branch name, or an empty string.
    pub fn version_name(&self) -> &str {
        self.tag
            .as_deref()
            .or(self.branch.as_deref())
            .unwrap_or_default()
    }

    pub fn set_version(&mut self, version: VersionRef) {
        match version {
            VersionRef::Tag(name) => {
                self.tag = Some(name);
                self.branch = None;
            }
            VersionRef::Branch(name) => {
                self.branch = Some(name);
                self.tag = None;
            }
        }
    }

    /// Create a record for `key` from a patch, filling required fields.
    ///
    /// A missing repository falls back to the key, a missing title to the
    /// repository.
    pub fn from_patch(key: &str, patch: RecordPatch) -> Self {
        let mut record = Self::default();
        record.apply(patch);
        if record.repository.is_empty() {
            record.repository = key.to_string();
        }
        if record.title.is_empty() {
            record.title = record.repository.clone();
        }
        record
    }

    /// Shallow field-level merge: every field set in `patch` overwrites,
    /// every field left unset is preserved.
    pub fn apply(&mut self, patch: RecordPatch) {
        let RecordPatch {
            repository,
            package,
            title,
            url,
            description,
            license,
            author,
            categories,
            contributors,
            commands,
            preferences,
            dependencies,
            dev_dependencies,
            optional_dependencies,
            peer_dependencies,
            version,
            commit,
            extra,
        } = patch;

        overwrite(&mut self.repository, repository);
        if package.is_some() {
            self.package = package;
        }
        overwrite(&mut self.title, title);
        if url.is_some() {
            self.url = url;
        }
        if description.is_some() {
            self.description = description;
        }
        if license.is_some() {
            self.license = license;
        }
        if author.is_some() {
            self.author = author;
        }
        overwrite(&mut self.categories, categories);
        overwrite(&mut self.contributors, contributors);
        overwrite(&mut self.commands, commands);
        overwrite(&mut self.preferences, preferences);
        overwrite(&mut self.dependencies, dependencies);
        overwrite(&mut self.dev_dependencies, dev_dependencies);
        overwrite(&mut self.optional_dependencies, optional_dependencies);
        overwrite(&mut self.peer_dependencies, peer_dependencies);
        if let Some(version) = version {
            self.set_version(version);
        }
        if commit.is_some() {
            self.commit = commit;
        }
        self.extra.extend(extra);
    }
}

fn overwrite<T>(slot: &mut T, value: Option<T>) {
    if let Some(value) = value {
        *slot = value;
    }
}

/// A partial [`ExtensionRecord`] for [`ManifestStore::upsert`](crate::ManifestStore::upsert).
///
/// `None` means "leave the stored value alone".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordPatch {
    pub repository: Option<String>,
    pub package: Option<String>,
    pub title: Option<String>,
    pub url: Option<String>,
    pub description: Option<String>,
    pub license: Option<String>,
    pub author: Option<Person>,
    pub categories: Option<BTreeSet<String>>,
    pub contributors: Option<Vec<Person>>,
    pub commands: Option<Vec<CommandDescriptor>>,
    pub preferences: Option<Vec<PreferenceDescriptor>>,
    pub dependencies: Option<BTreeMap<String, String>>,
    pub dev_dependencies: Option<BTreeMap<String, String>>,
    pub optional_dependencies: Option<BTreeMap<String, String>>,
    pub peer_dependencies: Option<BTreeMap<String, String>>,
    /// Setting a version clears the other pointer kind.
    pub version: Option<VersionRef>,
    pub commit: Option<GithubCommit>,
    pub extra: BTreeMap<String, Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn commit(sha: &str) -> GithubCommit {
        GithubCommit {
            sha: sha.into(),
            url: format!("https://api.github.com/commits/{sha}"),
        }
    }

    #[test]
    fn test_record_key() {
        assert_eq!(record_key("owner/demo", None), "owner/demo");
        assert_eq!(record_key("owner/demo", Some("")), "owner/demo");
        assert_eq!(
            record_key("owner/demo", Some("/packages/a/")),
            "owner/demo/packages/a"
        );
    }

    #[test]
    fn test_apply_preserves_unset_fields() {
        let mut record = ExtensionRecord::from_patch(
            "owner/demo",
            RecordPatch {
                title: Some("Demo".into()),
                description: Some("first".into()),
                version: Some(VersionRef::Tag("v1.0".into())),
                commit: Some(commit("aaa")),
                ..Default::default()
            },
        );

        record.apply(RecordPatch {
            description: Some("second".into()),
            ..Default::default()
        });

        assert_eq!(record.title, "Demo");
        assert_eq!(record.description.as_deref(), Some("second"));
        assert_eq!(record.tag.as_deref(), Some("v1.0"));
        assert_eq!(record.commit, Some(commit("aaa")));
    }

    #[test]
    fn test_version_pointers_are_exclusive() {
        let mut record = ExtensionRecord::from_patch(
            "owner/demo",
            RecordPatch {
                version: Some(VersionRef::Branch("main".into())),
                ..Default::default()
            },
        );
        assert_eq!(record.version(), Some(VersionRef::Branch("main".into())));

        record.apply(RecordPatch {
            version: Some(VersionRef::Tag("v2.0".into())),
            ..Default::default()
        });

        assert_eq!(record.branch, None);
        assert_eq!(record.version(), Some(VersionRef::Tag("v2.0".into())));
        assert_eq!(record.version_name(), "v2.0");
    }

    #[test]
    fn test_from_patch_fills_required_fields() {
        let record = ExtensionRecord::from_patch("owner/demo", RecordPatch::default());
        assert_eq!(record.repository, "owner/demo");
        assert_eq!(record.title, "owner/demo");
    }

    #[test]
    fn test_unknown_fields_survive_serialization() {
        let json = r#"{
            "repository": "owner/demo",
            "title": "Demo",
            "tag": "v1.0",
            "installedBy": "someone",
            "preferences": [{"name": "apiKey", "type": "password", "data": [1, 2]}]
        }"#;
        let record: ExtensionRecord = serde_json::from_str(json).unwrap();

        assert_eq!(
            record.extra.get("installedBy"),
            Some(&Value::String("someone".into()))
        );
        assert!(!record.preferences[0].required);
        assert!(record.preferences[0].extra.contains_key("data"));

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["installedBy"], "someone");
        assert_eq!(value["preferences"][0]["required"], false);
        assert!(value.get("branch").is_none());
    }

    #[test]
    fn test_person_forms() {
        let plain: Person = serde_json::from_str(r#""Jane""#).unwrap();
        let detailed: Person =
            serde_json::from_str(r#"{"name": "Jane", "email": "jane@example.com"}"#).unwrap();
        assert_eq!(plain.name(), "Jane");
        assert_eq!(detailed.name(), "Jane");
        assert!(matches!(detailed, Person::Detailed { email: Some(_), .. }));
    }
}
