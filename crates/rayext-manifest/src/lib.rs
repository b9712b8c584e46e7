//! Installed extension manifest for rayext.
//!
//! The manifest is a single JSON document mapping extension keys to
//! [`ExtensionRecord`]s. [`ManifestStore`] owns reading and writing it;
//! [`PackageMetadata`] reads the `package.json` an extension ships with and
//! derives the record fields from it.

pub mod error;
pub mod package;
pub mod record;
pub mod store;

/// File name of the manifest under the extensions root.
pub const MANIFEST_FILENAME: &str = "manifest.json";

/// File name of an extension's own package descriptor.
pub const PACKAGE_FILENAME: &str = "package.json";

pub use error::{Error, Result};
pub use package::PackageMetadata;
pub use record::{
    CommandDescriptor, ExtensionRecord, Person, PreferenceDescriptor, RecordPatch, VersionRef,
    record_key,
};
pub use rayext_github::GithubCommit;
pub use store::{Manifest, ManifestStore};
