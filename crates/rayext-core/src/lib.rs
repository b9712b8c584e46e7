//! Extension lifecycle and version resolution for rayext
//!
//! This crate turns a repository id and an optional version hint into an
//! installed extension:
//!
//! - [`VersionResolver`] picks the tag or branch to fetch
//! - [`ExtensionLayout`] owns `<root>/<owner>/<name>/<version>/`
//! - [`ExtensionManager`] drives install, update and uninstall and records
//!   results in the manifest
//!
//! User decisions come from an injected [`Decider`]; [`PolicyDecider`] is the
//! non-interactive implementation.

pub mod archive;
pub mod config;
pub mod decision;
pub mod error;
pub mod layout;
pub mod lifecycle;
pub mod resolver;
pub mod runner;

pub use config::{CONFIG_FILENAMES, Settings};
pub use decision::{Decider, PolicyDecider};
pub use error::{Error, Result};
pub use layout::{ExtensionLayout, PruneReport};
pub use lifecycle::{
    BatchReport, ExtensionManager, InstallOutcome, InstallTarget, LifecycleState,
    UninstallOutcome, UpdateOutcome,
};
pub use resolver::{ResolvedVersion, VersionHint, VersionResolver};
pub use runner::{NodePackageRunner, PackageManager, PackageRunner};
