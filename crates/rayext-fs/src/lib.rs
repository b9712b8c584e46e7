//! Filesystem primitives for rayext
//!
//! Provides locked atomic writes, path identifier validation and
//! format-agnostic configuration loading.

pub mod config;
pub mod error;
pub mod io;
pub mod path;

pub use config::ConfigStore;
pub use error::{Error, Result};
pub use io::FileLock;
pub use path::{decode_version_dir, encode_version_dir, validate_repository_id};
