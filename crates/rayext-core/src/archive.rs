//! Repository zipball unpacking
//!
//! Host archives wrap everything in one top-level directory
//! (`owner-name-<sha>/`). That component is dropped so the archive content
//! lands directly in the version directory.

use std::fs;
use std::io::{Cursor, Read};
use std::path::{Component, Path, PathBuf};

use zip::ZipArchive;

use crate::error::{Error, Result};

/// One archive member, relative to the archive root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    pub path: PathBuf,
    pub is_dir: bool,
    pub content: Vec<u8>,
}

/// Decode a zip archive, strip its top-level directory and reject members
/// that would escape the destination.
pub fn unpack(bytes: &[u8]) -> Result<Vec<ArchiveEntry>> {
    let mut archive =
        ZipArchive::new(Cursor::new(bytes)).map_err(|e| Error::Archive(e.to_string()))?;
    let mut entries = Vec::with_capacity(archive.len());

    for i in 0..archive.len() {
        let mut file = archive
            .by_index(i)
            .map_err(|e| Error::Archive(e.to_string()))?;
        let raw = file.name().replace('\\', "/");
        let Some(path) = strip_root(&raw)? else {
            continue;
        };

        let is_dir = file.is_dir();
        let mut content = Vec::new();
        if !is_dir {
            file.read_to_end(&mut content)
                .map_err(|e| Error::Archive(format!("{raw}: {e}")))?;
        }
        entries.push(ArchiveEntry {
            path,
            is_dir,
            content,
        });
    }
    Ok(entries)
}

/// Drop the first component. `None` for the root directory itself.
fn strip_root(raw: &str) -> Result<Option<PathBuf>> {
    let escapes = || Error::Archive(format!("archive entry escapes destination: {raw}"));
    let path = Path::new(raw);
    if path.has_root() {
        return Err(escapes());
    }

    let mut cleaned = PathBuf::new();
    for component in path.components().skip(1) {
        match component {
            Component::Prefix(_) | Component::RootDir | Component::ParentDir => {
                return Err(escapes());
            }
            Component::CurDir => {}
            Component::Normal(part) => cleaned.push(part),
        }
    }
    Ok((!cleaned.as_os_str().is_empty()).then_some(cleaned))
}

/// Write entries beneath `dest`, creating parents as needed.
pub fn write_entries(dest: &Path, entries: &[ArchiveEntry]) -> Result<usize> {
    fs::create_dir_all(dest).map_err(|e| Error::filesystem(dest, "create", e))?;
    let mut files = 0;
    for entry in entries {
        let out = dest.join(&entry.path);
        if entry.is_dir {
            fs::create_dir_all(&out).map_err(|e| Error::filesystem(&out, "create", e))?;
            continue;
        }
        if let Some(parent) = out.parent() {
            fs::create_dir_all(parent).map_err(|e| Error::filesystem(parent, "create", e))?;
        }
        fs::write(&out, &entry.content).map_err(|e| Error::filesystem(&out, "write", e))?;
        files += 1;
    }
    Ok(files)
}

/// Unpack `bytes` into `dest` on the blocking pool. Returns the number of
/// files written.
pub async fn extract(bytes: Vec<u8>, dest: PathBuf) -> Result<usize> {
    tokio::task::spawn_blocking(move || {
        let entries = unpack(&bytes)?;
        write_entries(&dest, &entries)
    })
    .await?
}
