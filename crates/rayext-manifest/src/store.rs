//! Durable manifest storage
//!
//! The manifest is cached lazily for the lifetime of a [`ManifestStore`].
//! Every mutation re-reads the document from disk under an in-process mutex
//! and a cross-process advisory lock, applies the change and writes the full
//! document back atomically.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use rayext_fs::FileLock;
use rayext_fs::io::{read_text_if_exists, write_atomic};

use crate::MANIFEST_FILENAME;
use crate::error::Result;
use crate::record::{ExtensionRecord, RecordPatch};

/// Extension key to installed record, ordered by key.
pub type Manifest = BTreeMap<String, ExtensionRecord>;

/// What was found on disk.
enum Disk {
    Missing,
    Malformed,
    Parsed(Manifest),
}

#[derive(Debug, Default)]
struct State {
    /// `None` until first read; `Some(None)` when the manifest is absent.
    cache: Option<Option<Manifest>>,
}

/// Reads and writes `<root>/manifest.json`.
#[derive(Debug)]
pub struct ManifestStore {
    path: PathBuf,
    lock_path: PathBuf,
    state: Mutex<State>,
}

impl ManifestStore {
    /// Store for the manifest under the extensions `root`.
    pub fn new(root: impl AsRef<Path>) -> Self {
        let path = root.as_ref().join(MANIFEST_FILENAME);
        let lock_path = path.with_file_name(format!("{MANIFEST_FILENAME}.lock"));
        Self {
            path,
            lock_path,
            state: Mutex::new(State::default()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn backup_path(&self) -> PathBuf {
        self.path.with_file_name(format!("{MANIFEST_FILENAME}.bak"))
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn read_disk(&self) -> Result<Disk> {
        let Some(content) = read_text_if_exists(&self.path)? else {
            return Ok(Disk::Missing);
        };
        match serde_json::from_str::<Manifest>(&content) {
            Ok(mut manifest) => {
                for (key, record) in manifest.iter_mut() {
                    if record.repository.is_empty() {
                        record.repository = key.clone();
                    }
                }
                Ok(Disk::Parsed(manifest))
            }
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "manifest is malformed, treating it as absent"
                );
                Ok(Disk::Malformed)
            }
        }
    }

    fn write(&self, manifest: &Manifest) -> Result<()> {
        let content = serde_json::to_string_pretty(manifest)?;
        write_atomic(&self.path, content.as_bytes())?;
        tracing::debug!(path = %self.path.display(), records = manifest.len(), "manifest written");
        Ok(())
    }

    /// Preserve the malformed document before it is replaced.
    fn backup(&self) -> Result<()> {
        if let Some(content) = read_text_if_exists(&self.path)? {
            let backup = self.backup_path();
            write_atomic(&backup, content.as_bytes())?;
            tracing::warn!(backup = %backup.display(), "malformed manifest backed up");
        }
        Ok(())
    }

    /// Load the manifest, or `None` when none exists or it is malformed.
    pub fn load(&self) -> Result<Option<Manifest>> {
        let mut state = self.state();
        if let Some(cached) = &state.cache {
            return Ok(cached.clone());
        }
        let manifest = match self.read_disk()? {
            Disk::Parsed(manifest) => Some(manifest),
            Disk::Missing | Disk::Malformed => None,
        };
        state.cache = Some(manifest.clone());
        Ok(manifest)
    }

    /// Replace the whole document.
    pub fn save(&self, manifest: &Manifest) -> Result<()> {
        let mut state = self.state();
        let _lock = FileLock::acquire(&self.lock_path)?;
        if let Disk::Malformed = self.read_disk()? {
            self.backup()?;
        }
        self.write(manifest)?;
        state.cache = Some(Some(manifest.clone()));
        Ok(())
    }

    /// Run one load-modify-save cycle. Nothing is written when `f` leaves
    /// the document unchanged.
    fn mutate<R>(&self, f: impl FnOnce(&mut Manifest) -> R) -> Result<R> {
        let mut state = self.state();
        let _lock = FileLock::acquire(&self.lock_path)?;

        let disk = self.read_disk()?;
        let malformed = matches!(disk, Disk::Malformed);
        let existed = matches!(disk, Disk::Parsed(_));
        let mut manifest = match disk {
            Disk::Parsed(manifest) => manifest,
            Disk::Missing | Disk::Malformed => Manifest::new(),
        };

        let before = manifest.clone();
        let out = f(&mut manifest);

        if manifest != before {
            if malformed {
                self.backup()?;
            }
            self.write(&manifest)?;
            state.cache = Some(Some(manifest));
        } else {
            state.cache = Some(existed.then_some(manifest));
        }
        Ok(out)
    }

    /// Every record, ordered by key.
    pub fn records(&self) -> Result<Vec<(String, ExtensionRecord)>> {
        Ok(self.load()?.unwrap_or_default().into_iter().collect())
    }

    /// Record stored under `name`, or the first record (by key) whose title
    /// equals `name`.
    pub fn get(&self, name: &str) -> Result<Option<ExtensionRecord>> {
        let Some(manifest) = self.load()? else {
            return Ok(None);
        };
        if let Some(record) = manifest.get(name) {
            return Ok(Some(record.clone()));
        }
        Ok(manifest.into_values().find(|record| record.title == name))
    }

    /// Keys of every record whose key, repository or title equals `name`.
    ///
    /// More than one key means the caller has to disambiguate.
    pub fn resolve(&self, name: &str) -> Result<Vec<String>> {
        let manifest = self.load()?.unwrap_or_default();
        Ok(manifest
            .iter()
            .filter(|(key, record)| {
                key.as_str() == name || record.repository == name || record.title == name
            })
            .map(|(key, _)| key.clone())
            .collect())
    }

    /// Every record installed from `repository`.
    pub fn find_by_repository(&self, repository: &str) -> Result<Vec<(String, ExtensionRecord)>> {
        let manifest = self.load()?.unwrap_or_default();
        Ok(manifest
            .into_iter()
            .filter(|(_, record)| record.repository == repository)
            .collect())
    }

    /// Merge `patch` into the record under `key`, creating it if needed.
    pub fn upsert(&self, key: &str, patch: RecordPatch) -> Result<ExtensionRecord> {
        self.mutate(|manifest| {
            let record = match manifest.remove(key) {
                Some(mut existing) => {
                    existing.apply(patch);
                    existing
                }
                None => ExtensionRecord::from_patch(key, patch),
            };
            manifest.insert(key.to_string(), record.clone());
            record
        })
    }

    /// Delete one key.
    pub fn remove(&self, key: &str) -> Result<Option<ExtensionRecord>> {
        self.mutate(|manifest| manifest.remove(key))
    }

    /// Delete every record installed from `repository`, returning their keys.
    pub fn remove_repository(&self, repository: &str) -> Result<Vec<String>> {
        self.mutate(|manifest| {
            let keys: Vec<String> = manifest
                .iter()
                .filter(|(_, record)| record.repository == repository)
                .map(|(key, _)| key.clone())
                .collect();
            for key in &keys {
                manifest.remove(key);
            }
            keys
        })
    }
}
