//! Directory-backed record storage
//!
//! Every record is one file `{root}/{name}.cache`. Writes go to a
//! `.partial-*` temp file in the root and are renamed into place, so a
//! record is either the old complete bytes or the new complete bytes.
//! Eviction also sweeps partial files left by interrupted writes.

use crate::error::{CacheError, CacheResult};
use chrono::{DateTime, Utc};
use std::collections::BTreeSet;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tempfile::Builder;
use tracing::debug;

/// File extension of record files
pub const RECORD_EXTENSION: &str = "cache";

/// Name prefix of temp files holding writes in flight
const PARTIAL_PREFIX: &str = ".partial-";

/// Metadata about one stored record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordInfo {
    /// Record name (file stem)
    pub name: String,
    /// Size of the record file in bytes
    pub size: u64,
    /// Last modification time
    pub modified: DateTime<Utc>,
}

/// Directory of named records
#[derive(Debug, Clone)]
pub struct RecordStore {
    root: PathBuf,
}

impl RecordStore {
    /// Open a store rooted at `root`, creating the directory if missing
    pub fn new(root: impl Into<PathBuf>) -> CacheResult<Self> {
        let store = Self { root: root.into() };
        store.ensure_root()?;
        Ok(store)
    }

    /// Create the root directory and its ancestors if missing
    pub fn ensure_root(&self) -> CacheResult<()> {
        fs::create_dir_all(&self.root).map_err(|e| {
            CacheError::io(format!("creating cache directory {}", self.root.display()), e)
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the file backing `name`
    pub fn record_path(&self, name: &str) -> CacheResult<PathBuf> {
        validate_name(name)?;
        Ok(self.root.join(format!("{}.{}", name, RECORD_EXTENSION)))
    }

    /// Write `bytes` as record `name`, replacing any previous record
    pub fn write(&self, name: &str, bytes: &[u8]) -> CacheResult<()> {
        let path = self.record_path(name)?;
        self.ensure_root()?;

        let mut tmp = Builder::new()
            .prefix(PARTIAL_PREFIX)
            .tempfile_in(&self.root)
            .map_err(|e| CacheError::io(format!("creating temp file for {}", name), e))?;
        tmp.write_all(bytes)
            .map_err(|e| CacheError::io(format!("writing record {}", name), e))?;
        tmp.as_file()
            .sync_all()
            .map_err(|e| CacheError::io(format!("syncing record {}", name), e))?;
        tmp.persist(&path).map_err(|e| {
            CacheError::io(format!("renaming record into {}", path.display()), e.error)
        })?;

        debug!("Wrote record {} ({} bytes)", name, bytes.len());
        Ok(())
    }

    /// Read the bytes of record `name`
    pub fn read(&self, name: &str) -> CacheResult<Vec<u8>> {
        let path = self.record_path(name)?;
        match fs::read(&path) {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(CacheError::NotFound(name.to_string())),
            Err(e) => Err(CacheError::io(format!("reading record {}", path.display()), e)),
        }
    }

    /// Check whether record `name` exists
    pub fn contains(&self, name: &str) -> CacheResult<bool> {
        Ok(self.record_path(name)?.is_file())
    }

    /// Names of all records in the store
    ///
    /// A missing root directory yields an empty set.
    pub fn list(&self) -> CacheResult<BTreeSet<String>> {
        Ok(self.record_files()?.into_iter().map(|(name, _)| name).collect())
    }

    /// Names, sizes and modification times of all records
    pub fn entries(&self) -> CacheResult<Vec<RecordInfo>> {
        let mut infos = Vec::new();
        for (name, path) in self.record_files()? {
            let metadata = match fs::metadata(&path) {
                Ok(m) => m,
                // Removed between listing and stat
                Err(e) if e.kind() == ErrorKind::NotFound => continue,
                Err(e) => {
                    return Err(CacheError::io(format!("reading metadata of {}", path.display()), e))
                }
            };
            let modified = metadata
                .modified()
                .map_err(|e| CacheError::io(format!("reading mtime of {}", path.display()), e))?;
            infos.push(RecordInfo {
                name,
                size: metadata.len(),
                modified: modified.into(),
            });
        }
        infos.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(infos)
    }

    /// Remove record `name`; absent records are not an error
    pub fn remove(&self, name: &str) -> CacheResult<()> {
        let path = self.record_path(name)?;
        remove_file_if_present(&path)?;
        debug!("Removed record {}", name);
        Ok(())
    }

    /// Remove records last modified strictly before `cutoff`
    ///
    /// With no cutoff every record is removed. Returns the removed names.
    pub fn remove_older_than(&self, cutoff: Option<SystemTime>) -> CacheResult<Vec<String>> {
        let mut removed = Vec::new();

        for (name, path) in self.record_files()? {
            if is_older(&path, cutoff)? {
                remove_file_if_present(&path)?;
                removed.push(name);
            }
        }

        // Leftovers of interrupted writes; a write in progress is newer
        // than any past cutoff
        for path in self.partial_files()? {
            if is_older(&path, cutoff)? {
                debug!("Removing stale partial write {}", path.display());
                remove_file_if_present(&path)?;
            }
        }

        debug!("Removed {} record(s)", removed.len());
        Ok(removed)
    }

    /// Remove every record
    pub fn remove_all(&self) -> CacheResult<Vec<String>> {
        self.remove_older_than(None)
    }

    /// (name, path) of every record file, sorted by name
    fn record_files(&self) -> CacheResult<Vec<(String, PathBuf)>> {
        let mut files = Vec::new();
        for path in self.root_files()? {
            if path.extension().is_none_or(|ext| ext != RECORD_EXTENSION) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                files.push((stem.to_string(), path));
            }
        }

        files.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(files)
    }

    /// Temp files left in the root by writes that never completed
    fn partial_files(&self) -> CacheResult<Vec<PathBuf>> {
        Ok(self
            .root_files()?
            .into_iter()
            .filter(|path| {
                let prefixed = path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.starts_with(PARTIAL_PREFIX));
                prefixed && path.extension().is_none_or(|ext| ext != RECORD_EXTENSION)
            })
            .collect())
    }

    /// Regular files directly under the root; a missing root has none
    fn root_files(&self) -> CacheResult<Vec<PathBuf>> {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(CacheError::io(
                    format!("reading cache directory {}", self.root.display()),
                    e,
                ))
            }
        };

        let mut files = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| CacheError::io("reading cache entry", e))?;
            let path = entry.path();
            if path.is_file() {
                files.push(path);
            }
        }
        Ok(files)
    }
}

/// Whether `path` was last modified strictly before `cutoff`
///
/// No cutoff matches everything; a file that vanished matches nothing.
fn is_older(path: &Path, cutoff: Option<SystemTime>) -> CacheResult<bool> {
    let Some(cutoff) = cutoff else {
        return Ok(true);
    };
    match fs::metadata(path).and_then(|m| m.modified()) {
        Ok(modified) => Ok(modified < cutoff),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
        Err(e) => Err(CacheError::io(format!("reading mtime of {}", path.display()), e)),
    }
}

/// Reject names that would resolve outside the store root
fn validate_name(name: &str) -> CacheResult<()> {
    let reason = if name.is_empty() {
        "name is empty"
    } else if name.contains(['/', '\\']) {
        "name contains a path separator"
    } else if name == "." || name == ".." {
        "name is a relative path component"
    } else if name.contains('\0') {
        "name contains a NUL byte"
    } else {
        return Ok(());
    };

    Err(CacheError::InvalidName {
        name: name.to_string(),
        reason: reason.to_string(),
    })
}

fn remove_file_if_present(path: &Path) -> CacheResult<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(CacheError::io(format!("removing {}", path.display()), e)),
    }
}
