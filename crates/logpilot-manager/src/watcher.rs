//! Polling watcher for one configuration directory.
//!
//! Each poll diffs the directory against the previous snapshot and reports
//! configuration files that appeared, changed or disappeared. A change is
//! a change of content: files whose modification time or size moved are
//! re-read and hashed, and only a different digest yields `Modified`.

use logpilot_domain::resolve_path;
use std::collections::hash_map::{DefaultHasher, Entry};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::hash::Hasher;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Change to a configuration file, carrying its absolute path
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigEvent {
    /// File appeared (or was present at the first scan)
    Added(PathBuf),
    /// File content changed
    Modified(PathBuf),
    /// File disappeared
    Removed(PathBuf),
}

impl ConfigEvent {
    /// Path of the configuration file
    pub fn path(&self) -> &Path {
        match self {
            ConfigEvent::Added(p) | ConfigEvent::Modified(p) | ConfigEvent::Removed(p) => p,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FileState {
    modified: SystemTime,
    size: u64,
    digest: u64,
}

/// Snapshot-diffing watcher over a single directory
#[derive(Debug)]
pub struct ConfigWatcher {
    dir: PathBuf,
    suffix: String,
    files: HashMap<PathBuf, FileState>,
}

impl ConfigWatcher {
    /// Create a watcher; the directory does not need to exist yet.
    ///
    /// An existing directory is keyed by its canonical path, so two
    /// spellings of it compare equal.
    pub fn new(dir: &Path, suffix: impl Into<String>) -> io::Result<Self> {
        Ok(Self {
            dir: resolve_path(dir)?,
            suffix: suffix.into(),
            files: HashMap::new(),
        })
    }

    /// Canonical (or, while missing, absolute) path of the watched directory
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Number of configuration files in the last snapshot
    pub fn known_files(&self) -> usize {
        self.files.len()
    }

    /// Scan the directory and return what changed since the last scan.
    ///
    /// A missing directory is `ErrorKind::NotFound`, except on the scan
    /// where it vanishes: that one reports every known file as removed.
    pub fn poll(&mut self) -> io::Result<Vec<ConfigEvent>> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound && !self.files.is_empty() => {
                let mut removed: Vec<PathBuf> = self.files.drain().map(|(p, _)| p).collect();
                removed.sort();
                return Ok(removed.into_iter().map(ConfigEvent::Removed).collect());
            }
            Err(e) => return Err(e),
        };

        let mut candidates: Vec<PathBuf> = entries
            .flatten()
            .filter(|entry| entry.file_name().to_string_lossy().ends_with(&self.suffix))
            .map(|entry| entry.path())
            .collect();
        candidates.sort();

        let mut seen: HashSet<PathBuf> = HashSet::with_capacity(candidates.len());
        let mut events = Vec::new();

        for path in candidates {
            // Follows symlinks: a linked configuration counts as a file.
            let metadata = match fs::metadata(&path) {
                Ok(m) if m.is_file() => m,
                _ => continue,
            };
            let modified = metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH);
            let size = metadata.len();

            match self.files.entry(path) {
                Entry::Vacant(entry) => match digest_of(entry.key()) {
                    Ok(digest) => {
                        seen.insert(entry.key().clone());
                        events.push(ConfigEvent::Added(entry.key().clone()));
                        entry.insert(FileState {
                            modified,
                            size,
                            digest,
                        });
                    }
                    Err(e) => {
                        tracing::warn!("Cannot read {}: {}", entry.key().display(), e);
                    }
                },
                Entry::Occupied(mut entry) => {
                    seen.insert(entry.key().clone());
                    let old = *entry.get();
                    if old.modified == modified && old.size == size {
                        continue;
                    }
                    match digest_of(entry.key()) {
                        Ok(digest) => {
                            if digest != old.digest {
                                events.push(ConfigEvent::Modified(entry.key().clone()));
                            }
                            entry.insert(FileState {
                                modified,
                                size,
                                digest,
                            });
                        }
                        // Keep the old snapshot; the next scan retries.
                        Err(e) => {
                            tracing::warn!("Cannot read {}: {}", entry.key().display(), e);
                        }
                    }
                }
            }
        }

        let mut removed: Vec<PathBuf> = self
            .files
            .keys()
            .filter(|path| !seen.contains(*path))
            .cloned()
            .collect();
        removed.sort();
        for path in removed {
            self.files.remove(&path);
            events.push(ConfigEvent::Removed(path));
        }

        Ok(events)
    }
}

fn digest_of(path: &Path) -> io::Result<u64> {
    let bytes = fs::read(path)?;
    let mut hasher = DefaultHasher::new();
    hasher.write(&bytes);
    Ok(hasher.finish())
}
