//! # Study Cache Module
//!
//! ## Purpose
//! Enumerates and evicts the file-system-backed cache of generated study
//! files. Entries are listed with their name, modification time, and size,
//! and removed either by explicit name or with the `*` wildcard.
//!
//! ## Input/Output Specification
//! - **Input**: the configured cache directory and a list/clear request
//! - **Output**: [`CacheEntry`] sequences and clear reports with
//!   `(attempted, removed)` counts
//! - **Filename convention**: `<logical-name>.json`; the suffix is appended
//!   automatically when a caller omits it, and bare names are resolved
//!   relative to the cache directory unless already prefixed with it
//!
//! Enumeration order is filesystem order and deliberately unsorted; callers
//! needing determinism sort the entries themselves. Per-file failures during
//! a clear are counted and logged but never stop the remaining deletions.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};

use crate::errors::Result;
use crate::status::OperationStatus;
use crate::utils::format_bytes;

/// Suffix every cache file carries on disk.
pub const CACHE_FILE_SUFFIX: &str = ".json";

/// The literal selector that expands to every cache entry.
pub const CACHE_WILDCARD: &str = "*";

/// Lists the files in a cache directory that match the cache suffix.
pub struct CacheFileScanner {
    dir: PathBuf,
}

impl CacheFileScanner {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Full paths of every matching file, in filesystem enumeration order.
    pub async fn matching_files(&self) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        let mut entries = tokio::fs::read_dir(&self.dir).await?;

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let is_file = entry.file_type().await.map(|t| t.is_file()).unwrap_or(false);
            if !is_file {
                continue;
            }
            let matches = path
                .file_name()
                .and_then(|name| name.to_str())
                .map(|name| name.ends_with(CACHE_FILE_SUFFIX))
                .unwrap_or(false);
            if matches {
                files.push(path);
            }
        }

        Ok(files)
    }
}

/// One cache file as observed at enumeration time.
#[derive(Debug, Clone, Serialize)]
pub struct CacheEntry {
    /// Logical name, or the absolute path when a full-path listing was
    /// requested.
    pub name: String,
    /// Last modification time of the backing file.
    pub last_modified: DateTime<Utc>,
    /// Size of the backing file in bytes.
    pub size_bytes: u64,
}

/// What a clear request selects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheClearSpec {
    /// Every entry currently present.
    All,
    /// An explicit ordered list of entry names, with or without the cache
    /// suffix or a full path prefix.
    Names(Vec<String>),
}

impl CacheClearSpec {
    /// Parse the raw request string: the literal `*` selects everything,
    /// anything else is a whitespace-separated name list.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed == CACHE_WILDCARD {
            CacheClearSpec::All
        } else {
            CacheClearSpec::Names(
                trimmed
                    .split_whitespace()
                    .map(|name| name.to_string())
                    .collect(),
            )
        }
    }
}

/// Result of a cache listing.
#[derive(Debug, Clone, Serialize)]
pub struct CacheListReport {
    pub entries: Vec<CacheEntry>,
    pub status: OperationStatus,
}

/// Result of a cache clear.
#[derive(Debug, Clone, Serialize)]
pub struct CacheClearReport {
    /// Number of files selected for deletion.
    pub attempted: usize,
    /// Number of files actually removed.
    pub removed: usize,
    pub status: OperationStatus,
    /// One message per file that could not be removed.
    pub errors: Vec<String>,
}

impl CacheClearReport {
    fn idle() -> Self {
        Self {
            attempted: 0,
            removed: 0,
            status: OperationStatus::Idle,
            errors: Vec::new(),
        }
    }
}

/// Manages the study cache directory.
///
/// A manager without a configured directory is valid: every operation then
/// reports [`OperationStatus::Idle`] and touches nothing, since a missing
/// cache path is a deployment choice rather than an error.
pub struct CacheManager {
    dir: Option<PathBuf>,
}

impl CacheManager {
    pub fn new(dir: Option<PathBuf>) -> Self {
        Self { dir }
    }

    /// Whether a cache directory is configured.
    pub fn is_configured(&self) -> bool {
        self.dir.is_some()
    }

    /// Enumerate the cache.
    ///
    /// With `full_path` set, entries are named by absolute path; otherwise by
    /// logical name (the file name with the cache suffix stripped). Files
    /// whose metadata cannot be read are skipped and counted against the
    /// report status.
    pub async fn list(&self, full_path: bool) -> CacheListReport {
        let Some(dir) = &self.dir else {
            tracing::info!("No study cache path has been set");
            return CacheListReport {
                entries: Vec::new(),
                status: OperationStatus::Idle,
            };
        };

        let scanner = CacheFileScanner::new(dir);
        let files = match scanner.matching_files().await {
            Ok(files) => files,
            Err(e) => {
                tracing::error!("Failed to scan cache directory {:?}: {}", dir, e);
                return CacheListReport {
                    entries: Vec::new(),
                    status: OperationStatus::Failed,
                };
            }
        };

        let seen = files.len();
        let mut entries = Vec::with_capacity(seen);

        for path in files {
            match Self::entry_for(&path, full_path).await {
                Ok(entry) => {
                    tracing::debug!(
                        "Cache entry '{}' ({}, modified {})",
                        entry.name,
                        format_bytes(entry.size_bytes),
                        entry.last_modified
                    );
                    entries.push(entry);
                }
                Err(e) => {
                    tracing::warn!("Failed to read cache metadata for {:?}: {}", path, e);
                }
            }
        }

        // An empty cache lists successfully; there is just nothing to show.
        let status = if seen == 0 {
            OperationStatus::Succeeded
        } else {
            OperationStatus::from_counts(seen, entries.len())
        };

        CacheListReport { entries, status }
    }

    async fn entry_for(path: &Path, full_path: bool) -> Result<CacheEntry> {
        let metadata = tokio::fs::metadata(path).await?;
        let modified = metadata.modified()?;

        let name = if full_path {
            path.display().to_string()
        } else {
            path.file_name()
                .and_then(|name| name.to_str())
                .map(|name| {
                    // Strip exactly one suffix; an inner ".json" belongs to
                    // the logical name.
                    name.strip_suffix(CACHE_FILE_SUFFIX)
                        .unwrap_or(name)
                        .to_string()
                })
                .unwrap_or_else(|| path.display().to_string())
        };

        Ok(CacheEntry {
            name,
            last_modified: DateTime::<Utc>::from(modified),
            size_bytes: metadata.len(),
        })
    }

    /// Remove the selected entries.
    ///
    /// The wildcard expands to every matching file before any deletion.
    /// Explicit names are normalised to full on-disk paths and deduplicated
    /// by resolved path, so a logical name and its suffixed form count as one
    /// attempt. Deletion failures are counted and reported without stopping
    /// the remaining names.
    pub async fn clear(&self, spec: &CacheClearSpec) -> CacheClearReport {
        let Some(dir) = &self.dir else {
            tracing::info!("No study cache path has been set");
            return CacheClearReport::idle();
        };

        let targets = match spec {
            CacheClearSpec::All => {
                let scanner = CacheFileScanner::new(dir);
                match scanner.matching_files().await {
                    Ok(files) => files,
                    Err(e) => {
                        tracing::error!("Failed to scan cache directory {:?}: {}", dir, e);
                        return CacheClearReport {
                            attempted: 0,
                            removed: 0,
                            status: OperationStatus::Failed,
                            errors: vec![format!("cache scan failed: {}", e)],
                        };
                    }
                }
            }
            CacheClearSpec::Names(names) => {
                let mut resolved = Vec::with_capacity(names.len());
                let mut unique = HashSet::new();
                for name in names {
                    let path = resolve_cache_name(dir, name);
                    if unique.insert(path.clone()) {
                        resolved.push(path);
                    }
                }
                resolved
            }
        };

        if targets.is_empty() {
            return CacheClearReport {
                attempted: 0,
                removed: 0,
                status: OperationStatus::FailedToStart,
                errors: Vec::new(),
            };
        }

        let attempted = targets.len();
        let mut removed = 0;
        let mut errors = Vec::new();

        for path in targets {
            match tokio::fs::remove_file(&path).await {
                Ok(()) => {
                    tracing::debug!("Removed cache file {:?}", path);
                    removed += 1;
                }
                Err(e) => {
                    tracing::error!("Failed to remove cache file {:?}: {}", path, e);
                    errors.push(format!("failed to remove {}: {}", path.display(), e));
                }
            }
        }

        let status = OperationStatus::from_counts(attempted, removed);
        tracing::info!(
            "Cache clear finished: removed {} of {} entries ({})",
            removed,
            attempted,
            status
        );

        CacheClearReport {
            attempted,
            removed,
            status,
            errors,
        }
    }
}

/// Normalise a caller-supplied entry name to its full on-disk path: append
/// the cache suffix when absent, then anchor the name at the cache directory
/// unless it already starts with it.
///
/// A name that is not prefixed with the cache directory can never resolve
/// outside it: root and parent-directory components are stripped before the
/// name is joined, so `/outside/victim` and `../victim` both resolve to
/// entries under the cache directory.
fn resolve_cache_name(dir: &Path, name: &str) -> PathBuf {
    let filename = if name.ends_with(CACHE_FILE_SUFFIX) {
        name.to_string()
    } else {
        format!("{}{}", name, CACHE_FILE_SUFFIX)
    };

    let candidate = PathBuf::from(filename);
    if candidate.starts_with(dir) {
        return candidate;
    }

    let relative: PathBuf = candidate
        .components()
        .filter(|component| matches!(component, Component::Normal(_)))
        .collect();
    dir.join(relative)
}
