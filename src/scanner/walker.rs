//! Candidate collection over a set of root directories.
//!
//! # Overview
//!
//! The [`Collector`] walks each root with [`walkdir`], visiting directory
//! entries sorted by file name so that the candidate order is stable between
//! runs. Every regular file is checked against the [`ScanOptions`] filters:
//!
//! - Size bounds (`min_file_size..=max_file_size`)
//! - Category flags (images, videos, documents, audio)
//! - Exclude prefixes (denylist)
//! - Include prefixes (allowlist, only when non-empty)
//!
//! Prefixes are matched as plain string prefixes of the absolute path.
//!
//! Directories that cannot be listed are logged and treated as empty.
//! Symbolic links are never followed.

use std::fs::Metadata;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use walkdir::WalkDir;

use super::{CandidateFile, CollectError};
use crate::config::ScanOptions;
use crate::signal::CancelToken;

/// Read-only traversal that yields the flat candidate list.
#[derive(Debug, Clone)]
pub struct Collector {
    /// Scan filters
    options: ScanOptions,
    /// Optional cancellation flag checked between entries
    cancel: Option<CancelToken>,
}

impl Collector {
    /// Create a collector for the given options.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use sweepdupe::config::ScanOptions;
    /// use sweepdupe::scanner::Collector;
    ///
    /// let collector = Collector::new(&ScanOptions::default());
    /// ```
    #[must_use]
    pub fn new(options: &ScanOptions) -> Self {
        Self {
            options: options.clone(),
            cancel: None,
        }
    }

    /// Stop walking as soon as the token is cancelled.
    #[must_use]
    pub fn with_cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(CancelToken::is_cancelled)
    }

    /// Walk all roots and return the candidates in traversal order.
    ///
    /// Roots that are missing or cannot be listed are skipped with a
    /// warning. When cancelled the partial list is returned; callers check
    /// the token themselves.
    ///
    /// # Errors
    ///
    /// - [`CollectError::NoRoots`] if `roots` is empty
    /// - [`CollectError::NoAccessibleRoot`] if no root could be listed
    pub fn collect(&self, roots: &[PathBuf]) -> Result<Vec<CandidateFile>, CollectError> {
        if roots.is_empty() {
            return Err(CollectError::NoRoots);
        }

        let mut candidates = Vec::new();
        let mut accessible = 0usize;

        for root in roots {
            let root = std::path::absolute(root).unwrap_or_else(|_| root.clone());
            if let Err(e) = check_root(&root) {
                log::warn!("Skipping root: {}", e);
                continue;
            }
            accessible += 1;

            let before = candidates.len();
            self.walk_root(&root, &mut candidates);
            log::debug!(
                "Collected {} candidate(s) under {}",
                candidates.len() - before,
                root.display()
            );

            if self.is_cancelled() {
                log::debug!("Collector: cancellation requested, stopping");
                break;
            }
        }

        if accessible == 0 {
            return Err(CollectError::NoAccessibleRoot(roots.len()));
        }

        Ok(candidates)
    }

    fn walk_root(&self, root: &Path, out: &mut Vec<CandidateFile>) {
        let walker = WalkDir::new(root)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| !(entry.file_type().is_dir() && self.prune_dir(entry.path())));

        for entry in walker {
            if self.is_cancelled() {
                return;
            }

            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    let path = e.path().map_or_else(|| root.to_path_buf(), Path::to_path_buf);
                    log::warn!("Skipping unreadable path {}: {}", path.display(), e);
                    continue;
                }
            };

            if !entry.file_type().is_file() {
                continue;
            }

            match entry.metadata() {
                Ok(metadata) => {
                    if let Some(candidate) = self.evaluate(entry.into_path(), &metadata) {
                        out.push(candidate);
                    }
                }
                Err(e) => {
                    log::warn!("Failed to stat {}: {}", entry.path().display(), e);
                }
            }
        }
    }

    /// Apply the file-level filters.
    fn evaluate(&self, path: PathBuf, metadata: &Metadata) -> Option<CandidateFile> {
        let size = metadata.len();
        if size < self.options.min_file_size || size > self.options.max_file_size {
            log::trace!("Skipping file due to size filter ({}): {}", size, path.display());
            return None;
        }

        let modified = metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH);
        let candidate = CandidateFile::new(path, size, modified);

        if !self.options.includes_category(candidate.category) {
            log::trace!(
                "Skipping {} file: {}",
                candidate.category,
                candidate.path.display()
            );
            return None;
        }

        if self.is_path_excluded(&candidate.path) {
            log::trace!("Skipping file due to path filter: {}", candidate.path.display());
            return None;
        }

        Some(candidate)
    }

    /// Whether a file path fails the deny/allow prefix lists.
    fn is_path_excluded(&self, path: &Path) -> bool {
        let path = path.to_string_lossy();
        if has_prefix(&path, &self.options.exclude_paths) {
            return true;
        }
        !self.options.include_paths.is_empty() && !has_prefix(&path, &self.options.include_paths)
    }

    /// Whether a whole directory can be skipped.
    ///
    /// A directory stays in the walk while it may still contain an
    /// allowlisted path, i.e. it is under an include prefix or above one.
    fn prune_dir(&self, dir: &Path) -> bool {
        let dir = dir.to_string_lossy();
        if has_prefix(&dir, &self.options.exclude_paths) {
            log::trace!("Pruning excluded directory: {}", dir);
            return true;
        }
        if self.options.include_paths.is_empty() {
            return false;
        }
        let keep = self.options.include_paths.iter().any(|prefix| {
            let prefix = prefix.to_string_lossy();
            dir.starts_with(prefix.as_ref()) || prefix.starts_with(dir.as_ref())
        });
        !keep
    }
}

fn has_prefix(path: &str, prefixes: &[PathBuf]) -> bool {
    prefixes
        .iter()
        .any(|prefix| path.starts_with(prefix.to_string_lossy().as_ref()))
}

/// A root is usable when it is a directory that can be listed.
fn check_root(root: &Path) -> Result<(), CollectError> {
    let metadata = std::fs::metadata(root).map_err(|e| io_to_collect_error(root, e))?;
    if !metadata.is_dir() {
        return Err(CollectError::NotADirectory(root.to_path_buf()));
    }
    std::fs::read_dir(root)
        .map(|_| ())
        .map_err(|e| io_to_collect_error(root, e))
}

fn io_to_collect_error(path: &Path, error: std::io::Error) -> CollectError {
    use std::io::ErrorKind;

    match error.kind() {
        ErrorKind::PermissionDenied => CollectError::PermissionDenied(path.to_path_buf()),
        ErrorKind::NotFound => CollectError::NotFound(path.to_path_buf()),
        _ => CollectError::Io {
            path: path.to_path_buf(),
            source: error,
        },
    }
}
