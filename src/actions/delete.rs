//! Permanent deletion of duplicate group members.
//!
//! # Overview
//!
//! [`delete_group_members`] removes a subset of one cached group's members
//! and publishes the updated result:
//!
//! - The request is rejected unless at least one member would survive.
//! - Each file is removed independently. A file that cannot be removed
//!   stays in the group and is reported in [`BatchDeleteResult::failures`].
//! - Removed files are dropped from every cached group they belong to,
//!   since a file can sit in an exact group and a similar-image cluster at
//!   once. A group left with two or more members is shrunk (sizes
//!   recomputed); otherwise it is removed from the result.
//!
//! Deletion is permanent and not transactional. A crash mid-batch leaves
//! the files that were already removed gone; the next scan reflects that.
//!
//! # Example
//!
//! ```no_run
//! use sweepdupe::actions::delete::delete_group_members;
//! use sweepdupe::cache::ResultCache;
//! use std::path::PathBuf;
//!
//! let cache = ResultCache::new();
//! match delete_group_members(&cache, "some-group", &[PathBuf::from("/sdcard/copy.jpg")]) {
//!     Ok(result) => println!("{}", result.summary()),
//!     Err(e) => eprintln!("Cannot delete: {}", e),
//! }
//! ```

use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;

use crate::cache::ResultCache;

/// Rejected deletion requests.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DeleteError {
    /// No cached group has this id.
    #[error("duplicate group not found: {0}")]
    GroupNotFound(String),

    /// The request would remove every copy.
    #[error("cannot delete {requested} of {members} files - at least one copy must be kept")]
    MustKeepOne {
        /// Number of paths in the request
        requested: usize,
        /// Number of members in the group
        members: usize,
    },

    /// A scan is running; the result it replaces must not change under it.
    #[error("cannot delete while a scan is in progress")]
    ScanInProgress,
}

/// Outcome of one deletion batch.
#[derive(Debug, Clone, Default)]
pub struct BatchDeleteResult {
    /// Files that were removed.
    pub deleted: Vec<PathBuf>,
    /// Files that could not be removed, with the reason.
    pub failures: Vec<(PathBuf, String)>,
    /// Requested paths that are not members of the group.
    pub ignored: Vec<PathBuf>,
    /// Bytes freed, from the sizes recorded at scan time.
    pub bytes_freed: u64,
}

impl BatchDeleteResult {
    /// Number of files removed.
    #[must_use]
    pub fn success_count(&self) -> usize {
        self.deleted.len()
    }

    /// Number of members that could not be removed.
    #[must_use]
    pub fn failure_count(&self) -> usize {
        self.failures.len()
    }

    /// Human-readable summary of the operation.
    #[must_use]
    pub fn summary(&self) -> String {
        if self.failures.is_empty() {
            format!(
                "Deleted {} file(s), freed {} bytes",
                self.success_count(),
                self.bytes_freed
            )
        } else {
            format!(
                "Deleted {} file(s), {} failed, freed {} bytes",
                self.success_count(),
                self.failure_count(),
                self.bytes_freed
            )
        }
    }
}

/// Check that deleting `requested` paths leaves a copy behind.
///
/// The raw request length is compared, so repeated paths count.
///
/// # Errors
///
/// Returns [`DeleteError::MustKeepOne`] when `requested >= members`.
pub fn validate_preserves_copy(requested: usize, members: usize) -> Result<(), DeleteError> {
    if requested >= members {
        log::error!(
            "Refusing to delete {} path(s) from a group of {}",
            requested,
            members
        );
        return Err(DeleteError::MustKeepOne { requested, members });
    }
    Ok(())
}

/// Remove one file from disk.
///
/// # Errors
///
/// Returns the underlying I/O error.
pub fn permanent_delete(path: &Path) -> io::Result<()> {
    fs::remove_file(path)?;
    log::info!("Permanently deleted: {}", path.display());
    Ok(())
}

/// Delete `paths` from the cached group `group_id` and publish the result.
///
/// Paths that are not members are ignored. Repeated paths are attempted
/// once.
///
/// # Errors
///
/// - [`DeleteError::GroupNotFound`] if no cached group has the id
/// - [`DeleteError::MustKeepOne`] if `paths.len()` is not less than the
///   member count; nothing is deleted
pub fn delete_group_members(
    cache: &ResultCache,
    group_id: &str,
    paths: &[PathBuf],
) -> Result<BatchDeleteResult, DeleteError> {
    let result = cache
        .get()
        .ok_or_else(|| DeleteError::GroupNotFound(group_id.to_string()))?;
    let group = result
        .group(group_id)
        .ok_or_else(|| DeleteError::GroupNotFound(group_id.to_string()))?;

    validate_preserves_copy(paths.len(), group.len())?;

    let mut batch = BatchDeleteResult::default();
    let mut attempted: HashSet<&Path> = HashSet::new();

    for path in paths {
        if !attempted.insert(path.as_path()) {
            continue;
        }
        let Some(member) = group.files.iter().find(|f| &f.path == path) else {
            log::warn!("Ignoring {}: not a member of group {}", path.display(), group_id);
            batch.ignored.push(path.clone());
            continue;
        };

        match permanent_delete(path) {
            Ok(()) => {
                batch.bytes_freed = batch.bytes_freed.saturating_add(member.size);
                batch.deleted.push(path.clone());
            }
            Err(e) => {
                log::warn!("Failed to delete {}: {}", path.display(), e);
                batch.failures.push((path.clone(), e.to_string()));
            }
        }
    }

    if !batch.deleted.is_empty() {
        let removed: HashSet<PathBuf> = batch.deleted.iter().cloned().collect();
        let updated = result.without_files(&removed);
        log::debug!(
            "{} group(s) remain after deletion from {}",
            updated.groups.len(),
            group_id
        );
        cache.publish(Arc::new(updated));
    }

    log::info!("{}", batch.summary());
    Ok(batch)
}
