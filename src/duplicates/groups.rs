//! Duplicate groups and scan results.
//!
//! # Overview
//!
//! A [`DuplicateGroup`] is either a set of byte-identical files (keyed by
//! their content digest) or a cluster of visually similar images (keyed by
//! the anchor fingerprint). Members are ordered oldest first; the caller
//! decides which copy to keep.
//!
//! Space accounting:
//!
//! - Exact: `total_size = size * n`, `wasted_space = size * (n - 1)`
//! - Similar: `total_size = sum(sizes)`, `wasted_space = avg(sizes) * (n - 1)`
//!
//! A group always has at least two members. Shrinking a group below that
//! removes it from the [`ScanResult`].
//!
//! # Example
//!
//! ```
//! use sweepdupe::duplicates::{DuplicateFile, DuplicateGroup};
//! use sweepdupe::scanner::ContentHasher;
//! use std::path::PathBuf;
//! use std::time::SystemTime;
//!
//! let digest = ContentHasher::digest_bytes(b"hello");
//! let files = vec![
//!     DuplicateFile::new(PathBuf::from("/a.txt"), 5, SystemTime::UNIX_EPOCH, digest.clone()),
//!     DuplicateFile::new(PathBuf::from("/b.txt"), 5, SystemTime::UNIX_EPOCH, digest.clone()),
//! ];
//!
//! let group = DuplicateGroup::exact(&digest, files).unwrap();
//! assert_eq!(group.wasted_space, 5);
//! ```

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use serde::Serialize;

use crate::scanner::{CandidateFile, ContentDigest, MediaCategory};

/// How the members of a group relate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicateKind {
    /// Byte-identical content.
    Exact,
    /// Perceptually similar images.
    SimilarImage,
}

/// One member of a duplicate group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicateFile {
    /// Absolute path
    pub path: PathBuf,
    /// Final path component
    pub file_name: String,
    /// Size in bytes at collection time
    pub size: u64,
    /// Last modification time at collection time
    pub modified: SystemTime,
    /// Category inferred from the extension
    pub category: MediaCategory,
    /// Content digest
    pub digest: ContentDigest,
}

impl DuplicateFile {
    /// Create a member record.
    #[must_use]
    pub fn new(path: PathBuf, size: u64, modified: SystemTime, digest: ContentDigest) -> Self {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let category = MediaCategory::from_path(&path);
        Self {
            path,
            file_name,
            size,
            modified,
            category,
            digest,
        }
    }

    /// Build a member from a hashed candidate.
    #[must_use]
    pub fn from_candidate(candidate: CandidateFile, digest: ContentDigest) -> Self {
        let mut file = Self::new(candidate.path, candidate.size, candidate.modified, digest);
        file.category = candidate.category;
        file
    }
}

/// A set of duplicate or similar files.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DuplicateGroup {
    /// Content digest for exact groups, `similar_<fingerprint>` for clusters
    pub id: String,
    /// Exact or similar
    pub kind: DuplicateKind,
    /// Members, oldest first
    pub files: Vec<DuplicateFile>,
    /// Combined size of all members
    pub total_size: u64,
    /// Bytes reclaimable by keeping one member
    pub wasted_space: u64,
    /// 1.0 for exact groups, the clustering threshold for similar ones
    pub similarity: f32,
}

impl DuplicateGroup {
    /// Build an exact-duplicate group. Returns `None` for fewer than two files.
    #[must_use]
    pub fn exact(digest: &ContentDigest, files: Vec<DuplicateFile>) -> Option<Self> {
        Self::build(digest.to_string(), DuplicateKind::Exact, files, 1.0)
    }

    /// Build a similar-image cluster. Returns `None` for fewer than two files.
    #[must_use]
    pub fn similar(anchor_key: &str, files: Vec<DuplicateFile>, similarity: f32) -> Option<Self> {
        Self::build(
            format!("similar_{}", anchor_key),
            DuplicateKind::SimilarImage,
            files,
            similarity,
        )
    }

    fn build(
        id: String,
        kind: DuplicateKind,
        mut files: Vec<DuplicateFile>,
        similarity: f32,
    ) -> Option<Self> {
        if files.len() < 2 {
            return None;
        }
        sort_members(&mut files);
        let (total_size, wasted_space) = space_usage(kind, &files);
        Some(Self {
            id,
            kind,
            files,
            total_size,
            wasted_space,
            similarity,
        })
    }

    /// Number of members.
    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Always false for a valid group.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Number of redundant copies (`n - 1`).
    #[must_use]
    pub fn duplicate_count(&self) -> usize {
        self.files.len().saturating_sub(1)
    }

    /// Whether `path` is a member.
    #[must_use]
    pub fn contains(&self, path: &Path) -> bool {
        self.files.iter().any(|f| f.path == path)
    }

    /// Member paths in order.
    #[must_use]
    pub fn paths(&self) -> Vec<PathBuf> {
        self.files.iter().map(|f| f.path.clone()).collect()
    }

    /// The group without the given members, with sizes recomputed.
    ///
    /// Returns `None` when fewer than two members would remain.
    #[must_use]
    pub fn without(&self, removed: &HashSet<PathBuf>) -> Option<Self> {
        let files: Vec<DuplicateFile> = self
            .files
            .iter()
            .filter(|f| !removed.contains(&f.path))
            .cloned()
            .collect();
        Self::build(self.id.clone(), self.kind, files, self.similarity)
    }
}

/// Oldest first, then by path.
fn sort_members(files: &mut [DuplicateFile]) {
    files.sort_by(|a, b| a.modified.cmp(&b.modified).then_with(|| a.path.cmp(&b.path)));
}

fn space_usage(kind: DuplicateKind, files: &[DuplicateFile]) -> (u64, u64) {
    let count = files.len() as u64;
    let redundant = count.saturating_sub(1);
    match kind {
        DuplicateKind::Exact => {
            let size = files.first().map_or(0, |f| f.size);
            (size.saturating_mul(count), size.saturating_mul(redundant))
        }
        DuplicateKind::SimilarImage => {
            let total = files.iter().fold(0u64, |acc, f| acc.saturating_add(f.size));
            let average = if count == 0 { 0 } else { total / count };
            (total, average.saturating_mul(redundant))
        }
    }
}

/// Snapshot of one completed scan.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScanResult {
    /// Groups by wasted space, largest first
    pub groups: Vec<DuplicateGroup>,
    /// Sum of `n - 1` over all groups
    pub total_duplicates: usize,
    /// Sum of wasted space over all groups
    pub total_wasted_space: u64,
    /// Files successfully hashed
    pub files_scanned: usize,
    /// Wall-clock duration of the scan
    pub scan_duration: Duration,
}

impl ScanResult {
    /// The zeroed result returned before any scan completed.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            groups: Vec::new(),
            total_duplicates: 0,
            total_wasted_space: 0,
            files_scanned: 0,
            scan_duration: Duration::ZERO,
        }
    }

    /// Build a result from already ordered groups, computing the totals.
    #[must_use]
    pub fn from_groups(groups: Vec<DuplicateGroup>, files_scanned: usize, scan_duration: Duration) -> Self {
        let total_duplicates = groups.iter().map(DuplicateGroup::duplicate_count).sum();
        let total_wasted_space = groups
            .iter()
            .fold(0u64, |acc, g| acc.saturating_add(g.wasted_space));
        Self {
            groups,
            total_duplicates,
            total_wasted_space,
            files_scanned,
            scan_duration,
        }
    }

    /// Look up a group by id.
    #[must_use]
    pub fn group(&self, id: &str) -> Option<&DuplicateGroup> {
        self.groups.iter().find(|g| g.id == id)
    }

    /// Whether no duplicates were found.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// A copy without the given files in any group.
    ///
    /// Groups that drop below two members are removed. Totals are
    /// recomputed; group order is kept.
    #[must_use]
    pub fn without_files(&self, removed: &HashSet<PathBuf>) -> Self {
        let groups = self
            .groups
            .iter()
            .filter_map(|g| {
                if g.files.iter().any(|f| removed.contains(&f.path)) {
                    g.without(removed)
                } else {
                    Some(g.clone())
                }
            })
            .collect();
        Self::from_groups(groups, self.files_scanned, self.scan_duration)
    }
}

impl Default for ScanResult {
    fn default() -> Self {
        Self::empty()
    }
}
