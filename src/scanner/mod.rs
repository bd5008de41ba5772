//! Scanner module for candidate collection and file hashing.
//!
//! This module provides functionality for:
//! - Walking root directories into a flat candidate list
//! - Content digests with BLAKE3
//! - Perceptual fingerprints for images
//!
//! # Architecture
//!
//! The scanner is divided into submodules:
//! - [`walker`]: Directory traversal and candidate filtering
//! - [`hasher`]: BLAKE3 content digests (streaming)
//! - [`perceptual`]: Image fingerprints and similarity
//!
//! # Example
//!
//! ```no_run
//! use sweepdupe::config::ScanOptions;
//! use sweepdupe::scanner::Collector;
//! use std::path::PathBuf;
//!
//! let options = ScanOptions {
//!     min_file_size: 0,
//!     ..Default::default()
//! };
//!
//! let collector = Collector::new(&options);
//! let candidates = collector.collect(&[PathBuf::from("/sdcard")]).unwrap();
//! for file in &candidates {
//!     println!("{}: {} bytes ({})", file.path.display(), file.size, file.category);
//! }
//! ```

pub mod hasher;
pub mod perceptual;
pub mod walker;

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use serde::{Deserialize, Serialize};

// Re-export main types
pub use hasher::{ContentDigest, ContentHasher};
pub use perceptual::{PerceptualError, PerceptualFingerprint, PerceptualHasher};
pub use walker::Collector;

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp", "bmp"];
const VIDEO_EXTENSIONS: &[&str] = &["mp4", "avi", "mkv", "mov", "wmv", "flv", "3gp"];
const DOCUMENT_EXTENSIONS: &[&str] = &["pdf", "doc", "docx", "txt", "xlsx", "pptx"];
const AUDIO_EXTENSIONS: &[&str] = &["mp3", "wav", "flac", "aac", "ogg", "m4a"];

/// Media category inferred from a file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaCategory {
    /// Still images, the only category that gets perceptual fingerprints.
    Image,
    /// Video containers.
    Video,
    /// Office documents, PDFs and plain text.
    Document,
    /// Audio files.
    Audio,
    /// Anything not matched by the extension tables.
    Other,
}

impl MediaCategory {
    /// Infer the category of a path from its extension (case-insensitive).
    ///
    /// # Example
    ///
    /// ```
    /// use sweepdupe::scanner::MediaCategory;
    /// use std::path::Path;
    ///
    /// assert_eq!(MediaCategory::from_path(Path::new("IMG_0001.JPG")), MediaCategory::Image);
    /// assert_eq!(MediaCategory::from_path(Path::new("notes")), MediaCategory::Other);
    /// ```
    #[must_use]
    pub fn from_path(path: &Path) -> Self {
        let extension = path
            .extension()
            .and_then(|s| s.to_str())
            .map(str::to_lowercase)
            .unwrap_or_default();
        Self::from_extension(&extension)
    }

    /// Category for an already lower-cased extension without the dot.
    #[must_use]
    pub fn from_extension(extension: &str) -> Self {
        if IMAGE_EXTENSIONS.contains(&extension) {
            Self::Image
        } else if VIDEO_EXTENSIONS.contains(&extension) {
            Self::Video
        } else if DOCUMENT_EXTENSIONS.contains(&extension) {
            Self::Document
        } else if AUDIO_EXTENSIONS.contains(&extension) {
            Self::Audio
        } else {
            Self::Other
        }
    }

    /// Extensions that map to this category.
    #[must_use]
    pub fn extensions(&self) -> &'static [&'static str] {
        match self {
            Self::Image => IMAGE_EXTENSIONS,
            Self::Video => VIDEO_EXTENSIONS,
            Self::Document => DOCUMENT_EXTENSIONS,
            Self::Audio => AUDIO_EXTENSIONS,
            Self::Other => &[],
        }
    }
}

impl fmt::Display for MediaCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Image => "image",
            Self::Video => "video",
            Self::Document => "document",
            Self::Audio => "audio",
            Self::Other => "other",
        };
        f.write_str(name)
    }
}

/// A file considered for scanning.
///
/// Snapshot taken at collection time; it is not re-validated until a
/// member is deleted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateFile {
    /// Absolute path to the file
    pub path: PathBuf,
    /// File size in bytes
    pub size: u64,
    /// Last modification time
    pub modified: SystemTime,
    /// Category inferred from the extension
    pub category: MediaCategory,
}

impl CandidateFile {
    /// Create a new candidate, inferring its category from the path.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the file
    /// * `size` - File size in bytes
    /// * `modified` - Last modification time
    #[must_use]
    pub fn new(path: PathBuf, size: u64, modified: SystemTime) -> Self {
        let category = MediaCategory::from_path(&path);
        Self {
            path,
            size,
            modified,
            category,
        }
    }

    /// Whether this candidate is eligible for perceptual fingerprinting.
    #[must_use]
    pub fn is_image(&self) -> bool {
        self.category == MediaCategory::Image
    }
}

/// Errors that can occur while collecting candidates.
#[derive(thiserror::Error, Debug)]
pub enum CollectError {
    /// No root directories were supplied.
    #[error("No root directories to scan")]
    NoRoots,

    /// None of the supplied roots could be listed.
    #[error("None of the {0} root directories could be accessed")]
    NoAccessibleRoot(usize),

    /// Permission was denied when accessing a file or directory.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// The specified path was not found.
    #[error("Path not found: {0}")]
    NotFound(PathBuf),

    /// The specified path is not a directory.
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    /// An I/O error occurred while accessing a path.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

/// Errors that can occur during file hashing.
#[derive(thiserror::Error, Debug)]
pub enum HashError {
    /// The specified file was not found.
    #[error("File not found: {0}")]
    NotFound(PathBuf),

    /// Permission was denied when reading the file.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// An I/O error occurred while reading the file.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

impl HashError {
    pub(crate) fn from_io(path: &Path, error: std::io::Error) -> Self {
        match error.kind() {
            std::io::ErrorKind::NotFound => Self::NotFound(path.to_path_buf()),
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied(path.to_path_buf()),
            _ => Self::Io {
                path: path.to_path_buf(),
                source: error,
            },
        }
    }
}
