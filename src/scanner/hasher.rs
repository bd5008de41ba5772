//! BLAKE3 file hasher with streaming support.
//!
//! # Overview
//!
//! [`ContentHasher`] computes a [`ContentDigest`] of a file's bytes by
//! reading it in fixed-size chunks, so memory use does not depend on file
//! size. Two files with equal digests are treated as exact duplicates.
//!
//! # Example
//!
//! ```no_run
//! use sweepdupe::scanner::ContentHasher;
//! use std::path::Path;
//!
//! let hasher = ContentHasher::new();
//! let digest = hasher.digest(Path::new("/sdcard/DCIM/IMG_0001.jpg")).unwrap();
//! println!("{}", digest);
//! ```

use std::fmt;
use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::HashError;

/// Read buffer size for streaming digests.
pub const DEFAULT_BUFFER_SIZE: usize = 64 * 1024;

/// Lowercase hex encoding of a BLAKE3 content hash.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentDigest(String);

impl ContentDigest {
    /// The hex string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Shortened form for log lines.
    #[must_use]
    pub fn short(&self) -> &str {
        &self.0[..self.0.len().min(12)]
    }
}

impl From<blake3::Hash> for ContentDigest {
    fn from(hash: blake3::Hash) -> Self {
        Self(hash.to_hex().to_string())
    }
}

impl fmt::Display for ContentDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Streaming BLAKE3 hasher.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContentHasher;

impl ContentHasher {
    /// Create a hasher reading in [`DEFAULT_BUFFER_SIZE`] blocks.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Compute the digest of the file at `path`.
    ///
    /// # Errors
    ///
    /// Returns a [`HashError`] if the file cannot be opened or read.
    pub fn digest(&self, path: &Path) -> Result<ContentDigest, HashError> {
        let file = File::open(path).map_err(|e| HashError::from_io(path, e))?;
        self.digest_reader(file)
            .map_err(|e| HashError::from_io(path, e))
    }

    /// Compute the digest of everything `reader` yields.
    ///
    /// # Errors
    ///
    /// Propagates read errors other than [`ErrorKind::Interrupted`].
    pub fn digest_reader<R: Read>(&self, mut reader: R) -> std::io::Result<ContentDigest> {
        let mut hasher = blake3::Hasher::new();
        let mut buffer = vec![0u8; DEFAULT_BUFFER_SIZE];

        loop {
            match reader.read(&mut buffer) {
                Ok(0) => break,
                Ok(n) => {
                    hasher.update(&buffer[..n]);
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }

        Ok(hasher.finalize().into())
    }

    /// Digest of an in-memory byte slice.
    #[must_use]
    pub fn digest_bytes(data: &[u8]) -> ContentDigest {
        blake3::hash(data).into()
    }
}
