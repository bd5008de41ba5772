//! Perceptual image fingerprints for similarity detection.
//!
//! This module provides the [`PerceptualHasher`], which computes a 64-bit
//! DCT-based fingerprint (pHash) for an image. Fingerprints stay close under
//! re-encoding, resizing and mild compression, so visually similar photos
//! end up with a small Hamming distance.
//!
//! Similarity between two fingerprints is `1 - distance / bits`.

use std::path::{Path, PathBuf};

use image_hasher::{HashAlg, HasherConfig, ImageHash};
use thiserror::Error;

/// Fingerprint width and height in bits.
const HASH_SIDE: u32 = 8;

/// Errors that can occur during perceptual hashing.
#[derive(Debug, Error)]
pub enum PerceptualError {
    /// Failed to open or decode the image.
    #[error("Failed to load image {0}: {1}")]
    LoadError(PathBuf, #[source] image::ImageError),

    /// The byte form of a fingerprint was malformed.
    #[error("Invalid fingerprint bytes")]
    InvalidBytes,
}

/// A perceptual image fingerprint.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PerceptualFingerprint(ImageHash);

impl PerceptualFingerprint {
    /// Rebuild a fingerprint from its raw bytes.
    ///
    /// # Errors
    ///
    /// Returns [`PerceptualError::InvalidBytes`] for an empty slice.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, PerceptualError> {
        if bytes.is_empty() {
            return Err(PerceptualError::InvalidBytes);
        }
        ImageHash::from_bytes(bytes)
            .map(Self)
            .map_err(|_| PerceptualError::InvalidBytes)
    }

    /// Raw fingerprint bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    /// Number of bits in the fingerprint.
    #[must_use]
    pub fn bits(&self) -> u32 {
        (self.0.as_bytes().len() * 8) as u32
    }

    /// Stable text key, used to bucket identical fingerprints and to name
    /// similar-image groups.
    #[must_use]
    pub fn key(&self) -> String {
        self.0.to_base64()
    }

    /// Number of differing bits, or `None` if the widths differ.
    #[must_use]
    pub fn distance(&self, other: &Self) -> Option<u32> {
        if self.as_bytes().len() != other.as_bytes().len() {
            return None;
        }
        Some(self.0.dist(&other.0))
    }

    /// Similarity in `[0, 1]`: `1 - distance / bits`.
    ///
    /// Fingerprints of different widths have similarity `0.0`.
    #[must_use]
    pub fn similarity(&self, other: &Self) -> f32 {
        let bits = self.bits();
        match self.distance(other) {
            Some(distance) if bits > 0 => 1.0 - distance as f32 / bits as f32,
            _ => 0.0,
        }
    }
}

/// Computes perceptual fingerprints for images.
pub struct PerceptualHasher {
    hasher: image_hasher::Hasher,
}

impl PerceptualHasher {
    /// Create a pHash hasher (DCT preprocessing, median threshold, 8x8 bits).
    #[must_use]
    pub fn new() -> Self {
        let hasher = HasherConfig::new()
            .hash_size(HASH_SIDE, HASH_SIDE)
            .hash_alg(HashAlg::Median)
            .preproc_dct()
            .to_hasher();
        Self { hasher }
    }

    /// Compute the fingerprint for the image at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`PerceptualError::LoadError`] when the file cannot be read or
    /// decoded.
    pub fn compute(&self, path: &Path) -> Result<PerceptualFingerprint, PerceptualError> {
        let img = image::open(path).map_err(|e| PerceptualError::LoadError(path.to_path_buf(), e))?;
        Ok(PerceptualFingerprint(self.hasher.hash_image(&img)))
    }

    /// Like [`compute`](Self::compute), but a decode failure is logged and
    /// yields `None`.
    #[must_use]
    pub fn fingerprint(&self, path: &Path) -> Option<PerceptualFingerprint> {
        match self.compute(path) {
            Ok(fingerprint) => Some(fingerprint),
            Err(e) => {
                log::debug!("No fingerprint: {}", e);
                None
            }
        }
    }
}

impl Default for PerceptualHasher {
    fn default() -> Self {
        Self::new()
    }
}
