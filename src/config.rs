//! Scan configuration.
//!
//! [`ScanOptions`] carries every caller-supplied filter and tuning knob for
//! one scan. Options are layered with figment:
//!
//! 1. Built-in defaults
//! 2. A TOML file (explicit path, or `config.toml` in the platform config dir)
//! 3. Environment variables prefixed with `SWEEPDUPE_`
//!
//! The driver binary applies its command-line flags on top of the loaded
//! value.

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::scanner::MediaCategory;

/// Prefix for environment variable overrides.
pub const ENV_PREFIX: &str = "SWEEPDUPE_";

/// Default upper size bound. Fits a TOML integer, unlike `u64::MAX`.
pub const UNBOUNDED_FILE_SIZE: u64 = i64::MAX as u64;

/// Errors raised while loading or validating options.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The layered configuration could not be extracted.
    #[error("failed to load configuration: {0}")]
    Load(#[from] Box<figment::Error>),

    /// The similarity threshold is outside `[0, 1]`.
    #[error("similarity threshold must be within [0, 1], got {0}")]
    InvalidThreshold(f32),

    /// The size bounds are inverted.
    #[error("minimum file size {min} exceeds maximum file size {max}")]
    InvalidSizeRange {
        /// Configured lower bound
        min: u64,
        /// Configured upper bound
        max: u64,
    },

    /// The options could not be rendered as TOML.
    #[error("failed to render configuration: {0}")]
    Render(#[from] toml::ser::Error),
}

/// Options for one duplicate scan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanOptions {
    /// Include image files.
    pub include_images: bool,
    /// Include video files.
    pub include_videos: bool,
    /// Include document files.
    pub include_documents: bool,
    /// Include audio files.
    pub include_audio: bool,
    /// Files smaller than this are skipped (bytes, inclusive bound).
    pub min_file_size: u64,
    /// Files larger than this are skipped (bytes, inclusive bound).
    pub max_file_size: u64,
    /// Minimum fingerprint similarity for two images to cluster.
    pub similarity_threshold: f32,
    /// Look for visually similar images in addition to exact duplicates.
    pub use_perceptual_hash: bool,
    /// When non-empty, only paths starting with one of these prefixes are scanned.
    pub include_paths: Vec<PathBuf>,
    /// Paths starting with any of these prefixes are skipped.
    pub exclude_paths: Vec<PathBuf>,
    /// Worker threads for the hashing phase.
    pub io_threads: usize,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            include_images: true,
            include_videos: true,
            include_documents: true,
            include_audio: true,
            min_file_size: 1024,
            max_file_size: UNBOUNDED_FILE_SIZE,
            similarity_threshold: 0.95,
            use_perceptual_hash: true,
            include_paths: Vec::new(),
            exclude_paths: Vec::new(),
            io_threads: 4,
        }
    }
}

impl ScanOptions {
    /// Load layered options.
    ///
    /// With `path = None` the platform config file is used when it exists.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Load`] when a layer cannot be parsed, or a
    /// validation error when the merged options are inconsistent.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        match path {
            Some(path) => {
                log::debug!("Loading configuration from {}", path.display());
                figment = figment.merge(Toml::file(path));
            }
            None => {
                if let Some(default_path) = Self::default_path() {
                    if default_path.exists() {
                        log::debug!("Loading configuration from {}", default_path.display());
                        figment = figment.merge(Toml::file(default_path));
                    }
                }
            }
        }

        let options: Self = figment
            .merge(Env::prefixed(ENV_PREFIX))
            .extract()
            .map_err(Box::new)?;
        options.validate()?;
        Ok(options)
    }

    /// Platform-specific default config file location.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("com", "sweepdupe", "sweepdupe")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Check option consistency.
    ///
    /// # Errors
    ///
    /// Fails on a threshold outside `[0, 1]` or `min_file_size > max_file_size`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.similarity_threshold) {
            return Err(ConfigError::InvalidThreshold(self.similarity_threshold));
        }
        if self.min_file_size > self.max_file_size {
            return Err(ConfigError::InvalidSizeRange {
                min: self.min_file_size,
                max: self.max_file_size,
            });
        }
        Ok(())
    }

    /// Whether files of `category` pass the category flags.
    ///
    /// Uncategorised files are always included.
    #[must_use]
    pub fn includes_category(&self, category: MediaCategory) -> bool {
        match category {
            MediaCategory::Image => self.include_images,
            MediaCategory::Video => self.include_videos,
            MediaCategory::Document => self.include_documents,
            MediaCategory::Audio => self.include_audio,
            MediaCategory::Other => true,
        }
    }

    /// Render the options as TOML, e.g. to seed a config file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Render`] if serialization fails.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }
}
