//! Command-line interface for the `sweepdupe` driver.
//!
//! The binary runs one scan and prints the result. It never deletes files;
//! deletion is a library operation for embedding applications.
//!
//! # Example
//!
//! ```bash
//! # Scan two roots, skipping app caches
//! sweepdupe /sdcard/DCIM /sdcard/Download --exclude /sdcard/Android
//!
//! # Exact duplicates only, at least 1 MiB, as JSON
//! sweepdupe ~/Pictures --no-perceptual --min-size 1MiB --json
//!
//! # Print the effective configuration as TOML
//! sweepdupe --dump-config
//! ```

use std::path::PathBuf;

use bytesize::ByteSize;
use clap::Parser;

use crate::config::ScanOptions;

/// Find duplicate files and visually similar images.
#[derive(Debug, Parser)]
#[command(name = "sweepdupe")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Root directories to scan
    #[arg(value_name = "DIR", required_unless_present = "dump_config")]
    pub directories: Vec<PathBuf>,

    /// Configuration file (TOML); defaults to the platform config directory
    #[arg(long, value_name = "FILE", env = "SWEEPDUPE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Minimum file size to consider (e.g. 0, 4KB, 1MiB)
    #[arg(long, value_name = "SIZE", value_parser = parse_size)]
    pub min_size: Option<u64>,

    /// Maximum file size to consider (e.g. 500MB, 2GiB)
    #[arg(long, value_name = "SIZE", value_parser = parse_size)]
    pub max_size: Option<u64>,

    /// Minimum image similarity in [0, 1]
    #[arg(long, value_name = "F", value_parser = parse_threshold)]
    pub threshold: Option<f32>,

    /// Skip the similar-image pass
    #[arg(long)]
    pub no_perceptual: bool,

    /// Skip image files
    #[arg(long)]
    pub no_images: bool,

    /// Skip video files
    #[arg(long)]
    pub no_videos: bool,

    /// Skip document files
    #[arg(long)]
    pub no_documents: bool,

    /// Skip audio files
    #[arg(long)]
    pub no_audio: bool,

    /// Only scan paths starting with this prefix (repeatable)
    #[arg(long = "include", value_name = "PREFIX")]
    pub include_paths: Vec<PathBuf>,

    /// Skip paths starting with this prefix (repeatable)
    #[arg(long = "exclude", value_name = "PREFIX")]
    pub exclude_paths: Vec<PathBuf>,

    /// Number of hashing threads
    #[arg(long, value_name = "N")]
    pub io_threads: Option<usize>,

    /// Print the result as JSON
    #[arg(long)]
    pub json: bool,

    /// Report errors as JSON on stderr
    #[arg(long)]
    pub json_errors: bool,

    /// Print the effective configuration as TOML and exit
    #[arg(long)]
    pub dump_config: bool,

    /// Increase verbosity level (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}

impl Cli {
    /// Overlay command-line flags on loaded options.
    pub fn apply(&self, options: &mut ScanOptions) {
        if let Some(min) = self.min_size {
            options.min_file_size = min;
        }
        if let Some(max) = self.max_size {
            options.max_file_size = max;
        }
        if let Some(threshold) = self.threshold {
            options.similarity_threshold = threshold;
        }
        if let Some(threads) = self.io_threads {
            options.io_threads = threads;
        }
        if self.no_perceptual {
            options.use_perceptual_hash = false;
        }
        options.include_images &= !self.no_images;
        options.include_videos &= !self.no_videos;
        options.include_documents &= !self.no_documents;
        options.include_audio &= !self.no_audio;
        options.include_paths.extend(self.include_paths.iter().cloned());
        options.exclude_paths.extend(self.exclude_paths.iter().cloned());
    }
}

/// Parse a human-readable size such as `1024`, `4KB` or `1.5GiB`.
///
/// # Errors
///
/// Returns a message for clap when the value is not a size.
pub fn parse_size(s: &str) -> Result<u64, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("Size cannot be empty".to_string());
    }
    s.parse::<ByteSize>()
        .map(|size| size.as_u64())
        .map_err(|e| format!("Invalid size '{s}': {e}"))
}

/// Parse a similarity threshold in `[0, 1]`.
///
/// # Errors
///
/// Returns a message for clap when the value is out of range.
pub fn parse_threshold(s: &str) -> Result<f32, String> {
    let value: f32 = s
        .trim()
        .parse()
        .map_err(|_| format!("Invalid number: '{s}'"))?;
    if (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(format!("Threshold must be within [0, 1], got {value}"))
    }
}
