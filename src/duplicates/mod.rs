//! Duplicate detection module.
//!
//! This module provides functionality for:
//! - Content hashing of candidates on a bounded worker pool
//! - Exact grouping by content digest
//! - Similar-image clustering by perceptual fingerprint
//! - Group and result types with wasted-space accounting

pub mod finder;
pub mod groups;

pub use finder::{DuplicateFinder, Grouping, ScanError};
pub use groups::{DuplicateFile, DuplicateGroup, DuplicateKind, ScanResult};
