//! Duplicate grouping engine.
//!
//! # Overview
//!
//! [`DuplicateFinder`] turns a candidate list into duplicate groups:
//!
//! 1. **Hashing**: every candidate gets a BLAKE3 digest. Files that cannot
//!    be read are logged and skipped; they do not count as scanned.
//! 2. **Exact grouping**: files are bucketed by digest in first-seen order.
//!    Buckets with two or more members become exact groups.
//! 3. **Similar images** (optional): hashed images get a perceptual
//!    fingerprint. Identical fingerprints share a bucket; buckets are then
//!    merged greedily, each unvisited bucket absorbing every later
//!    unvisited bucket whose similarity to it meets the threshold.
//! 4. **Ordering**: exact groups then similar clusters, stably sorted by
//!    wasted space, largest first.
//!
//! Hashing runs on a bounded rayon pool in fixed chunks. Results are
//! collected in input order, so the output matches a sequential run.
//! Cancellation is checked before each chunk and before each file.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use rayon::prelude::*;
use thiserror::Error;

use super::groups::{DuplicateFile, DuplicateGroup};
use crate::config::{ConfigError, ScanOptions};
use crate::progress::{scaled_checkpoint, CheckpointReporter};
use crate::scanner::{
    CandidateFile, CollectError, ContentDigest, ContentHasher, MediaCategory, PerceptualFingerprint,
    PerceptualHasher,
};
use crate::signal::CancelToken;

/// Upper bound on files per hashing chunk.
const MAX_CHUNK_SIZE: usize = 256;

/// Number of hashing progress steps (5% each over the 20-70 range).
const HASH_PROGRESS_STEPS: usize = 10;

/// Scan-level failures.
#[derive(Debug, Error)]
pub enum ScanError {
    /// Another scan is already running on the same service.
    #[error("a scan is already in progress")]
    AlreadyRunning,

    /// The scan was cancelled; the previous result is unchanged.
    #[error("scan cancelled")]
    Cancelled,

    /// The scan options are inconsistent.
    #[error("invalid scan options: {0}")]
    InvalidOptions(#[from] ConfigError),

    /// No root directory could be walked.
    #[error(transparent)]
    Collect(#[from] CollectError),

    /// A background scan ended without reporting an outcome.
    #[error("scan thread exited without a result")]
    Aborted,
}

/// Groups produced by one run of the engine.
#[derive(Debug, Clone, Default)]
pub struct Grouping {
    /// Exact groups and similar clusters, sorted by wasted space
    pub groups: Vec<DuplicateGroup>,
    /// Files hashed successfully
    pub files_scanned: usize,
}

/// Hashes candidates and builds duplicate groups.
pub struct DuplicateFinder {
    options: ScanOptions,
    cancel: CancelToken,
    hasher: ContentHasher,
    perceptual: PerceptualHasher,
}

impl DuplicateFinder {
    /// Create a finder for the given options.
    #[must_use]
    pub fn new(options: ScanOptions) -> Self {
        Self {
            options,
            cancel: CancelToken::new(),
            hasher: ContentHasher::new(),
            perceptual: PerceptualHasher::new(),
        }
    }

    /// Use a shared cancellation token.
    #[must_use]
    pub fn with_cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = token;
        self
    }

    fn check_cancelled(&self) -> Result<(), ScanError> {
        if self.cancel.is_cancelled() {
            log::info!("Grouping interrupted by cancellation");
            Err(ScanError::Cancelled)
        } else {
            Ok(())
        }
    }

    /// Run hashing and grouping over `candidates`.
    ///
    /// Emits checkpoints from 20 to 90 on `reporter`.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError::Cancelled`] if the token is cancelled.
    pub fn find(
        &self,
        candidates: Vec<CandidateFile>,
        reporter: &CheckpointReporter<'_>,
    ) -> Result<Grouping, ScanError> {
        let started = Instant::now();
        reporter.emit(20);

        let hashed = self.hash_all(candidates, reporter)?;
        let files_scanned = hashed.len();
        reporter.emit(70);
        self.check_cancelled()?;

        let mut groups = group_exact(&hashed);
        log::info!(
            "Found {} exact group(s) among {} hashed file(s)",
            groups.len(),
            files_scanned
        );

        if self.options.use_perceptual_hash {
            let images: Vec<DuplicateFile> = hashed
                .into_iter()
                .filter(|f| f.category == MediaCategory::Image)
                .collect();
            let fingerprinted = self.fingerprint_all(images)?;
            reporter.emit(80);

            let similar = group_similar(fingerprinted, self.options.similarity_threshold);
            log::info!("Found {} similar image cluster(s)", similar.len());
            groups.extend(similar);
        }
        self.check_cancelled()?;

        // Stable: ties keep discovery order.
        groups.sort_by(|a, b| b.wasted_space.cmp(&a.wasted_space));
        reporter.emit(90);

        log::debug!("Grouping finished in {:?}", started.elapsed());
        Ok(Grouping {
            groups,
            files_scanned,
        })
    }

    fn hash_all(
        &self,
        candidates: Vec<CandidateFile>,
        reporter: &CheckpointReporter<'_>,
    ) -> Result<Vec<DuplicateFile>, ScanError> {
        let total = candidates.len();
        if total == 0 {
            log::debug!("No candidates to hash");
            return Ok(Vec::new());
        }

        log::info!("Hashing {} file(s)", total);
        let pool = build_pool(self.options.io_threads);
        let flag = self.cancel.get_flag();
        let chunk_size = total.div_ceil(HASH_PROGRESS_STEPS).clamp(1, MAX_CHUNK_SIZE);

        let mut hashed = Vec::with_capacity(total);
        let mut done = 0usize;
        let mut failed = 0usize;

        for chunk in candidates.chunks(chunk_size) {
            self.check_cancelled()?;

            let results = run_chunk(pool.as_ref(), chunk, |candidate| self.hash_one(candidate, &flag));
            for file in results {
                match file {
                    Some(file) => hashed.push(file),
                    None => failed += 1,
                }
            }

            done += chunk.len();
            reporter.emit(scaled_checkpoint(20, 70, done, total));
        }

        // Files skipped because of a late cancellation look like failures.
        self.check_cancelled()?;

        if failed > 0 {
            log::warn!("Skipped {} file(s) that could not be hashed", failed);
        }
        Ok(hashed)
    }

    fn hash_one(&self, candidate: &CandidateFile, cancel: &Arc<AtomicBool>) -> Option<DuplicateFile> {
        if cancel.load(Ordering::SeqCst) {
            return None;
        }
        match self.hasher.digest(&candidate.path) {
            Ok(digest) => {
                log::trace!("Hashed {} -> {}", candidate.path.display(), digest.short());
                Some(DuplicateFile::from_candidate(candidate.clone(), digest))
            }
            Err(e) => {
                log::warn!("Failed to hash {}: {}", candidate.path.display(), e);
                None
            }
        }
    }

    fn fingerprint_all(
        &self,
        images: Vec<DuplicateFile>,
    ) -> Result<Vec<(DuplicateFile, PerceptualFingerprint)>, ScanError> {
        if images.is_empty() {
            return Ok(Vec::new());
        }

        log::info!("Fingerprinting {} image(s)", images.len());
        let pool = build_pool(self.options.io_threads);
        let mut fingerprinted = Vec::with_capacity(images.len());

        for chunk in images.chunks(MAX_CHUNK_SIZE) {
            self.check_cancelled()?;
            let results = run_chunk(pool.as_ref(), chunk, |file| {
                self.perceptual.fingerprint(&file.path).map(|fp| (file.clone(), fp))
            });
            fingerprinted.extend(results.into_iter().flatten());
        }

        Ok(fingerprinted)
    }
}

/// Build the hashing pool, or `None` to run on the calling thread.
fn build_pool(threads: usize) -> Option<rayon::ThreadPool> {
    match rayon::ThreadPoolBuilder::new().num_threads(threads.max(1)).build() {
        Ok(pool) => Some(pool),
        Err(e) => {
            log::warn!("Failed to create thread pool with {} threads: {}; hashing sequentially", threads, e);
            None
        }
    }
}

/// Map `f` over `chunk`, in parallel when a pool is available, keeping order.
fn run_chunk<T, R, F>(pool: Option<&rayon::ThreadPool>, chunk: &[T], f: F) -> Vec<R>
where
    T: Sync,
    R: Send,
    F: Fn(&T) -> R + Sync + Send,
{
    match pool {
        Some(pool) => pool.install(|| chunk.par_iter().map(&f).collect()),
        None => chunk.iter().map(f).collect(),
    }
}

/// Bucket hashed files by digest, keeping first-seen bucket order.
fn group_exact(files: &[DuplicateFile]) -> Vec<DuplicateGroup> {
    let mut index: HashMap<&ContentDigest, usize> = HashMap::new();
    let mut buckets: Vec<(&ContentDigest, Vec<DuplicateFile>)> = Vec::new();

    for file in files {
        match index.get(&file.digest) {
            Some(&i) => buckets[i].1.push(file.clone()),
            None => {
                index.insert(&file.digest, buckets.len());
                buckets.push((&file.digest, vec![file.clone()]));
            }
        }
    }

    buckets
        .into_iter()
        .filter_map(|(digest, members)| {
            let group = DuplicateGroup::exact(digest, members)?;
            log::debug!(
                "Exact group {} with {} files ({} bytes wasted)",
                digest.short(),
                group.len(),
                group.wasted_space
            );
            Some(group)
        })
        .collect()
}

/// Cluster fingerprinted images whose similarity meets `threshold`.
///
/// A cluster may overlap exact groups; byte-identical images appear in both.
fn group_similar(images: Vec<(DuplicateFile, PerceptualFingerprint)>, threshold: f32) -> Vec<DuplicateGroup> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut buckets: Vec<(PerceptualFingerprint, Vec<DuplicateFile>)> = Vec::new();

    for (file, fingerprint) in images {
        let key = fingerprint.key();
        match index.get(&key) {
            Some(&i) => buckets[i].1.push(file),
            None => {
                index.insert(key, buckets.len());
                buckets.push((fingerprint, vec![file]));
            }
        }
    }

    let mut visited = vec![false; buckets.len()];
    let mut clusters = Vec::new();

    for i in 0..buckets.len() {
        if visited[i] {
            continue;
        }
        visited[i] = true;

        let anchor = &buckets[i].0;
        let mut members = buckets[i].1.clone();
        for j in (i + 1)..buckets.len() {
            if !visited[j] && anchor.similarity(&buckets[j].0) >= threshold {
                visited[j] = true;
                members.extend(buckets[j].1.iter().cloned());
            }
        }

        if let Some(group) = DuplicateGroup::similar(&anchor.key(), members, threshold) {
            log::debug!("Similar cluster {} with {} images", group.id, group.len());
            clusters.push(group);
        }
    }

    clusters
}
