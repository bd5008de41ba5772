//! Scan orchestration and the public duplicate-finding API.
//!
//! # Overview
//!
//! [`DuplicateService`] owns the [`ResultCache`] and drives one scan at a
//! time: collect candidates, hash and group them, publish the result.
//!
//! ```text
//! Idle -> Scanning(0..100) -> Completed(ScanResult) | Failed(ScanError)
//! ```
//!
//! - A second scan while one runs fails with [`ScanError::AlreadyRunning`].
//! - A cancelled or failed scan leaves the cached result untouched.
//! - Deletions are rejected while a scan runs. A scan does not start until
//!   a running deletion has finished, and deletions are serialized with the
//!   scan's publish step.
//!
//! # Example
//!
//! ```no_run
//! use std::path::PathBuf;
//! use std::sync::Arc;
//! use sweepdupe::config::ScanOptions;
//! use sweepdupe::service::DuplicateService;
//!
//! let service = Arc::new(DuplicateService::new());
//! let handle = service
//!     .start_scan(vec![PathBuf::from("/sdcard")], ScanOptions::default())
//!     .unwrap();
//! let result = handle.wait_with(|percent| println!("{}%", percent)).unwrap();
//! println!("{} duplicate(s)", result.total_duplicates);
//! ```

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Instant;

use crate::actions::delete::{delete_group_members, BatchDeleteResult, DeleteError};
use crate::cache::ResultCache;
use crate::config::ScanOptions;
use crate::duplicates::{DuplicateFinder, DuplicateGroup, ScanError, ScanResult};
use crate::progress::{ChannelObserver, CheckpointReporter, ProgressObserver, ScanEvent};
use crate::scanner::{Collector, ContentDigest, ContentHasher, HashError, PerceptualFingerprint, PerceptualHasher};
use crate::signal::CancelToken;

/// Duplicate finder with a single cached result.
pub struct DuplicateService {
    cache: ResultCache,
    scanning: AtomicBool,
    /// Serializes cache mutation between publish and delete.
    mutation: Mutex<()>,
    hasher: ContentHasher,
    perceptual: PerceptualHasher,
}

/// Clears the scanning flag when the scan ends, however it ends.
struct ScanGuard<'a>(&'a AtomicBool);

impl<'a> ScanGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Result<Self, ScanError> {
        flag.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .map(|_| Self(flag))
            .map_err(|_| ScanError::AlreadyRunning)
    }
}

impl Drop for ScanGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl DuplicateService {
    /// Create a service with an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self {
            cache: ResultCache::new(),
            scanning: AtomicBool::new(false),
            mutation: Mutex::new(()),
            hasher: ContentHasher::new(),
            perceptual: PerceptualHasher::new(),
        }
    }

    /// Whether a scan is currently running.
    #[must_use]
    pub fn is_scanning(&self) -> bool {
        self.scanning.load(Ordering::SeqCst)
    }

    /// Run a scan on the calling thread.
    ///
    /// Progress checkpoints go to `observer`, strictly increasing and ending
    /// with 100 on success. The new result replaces the cached one.
    ///
    /// # Errors
    ///
    /// - [`ScanError::AlreadyRunning`] if another scan is in flight
    /// - [`ScanError::InvalidOptions`] if `options` fail validation
    /// - [`ScanError::Collect`] if no root directory is accessible
    /// - [`ScanError::Cancelled`] if `cancel` fires before publishing
    pub fn scan(
        &self,
        directories: &[PathBuf],
        options: &ScanOptions,
        observer: &dyn ProgressObserver,
        cancel: &CancelToken,
    ) -> Result<Arc<ScanResult>, ScanError> {
        // A delete in flight holds the lock; wait for it before reading the tree.
        let _guard = {
            let _lock = self.mutation.lock().unwrap_or_else(PoisonError::into_inner);
            ScanGuard::acquire(&self.scanning)?
        };
        options.validate()?;

        let started = Instant::now();
        let reporter = CheckpointReporter::new(observer);
        reporter.emit(0);
        log::info!("Starting duplicate scan of {} root(s)", directories.len());

        reporter.emit(5);
        let candidates = Collector::new(options)
            .with_cancel_token(cancel.clone())
            .collect(directories)?;
        if cancel.is_cancelled() {
            log::info!("Scan cancelled during collection");
            return Err(ScanError::Cancelled);
        }
        log::info!("Collected {} candidate file(s)", candidates.len());

        let grouping = DuplicateFinder::new(options.clone())
            .with_cancel_token(cancel.clone())
            .find(candidates, &reporter)?;

        let result = Arc::new(ScanResult::from_groups(
            grouping.groups,
            grouping.files_scanned,
            started.elapsed(),
        ));

        {
            let _lock = self.mutation.lock().unwrap_or_else(PoisonError::into_inner);
            if cancel.is_cancelled() {
                log::info!("Scan cancelled before publishing");
                return Err(ScanError::Cancelled);
            }
            self.cache.publish(Arc::clone(&result));
        }
        reporter.finish();

        log::info!(
            "Scan complete: {} group(s), {} duplicate(s), {} bytes reclaimable in {:?}",
            result.groups.len(),
            result.total_duplicates,
            result.total_wasted_space,
            result.scan_duration
        );
        Ok(result)
    }

    /// Run a scan on a background thread.
    ///
    /// The returned handle yields progress events followed by exactly one
    /// terminal event.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the scan thread cannot be spawned.
    pub fn start_scan(
        self: &Arc<Self>,
        directories: Vec<PathBuf>,
        options: ScanOptions,
    ) -> std::io::Result<ScanHandle> {
        let (sender, events) = mpsc::channel();
        let cancel = CancelToken::new();
        let service = Arc::clone(self);
        let token = cancel.clone();

        let thread = thread::Builder::new()
            .name("sweepdupe-scan".to_string())
            .spawn(move || {
                let observer = ChannelObserver::new(sender.clone());
                let event = match service.scan(&directories, &options, &observer, &token) {
                    Ok(result) => ScanEvent::Completed(result),
                    Err(e) => {
                        log::warn!("Scan failed: {}", e);
                        ScanEvent::Failed(e)
                    }
                };
                let _ = sender.send(event);
            })?;

        Ok(ScanHandle {
            events,
            cancel,
            thread: Some(thread),
        })
    }

    /// The last published result, or the zeroed empty result.
    #[must_use]
    pub fn scan_results(&self) -> Arc<ScanResult> {
        self.cache.current()
    }

    /// One group of the cached result.
    #[must_use]
    pub fn duplicate_group(&self, group_id: &str) -> Option<DuplicateGroup> {
        self.cache.group(group_id)
    }

    /// Delete members of a cached group and return how many were removed.
    ///
    /// # Errors
    ///
    /// See [`delete_files_report`](Self::delete_files_report).
    pub fn delete_files(&self, group_id: &str, paths: &[PathBuf]) -> Result<usize, DeleteError> {
        self.delete_files_report(group_id, paths)
            .map(|batch| batch.success_count())
    }

    /// Delete members of a cached group, reporting each outcome.
    ///
    /// # Errors
    ///
    /// - [`DeleteError::ScanInProgress`] while a scan runs
    /// - [`DeleteError::GroupNotFound`] for an unknown id
    /// - [`DeleteError::MustKeepOne`] if no member would remain
    pub fn delete_files_report(
        &self,
        group_id: &str,
        paths: &[PathBuf],
    ) -> Result<BatchDeleteResult, DeleteError> {
        let _lock = self.mutation.lock().unwrap_or_else(PoisonError::into_inner);
        if self.is_scanning() {
            return Err(DeleteError::ScanInProgress);
        }
        delete_group_members(&self.cache, group_id, paths)
    }

    /// Drop the cached result.
    pub fn clear_results(&self) {
        let _lock = self.mutation.lock().unwrap_or_else(PoisonError::into_inner);
        self.cache.clear();
        log::debug!("Scan results cleared");
    }

    /// Content digest of a single file.
    ///
    /// # Errors
    ///
    /// Returns a [`HashError`] if the file cannot be read.
    pub fn file_digest(&self, path: &Path) -> Result<ContentDigest, HashError> {
        self.hasher.digest(path)
    }

    /// Perceptual fingerprint of an image, `None` if it cannot be decoded.
    #[must_use]
    pub fn image_fingerprint(&self, path: &Path) -> Option<PerceptualFingerprint> {
        self.perceptual.fingerprint(path)
    }

    /// Similarity of two images in `[0, 1]`; `0.0` if either cannot be
    /// decoded.
    #[must_use]
    pub fn compare_images(&self, a: &Path, b: &Path) -> f32 {
        match (self.image_fingerprint(a), self.image_fingerprint(b)) {
            (Some(a), Some(b)) => a.similarity(&b),
            _ => 0.0,
        }
    }
}

impl Default for DuplicateService {
    fn default() -> Self {
        Self::new()
    }
}

/// Handle to a background scan.
pub struct ScanHandle {
    events: Receiver<ScanEvent>,
    cancel: CancelToken,
    thread: Option<JoinHandle<()>>,
}

impl ScanHandle {
    /// Request cooperative cancellation.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// The token that cancels this scan.
    #[must_use]
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Raw event stream.
    #[must_use]
    pub fn events(&self) -> &Receiver<ScanEvent> {
        &self.events
    }

    /// Block until the scan ends, discarding progress.
    ///
    /// # Errors
    ///
    /// Returns the scan's error.
    pub fn wait(self) -> Result<Arc<ScanResult>, ScanError> {
        self.wait_with(|_| {})
    }

    /// Block until the scan ends, passing each checkpoint to `on_progress`.
    ///
    /// # Errors
    ///
    /// Returns the scan's error, or [`ScanError::Aborted`] if the scan
    /// thread ended without a terminal event.
    pub fn wait_with<F: FnMut(u8)>(mut self, mut on_progress: F) -> Result<Arc<ScanResult>, ScanError> {
        let mut outcome = Err(ScanError::Aborted);
        for event in self.events.iter() {
            match event {
                ScanEvent::Progress(percent) => on_progress(percent),
                ScanEvent::Completed(result) => {
                    outcome = Ok(result);
                    break;
                }
                ScanEvent::Failed(e) => {
                    outcome = Err(e);
                    break;
                }
            }
        }

        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                log::error!("Scan thread panicked");
            }
        }
        outcome
    }
}
