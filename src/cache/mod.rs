//! Single-slot cache for the latest scan result.
//!
//! # Overview
//!
//! [`ResultCache`] holds at most one [`ScanResult`] behind an `Arc`.
//! Publishing swaps the pointer under a write lock, so a reader always sees
//! either the previous result or the complete new one. Results are never
//! mutated in place: a deletion builds a new result and publishes it.
//!
//! The cache is an ordinary value owned by the
//! [`DuplicateService`](crate::service::DuplicateService); tests create as
//! many as they need.

use std::sync::{Arc, PoisonError, RwLock};

use crate::duplicates::{DuplicateGroup, ScanResult};

/// Holder of the current scan result.
#[derive(Debug, Default)]
pub struct ResultCache {
    slot: RwLock<Option<Arc<ScanResult>>>,
}

impl ResultCache {
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The cached result, if a scan has been published.
    #[must_use]
    pub fn get(&self) -> Option<Arc<ScanResult>> {
        self.slot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// The cached result, or the zeroed empty result.
    #[must_use]
    pub fn current(&self) -> Arc<ScanResult> {
        self.get().unwrap_or_else(|| Arc::new(ScanResult::empty()))
    }

    /// Clone of one cached group.
    #[must_use]
    pub fn group(&self, id: &str) -> Option<DuplicateGroup> {
        self.get().and_then(|result| result.group(id).cloned())
    }

    /// Replace the cached result.
    pub fn publish(&self, result: Arc<ScanResult>) {
        log::debug!(
            "Publishing scan result with {} group(s)",
            result.groups.len()
        );
        *self.slot.write().unwrap_or_else(PoisonError::into_inner) = Some(result);
    }

    /// Drop the cached result.
    pub fn clear(&self) {
        *self.slot.write().unwrap_or_else(PoisonError::into_inner) = None;
    }

    /// Whether a result is cached.
    #[must_use]
    pub fn is_populated(&self) -> bool {
        self.slot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }
}
