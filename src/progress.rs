//! Scan progress reporting.
//!
//! A scan reports coarse checkpoints as integer percentages:
//!
//! | Range  | Phase                                  |
//! |--------|----------------------------------------|
//! | 0-20   | candidate collection                   |
//! | 20-70  | content hashing, every 5%              |
//! | 70-90  | exact grouping and image similarity    |
//! | 90-100 | sorting and publishing the result      |
//!
//! [`CheckpointReporter`] sits between the pipeline and a
//! [`ProgressObserver`] and drops any value that is not strictly greater
//! than the last one emitted, so observers always see an increasing
//! sequence ending in 100.
//!
//! For background scans the observer is a [`ChannelObserver`] feeding
//! [`ScanEvent`]s into a `std::sync::mpsc` channel, terminated by exactly
//! one `Completed` or `Failed` event.

use std::sync::atomic::{AtomicU16, Ordering};
use std::sync::mpsc::Sender;
use std::sync::Arc;

use indicatif::{ProgressBar, ProgressStyle};

use crate::duplicates::{ScanError, ScanResult};

/// Receives scan progress checkpoints.
pub trait ProgressObserver: Send + Sync {
    /// Called with a percentage in `0..=100`.
    fn on_progress(&self, percent: u8);
}

impl<F> ProgressObserver for F
where
    F: Fn(u8) + Send + Sync,
{
    fn on_progress(&self, percent: u8) {
        self(percent);
    }
}

/// Observer that discards every checkpoint.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl ProgressObserver for NoopObserver {
    fn on_progress(&self, _percent: u8) {}
}

/// Forwards only strictly increasing checkpoints to an observer.
pub struct CheckpointReporter<'a> {
    observer: &'a dyn ProgressObserver,
    /// Last emitted value plus one; zero before the first emission.
    last: AtomicU16,
}

impl<'a> CheckpointReporter<'a> {
    /// Wrap an observer.
    #[must_use]
    pub fn new(observer: &'a dyn ProgressObserver) -> Self {
        Self {
            observer,
            last: AtomicU16::new(0),
        }
    }

    /// Emit `percent` (clamped to 100) if it exceeds every earlier value.
    pub fn emit(&self, percent: u8) {
        let percent = percent.min(100);
        let marker = u16::from(percent) + 1;
        if self.last.fetch_max(marker, Ordering::SeqCst) < marker {
            self.observer.on_progress(percent);
        }
    }

    /// Emit the final 100 checkpoint.
    pub fn finish(&self) {
        self.emit(100);
    }
}

/// Map `done` out of `total` items onto `start..=end`, floored to a
/// multiple of 5.
#[must_use]
pub fn scaled_checkpoint(start: u8, end: u8, done: usize, total: usize) -> u8 {
    if total == 0 || end <= start {
        return end.max(start);
    }
    let span = usize::from(end - start);
    let raw = usize::from(start) + done.min(total) * span / total;
    let floored = raw - raw % 5;
    u8::try_from(floored.max(usize::from(start))).unwrap_or(end)
}

/// Event delivered by a background scan.
#[derive(Debug)]
pub enum ScanEvent {
    /// A progress checkpoint.
    Progress(u8),
    /// The scan finished and its result was published.
    Completed(Arc<ScanResult>),
    /// The scan stopped with an error; the cached result is unchanged.
    Failed(ScanError),
}

impl ScanEvent {
    /// Whether this is the last event of a scan.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Progress(_))
    }
}

/// Observer that forwards checkpoints into a channel.
#[derive(Debug, Clone)]
pub struct ChannelObserver {
    sender: Sender<ScanEvent>,
}

impl ChannelObserver {
    /// Create an observer for `sender`.
    #[must_use]
    pub fn new(sender: Sender<ScanEvent>) -> Self {
        Self { sender }
    }
}

impl ProgressObserver for ChannelObserver {
    fn on_progress(&self, percent: u8) {
        // The receiver may have been dropped; the scan keeps going.
        let _ = self.sender.send(ScanEvent::Progress(percent));
    }
}

/// Terminal progress bar for the driver binary.
pub struct ProgressBarObserver {
    bar: ProgressBar,
}

impl ProgressBarObserver {
    /// Create a bar; with `quiet` it is hidden.
    #[must_use]
    pub fn new(quiet: bool) -> Self {
        let bar = if quiet {
            ProgressBar::hidden()
        } else {
            ProgressBar::new(100)
        };
        bar.set_style(
            ProgressStyle::with_template("[{elapsed_precise}] [{bar:40.cyan/blue}] {pos:>3}% {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("█>-"),
        );
        bar.set_message("Scanning");
        Self { bar }
    }

    /// Stop rendering and clear the bar.
    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl ProgressObserver for ProgressBarObserver {
    fn on_progress(&self, percent: u8) {
        let message = match percent {
            0..=19 => "Collecting files",
            20..=69 => "Hashing",
            70..=89 => "Grouping",
            _ => "Finishing",
        };
        self.bar.set_message(message);
        self.bar.set_position(u64::from(percent));
    }
}
