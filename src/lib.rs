//! SweepDupe - duplicate and similar-image finder for storage cleaning.
//!
//! The library finds byte-identical files by BLAKE3 content digest and
//! visually similar images by perceptual fingerprint, groups them with
//! wasted-space accounting, and deletes selected copies while always
//! keeping one.
//!
//! The entry point is [`service::DuplicateService`]:
//!
//! ```no_run
//! use std::path::PathBuf;
//! use sweepdupe::config::ScanOptions;
//! use sweepdupe::progress::NoopObserver;
//! use sweepdupe::service::DuplicateService;
//! use sweepdupe::signal::CancelToken;
//!
//! let service = DuplicateService::new();
//! let result = service
//!     .scan(&[PathBuf::from("/sdcard")], &ScanOptions::default(), &NoopObserver, &CancelToken::new())
//!     .unwrap();
//!
//! if let Some(group) = result.groups.first() {
//!     // Keep the oldest copy.
//!     let extra: Vec<PathBuf> = group.paths().into_iter().skip(1).collect();
//!     service.delete_files(&group.id, &extra).unwrap();
//! }
//! ```

pub mod actions;
pub mod cache;
pub mod cli;
pub mod config;
pub mod duplicates;
pub mod error;
pub mod logging;
pub mod output;
pub mod progress;
pub mod scanner;
pub mod service;
pub mod signal;

use std::io;
use std::sync::mpsc::RecvTimeoutError;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;

use crate::cli::Cli;
use crate::config::ScanOptions;
use crate::duplicates::{ScanError, ScanResult};
use crate::error::ExitCode;
use crate::output::{JsonOutput, TextOutput};
use crate::progress::{ProgressBarObserver, ProgressObserver, ScanEvent};
use crate::service::DuplicateService;
use crate::signal::CancelToken;

/// Run the command-line driver.
///
/// # Errors
///
/// Returns configuration, scan and output errors. A cancelled scan surfaces
/// as [`ScanError::Cancelled`] inside the `anyhow` chain.
pub fn run_app(cli: Cli) -> anyhow::Result<ExitCode> {
    logging::init_logging(cli.verbose, cli.quiet);

    let mut options = ScanOptions::load(cli.config.as_deref()).context("Failed to load configuration")?;
    cli.apply(&mut options);
    options.validate().context("Invalid options")?;

    if cli.dump_config {
        print!("{}", options.to_toml()?);
        return Ok(ExitCode::Success);
    }

    let interrupt = signal::install_handler().unwrap_or_else(|e| {
        log::warn!("{}; Ctrl+C will terminate immediately", e);
        CancelToken::new()
    });

    let service = Arc::new(DuplicateService::new());
    let handle = service
        .start_scan(cli.directories.clone(), options)
        .context("Failed to start scan")?;

    let bar = ProgressBarObserver::new(cli.quiet || cli.json);
    let outcome: Result<Arc<ScanResult>, ScanError> = loop {
        if interrupt.is_cancelled() {
            handle.cancel();
        }
        match handle.events().recv_timeout(Duration::from_millis(100)) {
            Ok(ScanEvent::Progress(percent)) => bar.on_progress(percent),
            Ok(ScanEvent::Completed(result)) => break Ok(result),
            Ok(ScanEvent::Failed(e)) => break Err(e),
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => break Err(ScanError::Aborted),
        }
    };
    bar.finish();

    let result = outcome?;
    let stdout = io::stdout().lock();
    if cli.json {
        JsonOutput::new(&result).write_to(stdout)?;
    } else {
        TextOutput::new(&result).write_to(stdout)?;
    }

    Ok(if result.is_empty() {
        ExitCode::NoDuplicates
    } else {
        ExitCode::Success
    })
}
