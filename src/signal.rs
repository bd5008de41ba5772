//! Cooperative cancellation and Ctrl+C wiring.
//!
//! A [`CancelToken`] is a shared `AtomicBool`. The scan pipeline checks it
//! between hashing chunks and between directory entries; a cancelled scan
//! ends with [`ScanError::Cancelled`](crate::duplicates::ScanError::Cancelled)
//! and leaves the previously published result untouched.
//!
//! The driver binary calls [`install_handler`] so that Ctrl+C cancels the
//! running scan instead of killing the process mid-write.
//!
//! ```rust,no_run
//! use sweepdupe::signal::install_handler;
//!
//! let token = install_handler().expect("Failed to install signal handler");
//! if token.is_cancelled() {
//!     return;
//! }
//! ```

use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

/// Shared cancellation flag.
///
/// Clones observe the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    /// Create a token that is not cancelled.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation was requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// The underlying flag, for code that polls an `AtomicBool` directly.
    #[must_use]
    pub fn get_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.flag)
    }
}

/// Error type for signal handler installation.
#[derive(Debug, thiserror::Error)]
pub enum SignalError {
    /// Failed to install the Ctrl+C handler.
    #[error("Failed to install signal handler: {0}")]
    InstallFailed(#[from] ctrlc::Error),
}

static GLOBAL_TOKEN: OnceLock<CancelToken> = OnceLock::new();

/// Install a Ctrl+C handler that cancels the returned token.
///
/// Calling this again returns the already registered token.
///
/// # Errors
///
/// Returns [`SignalError::InstallFailed`] when another handler was
/// registered outside this module.
pub fn install_handler() -> Result<CancelToken, SignalError> {
    if let Some(token) = GLOBAL_TOKEN.get() {
        return Ok(token.clone());
    }

    let token = CancelToken::new();
    let hooked = token.clone();
    ctrlc::set_handler(move || {
        hooked.cancel();
        let _ = writeln!(std::io::stderr(), "\nInterrupted. Cancelling scan...");
        let _ = std::io::stderr().flush();
        log::info!("Cancellation signal received");
    })?;

    let _ = GLOBAL_TOKEN.set(token.clone());
    Ok(token)
}
