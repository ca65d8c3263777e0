//! Cooperative cancellation for downloads and installer execution
//!
//! A `CancelToken` is cheap to clone and is threaded through
//! `DownloadManager::fetch` (checked between streamed chunks, discarding the
//! partial temp file) and `InstallerRunner` (polled while waiting on the
//! child process). The core never installs a signal handler; wiring Ctrl-C
//! to a token is the embedding front-end's concern.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::{AppdeckError, Result};

/// Cloneable cancellation flag shared across threads
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    /// Create a new, un-cancelled token
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation; all clones observe it
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation has been requested
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Return `Err(Cancelled)` if cancellation has been requested
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(AppdeckError::Cancelled)
        } else {
            Ok(())
        }
    }
}
