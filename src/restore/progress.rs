//! State shared by the concurrent restore tasks of one run

use super::types::{RestoreError, RestoreProgress};
use crate::error::{Error, Result};
use crate::events::Notifier;
use crate::sync::MutexExt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use time::UtcOffset;

/// Cooperative cancellation flag for a restore run
///
/// Tasks check it before each unit of work. Units already committed stay committed.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// `Err(Error::Cancelled)` once cancellation was requested
    ///
    /// # Errors
    ///
    /// Returns [`Error::Cancelled`] if the token was cancelled.
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(Error::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// Progress counter with a fixed total
///
/// The notifier is called while the counter lock is held, so listeners see
/// `completed` strictly increasing even when tasks interleave.
pub struct ProgressTracker {
    total: u64,
    completed: Mutex<u64>,
    notifier: Arc<dyn Notifier>,
    token: CancellationToken,
}

impl ProgressTracker {
    pub fn new(total: u64, notifier: Arc<dyn Notifier>, token: CancellationToken) -> Self {
        Self {
            total,
            completed: Mutex::new(0),
            notifier,
            token,
        }
    }

    /// Count one finished unit and notify, unless the run was cancelled
    pub fn advance(&self, label: &str) {
        let mut completed = self.completed.lock_recovered();
        *completed += 1;
        debug_assert!(*completed <= self.total, "progress past total");

        if self.token.is_cancelled() {
            return;
        }
        self.notifier.on_progress(label, *completed, self.total);
    }

    #[must_use]
    pub fn snapshot(&self) -> RestoreProgress {
        RestoreProgress {
            completed: *self.completed.lock_recovered(),
            total: self.total,
        }
    }
}

/// Append-only accumulator of per-item failures
#[derive(Debug)]
pub struct ErrorCollector {
    errors: Mutex<Vec<RestoreError>>,
    offset: UtcOffset,
}

impl Default for ErrorCollector {
    fn default() -> Self {
        Self::new(UtcOffset::UTC)
    }
}

impl ErrorCollector {
    /// Create a collector stamping errors at `offset`
    pub fn new(offset: UtcOffset) -> Self {
        Self {
            errors: Mutex::new(Vec::new()),
            offset,
        }
    }

    pub fn push(&self, message: impl Into<String>) {
        self.errors
            .lock_recovered()
            .push(RestoreError::now(message, self.offset));
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.errors.lock_recovered().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Take every error recorded so far, in insertion order
    pub fn drain(&self) -> Vec<RestoreError> {
        std::mem::take(&mut *self.errors.lock_recovered())
    }
}

/// Everything a restore task reports into
pub struct RestoreContext {
    pub progress: ProgressTracker,
    pub errors: ErrorCollector,
    pub token: CancellationToken,
}

impl RestoreContext {
    pub fn new(total: u64, notifier: Arc<dyn Notifier>, token: CancellationToken) -> Self {
        Self {
            progress: ProgressTracker::new(total, notifier, token.clone()),
            errors: ErrorCollector::default(),
            token,
        }
    }

    /// Stamp recorded errors at `offset` instead of UTC
    #[must_use]
    pub fn with_utc_offset(mut self, offset: UtcOffset) -> Self {
        self.errors = ErrorCollector::new(offset);
        self
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

// =============================================================================
// Tests
// =============================================================================
